use chrono::NaiveTime;
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use serde::Serialize;

use super::base;
use super::EventSource;
use crate::config::{GroupEntry, GroupRegistry};
use crate::error::{FetchError, FetchResult};
use crate::models::{EventDetails, EventEntity, GroupInfo};
use crate::source::Crawler;

pub const SOURCE_ID: &str = "ti.to";
const TIMEZONE: Tz = chrono_tz::Europe::London;

static CARD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("section.upcoming-events div.event").expect("tito card selector")
});
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".event-title").expect("tito title selector"));
static LINK_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a.event-link").expect("tito link selector"));
static DATE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".event-date").expect("tito date selector"));
static LOCATION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(".event-location").expect("tito location selector"));
static OG_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:title"]"#).expect("tito og:title"));
static DESCRIPTION_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[name="description"]"#).expect("tito description"));
static OG_IMAGE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse(r#"meta[property="og:image"]"#).expect("tito og:image"));
static PAGE_TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("head > title").expect("tito page title"));

/// One upcoming-event card from an organizer page.
#[derive(Debug, Clone, Serialize)]
pub struct TitoCard {
    pub title: String,
    pub date: Option<String>,
    pub location: Option<String>,
    pub href: Option<String>,
}

/// Tito organizer pages, crawled as HTML. Events and group profile both come
/// from `<baseUrl><group_urlname>`.
pub struct TitoSource<C> {
    crawler: C,
    base_url: String,
    registry: GroupRegistry,
}

impl<C: Crawler> TitoSource<C> {
    pub fn new(crawler: C, base_url: impl Into<String>, registry: GroupRegistry) -> Self {
        Self {
            crawler,
            base_url: base_url.into(),
            registry,
        }
    }

    fn page_url(&self, entry: &GroupEntry) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            entry.group_urlname
        )
    }
}

fn default_start() -> NaiveTime {
    NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN)
}

pub(crate) fn parse_cards(html: &str) -> Vec<TitoCard> {
    let document = Html::parse_document(html);
    document
        .select(&CARD_SELECTOR)
        .filter_map(|card| {
            let title = base::first_text(&card, &TITLE_SELECTOR)?;
            Some(TitoCard {
                title,
                date: base::first_text(&card, &DATE_SELECTOR),
                location: base::first_text(&card, &LOCATION_SELECTOR),
                href: base::first_attr(&card, &LINK_SELECTOR, "href"),
            })
        })
        .collect()
}

pub(crate) fn parse_group_info(html: &str) -> Option<GroupInfo> {
    let document = Html::parse_document(html);
    let name = base::document_attr(&document, &OG_TITLE_SELECTOR, "content").or_else(|| {
        document
            .select(&PAGE_TITLE_SELECTOR)
            .next()
            .map(base::inner_text)
            .filter(|text| !text.is_empty())
    })?;
    let description =
        base::document_attr(&document, &DESCRIPTION_SELECTOR, "content").unwrap_or_default();
    let photo = base::document_attr(&document, &OG_IMAGE_SELECTOR, "content").unwrap_or_default();
    Some(GroupInfo::new(name, description, photo))
}

impl<C: Crawler> EventSource for TitoSource<C> {
    type Record = TitoCard;

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }

    fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    fn candidates(&self, _group_id: &str, entry: &GroupEntry) -> FetchResult<Vec<TitoCard>> {
        let html = self.crawler.crawl(&self.page_url(entry))?;
        Ok(parse_cards(&html))
    }

    /// Cards and profile live on the same organizer page, so it is crawled
    /// once and both lookups share the outcome.
    fn lookup(
        &self,
        group_id: &str,
        entry: &GroupEntry,
    ) -> (FetchResult<Vec<TitoCard>>, FetchResult<GroupInfo>) {
        match self.crawler.crawl(&self.page_url(entry)) {
            Ok(html) => (Ok(parse_cards(&html)), profile(group_id, &html)),
            Err(err) => (Err(err.clone()), Err(err)),
        }
    }

    fn title<'r>(&self, record: &'r TitoCard) -> &'r str {
        &record.title
    }

    fn to_entity(&self, record: TitoCard, group_id: &str, entry: &GroupEntry) -> EventEntity {
        let page_url = self.page_url(entry);
        let start_local = record
            .date
            .as_deref()
            .and_then(|text| base::parse_datetime(text, default_start(), TIMEZONE));
        let url = base::absolute_url(&page_url, record.href.clone()).unwrap_or(page_url);
        let raw = serde_json::to_value(&record).unwrap_or_default();

        EventEntity::Listed(EventDetails {
            id: base::entity_id(SOURCE_ID, group_id, &record.title, start_local.as_ref()),
            source: SOURCE_ID.to_string(),
            group_id: group_id.to_string(),
            title: record.title,
            start_local,
            location: record.location.unwrap_or_default(),
            url,
            raw,
        })
    }

    fn group_info(&self, group_id: &str, entry: &GroupEntry) -> FetchResult<GroupInfo> {
        let html = self.crawler.crawl(&self.page_url(entry))?;
        profile(group_id, &html)
    }
}

fn profile(group_id: &str, html: &str) -> FetchResult<GroupInfo> {
    parse_group_info(html).ok_or_else(|| FetchError::NoGroupInfo {
        group: group_id.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::testing::{LogCapture, StubClient};
    use crate::adapter::{Adapter, EventAdapter};

    const PAGE_URL: &str = "https://ti.to/nottsjs";

    const SAMPLE_HTML: &str = r#"
    <html>
    <head>
        <title>Notts JS | Tito</title>
        <meta property="og:title" content="Notts JS">
        <meta name="description" content="Monthly JavaScript meetup in Nottingham">
        <meta property="og:image" content="https://ti.to/images/nottsjs.png">
    </head>
    <body>
        <section class="upcoming-events">
            <div class="event">
                <a class="event-link" href="/nottsjs/intro-night">
                    <h3 class="event-title">Intro Night</h3>
                </a>
                <p class="event-date">Thursday 22 October 2026, 6:30pm</p>
                <p class="event-location">Rebel Recruiters, Nottingham</p>
            </div>
            <div class="event">
                <a class="event-link" href="https://ti.to/nottsjs/demo-day">
                    <h3 class="event-title">Demo Day</h3>
                </a>
                <p class="event-date">Thu 19 Nov 2026 @ 19:00</p>
            </div>
            <div class="event">
                <h3 class="event-title">Demo Day 2</h3>
                <p class="event-date">10/12/2026</p>
            </div>
            <div class="event">
                <p class="event-date">Untitled card is skipped</p>
            </div>
        </section>
        <section class="past-events">
            <div class="event">
                <h3 class="event-title">Demo Retrospective</h3>
            </div>
        </section>
    </body>
    </html>
    "#;

    const NO_EVENTS_HTML: &str = r#"
    <html><head><title>Quiet Group</title></head>
    <body><section class="upcoming-events"></section></body></html>
    "#;

    fn adapter(client: StubClient) -> Adapter<TitoSource<StubClient>> {
        let registry = GroupRegistry::new()
            .with_group("notts-js", GroupEntry::new("nottsjs"))
            .with_group("notts-js-demo", GroupEntry::new("nottsjs").matching("Demo"))
            .with_group("quiet", GroupEntry::new("quiet"))
            .with_group("gone", GroupEntry::new("gone"));
        Adapter::new(TitoSource::new(client, "https://ti.to/", registry))
    }

    fn titles(adapter: &impl EventAdapter) -> Vec<String> {
        adapter
            .event_entity_collection()
            .iter()
            .map(|entity| entity.title().to_string())
            .collect()
    }

    #[test]
    fn parses_upcoming_cards_only() {
        let cards = parse_cards(SAMPLE_HTML);
        let names: Vec<&str> = cards.iter().map(|card| card.title.as_str()).collect();
        assert_eq!(names, vec!["Intro Night", "Demo Day", "Demo Day 2"]);
        assert_eq!(cards[0].href.as_deref(), Some("/nottsjs/intro-night"));
        assert_eq!(
            cards[0].location.as_deref(),
            Some("Rebel Recruiters, Nottingham")
        );
        assert!(cards[2].href.is_none());
    }

    #[test]
    fn builds_entities_from_first_two_cards() {
        let client = StubClient::default().with(PAGE_URL, SAMPLE_HTML);
        let mut adapter = adapter(client);
        adapter.fetch("notts-js");

        assert_eq!(titles(&adapter), vec!["Intro Night", "Demo Day"]);
        let events: Vec<&EventEntity> = adapter.event_entity_collection().iter().collect();
        assert_eq!(events[0].url(), "https://ti.to/nottsjs/intro-night");
        assert_eq!(events[0].location(), "Rebel Recruiters, Nottingham");
        assert_eq!(
            events[0].start_local().map(|start| start.to_rfc3339()),
            Some("2026-10-22T18:30:00+01:00".to_string())
        );
        assert_eq!(events[0].raw()["title"], "Intro Night");
        assert_eq!(events[1].url(), "https://ti.to/nottsjs/demo-day");
        assert_eq!(events[1].location(), "");
        assert_eq!(events[1].date_display(), "Thu 19 Nov 2026, 19:00");
    }

    #[test]
    fn organizer_page_is_crawled_once_per_fetch() {
        let client = StubClient::default().with(PAGE_URL, SAMPLE_HTML);
        let mut adapter = adapter(client);
        adapter.fetch("notts-js");

        assert_eq!(adapter.source().crawler.requests(), vec![PAGE_URL.to_string()]);
        assert_eq!(titles(&adapter), vec!["Intro Night", "Demo Day"]);
        assert_eq!(adapter.group_name(), "Notts JS");
    }

    #[test]
    fn single_lookups_read_the_same_page() {
        let source = TitoSource::new(
            StubClient::default().with(PAGE_URL, SAMPLE_HTML),
            "https://ti.to",
            GroupRegistry::new(),
        );
        let entry = GroupEntry::new("nottsjs");

        let cards = source.candidates("notts-js", &entry).expect("cards");
        assert_eq!(cards.len(), 3);
        let info = source.group_info("notts-js", &entry).expect("profile");
        assert_eq!(info.name(), "Notts JS");
        assert!(matches!(
            source.group_info("gone", &GroupEntry::new("gone")),
            Err(FetchError::Request { .. })
        ));
    }

    #[test]
    fn reads_group_profile_from_meta_tags() {
        let client = StubClient::default().with(PAGE_URL, SAMPLE_HTML);
        let mut adapter = adapter(client);
        adapter.fetch("notts-js");

        assert_eq!(adapter.group_name(), "Notts JS");
        assert_eq!(
            adapter.group_description(),
            "Monthly JavaScript meetup in Nottingham"
        );
        assert_eq!(adapter.group_photo(), "https://ti.to/images/nottsjs.png");
    }

    #[test]
    fn group_profile_falls_back_to_page_title() {
        let info = parse_group_info(NO_EVENTS_HTML).expect("page title");
        assert_eq!(info.name(), "Quiet Group");
        assert_eq!(info.description(), "");
        assert!(parse_group_info("<html><body></body></html>").is_none());
    }

    #[test]
    fn match_rule_picks_first_matching_card() {
        let client = StubClient::default().with(PAGE_URL, SAMPLE_HTML);
        let mut adapter = adapter(client);
        adapter.fetch("notts-js-demo");

        assert_eq!(titles(&adapter), vec!["Demo Day"]);
    }

    #[test]
    fn page_without_cards_yields_null_entity() {
        let client =
            StubClient::default().with("https://ti.to/quiet", NO_EVENTS_HTML);
        let mut adapter = adapter(client);
        adapter.fetch("quiet");

        let collection = adapter.event_entity_collection();
        assert_eq!(collection.len(), 1);
        assert!(collection.iter().all(EventEntity::is_absent));
        assert_eq!(adapter.group_name(), "Quiet Group");
    }

    #[test]
    fn crawl_failure_degrades_both_lookups() {
        let mut adapter = adapter(StubClient::default().with(PAGE_URL, SAMPLE_HTML));
        let capture = LogCapture::default();

        tracing::subscriber::with_default(capture.subscriber(), || adapter.fetch("gone"));

        assert_eq!(titles(&adapter), vec![""]);
        assert!(adapter.group_info().is_absent());
        let logs = capture.contents();
        assert!(logs.contains("ERROR"), "{logs}");
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("https://ti.to/gone"), "{logs}");

        adapter.fetch("notts-js");
        assert_eq!(titles(&adapter), vec!["", "Intro Night", "Demo Day"]);
        assert_eq!(adapter.group_name(), "Notts JS");
    }

    #[test]
    fn unconfigured_group_is_a_noop() {
        let mut adapter = adapter(StubClient::default());
        adapter.fetch("not-listed");

        assert!(adapter.event_entity_collection().is_empty());
        assert!(adapter.group_info().is_absent());
        assert!(adapter.source().crawler.requests().is_empty());
    }

    #[test]
    fn unconfigured_group_keeps_previous_state() {
        let mut adapter = adapter(StubClient::default().with(PAGE_URL, SAMPLE_HTML));
        adapter.fetch("notts-js");
        let requests = adapter.source().crawler.requests().len();

        adapter.fetch("not-listed");

        assert_eq!(adapter.group_name(), "Notts JS");
        assert_eq!(titles(&adapter), vec!["Intro Night", "Demo Day"]);
        assert_eq!(adapter.source().crawler.requests().len(), requests);
    }
}
