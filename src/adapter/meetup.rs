use chrono::{DateTime, FixedOffset};
use serde::Deserialize;
use serde_json::Value;

use super::base;
use super::EventSource;
use crate::config::{GroupEntry, GroupRegistry, MeetupSettings};
use crate::error::{FetchError, FetchResult};
use crate::models::{EventDetails, EventEntity, GroupInfo};
use crate::source::HttpClient;
use crate::utils::expand_uri;

pub const SOURCE_ID: &str = "meetups";
const SITE_URL: &str = "https://www.meetup.com/";

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    results: Option<Vec<T>>,
}

#[derive(Debug, Deserialize)]
struct GroupDoc {
    name: Option<String>,
    description: Option<String>,
    group_photo: Option<GroupPhoto>,
}

#[derive(Debug, Deserialize)]
struct GroupPhoto {
    highres_link: Option<String>,
}

/// Meetup's JSON API: one request for upcoming events, one for the group
/// profile.
pub struct MeetupSource<C> {
    client: C,
    settings: MeetupSettings,
    registry: GroupRegistry,
}

impl<C: HttpClient> MeetupSource<C> {
    pub fn new(client: C, settings: MeetupSettings, registry: GroupRegistry) -> Self {
        Self {
            client,
            settings,
            registry,
        }
    }

    fn url(&self, template: &str, entry: &GroupEntry) -> String {
        format!(
            "{}{}",
            self.settings.base_url,
            expand_uri(template, &entry.group_urlname, &self.settings.api_key)
        )
    }

    fn get_results<T>(&self, url: &str) -> FetchResult<Option<Vec<T>>>
    where
        T: serde::de::DeserializeOwned,
    {
        let key = self.settings.api_key.as_str();
        let body = self.client.get(url).map_err(|err| err.redact(key))?;
        let envelope: Envelope<T> = serde_json::from_str(&body)
            .map_err(|err| FetchError::decode(url, err).redact(key))?;
        Ok(envelope.results)
    }
}

impl<C: HttpClient> EventSource for MeetupSource<C> {
    type Record = Value;

    fn source_id(&self) -> &'static str {
        SOURCE_ID
    }

    fn registry(&self) -> &GroupRegistry {
        &self.registry
    }

    fn candidates(&self, group_id: &str, entry: &GroupEntry) -> FetchResult<Vec<Value>> {
        let url = self.url(&self.settings.uris.events, entry);
        match self.get_results::<Value>(&url)? {
            Some(results) if !results.is_empty() => Ok(results),
            _ => Err(FetchError::NoEvents {
                group: group_id.to_string(),
            }),
        }
    }

    fn title<'r>(&self, record: &'r Value) -> &'r str {
        record.get("name").and_then(Value::as_str).unwrap_or("")
    }

    fn to_entity(&self, record: Value, group_id: &str, entry: &GroupEntry) -> EventEntity {
        let title = self.title(&record).to_string();
        let start_local = start_time(&record);
        let url = record
            .get("event_url")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("{SITE_URL}{}/", entry.group_urlname));

        EventEntity::Listed(EventDetails {
            id: base::entity_id(SOURCE_ID, group_id, &title, start_local.as_ref()),
            source: SOURCE_ID.to_string(),
            group_id: group_id.to_string(),
            title,
            start_local,
            location: venue_line(&record),
            url,
            raw: record,
        })
    }

    fn group_info(&self, group_id: &str, entry: &GroupEntry) -> FetchResult<GroupInfo> {
        let url = self.url(&self.settings.uris.groups, entry);
        tracing::debug!(urlname = %entry.group_urlname, "requesting group profile");
        let no_info = || FetchError::NoGroupInfo {
            group: group_id.to_string(),
        };
        let doc = self
            .get_results::<GroupDoc>(&url)?
            .and_then(|results| results.into_iter().next())
            .ok_or_else(no_info)?;

        match (
            doc.name,
            doc.description,
            doc.group_photo.and_then(|photo| photo.highres_link),
        ) {
            (Some(name), Some(description), Some(photo)) => {
                Ok(GroupInfo::new(name, description, photo))
            }
            _ => Err(no_info()),
        }
    }
}

/// `time` is epoch milliseconds; `utc_offset` is the venue offset in
/// milliseconds.
fn start_time(record: &Value) -> Option<DateTime<FixedOffset>> {
    let millis = record.get("time").and_then(Value::as_i64)?;
    let offset_ms = record
        .get("utc_offset")
        .and_then(Value::as_i64)
        .unwrap_or(0);
    let offset = FixedOffset::east_opt(i32::try_from(offset_ms / 1000).ok()?)?;
    DateTime::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&offset))
}

fn venue_line(record: &Value) -> String {
    let Some(venue) = record.get("venue") else {
        return String::new();
    };
    ["name", "address_1", "city"]
        .iter()
        .filter_map(|field| venue.get(*field).and_then(Value::as_str))
        .map(base::clean_text)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}
