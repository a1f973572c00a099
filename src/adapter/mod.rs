pub mod base;
pub mod meetup;
pub mod selection;
pub mod tito;

use tracing::Dispatch;

use crate::config::{GroupEntry, GroupRegistry};
use crate::error::{FetchError, FetchResult};
use crate::logging::{report_failure, Lookup};
use crate::models::{EventEntity, EventEntityCollection, GroupInfo};

use selection::Selection;

/// Public contract every adapter exposes to the facade.
pub trait EventAdapter: Send {
    fn source_id(&self) -> &'static str;

    /// Populates the collection and group info for `group_id`. Unconfigured
    /// groups are ignored; lookup failures are absorbed into null objects.
    fn fetch(&mut self, group_id: &str);

    fn group_info(&self) -> &GroupInfo;

    fn event_entity_collection(&self) -> &EventEntityCollection;

    fn group_name(&self) -> &str {
        self.group_info().name()
    }

    fn group_description(&self) -> &str {
        self.group_info().description()
    }

    fn group_photo(&self) -> &str {
        self.group_info().photo()
    }
}

/// Source-specific half of an adapter: how to get candidates and a group
/// profile out of one provider.
pub trait EventSource: Send + Sync {
    type Record: Send;

    fn source_id(&self) -> &'static str;

    fn registry(&self) -> &GroupRegistry;

    /// Raw event records for the group, in the order the source returns them.
    fn candidates(&self, group_id: &str, entry: &GroupEntry) -> FetchResult<Vec<Self::Record>>;

    fn title<'r>(&self, record: &'r Self::Record) -> &'r str;

    fn to_entity(&self, record: Self::Record, group_id: &str, entry: &GroupEntry) -> EventEntity;

    fn group_info(&self, group_id: &str, entry: &GroupEntry) -> FetchResult<GroupInfo>;

    /// Both lookups for one `fetch`. Runs them side by side; sources whose
    /// events and profile come from the same document override this to
    /// download it once.
    fn lookup(
        &self,
        group_id: &str,
        entry: &GroupEntry,
    ) -> (FetchResult<Vec<Self::Record>>, FetchResult<GroupInfo>) {
        join_traced(
            || self.candidates(group_id, entry),
            || self.group_info(group_id, entry),
        )
    }
}

/// `rayon::join` that keeps the caller's span and subscriber on the second
/// closure, which may be stolen by another pool thread.
pub(crate) fn join_traced<A, B, RA, RB>(first: A, second: B) -> (RA, RB)
where
    A: FnOnce() -> RA + Send,
    B: FnOnce() -> RB + Send,
    RA: Send,
    RB: Send,
{
    let span = tracing::Span::current();
    let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
    rayon::join(first, move || {
        tracing::dispatcher::with_default(&dispatch, || span.in_scope(second))
    })
}

/// Binds one [`EventSource`] to the collection and group info it fills.
///
/// The collection accumulates across `fetch` calls; callers that want one
/// result per group use one adapter per group.
pub struct Adapter<S> {
    source: S,
    collection: EventEntityCollection,
    group_info: GroupInfo,
}

impl<S: EventSource> Adapter<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            collection: EventEntityCollection::new(),
            group_info: GroupInfo::Absent,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_parts(self) -> (EventEntityCollection, GroupInfo) {
        (self.collection, self.group_info)
    }

    fn apply_events(&mut self, group_id: &str, events: FetchResult<Vec<EventEntity>>) {
        match events {
            Ok(entities) => {
                for entity in entities {
                    self.collection.add(entity);
                }
            }
            Err(err) => {
                report_failure(self.source.source_id(), group_id, Lookup::Events, &err);
                self.collection.add(EventEntity::Absent);
            }
        }
    }

    fn apply_group_info(&mut self, group_id: &str, info: FetchResult<GroupInfo>) {
        self.group_info = match info {
            Ok(info) => info,
            Err(err) => {
                report_failure(self.source.source_id(), group_id, Lookup::GroupInfo, &err);
                GroupInfo::Absent
            }
        };
    }
}

fn select_events<S: EventSource>(
    source: &S,
    group_id: &str,
    entry: &GroupEntry,
    candidates: Vec<S::Record>,
) -> FetchResult<Vec<EventEntity>> {
    if candidates.is_empty() {
        return Err(FetchError::NoEvents {
            group: group_id.to_string(),
        });
    }

    let rule = entry.selection_rule();
    match selection::select(candidates, &rule, |record| source.title(record)) {
        Selection::Picked(records) => Ok(records
            .into_iter()
            .map(|record| source.to_entity(record, group_id, entry))
            .collect()),
        Selection::Missed => {
            tracing::warn!(
                source = source.source_id(),
                group = group_id,
                rule = ?rule,
                "no event matched the selection rule"
            );
            Ok(vec![EventEntity::Absent])
        }
    }
}

impl<S: EventSource> EventAdapter for Adapter<S> {
    fn source_id(&self) -> &'static str {
        self.source.source_id()
    }

    fn fetch(&mut self, group_id: &str) {
        let Some(entry) = self.source.registry().get(group_id).cloned() else {
            tracing::debug!(source = self.source.source_id(), group = group_id, "group not configured");
            return;
        };

        let span = tracing::info_span!("fetch", source = self.source.source_id(), group = group_id);
        let _guard = span.enter();

        let (candidates, info) = self.source.lookup(group_id, &entry);
        let events = candidates
            .and_then(|candidates| select_events(&self.source, group_id, &entry, candidates));

        self.apply_events(group_id, events);
        self.apply_group_info(group_id, info);
        tracing::debug!(events = self.collection.len(), "fetch finished");
    }

    fn group_info(&self) -> &GroupInfo {
        &self.group_info
    }

    fn event_entity_collection(&self) -> &EventEntityCollection {
        &self.collection
    }
}
