use std::panic::{self, AssertUnwindSafe};

use anyhow::Context;
use rayon::prelude::*;
use rayon::ThreadPoolBuilder;
use serde::Serialize;

use crate::adapter::{Adapter, EventAdapter, EventSource};
use crate::models::EventEntityCollection;

/// Everything fetched for one group, ready for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct GroupEvents {
    pub group_id: String,
    pub source: String,
    pub name: String,
    pub description: String,
    pub photo: String,
    pub events: EventEntityCollection,
}

fn fetch_group<S: EventSource>(source: S, group_id: &str) -> Option<GroupEvents> {
    if !source.registry().contains(group_id) {
        tracing::debug!(source = source.source_id(), group = group_id, "skipping unconfigured group");
        return None;
    }
    let mut adapter = Adapter::new(source);
    adapter.fetch(group_id);

    let source_id = adapter.source_id().to_string();
    let (events, info) = adapter.into_parts();
    Some(GroupEvents {
        group_id: group_id.to_string(),
        source: source_id,
        name: info.name().to_string(),
        description: info.description().to_string(),
        photo: info.photo().to_string(),
        events,
    })
}

// A panic is contained to the group that raised it.
fn fetch_isolated<S, F>(make_source: &F, group_id: &str) -> Option<GroupEvents>
where
    S: EventSource,
    F: Fn() -> S,
{
    panic::catch_unwind(AssertUnwindSafe(|| fetch_group(make_source(), group_id))).unwrap_or_else(
        |_| {
            tracing::error!(group = group_id, "fetch panicked; group skipped");
            None
        },
    )
}

/// Fetches every group on a pool of `workers` threads, one adapter per group.
/// Results keep the order of `group_ids`, not completion order.
pub fn aggregate<S, F>(
    group_ids: &[String],
    workers: usize,
    make_source: F,
) -> anyhow::Result<Vec<GroupEvents>>
where
    S: EventSource,
    F: Fn() -> S + Sync,
{
    if group_ids.is_empty() {
        return Ok(Vec::new());
    }
    let pool = ThreadPoolBuilder::new()
        .num_threads(workers.clamp(1, group_ids.len()))
        .thread_name(|index| format!("aggregate-{index}"))
        .build()
        .context("failed to build aggregation pool")?;

    let make_source = &make_source;
    Ok(pool.install(|| {
        group_ids
            .par_iter()
            .filter_map(|group_id| fetch_isolated(make_source, group_id))
            .collect()
    }))
}
