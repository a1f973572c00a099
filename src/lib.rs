pub mod adapter;
pub mod aggregate;
pub mod config;
pub mod error;
pub mod facade;
pub mod logging;
pub mod models;
pub mod source;
pub mod utils;

use std::sync::Arc;

use anyhow::Context;
use tracing::Level;

pub use adapter::{Adapter, EventAdapter, EventSource};
pub use aggregate::{aggregate, GroupEvents};
pub use config::{GroupEntry, GroupRegistry, SelectionRule};
pub use error::FetchError;
pub use facade::EventFacade;
pub use models::{EventDetails, EventEntity, EventEntityCollection, GroupInfo};

use adapter::meetup::MeetupSource;
use adapter::tito::TitoSource;
use source::ReqwestClient;

/// Loads settings and groups, fetches every configured group from both
/// sources, and prints the aggregated result as JSON on stdout.
pub fn run() -> anyhow::Result<()> {
    logging::init(Level::INFO).context("failed to initialize logging")?;

    let root = utils::data_root();
    let settings = config::load_settings(&utils::settings_path(&root))?;
    let groups = config::load_groups(&utils::groups_path(&root))?;
    tracing::info!(
        config_dir = %root.display(),
        meetups = groups.meetups.len(),
        tito = groups.tito.len(),
        "loaded group registry"
    );

    let client = Arc::new(ReqwestClient::new(
        settings.runtime.timeout(),
        &settings.runtime.user_agent,
    )?);
    let workers = settings.runtime.workers();

    let mut results = aggregate(&groups.meetups.group_ids(), workers, || {
        MeetupSource::new(client.clone(), settings.meetups.clone(), groups.meetups.clone())
    })?;
    results.extend(aggregate(&groups.tito.group_ids(), workers, || {
        TitoSource::new(client.clone(), settings.tito.base_url.clone(), groups.tito.clone())
    })?);

    let missing = results
        .iter()
        .filter(|group| group.events.iter().all(EventEntity::is_absent))
        .count();
    tracing::info!(groups = results.len(), without_events = missing, "aggregation finished");

    let json = serde_json::to_string_pretty(&results).context("failed to serialize events")?;
    println!("{json}");
    Ok(())
}
