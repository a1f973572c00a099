use std::{collections::BTreeMap, fs, path::Path, time::Duration};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const DEFAULT_WORKERS: usize = 4;
const DEFAULT_TIMEOUT_SECS: u64 = 20;
const DEFAULT_USER_AGENT: &str =
    "CommunityEvents/0.1 (+https://github.com/community-events/community-events)";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub meetups: MeetupSettings,
    #[serde(rename = "ti.to")]
    pub tito: TitoSettings,
    pub runtime: RuntimeSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetupSettings {
    #[serde(rename = "api-key")]
    pub api_key: String,
    #[serde(rename = "baseUrl")]
    pub base_url: String,
    pub uris: MeetupUris,
}

impl Default for MeetupSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.meetup.com".to_string(),
            uris: MeetupUris::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetupUris {
    pub events: String,
    pub groups: String,
}

impl Default for MeetupUris {
    fn default() -> Self {
        Self {
            events: "/2/events?group_urlname={urlname}&key={key}&sign=true".to_string(),
            groups: "/2/groups?group_urlname={urlname}&key={key}&sign=true".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TitoSettings {
    #[serde(rename = "baseUrl")]
    pub base_url: String,
}

impl Default for TitoSettings {
    fn default() -> Self {
        Self {
            base_url: "https://ti.to/".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeSettings {
    pub workers: usize,
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for RuntimeSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl RuntimeSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn workers(&self) -> usize {
        self.workers.max(1)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SelectionRule {
    /// First candidate whose title contains the string (case-sensitive).
    ByMatch(String),
    /// First candidate, plus the second when present.
    ByOrder,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct MatchRule {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GroupEntry {
    pub group_urlname: String,
    #[serde(default, rename = "match")]
    pub match_rule: Option<MatchRule>,
}

impl GroupEntry {
    pub fn new(group_urlname: impl Into<String>) -> Self {
        Self {
            group_urlname: group_urlname.into(),
            match_rule: None,
        }
    }

    pub fn matching(mut self, name: impl Into<String>) -> Self {
        self.match_rule = Some(MatchRule {
            name: Some(name.into()),
        });
        self
    }

    pub fn selection_rule(&self) -> SelectionRule {
        match self.match_rule.as_ref().and_then(|rule| rule.name.as_ref()) {
            Some(name) => SelectionRule::ByMatch(name.clone()),
            None => SelectionRule::ByOrder,
        }
    }
}

/// Logical group id to source-specific entry, for one source.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct GroupRegistry {
    groups: BTreeMap<String, GroupEntry>,
}

impl GroupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_group(mut self, group_id: impl Into<String>, entry: GroupEntry) -> Self {
        self.groups.insert(group_id.into(), entry);
        self
    }

    pub fn get(&self, group_id: &str) -> Option<&GroupEntry> {
        self.groups.get(group_id)
    }

    pub fn contains(&self, group_id: &str) -> bool {
        self.groups.contains_key(group_id)
    }

    pub fn group_ids(&self) -> Vec<String> {
        self.groups.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Groups {
    pub meetups: GroupRegistry,
    #[serde(rename = "ti.to")]
    pub tito: GroupRegistry,
}

pub fn load_settings(path: &Path) -> Result<Settings> {
    if !path.exists() {
        tracing::warn!(path = %path.display(), "settings file missing, using defaults");
        return Ok(Settings::default());
    }
    read_json(path)
}

pub fn load_groups(path: &Path) -> Result<Groups> {
    read_json(path)
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("unable to read {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("invalid JSON in {}", path.display()))
}
