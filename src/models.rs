use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

static NO_PAYLOAD: Value = Value::Null;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EventDetails {
    pub id: String, // stable hash: source|group|title|start
    pub source: String,
    pub group_id: String,
    pub title: String,
    pub start_local: Option<DateTime<FixedOffset>>,
    pub location: String,
    pub url: String,
    pub raw: Value,
}

/// A normalized event, or the null object standing in for "nothing usable".
///
/// Every accessor works on both variants so presentation code never has to
/// branch; `Absent` answers with empty strings and `None`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EventEntity {
    Listed(EventDetails),
    Absent,
}

impl EventEntity {
    pub fn is_absent(&self) -> bool {
        matches!(self, EventEntity::Absent)
    }

    pub fn id(&self) -> &str {
        match self {
            EventEntity::Listed(details) => &details.id,
            EventEntity::Absent => "",
        }
    }

    pub fn title(&self) -> &str {
        match self {
            EventEntity::Listed(details) => &details.title,
            EventEntity::Absent => "",
        }
    }

    pub fn start_local(&self) -> Option<DateTime<FixedOffset>> {
        match self {
            EventEntity::Listed(details) => details.start_local,
            EventEntity::Absent => None,
        }
    }

    /// Date line as shown on an event card, e.g. `Thu 24 Oct 2026, 18:30`.
    pub fn date_display(&self) -> String {
        self.start_local()
            .map(|start| start.format("%a %-d %b %Y, %H:%M").to_string())
            .unwrap_or_default()
    }

    pub fn location(&self) -> &str {
        match self {
            EventEntity::Listed(details) => &details.location,
            EventEntity::Absent => "",
        }
    }

    pub fn url(&self) -> &str {
        match self {
            EventEntity::Listed(details) => &details.url,
            EventEntity::Absent => "",
        }
    }

    /// Source record the entity was built from, kept for the presentation layer.
    pub fn raw(&self) -> &Value {
        match self {
            EventEntity::Listed(details) => &details.raw,
            EventEntity::Absent => &NO_PAYLOAD,
        }
    }
}

/// Group metadata from the most recent fetch; `Absent` on any failure.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GroupInfo {
    Known {
        name: String,
        description: String,
        photo: String,
    },
    #[default]
    Absent,
}

impl GroupInfo {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        photo: impl Into<String>,
    ) -> Self {
        GroupInfo::Known {
            name: name.into(),
            description: description.into(),
            photo: photo.into(),
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, GroupInfo::Absent)
    }

    pub fn name(&self) -> &str {
        match self {
            GroupInfo::Known { name, .. } => name,
            GroupInfo::Absent => "",
        }
    }

    pub fn description(&self) -> &str {
        match self {
            GroupInfo::Known { description, .. } => description,
            GroupInfo::Absent => "",
        }
    }

    pub fn photo(&self) -> &str {
        match self {
            GroupInfo::Known { photo, .. } => photo,
            GroupInfo::Absent => "",
        }
    }
}

/// Append-only, insertion-ordered list of entities. The first entry added for
/// a group is its primary event.
#[derive(Serialize, Clone, Debug, Default, PartialEq)]
#[serde(transparent)]
pub struct EventEntityCollection {
    entities: Vec<EventEntity>,
}

impl EventEntityCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, entity: EventEntity) {
        self.entities.push(entity);
    }

    pub fn iter(&self) -> std::slice::Iter<'_, EventEntity> {
        self.entities.iter()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn first(&self) -> Option<&EventEntity> {
        self.entities.first()
    }
}

impl<'a> IntoIterator for &'a EventEntityCollection {
    type Item = &'a EventEntity;
    type IntoIter = std::slice::Iter<'a, EventEntity>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
