use crate::adapter::EventAdapter;
use crate::models::{EventEntityCollection, GroupInfo};

/// Uniform handle the presentation layer holds, whichever source filled it.
pub struct EventFacade {
    adapter: Box<dyn EventAdapter>,
}

impl EventFacade {
    pub fn new(adapter: impl EventAdapter + 'static) -> Self {
        Self {
            adapter: Box::new(adapter),
        }
    }

    pub fn source_id(&self) -> &'static str {
        self.adapter.source_id()
    }

    pub fn fetch(&mut self, group_id: &str) {
        self.adapter.fetch(group_id);
    }

    pub fn event_entity_collection(&self) -> &EventEntityCollection {
        self.adapter.event_entity_collection()
    }

    pub fn group_info(&self) -> &GroupInfo {
        self.adapter.group_info()
    }

    pub fn group_name(&self) -> &str {
        self.adapter.group_name()
    }

    pub fn group_description(&self) -> &str {
        self.adapter.group_description()
    }

    pub fn group_photo(&self) -> &str {
        self.adapter.group_photo()
    }
}
