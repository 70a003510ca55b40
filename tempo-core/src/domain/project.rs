use serde::{Deserialize, Serialize};

use super::{Money, ProjectId};

/// A node of the project forest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ProjectId>,
    /// Rate billed per tracked hour. `None` means the project is not billed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hourly_rate: Option<Money>,
}

impl Project {
    pub fn new(id: impl Into<ProjectId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            parent_id: None,
            hourly_rate: None,
        }
    }

    pub fn with_parent(mut self, parent_id: impl Into<ProjectId>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    pub fn with_hourly_rate(mut self, rate: Money) -> Self {
        self.hourly_rate = Some(rate);
        self
    }

    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }
}
