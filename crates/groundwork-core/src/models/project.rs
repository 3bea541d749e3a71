//! Task and documentation records as the MCP project server understands
//! them. Field names follow the server's camelCase wire form; enum values
//! are its lowercase tokens.

use serde::{Deserialize, Serialize};

// ── Enumerations ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Completed,
    Blocked,
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentationType {
    Guide,
    Reference,
    Api,
    Tutorial,
    Spec,
    Readme,
    Changelog,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentationImportance {
    Low,
    Medium,
    High,
    Critical,
}

impl Default for DocumentationImportance {
    fn default() -> Self {
        DocumentationImportance::Medium
    }
}

// ── Records ──────────────────────────────────────────────────────────────────

/// Payload for `createTask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub project_name: String,
    pub priority: TaskPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl NewTask {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            project_name: project_name.into(),
            priority: TaskPriority::default(),
            estimated_hours: None,
            assigned_to: None,
            tags: None,
        }
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_estimated_hours(mut self, hours: f64) -> Self {
        self.estimated_hours = Some(hours);
        self
    }

    pub fn with_assignee(mut self, assignee: impl Into<String>) -> Self {
        self.assigned_to = Some(assignee.into());
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }
}

/// Payload for `createDocumentation`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDocumentation {
    pub title: String,
    pub content: String,
    #[serde(rename = "type")]
    pub doc_type: DocumentationType,
    pub project_name: String,
    pub importance: DocumentationImportance,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub tags: Vec<String>,
}

impl NewDocumentation {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        doc_type: DocumentationType,
        project_name: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            content: content.into(),
            doc_type,
            project_name: project_name.into(),
            importance: DocumentationImportance::default(),
            tags: Vec::new(),
        }
    }

    pub fn with_importance(mut self, importance: DocumentationImportance) -> Self {
        self.importance = importance;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }
}

/// Selection for `listTasks`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl Default for TaskFilter {
    fn default() -> Self {
        Self {
            limit: 50,
            project_name: None,
            status: None,
            assigned_to: None,
        }
    }
}

impl TaskFilter {
    pub fn for_project(project_name: impl Into<String>) -> Self {
        Self {
            project_name: Some(project_name.into()),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = limit;
        self
    }
}

/// Counters pulled out of the server's textual `parsePRP` summary. Lines the
/// server omits stay zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PrpParseStats {
    pub tasks_extracted: u64,
    pub documentation_extracted: u64,
    pub total_estimated_hours: f64,
}

/// Snapshot of a project as the server reports it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectStatus {
    pub project_name: String,
    /// Textual task summary from `listTasks`.
    pub tasks: String,
    /// Textual documentation summary, or the placeholder when the server
    /// does not support documentation listing.
    pub documentation: String,
}
