//! Inputs and outputs of the research workflow.

use serde::{Deserialize, Serialize};

use super::project::PrpParseStats;

/// One web search hit, in the order the search service returned it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub age: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub score: Option<f64>,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            url: url.into(),
            description: description.into(),
            age: None,
            score: None,
        }
    }
}

fn default_search_depth() -> u32 {
    10
}

/// What to research and how deep to look.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchRequest {
    pub topic: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub project_goals: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub target_users: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub constraints: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub timeline: Option<String>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
    /// Results requested per query. Out-of-range values are clamped at use.
    #[serde(default = "default_search_depth")]
    pub search_depth: u32,
}

impl ResearchRequest {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            project_goals: None,
            target_users: None,
            constraints: None,
            timeline: None,
            focus_areas: Vec::new(),
            search_depth: default_search_depth(),
        }
    }

    /// Search depth within the range the search service accepts.
    pub fn clamped_depth(&self) -> u32 {
        self.search_depth.clamp(1, 20)
    }
}

/// Outcome of one workflow run. `success` is false when a stage failed after
/// the run started; `error_message` then says which.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResearchReport {
    pub success: bool,
    pub session_id: String,
    pub topic: String,
    pub search_results_count: usize,
    pub prp_generated: bool,
    pub prp_parsed: bool,
    pub tasks_created: u64,
    pub documentation_created: u64,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub estimated_hours: Option<f64>,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error_message: Option<String>,
}

impl ResearchReport {
    /// Blank report for a fresh session; stages fill it in as they complete.
    pub fn started(session_id: impl Into<String>, topic: impl Into<String>) -> Self {
        Self {
            success: false,
            session_id: session_id.into(),
            topic: topic.into(),
            search_results_count: 0,
            prp_generated: false,
            prp_parsed: false,
            tasks_created: 0,
            documentation_created: 0,
            project_name: None,
            estimated_hours: None,
            next_steps: Vec::new(),
            error_message: None,
        }
    }

    pub fn apply_parse_stats(&mut self, stats: &PrpParseStats) {
        self.prp_parsed = true;
        self.tasks_created = stats.tasks_extracted;
        self.documentation_created = stats.documentation_extracted;
        if stats.total_estimated_hours > 0.0 {
            self.estimated_hours = Some(stats.total_estimated_hours);
        }
    }
}
