pub mod config;
pub mod mcp;
pub mod models;
pub mod providers;
pub mod prp;
pub mod retry;
pub mod search;
pub mod workflow;

#[cfg(test)]
pub(crate) mod testutil;

pub use config::config::GroundworkConfig;
pub use mcp::client::{McpClient, McpClientConfig};
pub use mcp::error::McpError;
pub use models::project::{
    DocumentationImportance, DocumentationType, NewDocumentation, NewTask, PrpParseStats,
    ProjectStatus, TaskFilter, TaskPriority, TaskStatus,
};
pub use models::research::{ResearchReport, ResearchRequest, SearchResult};
pub use providers::anthropic::AnthropicProvider;
pub use providers::provider::{CompletionError, CompletionProvider, CompletionRequest};
pub use prp::writer::PrpWriter;
pub use retry::{with_retry, RetryPolicy, Transient};
pub use search::brave::{SearchClient, SearchError, SearchQuery};
pub use workflow::workflow::ResearchWorkflow;
