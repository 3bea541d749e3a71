//! Drive the MCP task server with the raw client, no workflow on top:
//! open a session, discover the tools, parse a PRP, add a task, list the
//! project, close.
//!
//! Expects a server at `MCP_SERVER_URL` (default `http://localhost:8787/mcp`):
//!
//! ```sh
//! cargo run --example direct_client
//! ```

use groundwork_core::mcp::calls;
use groundwork_core::models::project::{NewTask, TaskFilter, TaskPriority};
use groundwork_core::{GroundworkConfig, McpClient};

const PRP: &str = r#"# Product Requirements Prompt: Link Shortener

## Project Overview
A minimal link shortener with click counting.

## Implementation Tasks

### Phase 1
1. Define the redirect data model (2 hours)
2. Implement shorten and redirect endpoints (4 hours)
3. Add click counting (2 hours)

## Documentation Needs
- API reference for the two endpoints
"#;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = GroundworkConfig::load();
    let project = "link-shortener";

    let mut session = McpClient::new(config.mcp_client_config())?;

    let tools = session.discover_tools().await?;
    println!("server tools: {}", tools.join(", "));

    let parsed = calls::parse_prp(&mut session, PRP, project, None).await?;
    println!("\nparsePRP:\n{}", calls::result_text(&parsed).unwrap_or_default());

    let task = NewTask::new(
        "Pick a storage backend",
        "Compare sqlite and redis for redirect lookups",
        project,
    )
    .with_priority(TaskPriority::High)
    .with_estimated_hours(2.0);
    let created = calls::create_task(&mut session, &task).await?;
    println!("\ncreateTask:\n{}", calls::result_text(&created).unwrap_or_default());

    let listed = calls::list_tasks(&mut session, &TaskFilter::for_project(project)).await?;
    println!("\nlistTasks:\n{}", calls::result_text(&listed).unwrap_or_default());

    session.close();
    Ok(())
}
