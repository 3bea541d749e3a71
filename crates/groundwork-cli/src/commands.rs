use anyhow::Context;
use groundwork_core::mcp::{calls, McpClient};
use groundwork_core::models::project::{
    DocumentationType, NewDocumentation, NewTask, TaskFilter, TaskPriority,
};
use groundwork_core::models::research::ResearchRequest;
use groundwork_core::{GroundworkConfig, ResearchWorkflow};
use serde_json::{Map, Value};

const KEY_TOOLS: [&str; 3] = [
    calls::TOOL_PARSE_PRP,
    calls::TOOL_CREATE_TASK,
    calls::TOOL_LIST_TASKS,
];

/// Probe the configured MCP server and report which integration tools it
/// exposes.
pub async fn check(config: &GroundworkConfig) -> anyhow::Result<()> {
    println!("Checking MCP server at {}", config.mcp_server_url);

    let mut session = McpClient::new(config.mcp_client_config())?;
    let outcome = probe(&mut session).await;
    session.close();
    outcome
}

async fn probe(session: &mut McpClient) -> anyhow::Result<()> {
    let tools = session.discover_tools().await.context("discovering tools")?;
    println!("Server exposes {} tools:", tools.len());
    for tool in &tools {
        println!("  - {tool}");
    }

    let missing: Vec<&str> = KEY_TOOLS
        .iter()
        .copied()
        .filter(|tool| !session.has_tool(tool))
        .collect();
    if missing.is_empty() {
        println!("All integration tools are available.");
    } else {
        println!("Missing integration tools: {}", missing.join(", "));
    }
    Ok(())
}

const SAMPLE_PRP: &str = r#"# Product Requirements Prompt: Team Task Tracker

## Project Overview
A small web application for tracking a team's tasks with priorities,
assignments, and progress states.

## Core Features
- Create, edit, and complete tasks
- Assign tasks to team members with priorities
- Filter the task list by status and assignee

## Implementation Tasks

### Phase 1: Foundation
1. Set up the project skeleton and CI (4 hours)
2. Design the task data model and storage (6 hours)
3. Implement task creation and listing endpoints (8 hours)

### Phase 2: Collaboration
4. Add assignment and priority handling (6 hours)
5. Build the status filters and board view (8 hours)

## Documentation Needs
- API reference for the task endpoints
- Getting-started guide for new team members
"#;

/// Walk the MCP integration end to end with a built-in sample PRP.
pub async fn demo(config: &GroundworkConfig) -> anyhow::Result<()> {
    let project = "groundwork-demo";
    println!("Running the integration demo against {}", config.mcp_server_url);

    let mut session = McpClient::new(config.mcp_client_config())?;
    let outcome = drive_demo(&mut session, project).await;
    session.close();
    outcome?;

    let workflow = ResearchWorkflow::new(config.clone())?;
    let status = workflow.project_status(project).await?;
    println!("\nProject status for {}:", status.project_name);
    println!("{}", status.tasks);
    println!("{}", status.documentation);
    Ok(())
}

async fn drive_demo(session: &mut McpClient, project: &str) -> anyhow::Result<()> {
    let tools = session.discover_tools().await.context("discovering tools")?;
    println!("\n[1/5] Discovered {} tools: {}", tools.len(), tools.join(", "));

    let parsed = calls::parse_prp(session, SAMPLE_PRP, project, Some("integration demo"))
        .await
        .context("parsing the sample PRP")?;
    println!("\n[2/5] parsePRP:\n{}", render(&parsed));

    let task = NewTask::new(
        "Review generated tasks",
        "Check the extracted tasks against the PRP for accuracy",
        project,
    )
    .with_priority(TaskPriority::High)
    .with_estimated_hours(1.0);
    let created = calls::create_task(session, &task)
        .await
        .context("creating a follow-up task")?;
    println!("\n[3/5] createTask:\n{}", render(&created));

    let listed = calls::list_tasks(session, &TaskFilter::for_project(project))
        .await
        .context("listing tasks")?;
    println!("\n[4/5] listTasks:\n{}", render(&listed));

    let doc = NewDocumentation::new(
        "Demo run notes",
        "Created by the groundwork integration demo.",
        DocumentationType::Readme,
        project,
    )
    .with_tags(vec!["demo".into()]);
    let documented = calls::create_documentation(session, &doc)
        .await
        .context("creating documentation")?;
    println!("\n[5/5] createDocumentation:\n{}", render(&documented));

    Ok(())
}

/// Run the research pipeline and print the report.
pub async fn research(
    config: &GroundworkConfig,
    topic: &str,
    focus_areas: &[String],
) -> anyhow::Result<()> {
    let mut request = ResearchRequest::new(topic);
    request.focus_areas = focus_areas.to_vec();
    request.search_depth = config.max_search_results;

    let workflow = ResearchWorkflow::new(config.clone())?;
    let report = workflow.run(&request).await?;

    println!("Research session {}", report.session_id);
    println!("  topic:           {}", report.topic);
    println!("  search results:  {}", report.search_results_count);
    println!("  PRP generated:   {}", report.prp_generated);
    println!("  PRP parsed:      {}", report.prp_parsed);
    println!("  tasks created:   {}", report.tasks_created);
    println!("  documentation:   {}", report.documentation_created);
    if let Some(hours) = report.estimated_hours {
        println!("  estimated hours: {hours}");
    }
    if let Some(project) = &report.project_name {
        println!("  project:         {project}");
    }
    if !report.next_steps.is_empty() {
        println!("Next steps:");
        for step in &report.next_steps {
            println!("  - {step}");
        }
    }

    if let Some(message) = report.error_message {
        anyhow::bail!("research did not complete: {message}");
    }
    Ok(())
}

/// Show a project's tasks and documentation as the server reports them.
pub async fn status(config: &GroundworkConfig, project_name: &str) -> anyhow::Result<()> {
    let workflow = ResearchWorkflow::new(config.clone())?;
    let status = workflow.project_status(project_name).await?;

    println!("Project: {}", status.project_name);
    println!("\nTasks:\n{}", status.tasks);
    println!("\nDocumentation:\n{}", status.documentation);
    Ok(())
}

/// Prefer the tool's own text; fall back to pretty JSON when it sent none.
fn render(result: &Map<String, Value>) -> String {
    calls::result_text(result).unwrap_or_else(|| {
        serde_json::to_string_pretty(&Value::Object(result.clone())).unwrap_or_default()
    })
}
