//! The research pipeline: web search, PRP synthesis, hand-off to the MCP
//! task server, status reporting.

use std::collections::HashSet;
use std::sync::Arc;

use futures_util::{stream, StreamExt};
use regex::Regex;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::GroundworkConfig;
use crate::mcp::{calls, McpClient, McpError};
use crate::models::project::{PrpParseStats, ProjectStatus, TaskFilter};
use crate::models::research::{ResearchReport, ResearchRequest, SearchResult};
use crate::prp::{project_name_from_topic, PrpWriter};
use crate::providers::AnthropicProvider;
use crate::retry::with_retry;
use crate::search::{SearchClient, SearchError, SearchQuery};

const DOCS_UNAVAILABLE: &str = "Documentation listing not available";

pub struct ResearchWorkflow {
    config: GroundworkConfig,
    search: SearchClient,
    prp_writer: PrpWriter,
}

impl ResearchWorkflow {
    pub fn new(config: GroundworkConfig) -> anyhow::Result<Self> {
        let search = SearchClient::new(
            config.search_base_url.clone(),
            config.brave_api_key.clone(),
        )?;
        let provider = AnthropicProvider::new(
            config.anthropic_base_url.clone(),
            config.anthropic_api_key.clone(),
            config.model.clone(),
        )?;
        let prp_writer = PrpWriter::new(Arc::new(provider));
        Ok(Self {
            config,
            search,
            prp_writer,
        })
    }

    /// Run the full pipeline. Configuration problems fail fast with `Err`;
    /// once the session starts, stage failures come back as a report with
    /// `success: false` so partial progress is never lost.
    pub async fn run(&self, request: &ResearchRequest) -> anyhow::Result<ResearchReport> {
        self.config.validate_for_research()?;

        let session_id = Uuid::new_v4().to_string();
        let mut report = ResearchReport::started(session_id.clone(), request.topic.clone());
        info!("research: session {session_id} starting on {:?}", request.topic);

        let findings = match self.gather_findings(request).await {
            Ok(findings) => findings,
            Err(e) => {
                report.error_message = Some(format!("search failed: {e:#}"));
                return Ok(report);
            }
        };
        report.search_results_count = findings.len();

        let prp = match self.prp_writer.write_prp(request, &findings).await {
            Ok(prp) => prp,
            Err(e) => {
                report.error_message = Some(format!("PRP generation failed: {e}"));
                return Ok(report);
            }
        };
        report.prp_generated = true;

        let project_name = project_name_from_topic(&request.topic);
        report.project_name = Some(project_name.clone());
        if let Err(e) = self
            .parse_into_project(&prp, &project_name, request, &mut report)
            .await
        {
            report.error_message = Some(format!("task server hand-off failed: {e:#}"));
            return Ok(report);
        }

        report.success = true;
        report.next_steps = vec![
            format!("Review the generated tasks: groundwork status {project_name}"),
            "Adjust priorities and assignees on the task server".into(),
            "Start with the highest-priority foundation tasks".into(),
        ];
        Ok(report)
    }

    /// Fan the query variants out with bounded concurrency and merge the
    /// hits, first seen URL wins. Individual query failures degrade; only a
    /// total blank is an error.
    async fn gather_findings(
        &self,
        request: &ResearchRequest,
    ) -> anyhow::Result<Vec<SearchResult>> {
        let queries = build_queries(request);
        let depth = request.clamped_depth();
        let concurrency = self.config.max_concurrent_requests.max(1);

        let search = &self.search;
        let outcomes: Vec<(String, Result<Vec<SearchResult>, SearchError>)> =
            stream::iter(queries.into_iter().map(|q| {
                let query = SearchQuery::new(q.clone()).with_count(depth);
                async move {
                    let outcome = search.search(&query).await;
                    (q, outcome)
                }
            }))
            .buffered(concurrency)
            .collect()
            .await;

        let mut findings = Vec::new();
        let mut seen = HashSet::new();
        let mut succeeded = 0usize;
        let mut last_error = None;
        for (query, outcome) in outcomes {
            match outcome {
                Ok(results) => {
                    succeeded += 1;
                    for result in results {
                        if seen.insert(result.url.clone()) {
                            findings.push(result);
                        }
                    }
                }
                Err(e) => {
                    warn!("research: query {query:?} failed: {e}");
                    last_error = Some(e);
                }
            }
        }

        if succeeded == 0 {
            match last_error {
                Some(e) => return Err(anyhow::Error::new(e).context("all search queries failed")),
                None => anyhow::bail!("no search queries were built"),
            }
        }
        info!(
            "research: {} findings across {succeeded} successful queries",
            findings.len()
        );
        Ok(findings)
    }

    /// Feed the PRP to the task server and fold the parse counters into the
    /// report. The session closes on every path out.
    async fn parse_into_project(
        &self,
        prp: &str,
        project_name: &str,
        request: &ResearchRequest,
        report: &mut ResearchReport,
    ) -> anyhow::Result<()> {
        let mut session = McpClient::new(self.config.mcp_client_config())?;

        let tools = match session.discover_tools().await {
            Ok(tools) => tools,
            Err(e) => {
                session.close();
                return Err(e.into());
            }
        };
        if !session.has_tool(calls::TOOL_PARSE_PRP) {
            session.close();
            anyhow::bail!(
                "task server does not expose {} (tools: {})",
                calls::TOOL_PARSE_PRP,
                tools.join(", ")
            );
        }

        let session = Arc::new(Mutex::new(session));
        let context = request.project_goals.as_deref();
        let outcome = with_retry(self.config.retry_policy(), || {
            let session = session.clone();
            async move {
                let mut guard = session.lock().await;
                calls::parse_prp(&mut guard, prp, project_name, context).await
            }
        })
        .await;
        session.lock().await.close();

        let response = outcome?;
        let text = calls::result_text(&response).unwrap_or_default();
        let stats = parse_project_stats(&text);
        report.apply_parse_stats(&stats);
        info!(
            "research: server extracted {} tasks, {} documentation sections",
            stats.tasks_extracted, stats.documentation_extracted
        );
        Ok(())
    }

    /// Snapshot a project's tasks and documentation. Documentation listing is
    /// optional server-side, so it is consulted only when discovery announced
    /// it, and a late `ToolNotFound` degrades to the placeholder.
    pub async fn project_status(&self, project_name: &str) -> anyhow::Result<ProjectStatus> {
        let mut session = McpClient::new(self.config.mcp_client_config())?;
        let status = self.fetch_status(&mut session, project_name).await;
        session.close();
        status
    }

    async fn fetch_status(
        &self,
        session: &mut McpClient,
        project_name: &str,
    ) -> anyhow::Result<ProjectStatus> {
        session.discover_tools().await?;

        let filter = TaskFilter::for_project(project_name);
        let tasks = calls::list_tasks(session, &filter).await?;
        let tasks = calls::result_text(&tasks).unwrap_or_default();

        let documentation = if session.has_tool(calls::TOOL_LIST_DOCUMENTATION) {
            match calls::list_documentation(session, project_name).await {
                Ok(result) => calls::result_text(&result).unwrap_or_default(),
                // Discovery can go stale; the server has the final word.
                Err(McpError::ToolNotFound(_)) => DOCS_UNAVAILABLE.to_string(),
                Err(e) => return Err(e.into()),
            }
        } else {
            debug!("status: server does not list documentation");
            DOCS_UNAVAILABLE.to_string()
        };

        Ok(ProjectStatus {
            project_name: project_name.to_string(),
            tasks,
            documentation,
        })
    }
}

fn build_queries(request: &ResearchRequest) -> Vec<String> {
    let topic = request.topic.trim();
    let mut queries = vec![
        topic.to_string(),
        format!("{topic} best practices"),
        format!("{topic} implementation guide"),
    ];
    for area in request.focus_areas.iter().take(2) {
        queries.push(format!("{topic} {area}"));
    }
    queries
}

/// Counters from the server's textual parse summary; lines it omits stay
/// zero.
fn parse_project_stats(text: &str) -> PrpParseStats {
    PrpParseStats {
        tasks_extracted: capture_u64(text, r"Total Tasks Extracted:\s*(\d+)"),
        documentation_extracted: capture_u64(text, r"Documentation Sections:\s*(\d+)"),
        total_estimated_hours: capture_f64(text, r"Estimated Total Hours:\s*([\d.]+)"),
    }
}

fn capture_u64(text: &str, pattern: &str) -> u64 {
    capture_str(text, pattern)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

fn capture_f64(text: &str, pattern: &str) -> f64 {
    capture_str(text, pattern)
        .and_then(|s| s.parse().ok())
        .unwrap_or(0.0)
}

fn capture_str(text: &str, pattern: &str) -> Option<String> {
    Regex::new(pattern)
        .ok()?
        .captures(text)?
        .get(1)
        .map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{json_response, spawn_server, status_response};
    use http_body_util::BodyExt;
    use hyper::body::Incoming;
    use hyper::Request;
    use std::convert::Infallible;
    use std::net::SocketAddr;
    use std::sync::atomic::{AtomicUsize, Ordering};

    // --- unit ---

    #[test]
    fn parse_project_stats_reads_the_summary_lines() {
        let text = "PRP parsed successfully!\n\
                    Total Tasks Extracted: 12\n\
                    Documentation Sections: 4\n\
                    Estimated Total Hours: 36.5";
        let stats = parse_project_stats(text);
        assert_eq!(stats.tasks_extracted, 12);
        assert_eq!(stats.documentation_extracted, 4);
        assert_eq!(stats.total_estimated_hours, 36.5);

        let partial = parse_project_stats("Total Tasks Extracted: 3");
        assert_eq!(partial.tasks_extracted, 3);
        assert_eq!(partial.documentation_extracted, 0);
        assert_eq!(partial.total_estimated_hours, 0.0);

        assert_eq!(parse_project_stats(""), PrpParseStats::default());
    }

    #[test]
    fn queries_cover_the_topic_and_two_focus_areas() {
        let mut request = ResearchRequest::new(" rust task runner ");
        request.focus_areas = vec!["scheduling".into(), "storage".into(), "auth".into()];

        let queries = build_queries(&request);
        assert_eq!(
            queries,
            vec![
                "rust task runner",
                "rust task runner best practices",
                "rust task runner implementation guide",
                "rust task runner scheduling",
                "rust task runner storage",
            ]
        );
    }

    // --- end to end against in-process servers ---

    const SEARCH_BODY: &str = r#"{
        "web": {
            "results": [
                {"title": "Guide", "url": "https://one.example", "description": "First"},
                {"title": "Docs", "url": "https://two.example", "description": "Second"}
            ]
        }
    }"#;

    const PRP_BODY: &str = r##"{"content":[{"type":"text","text":"# PRP\n\nBuild it."}]}"##;

    const PARSE_BODY: &str = r#"{"result":{"content":[{"type":"text","text":"PRP parsed!\nTotal Tasks Extracted: 12\nDocumentation Sections: 4\nEstimated Total Hours: 36.5"}]}}"#;

    async fn spawn_search_ok() -> SocketAddr {
        spawn_server(|_req| async { Ok::<_, Infallible>(json_response(SEARCH_BODY)) }).await
    }

    async fn spawn_anthropic_ok() -> SocketAddr {
        spawn_server(|_req| async { Ok::<_, Infallible>(json_response(PRP_BODY)) }).await
    }

    fn test_config(
        search: SocketAddr,
        anthropic: SocketAddr,
        mcp: SocketAddr,
    ) -> GroundworkConfig {
        GroundworkConfig {
            brave_api_key: "brave-test".into(),
            anthropic_api_key: "sk-test".into(),
            search_base_url: format!("http://{search}"),
            anthropic_base_url: format!("http://{anthropic}"),
            mcp_server_url: format!("http://{mcp}"),
            max_retries: 1,
            retry_base_delay_ms: 1,
            ..GroundworkConfig::default()
        }
    }

    #[tokio::test]
    async fn run_reports_counters_from_the_parse_summary() {
        let search = spawn_search_ok().await;
        let anthropic = spawn_anthropic_ok().await;
        let mcp = spawn_server(|req: Request<Incoming>| async move {
            if req.uri().path().ends_with("/tools/list") {
                Ok::<_, Infallible>(json_response(
                    r#"{"result":{"tools":[{"name":"parsePRP"},{"name":"createTask"},{"name":"listTasks"}]}}"#,
                ))
            } else {
                Ok::<_, Infallible>(json_response(PARSE_BODY))
            }
        })
        .await;

        let workflow = ResearchWorkflow::new(test_config(search, anthropic, mcp)).unwrap();
        let report = workflow
            .run(&ResearchRequest::new("rust task runner"))
            .await
            .unwrap();

        assert!(report.success, "report: {report:?}");
        assert!(report.error_message.is_none());
        // Three query variants all yield the same two URLs.
        assert_eq!(report.search_results_count, 2);
        assert!(report.prp_generated);
        assert!(report.prp_parsed);
        assert_eq!(report.tasks_created, 12);
        assert_eq!(report.documentation_created, 4);
        assert_eq!(report.estimated_hours, Some(36.5));
        assert_eq!(report.project_name.as_deref(), Some("rust-task-runner"));
        assert!(!report.next_steps.is_empty());
        assert!(!report.session_id.is_empty());
    }

    #[tokio::test]
    async fn run_degrades_when_one_query_fails() {
        let hits = Arc::new(AtomicUsize::new(0));
        let hits_srv = hits.clone();
        let search = spawn_server(move |_req| {
            let hits = hits_srv.clone();
            async move {
                if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                    Ok::<_, Infallible>(status_response(500))
                } else {
                    Ok::<_, Infallible>(json_response(SEARCH_BODY))
                }
            }
        })
        .await;
        let anthropic = spawn_anthropic_ok().await;
        let mcp = spawn_server(|req: Request<Incoming>| async move {
            if req.uri().path().ends_with("/tools/list") {
                Ok::<_, Infallible>(json_response(
                    r#"{"result":{"tools":[{"name":"parsePRP"}]}}"#,
                ))
            } else {
                Ok::<_, Infallible>(json_response(PARSE_BODY))
            }
        })
        .await;

        let workflow = ResearchWorkflow::new(test_config(search, anthropic, mcp)).unwrap();
        let report = workflow
            .run(&ResearchRequest::new("rust task runner"))
            .await
            .unwrap();

        assert!(report.success);
        assert_eq!(report.search_results_count, 2);
    }

    #[tokio::test]
    async fn run_keeps_the_error_when_every_query_fails() {
        let search =
            spawn_server(|_req| async { Ok::<_, Infallible>(status_response(500)) }).await;
        let anthropic = spawn_anthropic_ok().await;

        let workflow = ResearchWorkflow::new(test_config(search, anthropic, search)).unwrap();
        let report = workflow
            .run(&ResearchRequest::new("rust task runner"))
            .await
            .unwrap();

        assert!(!report.success);
        assert_eq!(report.search_results_count, 0);
        assert!(!report.prp_generated);
        let message = report.error_message.unwrap();
        assert!(message.contains("search failed"), "got: {message}");
    }

    #[tokio::test]
    async fn run_fails_the_hand_off_when_the_parse_tool_is_missing() {
        let search = spawn_search_ok().await;
        let anthropic = spawn_anthropic_ok().await;
        let mcp = spawn_server(|_req| async {
            Ok::<_, Infallible>(json_response(
                r#"{"result":{"tools":[{"name":"createTask"}]}}"#,
            ))
        })
        .await;

        let workflow = ResearchWorkflow::new(test_config(search, anthropic, mcp)).unwrap();
        let report = workflow
            .run(&ResearchRequest::new("rust task runner"))
            .await
            .unwrap();

        assert!(!report.success);
        assert!(report.prp_generated);
        assert_eq!(report.search_results_count, 2);
        let message = report.error_message.unwrap();
        assert!(message.contains("parsePRP"), "got: {message}");
    }

    #[tokio::test]
    async fn run_fails_fast_on_missing_credentials() {
        let config = GroundworkConfig {
            brave_api_key: String::new(),
            anthropic_api_key: "sk-test".into(),
            ..GroundworkConfig::default()
        };

        let workflow = ResearchWorkflow::new(config).unwrap();
        let err = workflow
            .run(&ResearchRequest::new("rust task runner"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("BRAVE_API_KEY"));
    }

    // --- project status ---

    #[tokio::test]
    async fn status_skips_documentation_the_server_never_listed() {
        let calls_made = Arc::new(AtomicUsize::new(0));
        let calls_srv = calls_made.clone();
        let mcp = spawn_server(move |req: Request<Incoming>| {
            let calls_made = calls_srv.clone();
            async move {
                if req.uri().path().ends_with("/tools/list") {
                    Ok::<_, Infallible>(json_response(
                        r#"{"result":{"tools":[{"name":"listTasks"}]}}"#,
                    ))
                } else {
                    calls_made.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, Infallible>(json_response(
                        r#"{"result":{"content":[{"type":"text","text":"1 open task"}]}}"#,
                    ))
                }
            }
        })
        .await;

        let workflow = ResearchWorkflow::new(test_config(mcp, mcp, mcp)).unwrap();
        let status = workflow.project_status("demo-project").await.unwrap();

        assert_eq!(status.project_name, "demo-project");
        assert_eq!(status.tasks, "1 open task");
        assert_eq!(status.documentation, DOCS_UNAVAILABLE);
        // Only listTasks went over the wire.
        assert_eq!(calls_made.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn status_degrades_when_the_listed_tool_turns_out_missing() {
        let mcp = spawn_server(|req: Request<Incoming>| async move {
            if req.uri().path().ends_with("/tools/list") {
                return Ok::<_, Infallible>(json_response(
                    r#"{"result":{"tools":[{"name":"listTasks"},{"name":"listDocumentation"}]}}"#,
                ));
            }
            let body = req.collect().await.unwrap().to_bytes();
            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            if body["params"]["name"] == "listDocumentation" {
                Ok::<_, Infallible>(status_response(404))
            } else {
                Ok::<_, Infallible>(json_response(
                    r#"{"result":{"content":[{"type":"text","text":"2 open tasks"}]}}"#,
                ))
            }
        })
        .await;

        let workflow = ResearchWorkflow::new(test_config(mcp, mcp, mcp)).unwrap();
        let status = workflow.project_status("demo-project").await.unwrap();

        assert_eq!(status.tasks, "2 open tasks");
        assert_eq!(status.documentation, DOCS_UNAVAILABLE);
    }

    #[tokio::test]
    async fn status_lists_documentation_when_supported() {
        let mcp = spawn_server(|req: Request<Incoming>| async move {
            if req.uri().path().ends_with("/tools/list") {
                return Ok::<_, Infallible>(json_response(
                    r#"{"result":{"tools":[{"name":"listTasks"},{"name":"listDocumentation"}]}}"#,
                ));
            }
            let body = req.collect().await.unwrap().to_bytes();
            let body: serde_json::Value = serde_json::from_slice(&body).unwrap();
            let text = if body["params"]["name"] == "listDocumentation" {
                "3 documents"
            } else {
                "2 open tasks"
            };
            Ok::<_, Infallible>(json_response(format!(
                r#"{{"result":{{"content":[{{"type":"text","text":"{text}"}}]}}}}"#
            )))
        })
        .await;

        let workflow = ResearchWorkflow::new(test_config(mcp, mcp, mcp)).unwrap();
        let status = workflow.project_status("demo-project").await.unwrap();

        assert_eq!(status.tasks, "2 open tasks");
        assert_eq!(status.documentation, "3 documents");
    }
}
