//! Typed wrappers over [`McpClient::call_tool`] for the project-management
//! tools the research workflow drives.

use serde::Serialize;
use serde_json::{json, Map, Value};

use super::client::McpClient;
use super::error::McpError;
use crate::models::project::{NewDocumentation, NewTask, TaskFilter};

pub const TOOL_PARSE_PRP: &str = "parsePRP";
pub const TOOL_CREATE_TASK: &str = "createTask";
pub const TOOL_CREATE_DOCUMENTATION: &str = "createDocumentation";
pub const TOOL_LIST_TASKS: &str = "listTasks";
pub const TOOL_LIST_DOCUMENTATION: &str = "listDocumentation";

/// Pull the human-readable text out of a tool result.
///
/// Tool results carry a `content` array of typed blocks; this joins the
/// `text` blocks with newlines and ignores every other block type. Returns
/// `None` when there is no text to show.
pub fn result_text(result: &Map<String, Value>) -> Option<String> {
    let blocks = result.get("content")?.as_array()?;
    let texts: Vec<&str> = blocks
        .iter()
        .filter(|b| b["type"] == "text")
        .filter_map(|b| b["text"].as_str())
        .collect();
    if texts.is_empty() {
        None
    } else {
        Some(texts.join("\n"))
    }
}

/// Feed a PRP document to the server for task extraction.
pub async fn parse_prp(
    client: &mut McpClient,
    prp_content: &str,
    project_name: &str,
    project_context: Option<&str>,
) -> Result<Map<String, Value>, McpError> {
    let mut arguments = Map::new();
    arguments.insert("prpContent".into(), json!(prp_content));
    arguments.insert("projectName".into(), json!(project_name));
    if let Some(context) = project_context {
        arguments.insert("projectContext".into(), json!(context));
    }
    client.call_tool(TOOL_PARSE_PRP, arguments).await
}

pub async fn create_task(
    client: &mut McpClient,
    task: &NewTask,
) -> Result<Map<String, Value>, McpError> {
    client.call_tool(TOOL_CREATE_TASK, to_arguments(task)?).await
}

pub async fn create_documentation(
    client: &mut McpClient,
    doc: &NewDocumentation,
) -> Result<Map<String, Value>, McpError> {
    client
        .call_tool(TOOL_CREATE_DOCUMENTATION, to_arguments(doc)?)
        .await
}

pub async fn list_tasks(
    client: &mut McpClient,
    filter: &TaskFilter,
) -> Result<Map<String, Value>, McpError> {
    client.call_tool(TOOL_LIST_TASKS, to_arguments(filter)?).await
}

pub async fn list_documentation(
    client: &mut McpClient,
    project_name: &str,
) -> Result<Map<String, Value>, McpError> {
    let mut arguments = Map::new();
    arguments.insert("projectName".into(), json!(project_name));
    client.call_tool(TOOL_LIST_DOCUMENTATION, arguments).await
}

fn to_arguments<T: Serialize>(value: &T) -> Result<Map<String, Value>, McpError> {
    match serde_json::to_value(value) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(McpError::InvalidRequest(
            "tool arguments must serialize to a JSON object".into(),
        )),
        Err(e) => Err(McpError::InvalidRequest(format!(
            "tool arguments failed to serialize: {e}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::project::TaskPriority;
    use crate::testutil::{json_response, spawn_server};
    use http_body_util::BodyExt;
    use hyper::body::Incoming;
    use hyper::Request;
    use std::convert::Infallible;
    use std::sync::{Arc, Mutex};

    // --- result_text ---

    #[test]
    fn result_text_joins_text_blocks_and_skips_others() {
        let result: Map<String, Value> = serde_json::from_value(json!({
            "content": [
                {"type": "text", "text": "line one"},
                {"type": "image", "data": "..."},
                {"type": "text", "text": "line two"}
            ]
        }))
        .unwrap();

        assert_eq!(result_text(&result).unwrap(), "line one\nline two");
    }

    #[test]
    fn result_text_is_none_without_text() {
        let empty = Map::new();
        assert!(result_text(&empty).is_none());

        let no_text: Map<String, Value> = serde_json::from_value(json!({
            "content": [{"type": "image", "data": "..."}]
        }))
        .unwrap();
        assert!(result_text(&no_text).is_none());
    }

    // --- wire shape ---

    async fn capture_server() -> (std::net::SocketAddr, Arc<Mutex<Option<Value>>>) {
        let seen: Arc<Mutex<Option<Value>>> = Arc::new(Mutex::new(None));
        let seen_srv = seen.clone();
        let addr = spawn_server(move |req: Request<Incoming>| {
            let seen = seen_srv.clone();
            async move {
                let body = req.collect().await.unwrap().to_bytes();
                let body: Value = serde_json::from_slice(&body).unwrap();
                *seen.lock().unwrap() = Some(body);
                Ok::<_, Infallible>(json_response(
                    r#"{"result":{"content":[{"type":"text","text":"done"}]}}"#,
                ))
            }
        })
        .await;
        (addr, seen)
    }

    async fn open(addr: std::net::SocketAddr) -> McpClient {
        McpClient::new(crate::mcp::McpClientConfig::new(format!("http://{addr}"))).unwrap()
    }

    #[tokio::test]
    async fn create_task_serializes_to_server_field_names() {
        let (addr, seen) = capture_server().await;
        let mut client = open(addr).await;

        let task = NewTask::new("Set up CI", "Add a pipeline", "demo-project")
            .with_priority(TaskPriority::High)
            .with_estimated_hours(4.0);
        create_task(&mut client, &task).await.unwrap();

        let body = seen.lock().unwrap().take().unwrap();
        let args = &body["params"]["arguments"];
        assert_eq!(args["title"], "Set up CI");
        assert_eq!(args["projectName"], "demo-project");
        assert_eq!(args["priority"], "high");
        assert_eq!(args["estimatedHours"], 4.0);
        assert!(args.get("assignedTo").is_none());
        assert!(args.get("tags").is_none());
    }

    #[tokio::test]
    async fn parse_prp_sends_context_only_when_present() {
        let (addr, seen) = capture_server().await;
        let mut client = open(addr).await;

        parse_prp(&mut client, "# PRP", "demo-project", None)
            .await
            .unwrap();
        let body = seen.lock().unwrap().take().unwrap();
        let args = &body["params"]["arguments"];
        assert_eq!(args["prpContent"], "# PRP");
        assert_eq!(args["projectName"], "demo-project");
        assert!(args.get("projectContext").is_none());

        parse_prp(&mut client, "# PRP", "demo-project", Some("greenfield"))
            .await
            .unwrap();
        let body = seen.lock().unwrap().take().unwrap();
        assert_eq!(body["params"]["arguments"]["projectContext"], "greenfield");
    }

    #[tokio::test]
    async fn list_tasks_carries_the_default_page_size() {
        let (addr, seen) = capture_server().await;
        let mut client = open(addr).await;

        let filter = TaskFilter::for_project("demo-project");
        list_tasks(&mut client, &filter).await.unwrap();

        let body = seen.lock().unwrap().take().unwrap();
        let args = &body["params"]["arguments"];
        assert_eq!(args["limit"], 50);
        assert_eq!(args["projectName"], "demo-project");
        assert!(args.get("status").is_none());
    }
}
