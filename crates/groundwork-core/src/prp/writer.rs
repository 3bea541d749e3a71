//! Turns a research request plus search findings into a Product Requirements
//! Prompt (PRP) by asking a completion provider to write it.

use std::sync::Arc;

use crate::models::research::{ResearchRequest, SearchResult};
use crate::providers::{CompletionError, CompletionProvider, CompletionRequest};

/// Findings beyond this never reach the prompt.
const MAX_PROMPT_FINDINGS: usize = 10;

const MAX_PROJECT_NAME_LEN: usize = 50;

pub struct PrpWriter {
    provider: Arc<dyn CompletionProvider>,
}

impl PrpWriter {
    pub fn new(provider: Arc<dyn CompletionProvider>) -> Self {
        Self { provider }
    }

    /// Ask the provider for a markdown PRP covering the request, grounded in
    /// the findings.
    pub async fn write_prp(
        &self,
        request: &ResearchRequest,
        findings: &[SearchResult],
    ) -> Result<String, CompletionError> {
        let prompt = build_prompt(request, findings);
        self.provider.complete(&CompletionRequest::new(prompt)).await
    }
}

/// Plain-text instruction prompt. Kept deliberately simple; the provider does
/// the writing.
fn build_prompt(request: &ResearchRequest, findings: &[SearchResult]) -> String {
    let mut sections = vec![format!(
        "Write a Product Requirements Prompt (PRP) in markdown for the following project.\n\nTopic: {}",
        request.topic
    )];

    if let Some(goals) = &request.project_goals {
        sections.push(format!("Goals: {goals}"));
    }
    if let Some(users) = &request.target_users {
        sections.push(format!("Target users: {users}"));
    }
    if let Some(constraints) = &request.constraints {
        sections.push(format!("Constraints: {constraints}"));
    }
    if let Some(timeline) = &request.timeline {
        sections.push(format!("Timeline: {timeline}"));
    }
    if !request.focus_areas.is_empty() {
        sections.push(format!("Focus areas: {}", request.focus_areas.join(", ")));
    }

    if !findings.is_empty() {
        let digest: Vec<String> = findings
            .iter()
            .take(MAX_PROMPT_FINDINGS)
            .map(|f| format!("- {} ({}): {}", f.title, f.url, f.description))
            .collect();
        sections.push(format!("Research findings:\n{}", digest.join("\n")));
    }

    sections.push(
        "Structure the PRP with sections for overview, goals, requirements, \
         implementation tasks (with estimated hours), and documentation needs."
            .to_string(),
    );

    sections.join("\n\n")
}

/// Derive a project name the task server will accept from a free-form topic:
/// lowercase, alphanumeric runs joined by single dashes, length-capped.
pub fn project_name_from_topic(topic: &str) -> String {
    let mut name = String::with_capacity(topic.len());
    let mut pending_dash = false;
    for ch in topic.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !name.is_empty() {
                name.push('-');
            }
            name.push(ch.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    // Only ASCII made it in, so byte indexing is safe here.
    if name.len() > MAX_PROJECT_NAME_LEN {
        name.truncate(MAX_PROJECT_NAME_LEN);
        while name.ends_with('-') {
            name.pop();
        }
    }

    if name.is_empty() {
        "research-project".into()
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[test]
    fn project_names_are_slugged_and_capped() {
        assert_eq!(
            project_name_from_topic("Rust CLI Task Manager!"),
            "rust-cli-task-manager"
        );
        assert_eq!(project_name_from_topic("  spaced   out  "), "spaced-out");
        assert_eq!(project_name_from_topic("///"), "research-project");
        assert_eq!(project_name_from_topic(""), "research-project");

        let long = project_name_from_topic(
            "a very long topic title that keeps going well past the cap on name length",
        );
        assert!(long.len() <= 50);
        assert!(!long.ends_with('-'));
    }

    #[test]
    fn prompt_carries_request_fields_and_findings() {
        let mut request = ResearchRequest::new("rust task runner");
        request.project_goals = Some("ship v1".into());
        request.focus_areas = vec!["scheduling".into(), "persistence".into()];

        let findings = vec![
            SearchResult::new("Guide", "https://one.example", "First hit"),
            SearchResult::new("Docs", "https://two.example", "Second hit"),
        ];

        let prompt = build_prompt(&request, &findings);
        assert!(prompt.contains("Topic: rust task runner"));
        assert!(prompt.contains("Goals: ship v1"));
        assert!(prompt.contains("Focus areas: scheduling, persistence"));
        assert!(prompt.contains("https://one.example"));
        assert!(prompt.contains("https://two.example"));
        assert!(!prompt.contains("Target users"));
    }

    #[test]
    fn prompt_digests_at_most_ten_findings() {
        let findings: Vec<SearchResult> = (0..12)
            .map(|i| {
                SearchResult::new(
                    format!("hit {i}"),
                    format!("https://example.test/{i}"),
                    "desc",
                )
            })
            .collect();

        let prompt = build_prompt(&ResearchRequest::new("topic"), &findings);
        assert!(prompt.contains("https://example.test/9"));
        assert!(!prompt.contains("https://example.test/10"));
    }

    #[derive(Default)]
    struct StubProvider {
        seen: Mutex<Option<CompletionRequest>>,
    }

    #[async_trait]
    impl CompletionProvider for StubProvider {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<String, CompletionError> {
            *self.seen.lock().unwrap() = Some(request.clone());
            Ok("# PRP".into())
        }
    }

    #[tokio::test]
    async fn writer_hands_the_prompt_to_the_provider() {
        let stub = Arc::new(StubProvider::default());
        let writer = PrpWriter::new(stub.clone());

        let prp = writer
            .write_prp(&ResearchRequest::new("rust task runner"), &[])
            .await
            .unwrap();
        assert_eq!(prp, "# PRP");

        let seen = stub.seen.lock().unwrap().take().unwrap();
        assert!(seen.prompt.contains("rust task runner"));
        assert_eq!(seen.max_tokens, 4000);
    }
}
