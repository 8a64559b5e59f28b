//! Clarification planner
//!
//! One generation call that turns a raw scenario into up to two targeted
//! follow-up questions. Strictly fail-open: a failed call or unparseable
//! answer yields zero questions and the intake proceeds straight to analysis.

use std::sync::Arc;

use serde::Deserialize;

use crate::provider::GenerationProvider;
use crate::service::prompt;

const MAX_QUESTIONS: usize = 2;

#[derive(Debug, Deserialize)]
struct DrillPayload {
    #[serde(default)]
    questions: Vec<String>,
}

pub struct ClarificationPlanner {
    generator: Arc<dyn GenerationProvider>,
}

impl ClarificationPlanner {
    pub fn new(generator: Arc<dyn GenerationProvider>) -> Self {
        Self { generator }
    }

    /// Produce 0 to 2 scenario-specific questions. Single attempt, no retry,
    /// no side effects.
    pub async fn plan(&self, scenario: &str) -> Vec<String> {
        let drill_prompt = prompt::drilling_prompt(scenario);

        let raw = match self.generator.complete("", &drill_prompt).await {
            Ok(text) => text,
            Err(e) => {
                tracing::debug!(error = %e, "Drill call failed, proceeding without clarifications");
                return Vec::new();
            }
        };

        let mut questions = parse_questions(&raw);
        questions.truncate(MAX_QUESTIONS);
        questions
    }
}

fn parse_questions(raw: &str) -> Vec<String> {
    let cleaned = strip_code_fences(raw);
    match serde_json::from_str::<DrillPayload>(cleaned) {
        Ok(payload) => payload.questions,
        Err(e) => {
            tracing::debug!(error = %e, "Drill response was not valid JSON, skipping clarifications");
            Vec::new()
        }
    }
}

/// Models sometimes wrap the JSON in a Markdown code fence despite the
/// prompt; strip it before parsing.
fn strip_code_fences(raw: &str) -> &str {
    let mut text = raw.trim();
    if let Some(rest) = text.strip_prefix("```") {
        text = rest
            .strip_prefix("json")
            .or_else(|| rest.strip_prefix("JSON"))
            .unwrap_or(rest);
        text = text.trim_start();
        text = text.strip_suffix("```").unwrap_or(text).trim_end();
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::testing::StubGenerator;

    fn planner_with(response: &str) -> ClarificationPlanner {
        ClarificationPlanner::new(Arc::new(StubGenerator::completing(response)))
    }

    #[tokio::test]
    async fn parses_plain_json_response() {
        let planner = planner_with(
            r#"{"questions": ["Is the company public or private?", "Any existing SAFEs?"]}"#,
        );
        let questions = planner.plan("raising a seed round").await;
        assert_eq!(
            questions,
            vec![
                "Is the company public or private?",
                "Any existing SAFEs?"
            ]
        );
    }

    #[tokio::test]
    async fn strips_markdown_code_fences() {
        let planner =
            planner_with("```json\n{\"questions\": [\"What share classes exist today?\"]}\n```");
        let questions = planner.plan("cap table restructure").await;
        assert_eq!(questions, vec!["What share classes exist today?"]);
    }

    #[tokio::test]
    async fn unparseable_response_fails_open_to_empty() {
        let planner = planner_with("I'd be happy to help! Here are my questions:");
        assert!(planner.plan("some matter").await.is_empty());
    }

    #[tokio::test]
    async fn upstream_failure_fails_open_to_empty() {
        let planner = ClarificationPlanner::new(Arc::new(StubGenerator::failing("boom")));
        assert!(planner.plan("some matter").await.is_empty());
    }

    #[tokio::test]
    async fn caps_questions_at_two() {
        let planner = planner_with(r#"{"questions": ["a?", "b?", "c?", "d?"]}"#);
        assert_eq!(planner.plan("matter").await.len(), 2);
    }

    #[tokio::test]
    async fn missing_questions_key_yields_empty() {
        let planner = planner_with(r#"{"replies": ["a?"]}"#);
        assert!(planner.plan("matter").await.is_empty());
    }

    #[test]
    fn fence_stripping_handles_variants() {
        assert_eq!(strip_code_fences("{\"a\":1}"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fences("  ```JSON\n{\"a\":1}\n```  "), "{\"a\":1}");
    }
}
