//! Intro analysis - flags what a candidate's introduction mentions

use super::{Tool, ToolError, ToolOutput};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Signals extracted from a self-introduction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntroSignals {
    pub project: bool,
    pub skill: bool,
    pub achievement: bool,
    pub internship: bool,
    pub work: bool,
}

/// Case-insensitive substring checks over the intro text.
pub fn analyze_intro(intro: &str) -> IntroSignals {
    let lower = intro.to_lowercase();
    IntroSignals {
        project: lower.contains("project"),
        skill: lower.contains("skill"),
        achievement: lower.contains("achieve"),
        internship: lower.contains("intern"),
        work: lower.contains("experience") || lower.contains("job"),
    }
}

pub struct AnalyzeIntroTool;

#[derive(Debug, Deserialize)]
struct AnalyzeIntroInput {
    intro: String,
}

impl AnalyzeIntroTool {
    fn parse_input(input: Value) -> Result<AnalyzeIntroInput, ToolError> {
        serde_json::from_value(input).map_err(|e| ToolError::Validation(e.to_string()))
    }
}

#[async_trait]
impl Tool for AnalyzeIntroTool {
    fn name(&self) -> &'static str {
        "analyze_intro"
    }

    fn description(&self) -> String {
        "Analyze intro for keywords".to_string()
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "required": ["intro"],
            "properties": {
                "intro": {
                    "type": "string",
                    "description": "The candidate's self-introduction"
                }
            }
        })
    }

    async fn run(&self, input: Value) -> ToolOutput {
        let input = match Self::parse_input(input) {
            Ok(input) => input,
            Err(e) => return e.into(),
        };

        match serde_json::to_string(&analyze_intro(&input.intro)) {
            Ok(body) => ToolOutput::success(body),
            Err(e) => ToolOutput::error(format!("Failed to encode result: {e}")),
        }
    }
}
