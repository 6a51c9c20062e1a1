use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

//
// ---------- Error Types ----------
//
#[derive(Debug, Error)]
pub enum AgentError {
    #[error("WebDriver connection failed: {0}")]
    Connection(String),

    #[error("browser session failure: {0}")]
    Session(String),

    #[error("navigation to {0} did not finish within 60s")]
    NavigationTimeout(String),

    #[error("generated value violates the expected schema: {0}")]
    SchemaViolation(String),

    #[error("malformed instruction: {0}")]
    MalformedInstruction(String),

    #[error("inference request failed: {0}")]
    Inference(String),

    #[error("failed to enumerate page elements: {0}")]
    Dom(String),
}

//
// ---------- Step Contract ----------
//
/// The closed vocabulary of actions a step may carry.
///
/// Serialized as the uppercase literals the step schema exposes to the
/// model, e.g. `"GOTO"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tool {
    /// Navigate to the URL in the instruction.
    Goto,
    /// Perform one atomic UI action described by the instruction.
    Act,
    /// Pull data matching the instruction out of the current page.
    Extract,
    /// Enumerate visible elements matching the instruction.
    Observe,
    /// Pause for the instruction's millisecond count.
    Wait,
    /// Go back to the previous page; the instruction is ignored.
    Navback,
    /// Terminal: the goal is achieved or abandoned. The schema does not
    /// distinguish the two outcomes; both collapse into this tool.
    Close,
}

impl fmt::Display for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tool::Goto => "GOTO",
            Tool::Act => "ACT",
            Tool::Extract => "EXTRACT",
            Tool::Observe => "OBSERVE",
            Tool::Wait => "WAIT",
            Tool::Navback => "NAVBACK",
            Tool::Close => "CLOSE",
        };
        f.write_str(name)
    }
}

/// One decided action: a human-readable summary, the model's rationale,
/// and the tool/instruction pair the executor dispatches on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Step {
    /// Human-readable summary of the action taken.
    pub text: String,
    /// Free-text justification. Kept for observability, never parsed.
    pub reasoning: String,
    pub tool: Tool,
    /// Tool-specific payload; semantics depend on `tool`.
    pub instruction: String,
}

impl Step {
    /// Enforces the contract the schema alone cannot express: every tool
    /// except the terminal one requires a non-empty instruction.
    pub fn validate(&self) -> Result<(), AgentError> {
        if self.tool != Tool::Close && self.instruction.trim().is_empty() {
            return Err(AgentError::SchemaViolation(format!(
                "{} step carries an empty instruction",
                self.tool
            )));
        }
        Ok(())
    }
}

/// Entry point chosen before the loop starts.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
pub struct StartingPoint {
    pub url: String,
    pub reasoning: String,
}

//
// ---------- Perception Types ----------
//
/// One currently visible interactive element, as enumerated by OBSERVE.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObservedElement {
    pub selector: String,
    pub tag: String,
    pub text: String,
    pub placeholder: String,
}

/// Payload of the immediately preceding EXTRACT or OBSERVE step, fed back
/// into the next decision. At most one of the two exists per iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum LastResult {
    Extraction(String),
    Observation(Vec<ObservedElement>),
}

impl LastResult {
    /// Label used verbatim in the decision prompt.
    pub fn kind(&self) -> &'static str {
        match self {
            LastResult::Extraction(_) => "extraction",
            LastResult::Observation(_) => "observation",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_serializes_to_uppercase_literals() {
        let pairs = [
            (Tool::Goto, "\"GOTO\""),
            (Tool::Act, "\"ACT\""),
            (Tool::Extract, "\"EXTRACT\""),
            (Tool::Observe, "\"OBSERVE\""),
            (Tool::Wait, "\"WAIT\""),
            (Tool::Navback, "\"NAVBACK\""),
            (Tool::Close, "\"CLOSE\""),
        ];
        for (tool, literal) in pairs {
            assert_eq!(serde_json::to_string(&tool).unwrap(), literal);
            assert_eq!(serde_json::from_str::<Tool>(literal).unwrap(), tool);
        }
    }

    #[test]
    fn tool_display_matches_wire_literal() {
        for tool in [
            Tool::Goto,
            Tool::Act,
            Tool::Extract,
            Tool::Observe,
            Tool::Wait,
            Tool::Navback,
            Tool::Close,
        ] {
            let wire = serde_json::to_string(&tool).unwrap();
            assert_eq!(format!("\"{tool}\""), wire);
        }
    }

    #[test]
    fn step_decodes_from_model_output() {
        let raw = r#"{
            "text": "Search for the report",
            "reasoning": "The search box is the fastest path",
            "tool": "ACT",
            "instruction": "click the search box"
        }"#;
        let step: Step = serde_json::from_str(raw).unwrap();
        assert_eq!(step.tool, Tool::Act);
        assert_eq!(step.instruction, "click the search box");
    }

    #[test]
    fn unknown_tool_literal_is_rejected() {
        let raw = r#"{"text": "x", "reasoning": "y", "tool": "SCREENSHOT", "instruction": "z"}"#;
        assert!(serde_json::from_str::<Step>(raw).is_err());
    }

    #[test]
    fn validate_rejects_empty_instruction_except_for_close() {
        let mut step = Step {
            text: "wait".into(),
            reasoning: "page is loading".into(),
            tool: Tool::Wait,
            instruction: "  ".into(),
        };
        assert!(step.validate().is_err());

        step.tool = Tool::Close;
        assert!(step.validate().is_ok());

        step.tool = Tool::Act;
        step.instruction = "click the login button".into();
        assert!(step.validate().is_ok());
    }

    #[test]
    fn last_result_kinds_are_labelled() {
        assert_eq!(LastResult::Extraction("data".into()).kind(), "extraction");
        assert_eq!(LastResult::Observation(Vec::new()).kind(), "observation");
    }
}
