use std::sync::OnceLock;

use regex::Regex;

use super::steps::{AgentAction, AgentDecision, AgentFinish};

pub const FINAL_ANSWER_ACTION: &str = "Final Answer:";
pub const MISSING_ACTION_AFTER_THOUGHT: &str = "Invalid Format: Missing 'Action:' after 'Thought:'";
pub const MISSING_ACTION_INPUT_AFTER_ACTION: &str =
    "Invalid Format: Missing 'Action Input:' after 'Action:'";
pub const FINAL_ANSWER_AND_PARSABLE_ACTION: &str =
    "Parsing LLM output produced both a final answer and a parse-able action:";

/// The model answered in a shape the parser does not understand.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputParserError {
    pub message: String,
    /// Hint to feed back to the model as the next observation.
    pub observation: Option<String>,
    /// Raw model text that failed to parse.
    pub llm_output: String,
    /// Whether `observation` is meant to be shown to the model.
    pub send_to_llm: bool,
}

impl std::fmt::Display for OutputParserError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for OutputParserError {}

fn action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:[\s]*(.*?)[\s]*Action\s*\d*\s*Input\s*\d*\s*:[\s]*(.*)")
            .unwrap_or_else(|e| panic!("action regex: {e}"))
    })
}

fn bare_action_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*:").unwrap_or_else(|e| panic!("action regex: {e}"))
    })
}

fn action_input_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*Input\s*\d*\s*:")
            .unwrap_or_else(|e| panic!("action input regex: {e}"))
    })
}

/// Parser for the single-input ReAct format:
///
/// ```text
/// Thought: agent thought here
/// Action: search
/// Action Input: what is the temperature in SF?
/// ```
///
/// or, when done:
///
/// ```text
/// Thought: agent thought here
/// Final Answer: The temperature is 100 degrees
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct ReActOutputParser;

impl ReActOutputParser {
    pub fn parse(&self, text: &str) -> Result<AgentDecision, OutputParserError> {
        let includes_answer = text.contains(FINAL_ANSWER_ACTION);

        if let Some(caps) = action_re().captures(text) {
            if includes_answer {
                return Err(OutputParserError {
                    message: format!("{FINAL_ANSWER_AND_PARSABLE_ACTION}: {text}"),
                    observation: None,
                    llm_output: text.to_string(),
                    send_to_llm: false,
                });
            }
            let tool = caps.get(1).map(|m| m.as_str()).unwrap_or_default().trim();
            let tool_input = caps
                .get(2)
                .map(|m| m.as_str())
                .unwrap_or_default()
                .trim_matches(' ')
                .trim_matches('"');
            return Ok(AgentDecision::Action(AgentAction {
                tool: tool.to_string(),
                tool_input: tool_input.to_string(),
                log: text.to_string(),
            }));
        }

        if includes_answer {
            let output = text
                .rsplit(FINAL_ANSWER_ACTION)
                .next()
                .unwrap_or_default()
                .trim();
            return Ok(AgentDecision::Finish(AgentFinish {
                output: output.to_string(),
                log: text.to_string(),
            }));
        }

        let message = format!("Could not parse LLM output: `{text}`");
        let observation = if !bare_action_re().is_match(text) {
            Some(MISSING_ACTION_AFTER_THOUGHT)
        } else if !action_input_re().is_match(text) {
            Some(MISSING_ACTION_INPUT_AFTER_ACTION)
        } else {
            None
        };

        Err(OutputParserError {
            message,
            send_to_llm: observation.is_some(),
            observation: observation.map(str::to_string),
            llm_output: text.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<AgentDecision, OutputParserError> {
        ReActOutputParser.parse(text)
    }

    #[test]
    fn parses_action_and_input() {
        let text = "Thought: I should check the weather.\nAction: Weather Checker\nAction Input: \"Tokyo\"";
        match parse(text).unwrap() {
            AgentDecision::Action(a) => {
                assert_eq!(a.tool, "Weather Checker");
                assert_eq!(a.tool_input, "Tokyo");
                assert_eq!(a.log, text);
            }
            other => panic!("expected action, got {other:?}"),
        }
    }

    #[test]
    fn numbered_action_labels_are_accepted() {
        let text = "Action 1: Web Search\nAction 1 Input: rust 2024 edition";
        let AgentDecision::Action(a) = parse(text).unwrap() else {
            panic!("expected action");
        };
        assert_eq!(a.tool, "Web Search");
        assert_eq!(a.tool_input, "rust 2024 edition");
    }

    #[test]
    fn final_answer_takes_text_after_last_marker() {
        let text = "Thought: I now know the final answer\nFinal Answer: It is sunny and 22°C in Tokyo.  ";
        let AgentDecision::Finish(f) = parse(text).unwrap() else {
            panic!("expected finish");
        };
        assert_eq!(f.output, "It is sunny and 22°C in Tokyo.");
        assert_eq!(f.log, text);
    }

    #[test]
    fn answer_and_action_together_is_an_error() {
        let text = "Action: Web Search\nAction Input: x\nFinal Answer: y";
        let err = parse(text).unwrap_err();
        assert!(err.message.starts_with(FINAL_ANSWER_AND_PARSABLE_ACTION));
        assert!(!err.send_to_llm);
        assert_eq!(err.llm_output, text);
    }

    #[test]
    fn missing_action_reports_hint() {
        let text = "I think the weather is nice.";
        let err = parse(text).unwrap_err();
        assert_eq!(err.message, "Could not parse LLM output: `I think the weather is nice.`");
        assert_eq!(err.observation.as_deref(), Some(MISSING_ACTION_AFTER_THOUGHT));
        assert!(err.send_to_llm);
        assert_eq!(err.llm_output, text);
    }

    #[test]
    fn missing_action_input_reports_hint() {
        let err = parse("Thought: search it\nAction: Web Search").unwrap_err();
        assert_eq!(err.observation.as_deref(), Some(MISSING_ACTION_INPUT_AFTER_ACTION));
        assert!(err.send_to_llm);
    }
}
