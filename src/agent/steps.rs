use std::fmt;

/// A tool invocation chosen by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentAction {
    pub tool: String,
    pub tool_input: String,
    /// Full model text that produced this action.
    pub log: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentFinish {
    pub output: String,
    pub log: String,
}

/// What the model decided on one turn of the loop.
#[derive(Debug, Clone, PartialEq)]
pub enum AgentDecision {
    Action(AgentAction),
    Finish(AgentFinish),
}

/// An action together with the observation it produced.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentStep {
    pub action: AgentAction,
    pub observation: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgentOutput {
    pub output: String,
    /// Present only when the executor was asked to return them.
    pub intermediate_steps: Option<Vec<AgentStep>>,
}

impl fmt::Display for AgentAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tool='{}' tool_input='{}' log='{}'",
            self.tool, self.tool_input, self.log
        )
    }
}
