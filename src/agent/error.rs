use crate::{
    services::llm::ModelClientError, templates::TemplateError, OutputParserError,
    ToolExecutionError,
};

/// Errors that can occur while building or running a ReAct agent.
#[derive(Debug)]
pub enum AgentError {
    /// Failure inside the underlying LLM client.
    ModelClient(ModelClientError),
    /// The model reply did not follow the expected format.
    OutputParser(OutputParserError),
    /// The agent prompt is unusable (e.g. a required variable is absent).
    Prompt(String),
    /// Rendering a prompt template failed.
    Template(TemplateError),
    /// A tool could not be constructed or executed.
    Tool(ToolExecutionError),
    /// A required input key was not supplied to the executor.
    MissingInput(String),
}

impl std::fmt::Display for AgentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentError::ModelClient(e) => write!(f, "Model client error: {e}"),
            AgentError::OutputParser(e) => write!(f, "{e}"),
            AgentError::Prompt(s) => write!(f, "Prompt error: {s}"),
            AgentError::Template(e) => write!(f, "Template error: {e}"),
            AgentError::Tool(e) => write!(f, "Tool error: {e}"),
            AgentError::MissingInput(key) => write!(f, "Missing required input key: {key}"),
        }
    }
}

impl std::error::Error for AgentError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AgentError::ModelClient(e) => Some(e),
            AgentError::OutputParser(e) => Some(e),
            AgentError::Template(e) => Some(e),
            AgentError::Tool(e) => Some(e),
            AgentError::Prompt(_) | AgentError::MissingInput(_) => None,
        }
    }
}

impl From<ModelClientError> for AgentError {
    fn from(err: ModelClientError) -> Self {
        AgentError::ModelClient(err)
    }
}

impl From<OutputParserError> for AgentError {
    fn from(err: OutputParserError) -> Self {
        AgentError::OutputParser(err)
    }
}

impl From<TemplateError> for AgentError {
    fn from(err: TemplateError) -> Self {
        AgentError::Template(err)
    }
}

impl From<ToolExecutionError> for AgentError {
    fn from(err: ToolExecutionError) -> Self {
        AgentError::Tool(err)
    }
}
