/// Why a tool could not produce an observation.
///
/// The executor hands the `Display` text back to the model as the
/// observation, so messages are written for the model to read.
#[derive(Debug)]
pub enum ToolExecutionError {
    /// The `Action Input` was empty or unusable.
    InvalidInput(String),
    /// The tool ran but its backend failed (network, HTTP status, ...).
    ExecutionFailed(String),
}

impl std::fmt::Display for ToolExecutionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolExecutionError::InvalidInput(s) => write!(f, "Invalid tool input: {s}"),
            ToolExecutionError::ExecutionFailed(s) => write!(f, "Tool execution failed: {s}"),
        }
    }
}

impl std::error::Error for ToolExecutionError {}

impl From<reqwest::Error> for ToolExecutionError {
    fn from(err: reqwest::Error) -> Self {
        let reason = if err.is_timeout() {
            "request timed out".to_string()
        } else if err.is_connect() {
            "could not connect".to_string()
        } else {
            err.to_string()
        };
        ToolExecutionError::ExecutionFailed(reason)
    }
}
