use std::{fmt, future::Future, pin::Pin, sync::Arc};

use super::errors::ToolExecutionError;

/// Signature for an asynchronous tool executor function.
///
/// Accepts the raw `Action Input` text chosen by the model and produces the
/// observation string, or a [`ToolExecutionError`] if execution fails.
pub type AsyncToolFn = Arc<
    dyn Fn(String) -> Pin<Box<dyn Future<Output = Result<String, ToolExecutionError>> + Send>>
        + Send
        + Sync,
>;

/// A named action the agent may take.
#[derive(Clone)]
pub struct Tool {
    pub name: String,
    pub description: String,
    pub executor: AsyncToolFn,
}

impl fmt::Debug for Tool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tool")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("executor", &"<async_fn>")
            .finish()
    }
}

impl Tool {
    /// Convenience method to execute the tool
    pub async fn execute<T>(&self, input: T) -> Result<String, ToolExecutionError>
    where
        T: Into<String>,
    {
        (self.executor)(input.into()).await
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// One `name: description` line per tool, in the given order.
pub fn render_text_description(tools: &[Tool]) -> String {
    tools
        .iter()
        .map(|t| format!("{}: {}", t.name, t.description))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Tool names joined with `", "`, in the given order.
pub fn tool_names(tools: &[Tool]) -> String {
    tools
        .iter()
        .map(|t| t.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
