use std::{future::Future, pin::Pin, sync::Arc};

use super::{
    errors::ToolExecutionError,
    tool::{AsyncToolFn, Tool},
};

type ToolFuture = Pin<Box<dyn Future<Output = Result<String, ToolExecutionError>> + Send>>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolBuilderError {
    MissingName,
    MissingDescription,
    MissingExecutor,
    /// Resources the executor needs (an HTTP client, say) could not be created.
    Setup(String),
}

impl std::fmt::Display for ToolBuilderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ToolBuilderError::MissingName => write!(f, "Tool name is required."),
            ToolBuilderError::MissingDescription => write!(f, "Tool description is required."),
            ToolBuilderError::MissingExecutor => write!(f, "Executor function is required for the tool."),
            ToolBuilderError::Setup(s) => write!(f, "Tool setup failed: {s}"),
        }
    }
}

impl std::error::Error for ToolBuilderError {}

#[derive(Default)]
pub struct ToolBuilder {
    name: Option<String>,
    description: Option<String>,
    executor: Option<AsyncToolFn>,
}

impl std::fmt::Debug for ToolBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBuilder")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("executor", &self.executor.as_ref().map(|_| "<async_fn>"))
            .finish()
    }
}

impl ToolBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the tool name the model refers to in `Action:`. (Required)
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the human-readable description shown in the prompt. (Required)
    pub fn description<T>(mut self, description: T) -> Self
    where
        T: Into<String>,
    {
        self.description = Some(description.into());
        self
    }

    /// Sets the asynchronous executor function for the tool. (Required)
    pub fn executor(mut self, exec: AsyncToolFn) -> Self {
        self.executor = Some(exec);
        self
    }

    /// Wraps a plain async closure as the executor.
    pub fn executor_fn<F, Fut>(self, f: F) -> Self
    where
        F: Fn(String) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<String, ToolExecutionError>> + Send + 'static,
    {
        self.executor(Arc::new(move |input: String| -> ToolFuture { Box::pin(f(input)) }))
    }

    /// Consumes the builder and attempts to create a `Tool`.
    pub fn build(self) -> Result<Tool, ToolBuilderError> {
        let name = self.name.ok_or(ToolBuilderError::MissingName)?;
        let description = self.description.ok_or(ToolBuilderError::MissingDescription)?;
        let executor = self.executor.ok_or(ToolBuilderError::MissingExecutor)?;

        Ok(Tool {
            name,
            description,
            executor,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::weather::{current_weather, WEATHER_TOOL_DESCRIPTION, WEATHER_TOOL_NAME};

    fn forecast(location: String) -> ToolFuture {
        Box::pin(async move { Ok(current_weather(&location)) })
    }

    #[tokio::test]
    async fn raw_executor_is_used_as_is() {
        let tool = ToolBuilder::new()
            .name(WEATHER_TOOL_NAME)
            .description(WEATHER_TOOL_DESCRIPTION)
            .executor(Arc::new(forecast))
            .build()
            .unwrap();

        assert_eq!(tool.name(), "Weather Checker");
        assert_eq!(tool.execute("Oslo").await.unwrap(), current_weather("Oslo"));
    }

    #[test]
    fn each_missing_field_is_named() {
        let no_name = ToolBuilder::new()
            .description(WEATHER_TOOL_DESCRIPTION)
            .executor(Arc::new(forecast))
            .build();
        assert_eq!(no_name.unwrap_err(), ToolBuilderError::MissingName);

        let no_description = ToolBuilder::new()
            .name(WEATHER_TOOL_NAME)
            .executor(Arc::new(forecast))
            .build();
        assert_eq!(no_description.unwrap_err(), ToolBuilderError::MissingDescription);

        let no_executor = ToolBuilder::new()
            .name(WEATHER_TOOL_NAME)
            .description(WEATHER_TOOL_DESCRIPTION)
            .build();
        let err = no_executor.unwrap_err();
        assert_eq!(err, ToolBuilderError::MissingExecutor);
        assert_eq!(err.to_string(), "Executor function is required for the tool.");
    }

    #[tokio::test]
    async fn executor_fn_errors_reach_the_caller() {
        let tool = ToolBuilder::new()
            .name("Web Search")
            .description("offline search")
            .executor_fn(|query| async move {
                if query.trim().is_empty() {
                    Err(ToolExecutionError::InvalidInput("empty search query".into()))
                } else {
                    Ok(format!("results for {query}"))
                }
            })
            .build()
            .unwrap();

        assert_eq!(tool.execute("rust").await.unwrap(), "results for rust");
        let err = tool.execute("  ").await.unwrap_err();
        assert_eq!(err.to_string(), "Invalid tool input: empty search query");
    }
}
