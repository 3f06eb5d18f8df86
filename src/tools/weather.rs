//! Mock weather lookup used by the weather lab.

use super::{Tool, ToolBuilder, ToolBuilderError};

pub const WEATHER_TOOL_NAME: &str = "Weather Checker";
pub const WEATHER_TOOL_DESCRIPTION: &str =
    "Useful for getting the current weather in a specific location";

/// Canned forecast for `location`. No API is called.
pub fn current_weather(location: &str) -> String {
    format!("The weather in {location} is currently sunny and 22°C.\n")
}

pub fn weather_tool() -> Result<Tool, ToolBuilderError> {
    ToolBuilder::new()
        .name(WEATHER_TOOL_NAME)
        .description(WEATHER_TOOL_DESCRIPTION)
        .executor_fn(|location| async move {
            tracing::info!(target: "tool", %location, "mock weather lookup");
            Ok(current_weather(&location))
        })
        .build()
}
