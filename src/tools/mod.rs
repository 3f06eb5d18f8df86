mod errors;
mod tool;
mod tool_builder;
pub mod weather;
pub mod web_search;

pub use self::{
    errors::ToolExecutionError,
    tool::{render_text_description, tool_names, AsyncToolFn, Tool},
    tool_builder::{ToolBuilder, ToolBuilderError},
};
