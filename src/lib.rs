pub mod agent;
pub mod config;
pub mod labs;
pub mod observability;
pub mod pipeline;
pub mod services;
pub mod templates;
pub mod tools;
pub mod web;

pub use agent::*;
pub use tools::*;

pub use config::{ConfigError, Settings};
pub use labs::{build_pipeline, run_console, Lab};
pub use observability::init_default_tracing;
pub use pipeline::Pipeline;
pub use services::llm::models::base::{Message, Role};
pub use services::llm::{ChatModel, ClientConfig, InferenceClient, Provider};
