pub mod client;
pub mod client_config;
pub mod models;
pub mod providers;

pub use client::{ChatFuture, ChatModel, InferenceClient, Provider};
pub use client_config::ClientConfig;
pub use models::*;
