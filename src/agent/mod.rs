mod error;
mod executor;
mod output_parser;
mod react_agent;
mod steps;

pub use self::{
    error::AgentError,
    executor::{AgentExecutor, AgentExecutorBuilder, ParsingErrorHandling},
    output_parser::{OutputParserError, ReActOutputParser},
    react_agent::{format_log_to_str, ReactAgent, OBSERVATION_STOP},
    steps::{AgentAction, AgentDecision, AgentFinish, AgentOutput, AgentStep},
};
