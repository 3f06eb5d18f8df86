use std::collections::HashMap;

use tracing::{debug, info, instrument, warn, Span};
use uuid::Uuid;

use crate::tools::{tool_names, Tool};

use super::{
    error::AgentError,
    output_parser::OutputParserError,
    react_agent::ReactAgent,
    steps::{AgentAction, AgentDecision, AgentOutput, AgentStep},
};

pub const EXCEPTION_TOOL: &str = "_Exception";
pub const STOPPED_OUTPUT: &str = "Agent stopped due to iteration limit or time limit.";
const INVALID_RESPONSE: &str = "Invalid or incomplete response";
const DEFAULT_MAX_ITERATIONS: usize = 15;

/// What to do when the model reply cannot be parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum ParsingErrorHandling {
    /// Return the parser error to the caller.
    #[default]
    Raise,
    /// Feed the parser's hint back to the model and keep going.
    Default,
    /// Feed a fixed message back to the model and keep going.
    Message(String),
}

/// Runs a [`ReactAgent`] against a tool set until it produces a final
/// answer or runs out of iterations.
#[derive(Debug, Clone)]
pub struct AgentExecutor {
    agent: ReactAgent,
    tools: Vec<Tool>,
    verbose: bool,
    return_intermediate_steps: bool,
    handle_parsing_errors: ParsingErrorHandling,
    max_iterations: Option<usize>,
}

#[derive(Debug)]
pub struct AgentExecutorBuilder {
    agent: ReactAgent,
    tools: Vec<Tool>,
    verbose: bool,
    return_intermediate_steps: bool,
    handle_parsing_errors: ParsingErrorHandling,
    max_iterations: Option<usize>,
}

impl AgentExecutorBuilder {
    /// Log every thought, action and observation at `info` level.
    pub fn set_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn set_return_intermediate_steps(mut self, set: bool) -> Self {
        self.return_intermediate_steps = set;
        self
    }

    pub fn set_handle_parsing_errors(mut self, handling: ParsingErrorHandling) -> Self {
        self.handle_parsing_errors = handling;
        self
    }

    /// `None` lets the loop run until the model finishes.
    pub fn set_max_iterations(mut self, max: Option<usize>) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn build(self) -> AgentExecutor {
        AgentExecutor {
            agent: self.agent,
            tools: self.tools,
            verbose: self.verbose,
            return_intermediate_steps: self.return_intermediate_steps,
            handle_parsing_errors: self.handle_parsing_errors,
            max_iterations: self.max_iterations,
        }
    }
}

macro_rules! trace_step {
    ($verbose:expr, $($arg:tt)+) => {
        if $verbose {
            info!(target: "agent", $($arg)+);
        } else {
            debug!(target: "agent", $($arg)+);
        }
    };
}

impl AgentExecutor {
    pub fn builder(agent: ReactAgent, tools: Vec<Tool>) -> AgentExecutorBuilder {
        AgentExecutorBuilder {
            agent,
            tools,
            verbose: false,
            return_intermediate_steps: false,
            handle_parsing_errors: ParsingErrorHandling::default(),
            max_iterations: Some(DEFAULT_MAX_ITERATIONS),
        }
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// Configured tool names, comma-joined in configuration order.
    pub fn tool_names(&self) -> String {
        tool_names(&self.tools)
    }

    pub fn agent(&self) -> &ReactAgent {
        &self.agent
    }

    /// Run the loop. `inputs` must contain `input`.
    #[instrument(
        name = "agent_executor",
        skip_all,
        fields(run_id = tracing::field::Empty, iterations = tracing::field::Empty)
    )]
    pub async fn invoke(&self, inputs: HashMap<String, String>) -> Result<AgentOutput, AgentError> {
        if !inputs.contains_key("input") {
            return Err(AgentError::MissingInput("input".into()));
        }
        let run_id = Uuid::new_v4();
        Span::current().record("run_id", tracing::field::display(run_id));
        trace_step!(self.verbose, %run_id, "Entering new AgentExecutor chain...");

        let mut steps: Vec<AgentStep> = Vec::new();
        let mut iterations = 0usize;

        while self.max_iterations.map_or(true, |max| iterations < max) {
            let decision = match self.agent.plan(&inputs, &steps).await {
                Ok(decision) => decision,
                Err(AgentError::OutputParser(e)) => {
                    let step = self.recover_from_parse_error(e)?;
                    trace_step!(self.verbose, observation = %step.observation, "{}", step.action.log);
                    steps.push(step);
                    iterations += 1;
                    continue;
                }
                Err(other) => return Err(other),
            };

            match decision {
                AgentDecision::Finish(finish) => {
                    trace_step!(self.verbose, "{}", finish.log);
                    trace_step!(self.verbose, %run_id, "Finished chain.");
                    Span::current().record("iterations", iterations + 1);
                    return Ok(self.output(finish.output, steps));
                }
                AgentDecision::Action(action) => {
                    trace_step!(self.verbose, tool = %action.tool, input = %action.tool_input, "{}", action.log);
                    let observation = self.perform(&action).await;
                    trace_step!(self.verbose, "Observation: {observation}");
                    steps.push(AgentStep { action, observation });
                }
            }
            iterations += 1;
        }

        warn!(target: "agent", %run_id, iterations, "stopping early");
        Span::current().record("iterations", iterations);
        Ok(self.output(STOPPED_OUTPUT.to_string(), steps))
    }

    fn recover_from_parse_error(&self, e: OutputParserError) -> Result<AgentStep, AgentError> {
        let (observation, log) = match &self.handle_parsing_errors {
            ParsingErrorHandling::Raise => return Err(AgentError::OutputParser(e)),
            ParsingErrorHandling::Default if e.send_to_llm => (
                e.observation.clone().unwrap_or_else(|| INVALID_RESPONSE.to_string()),
                e.llm_output.clone(),
            ),
            ParsingErrorHandling::Default => (INVALID_RESPONSE.to_string(), e.to_string()),
            ParsingErrorHandling::Message(m) => (m.clone(), e.to_string()),
        };
        Ok(AgentStep {
            action: AgentAction {
                tool: EXCEPTION_TOOL.into(),
                tool_input: observation.clone(),
                log,
            },
            observation,
        })
    }

    async fn perform(&self, action: &AgentAction) -> String {
        let Some(tool) = self.tools.iter().find(|t| t.name == action.tool) else {
            return format!(
                "{} is not a valid tool, try one of [{}].",
                action.tool,
                self.tool_names()
            );
        };

        match tool.execute(action.tool_input.as_str()).await {
            Ok(observation) => observation,
            Err(e) => {
                warn!(target: "tool", tool = %tool.name, error = %e, "tool failed");
                e.to_string()
            }
        }
    }

    fn output(&self, output: String, steps: Vec<AgentStep>) -> AgentOutput {
        AgentOutput {
            output,
            intermediate_steps: self.return_intermediate_steps.then_some(steps),
        }
    }
}
