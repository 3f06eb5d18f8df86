use std::{collections::HashMap, fmt, sync::Arc};

use tracing::{debug, instrument};

use crate::{
    services::llm::{BaseRequest, ChatModel, ChatRequest, InferenceOptions, Message},
    templates::PromptTemplate,
    tools::{render_text_description, tool_names, Tool},
};

use super::{
    error::AgentError,
    output_parser::ReActOutputParser,
    steps::{AgentDecision, AgentStep},
};

/// Stop sequence sent with every request so the model does not invent
/// its own observations.
pub const OBSERVATION_STOP: &str = "\nObservation";

const REQUIRED_VARIABLES: [&str; 3] = ["tools", "tool_names", "agent_scratchpad"];

/// Render intermediate steps as the `agent_scratchpad` text.
pub fn format_log_to_str(steps: &[AgentStep]) -> String {
    let mut thoughts = String::new();
    for step in steps {
        thoughts.push_str(&step.action.log);
        thoughts.push_str("\nObservation: ");
        thoughts.push_str(&step.observation);
        thoughts.push_str("\nThought: ");
    }
    thoughts
}

/// A prompt-driven ReAct planner: one model call per decision.
#[derive(Clone)]
pub struct ReactAgent {
    llm: Arc<dyn ChatModel>,
    model: String,
    options: InferenceOptions,
    prompt: PromptTemplate,
    parser: ReActOutputParser,
}

impl ReactAgent {
    /// Bind `tools` and `tool_names` into the prompt.
    ///
    /// Fails when the prompt does not mention every one of `tools`,
    /// `tool_names` and `agent_scratchpad`.
    pub fn new<M>(
        llm: Arc<dyn ChatModel>,
        model: M,
        tools: &[Tool],
        prompt: PromptTemplate,
    ) -> Result<Self, AgentError>
    where
        M: Into<String>,
    {
        let missing: Vec<&str> = REQUIRED_VARIABLES
            .iter()
            .copied()
            .filter(|v| !prompt.has_variable(v))
            .collect();
        if !missing.is_empty() {
            return Err(AgentError::Prompt(format!(
                "Prompt missing required variables: {missing:?}"
            )));
        }

        let prompt = prompt
            .partial("tools", render_text_description(tools))
            .partial("tool_names", tool_names(tools));

        Ok(Self {
            llm,
            model: model.into(),
            options: InferenceOptions::default(),
            prompt,
            parser: ReActOutputParser,
        })
    }

    pub fn with_options(mut self, options: InferenceOptions) -> Self {
        self.options = options;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    /// Render the prompt for the current state of the loop.
    ///
    /// Caller inputs override the bound `tools` / `tool_names`; the
    /// scratchpad is always rebuilt from `steps`.
    pub fn render(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
    ) -> Result<String, AgentError> {
        let mut vars = inputs.clone();
        vars.insert("agent_scratchpad".into(), format_log_to_str(steps));
        Ok(self.prompt.format(&vars)?)
    }

    /// Ask the model for the next decision.
    #[instrument(level = "debug", skip_all, fields(model = %self.model, steps = steps.len()))]
    pub async fn plan(
        &self,
        inputs: &HashMap<String, String>,
        steps: &[AgentStep],
    ) -> Result<AgentDecision, AgentError> {
        let text = self.render(inputs, steps)?;

        let request = ChatRequest {
            base: BaseRequest {
                model: self.model.clone(),
                options: Some(self.options.with_stop([OBSERVATION_STOP])),
            },
            messages: vec![Message::user(text)],
        };

        let response = self.llm.chat(request).await?;
        debug!(reply = %response.message.text(), "model replied");

        Ok(self.parser.parse(response.message.text())?)
    }
}

impl fmt::Debug for ReactAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReactAgent")
            .field("llm", &self.llm)
            .field("model", &self.model)
            .field("options", &self.options)
            .field("prompt", &self.prompt.template())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::AgentAction,
        services::llm::{ChatFuture, ChatResponse},
        ToolBuilder,
    };
    use std::sync::Mutex;

    #[derive(Debug, Default)]
    struct Recorder {
        reply: String,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ChatModel for Recorder {
        fn chat(&self, req: ChatRequest) -> ChatFuture<'_> {
            self.seen.lock().unwrap().push(req);
            let reply = self.reply.clone();
            Box::pin(async move {
                Ok(ChatResponse {
                    model: "recorder".into(),
                    message: Message::assistant(reply),
                    done_reason: None,
                    prompt_tokens: None,
                    completion_tokens: None,
                })
            })
        }
    }

    fn tool(name: &str) -> Tool {
        ToolBuilder::new()
            .name(name)
            .description(format!("{name} description"))
            .executor_fn(|i| async move { Ok(i) })
            .build()
            .unwrap()
    }

    const PROMPT: &str = "Tools:\n{tools}\nUse one of [{tool_names}]\nQuestion: {input}\nThought:{agent_scratchpad}";

    #[test]
    fn scratchpad_concatenates_steps() {
        let steps = vec![
            AgentStep {
                action: AgentAction {
                    tool: "A".into(),
                    tool_input: "x".into(),
                    log: "Thought: try A\nAction: A\nAction Input: x".into(),
                },
                observation: "ok".into(),
            },
            AgentStep {
                action: AgentAction {
                    tool: "B".into(),
                    tool_input: "y".into(),
                    log: "Action: B\nAction Input: y".into(),
                },
                observation: "done".into(),
            },
        ];
        assert_eq!(
            format_log_to_str(&steps),
            "Thought: try A\nAction: A\nAction Input: x\nObservation: ok\nThought: \
             Action: B\nAction Input: y\nObservation: done\nThought: "
        );
        assert_eq!(format_log_to_str(&[]), "");
    }

    #[test]
    fn prompt_without_required_variables_is_rejected() {
        let llm: Arc<dyn ChatModel> = Arc::new(Recorder::default());
        let prompt = PromptTemplate::from_template("Question: {input} using {tools}").unwrap();
        let err = ReactAgent::new(llm, "m", &[], prompt).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("tool_names"));
        assert!(msg.contains("agent_scratchpad"));
        assert!(!msg.contains("\"tools\""));
    }

    #[tokio::test]
    async fn plan_sends_rendered_prompt_with_stop_sequence() {
        let recorder = Arc::new(Recorder {
            reply: "Thought: easy\nFinal Answer: 4".into(),
            ..Default::default()
        });
        let llm: Arc<dyn ChatModel> = recorder.clone();
        let tools = vec![tool("Weather Checker"), tool("Web Search")];
        let agent = ReactAgent::new(llm, "gpt-4o-mini", &tools, PromptTemplate::from_template(PROMPT).unwrap())
            .unwrap()
            .with_options(InferenceOptions {
                temperature: Some(0.0),
                ..Default::default()
            });

        let mut inputs = HashMap::new();
        inputs.insert("input".to_string(), "2+2?".to_string());
        let decision = agent.plan(&inputs, &[]).await.unwrap();
        assert!(matches!(decision, AgentDecision::Finish(ref f) if f.output == "4"));

        let seen = recorder.seen.lock().unwrap();
        let req = &seen[0];
        assert_eq!(req.base.model, "gpt-4o-mini");
        let opts = req.base.options.as_ref().unwrap();
        assert_eq!(opts.stop, Some(vec![OBSERVATION_STOP.to_string()]));
        assert_eq!(opts.temperature, Some(0.0));
        assert_eq!(
            req.messages[0].text(),
            "Tools:\nWeather Checker: Weather Checker description\nWeb Search: Web Search description\n\
             Use one of [Weather Checker, Web Search]\nQuestion: 2+2?\nThought:"
        );
    }
}
