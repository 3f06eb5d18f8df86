use std::collections::HashMap;

use tracing::instrument;

use crate::{
    agent::{AgentError, AgentExecutor, AgentOutput},
    templates::ChatPromptTemplate,
};

/// Prompt formatting followed by one executor run.
#[derive(Debug, Clone)]
pub struct Pipeline {
    prompt: ChatPromptTemplate,
    executor: AgentExecutor,
}

impl Pipeline {
    pub fn new(prompt: ChatPromptTemplate, executor: AgentExecutor) -> Self {
        Self { prompt, executor }
    }

    pub fn executor(&self) -> &AgentExecutor {
        &self.executor
    }

    /// Turn the prompt variables into executor inputs.
    ///
    /// `input` is the first rendered message, `tool_names` the configured
    /// tool names in order, `agent_scratchpad` starts empty.
    pub fn agent_inputs<K, V>(
        &self,
        vars: &HashMap<K, V>,
    ) -> Result<HashMap<String, String>, AgentError>
    where
        K: AsRef<str> + Eq + std::hash::Hash,
        V: AsRef<str>,
    {
        let messages = self.prompt.format_messages(vars)?;
        let input = messages
            .first()
            .map(|m| m.text().to_string())
            .ok_or_else(|| AgentError::Prompt("chat prompt produced no messages".into()))?;

        Ok(HashMap::from([
            ("input".to_string(), input),
            ("tool_names".to_string(), self.executor.tool_names()),
            ("agent_scratchpad".to_string(), String::new()),
        ]))
    }

    #[instrument(name = "pipeline", skip_all)]
    pub async fn invoke<K, V>(&self, vars: &HashMap<K, V>) -> Result<AgentOutput, AgentError>
    where
        K: AsRef<str> + Eq + std::hash::Hash,
        V: AsRef<str>,
    {
        let inputs = self.agent_inputs(vars)?;
        self.executor.invoke(inputs).await
    }

    /// Shorthand for prompts whose only variable is `question`.
    pub async fn invoke_question(&self, question: &str) -> Result<AgentOutput, AgentError> {
        self.invoke(&HashMap::from([("question", question)])).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        agent::ReactAgent,
        services::llm::{ChatFuture, ChatModel, ChatRequest, ChatResponse, Message},
        templates::PromptTemplate,
        tools::{weather::weather_tool, web_search::web_search_tool},
    };
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Default)]
    struct Echo {
        prompts: Mutex<Vec<String>>,
    }

    impl ChatModel for Echo {
        fn chat(&self, req: ChatRequest) -> ChatFuture<'_> {
            let prompt = req.messages[0].text().to_string();
            self.prompts.lock().unwrap().push(prompt);
            Box::pin(async {
                Ok(ChatResponse {
                    model: "echo".into(),
                    message: Message::assistant("Thought: done\nFinal Answer: fine"),
                    done_reason: None,
                    prompt_tokens: None,
                    completion_tokens: None,
                })
            })
        }
    }

    fn pipeline(model: Arc<Echo>) -> Pipeline {
        let tools = vec![weather_tool().unwrap(), web_search_tool().unwrap()];
        let prompt = PromptTemplate::from_template(
            "{tools}\nPick from [{tool_names}]\nQuestion: {input}\n{agent_scratchpad}",
        )
        .unwrap();
        let agent = ReactAgent::new(model, "echo", &tools, prompt).unwrap();
        let executor = AgentExecutor::builder(agent, tools).build();
        Pipeline::new(
            ChatPromptTemplate::from_template("Answer the following question: {question}").unwrap(),
            executor,
        )
    }

    #[test]
    fn inputs_carry_question_and_tool_names_in_order() {
        let p = pipeline(Arc::default());
        let inputs = p
            .agent_inputs(&HashMap::from([("question", "What's the weather like in Tokyo?")]))
            .unwrap();

        assert_eq!(
            inputs["input"],
            "Answer the following question: What's the weather like in Tokyo?"
        );
        assert_eq!(inputs["tool_names"], "Weather Checker, Web Search");
        assert_eq!(inputs["agent_scratchpad"], "");
    }

    #[test]
    fn missing_question_is_a_template_error() {
        let p = pipeline(Arc::default());
        let err = p.agent_inputs(&HashMap::<String, String>::new()).unwrap_err();
        assert!(matches!(err, AgentError::Template(_)));
    }

    #[tokio::test]
    async fn invoke_question_runs_the_agent() {
        let model = Arc::new(Echo::default());
        let out = pipeline(model.clone()).invoke_question("2+2?").await.unwrap();
        assert_eq!(out.output, "fine");

        let prompts = model.prompts.lock().unwrap();
        assert!(prompts[0].contains("Pick from [Weather Checker, Web Search]"));
        assert!(prompts[0].contains("Question: Answer the following question: 2+2?"));
    }
}
