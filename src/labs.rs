//! The three lab programs: shared wiring and the console runner.

use std::{error::Error, fmt, str::FromStr, sync::Arc};

use tracing::{info, instrument};

use crate::{
    agent::{AgentExecutor, ParsingErrorHandling, ReactAgent},
    config::Settings,
    pipeline::Pipeline,
    services::llm::{ChatModel, InferenceOptions},
    templates::{cached_prompt_template, load_prompt_template, ChatPromptTemplate, PromptTemplate},
    tools::{weather::weather_tool, web_search::web_search_tool, Tool},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lab {
    /// Mock weather tool, console output.
    Weather,
    /// DuckDuckGo search tool, console output.
    WebSearch,
    /// DuckDuckGo search tool behind the web form.
    Assistant,
}

impl Lab {
    pub fn question_prompt(&self) -> &'static str {
        match self {
            Lab::Weather => "Answer the following question: {question}",
            Lab::WebSearch | Lab::Assistant => {
                "Answer the following question using the most up-to-date information you can find: {question}"
            }
        }
    }

    /// Question asked by the console runner. The web form asks the user instead.
    pub fn default_question(&self) -> Option<&'static str> {
        match self {
            Lab::Weather => Some("What's the weather like in Tokyo?"),
            Lab::WebSearch => Some("What are the latest developments in artificial intelligence?"),
            Lab::Assistant => None,
        }
    }

    pub fn tools(&self) -> Result<Vec<Tool>, Box<dyn Error + Send + Sync>> {
        let tool = match self {
            Lab::Weather => weather_tool()?,
            Lab::WebSearch | Lab::Assistant => web_search_tool()?,
        };
        Ok(vec![tool])
    }

    fn returns_intermediate_steps(&self) -> bool {
        matches!(self, Lab::Assistant)
    }

    fn parsing_errors(&self) -> ParsingErrorHandling {
        match self {
            Lab::Assistant => ParsingErrorHandling::Default,
            Lab::Weather | Lab::WebSearch => ParsingErrorHandling::Raise,
        }
    }
}

impl fmt::Display for Lab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lab::Weather => write!(f, "weather"),
            Lab::WebSearch => write!(f, "web-search"),
            Lab::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Lab {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weather" => Ok(Lab::Weather),
            "web-search" | "websearch" => Ok(Lab::WebSearch),
            "assistant" => Ok(Lab::Assistant),
            other => Err(format!("Unknown lab: {other}")),
        }
    }
}

/// Assemble the prompt -> agent pipeline for `lab`.
///
/// The ReAct template is read from `settings.prompt_path`; a missing file
/// is returned as a [`crate::templates::TemplateError::Io`].
#[instrument(skip(settings, llm), fields(prompt = %settings.prompt_path.display()))]
pub fn build_pipeline(
    lab: Lab,
    settings: &Settings,
    llm: Arc<dyn ChatModel>,
) -> Result<Pipeline, Box<dyn Error + Send + Sync>> {
    let template = match lab {
        Lab::Assistant => cached_prompt_template(&settings.prompt_path)?.to_string(),
        Lab::Weather | Lab::WebSearch => load_prompt_template(&settings.prompt_path)?,
    };
    let tools = lab.tools()?;

    let agent = ReactAgent::new(
        llm,
        settings.model.clone(),
        &tools,
        PromptTemplate::from_template(template)?,
    )?
    .with_options(InferenceOptions {
        temperature: settings.temperature,
        ..Default::default()
    });

    let executor = AgentExecutor::builder(agent, tools)
        .set_verbose(true)
        .set_return_intermediate_steps(lab.returns_intermediate_steps())
        .set_handle_parsing_errors(lab.parsing_errors())
        .set_max_iterations(Some(settings.max_iterations))
        .build();

    Ok(Pipeline::new(
        ChatPromptTemplate::from_template(lab.question_prompt())?,
        executor,
    ))
}

/// Run a console lab once and print its answer.
pub async fn run_console(lab: Lab, settings: &Settings) -> Result<(), Box<dyn Error + Send + Sync>> {
    let question = lab
        .default_question()
        .ok_or_else(|| format!("the {lab} lab has no console question"))?;

    let client = settings.client_config().build()?;
    let pipeline = build_pipeline(lab, settings, Arc::new(client))?;

    info!(%lab, question, "running lab");
    let result = pipeline.invoke_question(question).await?;

    println!("Answer:");
    println!("{}", result.output);
    Ok(())
}
