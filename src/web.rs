//! Single-page web form for the assistant lab.

use std::{error::Error, fmt::Write as _, sync::Arc};

use axum::{
    extract::{Query, State},
    response::Html,
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::{net::TcpListener, sync::OnceCell};
use tower_http::trace::TraceLayer;
use tracing::{error, info, instrument};

use crate::{
    agent::{AgentError, AgentOutput},
    config::Settings,
    labs::{build_pipeline, Lab},
    pipeline::Pipeline,
};

pub const PAGE_TITLE: &str = "AI Assistant with Web Search";
pub const QUESTION_LABEL: &str = "What would you like to know?";
pub const TRACE_TITLE: &str = "See the search process";
pub const NO_STEPS: &str = "No intermediate steps available.";
pub const FORMAT_HINT: &str =
    "The AI generated a response, but it didn't follow the expected format. Here's what it said:";
const FOOTER: &str = "Powered by react-labs and axum";

type BoxError = Box<dyn Error + Send + Sync>;

pub type PipelineFactory = Arc<dyn Fn() -> Result<Pipeline, BoxError> + Send + Sync>;

/// Shared handler state. The pipeline is built on the first question and
/// reused for the rest of the process.
pub struct AppState {
    factory: PipelineFactory,
    pipeline: OnceCell<Arc<Pipeline>>,
}

impl AppState {
    pub fn new(factory: PipelineFactory) -> Self {
        Self {
            factory,
            pipeline: OnceCell::new(),
        }
    }

    /// State for the assistant lab, backed by the configured model client.
    pub fn from_settings(settings: Settings) -> Self {
        Self::new(Arc::new(move || -> Result<Pipeline, BoxError> {
            let client = settings.client_config().build()?;
            build_pipeline(Lab::Assistant, &settings, Arc::new(client))
        }))
    }

    pub async fn pipeline(&self) -> Result<Arc<Pipeline>, BoxError> {
        self.pipeline
            .get_or_try_init(|| async {
                info!("building assistant pipeline");
                (self.factory)().map(Arc::new)
            })
            .await
            .cloned()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct AskParams {
    pub question: Option<String>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[instrument(skip_all)]
async fn index(State(state): State<Arc<AppState>>, Query(params): Query<AskParams>) -> Html<String> {
    let question = params
        .question
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty());

    let body = match question {
        None => String::new(),
        Some(q) => match state.pipeline().await {
            Ok(pipeline) => render_outcome(&pipeline.invoke_question(q).await),
            Err(e) => {
                error!(error = %e, "pipeline construction failed");
                render_unexpected(e.as_ref())
            }
        },
    };

    Html(render_page(question.unwrap_or_default(), &body))
}

/// HTML fragment for one pipeline result.
///
/// Parser failures show the raw model text; every other error collapses
/// into a generic message.
pub fn render_outcome(result: &Result<AgentOutput, AgentError>) -> String {
    match result {
        Ok(output) => render_answer(output),
        Err(AgentError::OutputParser(e)) => {
            let mut html = String::new();
            let _ = write!(
                html,
                "<div class=\"error\">An error occurred while processing your request: {}</div>\n\
                 <p>{}</p>\n<pre>{}</pre>\n",
                html_escape(&e.to_string()),
                html_escape(FORMAT_HINT),
                html_escape(&e.llm_output),
            );
            html
        }
        Err(e) => render_unexpected(e),
    }
}

fn render_unexpected(e: &(dyn Error + 'static)) -> String {
    format!(
        "<div class=\"error\">An unexpected error occurred: {}</div>\n",
        html_escape(&e.to_string())
    )
}

fn render_answer(output: &AgentOutput) -> String {
    let mut html = String::new();
    let _ = write!(
        html,
        "<h3>Answer:</h3>\n<p class=\"answer\">{}</p>\n<details>\n<summary>{}</summary>\n",
        html_escape(&output.output),
        TRACE_TITLE
    );
    match &output.intermediate_steps {
        Some(steps) => {
            for step in steps {
                let _ = write!(
                    html,
                    "<p>Action: {}</p>\n<p>Observation: {}</p>\n<hr>\n",
                    html_escape(&step.action.to_string()),
                    html_escape(&step.observation)
                );
            }
        }
        None => {
            let _ = writeln!(html, "<p>{NO_STEPS}</p>");
        }
    }
    html.push_str("</details>\n");
    html
}

pub fn render_page(question: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{PAGE_TITLE}</title>\n\
         <style>body{{font-family:sans-serif;max-width:48rem;margin:2rem auto}}\
         .answer,pre{{white-space:pre-wrap}}.error{{color:#b00020}}</style>\n</head>\n<body>\n\
         <h1>{PAGE_TITLE}</h1>\n<form method=\"get\" action=\"/\">\n\
         <label for=\"question\">{QUESTION_LABEL}</label>\n\
         <input id=\"question\" name=\"question\" type=\"text\" value=\"{}\">\n</form>\n\
         {body}<hr>\n<footer>{FOOTER}</footer>\n</body>\n</html>\n",
        html_escape(question)
    )
}

pub fn html_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Bind `settings.bind` and serve the form until the process exits.
pub async fn serve(settings: Settings) -> Result<(), BoxError> {
    let addr = settings.bind;
    let app = router(Arc::new(AppState::from_settings(settings)));

    let listener = TcpListener::bind(addr).await?;
    info!(%addr, "assistant listening");
    axum::serve(listener, app).await?;
    Ok(())
}
