use opentelemetry::{global, trace::TracerProvider as _, KeyValue};
use opentelemetry_langfuse::ExporterBuilder;
use opentelemetry_sdk::trace::span_processor_with_async_runtime::BatchSpanProcessor;
use opentelemetry_sdk::{resource::Resource, runtime, trace::SdkTracerProvider};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use tracing::{Metadata, Subscriber};
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::{Filter, SubscriberExt};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;
use tracing_subscriber::{fmt, Registry};

use crate::config::LangfuseSettings;

use super::default_filter;

const SERVICE: &str = "react-labs";

#[derive(Debug, Clone, Default)]
pub struct LangfuseOptions<'a> {
    pub public_key: Option<&'a str>,
    pub secret_key: Option<&'a str>,
    pub host: Option<&'a str>,
}

impl<'a> From<&'a LangfuseSettings> for LangfuseOptions<'a> {
    fn from(s: &'a LangfuseSettings) -> Self {
        Self {
            public_key: s.public_key.as_deref(),
            secret_key: s.secret_key.as_deref(),
            host: s.host.as_deref(),
        }
    }
}

#[derive(Debug)]
pub enum TelemetryError {
    Exporter(String),
    Subscriber(String),
}

impl std::fmt::Display for TelemetryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TelemetryError::Exporter(s) => write!(f, "Langfuse exporter error: {s}"),
            TelemetryError::Subscriber(s) => write!(f, "Tracing subscriber error: {s}"),
        }
    }
}

impl std::error::Error for TelemetryError {}

/// Only spans from this crate's own targets are exported.
#[derive(Debug, Clone)]
struct CrateSpanFilter;

impl CrateSpanFilter {
    fn allows(target: &str) -> bool {
        ["react_labs", "agent", "tool"]
            .iter()
            .any(|prefix| target.starts_with(prefix))
    }
}

impl<S> Filter<S> for CrateSpanFilter
where
    S: Subscriber,
{
    fn enabled(&self, meta: &Metadata<'_>, _cx: &tracing_subscriber::layer::Context<'_, S>) -> bool {
        Self::allows(meta.target())
    }
}

/// Install console logging plus Langfuse trace export.
///
/// Must run inside a Tokio runtime. Keep the returned provider and call
/// `shutdown()` on it before exit so queued spans are flushed.
pub fn init(config: LangfuseOptions) -> Result<SdkTracerProvider, TelemetryError> {
    let mut builder = ExporterBuilder::default();
    if let (Some(pk), Some(sk)) = (config.public_key, config.secret_key) {
        builder = builder.with_basic_auth(pk, sk);
    }
    if let Some(host) = config.host {
        builder = builder.with_host(host);
    }
    let exporter = builder
        .build()
        .map_err(|e| TelemetryError::Exporter(e.to_string()))?;

    let resource = Resource::builder()
        .with_attributes([
            KeyValue::new(SERVICE_NAME, SERVICE),
            KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        ])
        .build();

    let processor = BatchSpanProcessor::builder(exporter, runtime::Tokio).build();

    let provider = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_span_processor(processor)
        .build();

    let tracer = provider.tracer(SERVICE);
    global::set_tracer_provider(provider.clone());

    let fmt_layer = fmt::layer()
        .with_timer(UtcTime::rfc_3339())
        .with_target(false)
        .with_filter(default_filter());

    let otel_layer = tracing_opentelemetry::layer()
        .with_tracer(tracer)
        .with_filter(CrateSpanFilter);

    Registry::default()
        .with(fmt_layer)
        .with(otel_layer)
        .try_init()
        .map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

    Ok(provider)
}
