pub mod langfuse;
mod logging;

use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::config::LangfuseSettings;

pub use langfuse::TelemetryError;
pub use logging::{default_filter, init_default_tracing};

/// Langfuse export when both keys are configured, console logging otherwise.
pub fn init(settings: &LangfuseSettings) -> Result<Option<SdkTracerProvider>, TelemetryError> {
    if settings.is_enabled() {
        langfuse::init(settings.into()).map(Some)
    } else {
        init_default_tracing();
        Ok(None)
    }
}

/// Flush and stop the exporter returned by [`init`].
pub fn shutdown(provider: Option<SdkTracerProvider>) {
    if let Some(provider) = provider {
        if let Err(e) = provider.shutdown() {
            tracing::warn!(error = %e, "failed to flush traces");
        }
    }
}
