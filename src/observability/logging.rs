use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

const DEFAULT_DIRECTIVES: &str = "react_labs=info,agent=info,tool=info,tower_http=info";

/// `RUST_LOG` when set and valid, otherwise this crate's defaults at `warn`.
pub fn default_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::builder()
            .with_default_directive(tracing::Level::WARN.into())
            .parse_lossy(DEFAULT_DIRECTIVES)
    })
}

/// Console-only logging. Calling it twice is a no-op.
pub fn init_default_tracing() {
    let fmt_layer = fmt::layer()
        .compact()
        .with_target(false)
        .with_span_events(fmt::format::FmtSpan::CLOSE);

    let _ = Registry::default()
        .with(default_filter())
        .with(fmt_layer)
        .try_init();
}
