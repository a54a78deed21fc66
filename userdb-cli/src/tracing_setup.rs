//! Log and span output for the userdb binary
//!
//! Events go to stderr so `ping` and `config show` keep stdout for their
//! results. `RUST_LOG` replaces the default directives entirely, e.g.
//! `RUST_LOG=userdb_core=trace,sqlx=debug userdb serve`.
//!
//! With the `telemetry` feature, `--otel` also exports spans (one per user
//! operation and per HTTP request) to `OTEL_EXPORTER_OTLP_ENDPOINT`.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

/// sqlx logs every statement at info; keep that out of normal output.
const DEFAULT_DIRECTIVES: &str = "info,sqlx=warn";
const DEBUG_DIRECTIVES: &str = "debug,sqlx=info,hyper=info,h2=info";

#[derive(Debug, Clone, Default)]
pub struct TracingConfig {
    pub debug: bool,
    pub otel: bool,
}

impl TracingConfig {
    fn directives(&self) -> &'static str {
        if self.debug {
            DEBUG_DIRECTIVES
        } else {
            DEFAULT_DIRECTIVES
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.directives()))
    }
}

fn init_console(config: &TracingConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(config.filter())
        .with_writer(std::io::stderr)
        .with_target(config.debug)
        .compact()
        .try_init()
        .map_err(|err| anyhow!(err))
}

#[cfg(feature = "telemetry")]
fn init_with_otel(config: &TracingConfig) -> Result<()> {
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry::KeyValue;
    use opentelemetry_otlp::WithExportConfig;
    use opentelemetry_sdk::trace::TracerProvider;
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT")
        .unwrap_or_else(|_| "http://localhost:4317".to_string());

    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&endpoint)
        .build()
        .map_err(|e| anyhow!("cannot build OTLP exporter for {}: {}", endpoint, e))?;

    let provider = TracerProvider::builder()
        .with_batch_exporter(exporter, opentelemetry_sdk::runtime::Tokio)
        .with_resource(opentelemetry_sdk::Resource::new(vec![
            KeyValue::new("service.name", "userdb"),
            KeyValue::new("service.version", env!("CARGO_PKG_VERSION")),
        ]))
        .build();

    let tracer = provider.tracer("userdb");
    // The global slot keeps the provider alive until shutdown_otel.
    let _ = opentelemetry::global::set_tracer_provider(provider);

    tracing_subscriber::registry()
        .with(config.filter())
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(config.debug)
                .compact(),
        )
        .with(tracing_opentelemetry::layer().with_tracer(tracer))
        .try_init()
        .map_err(|err| anyhow!(err))?;

    tracing::info!(%endpoint, "exporting spans over OTLP");
    Ok(())
}

/// Flush spans still buffered for export.
#[cfg(feature = "telemetry")]
pub fn shutdown_otel() {
    opentelemetry::global::shutdown_tracer_provider();
}

#[cfg(not(feature = "telemetry"))]
pub fn shutdown_otel() {}

pub fn init(config: &TracingConfig) -> Result<()> {
    #[cfg(feature = "telemetry")]
    if config.otel {
        return init_with_otel(config);
    }

    #[cfg(not(feature = "telemetry"))]
    if config.otel {
        eprintln!("warning: --otel ignored, userdb was built without the telemetry feature");
    }

    init_console(config)
}
