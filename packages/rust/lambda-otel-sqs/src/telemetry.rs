//! OpenTelemetry initialization for Lambda functions exporting over SQS.
//!
//! This module wires the SQS span exporter into a tracer provider and a
//! `tracing` subscriber:
//! - `TelemetryConfig`: configuration builder for the export pipeline
//! - `init_telemetry`: main entry point for telemetry setup
//! - `TelemetryHandle`: per-process handle used to flush after each invocation
//!
//! # Basic Usage
//!
//! ```no_run
//! use lambda_otel_sqs::{init_telemetry, TelemetryConfig};
//! use lambda_runtime::Error;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let client = aws_sdk_sqs::Client::new(&aws_config::load_from_env().await);
//!     let telemetry = init_telemetry(
//!         TelemetryConfig::builder()
//!             .client(client)
//!             .queue_url("https://sqs.us-east-1.amazonaws.com/123456789012/spans")
//!             .build(),
//!     )?;
//!     // run the handler, then telemetry.complete() after each invocation
//!     Ok(())
//! }
//! ```
//!
//! # Environment Configuration
//!
//! - `OTEL_EXPORTER_OTLP_TRACES_COMPRESSION` / `OTEL_EXPORTER_OTLP_COMPRESSION`:
//!   message body compression when none is set on the config
//! - `RUST_LOG` or `AWS_LAMBDA_LOG_LEVEL`: subscriber log level filter
//! - `OTEL_SERVICE_NAME`: overrides the service name detected from the
//!   function name

use std::borrow::Cow;
use std::env;
use std::sync::Arc;

use bon::Builder;
use lambda_runtime::Error;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::{global, InstrumentationScope, KeyValue};
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::trace::SdkTracerProvider;
use opentelemetry_sdk::Resource;
use otlp_sqs_span_exporter::{sqs_batch_span_processor, Compression, SqsSpanExporter};
use tracing_subscriber::layer::SubscriberExt;

use crate::cold_start::ColdStartTracker;
use crate::constants::env_vars;

/// Configuration for OpenTelemetry initialization.
///
/// The SQS client and queue URL are required; everything else has defaults.
///
/// ```no_run
/// use lambda_otel_sqs::TelemetryConfig;
/// use otlp_sqs_span_exporter::Compression;
///
/// # async fn example() {
/// let client = aws_sdk_sqs::Client::new(&aws_config::load_from_env().await);
/// let config = TelemetryConfig::builder()
///     .client(client)
///     .queue_url("https://sqs.us-east-1.amazonaws.com/123456789012/spans")
///     .compression(Compression::Gzip)
///     .build();
/// # }
/// ```
#[derive(Builder, Debug)]
pub struct TelemetryConfig {
    /// SQS client used by the span exporter.
    pub client: aws_sdk_sqs::Client,

    /// URL of the queue that receives serialized span batches.
    #[builder(into)]
    pub queue_url: String,

    /// Message body compression.
    ///
    /// Default: `None` (resolved from the OTLP compression environment
    /// variables, falling back to no compression)
    pub compression: Option<Compression>,

    /// Maximum spans per export batch, at most one SQS message each.
    ///
    /// Default: `None` (the SQS batch limit of 10)
    pub max_export_batch_size: Option<usize>,

    /// Custom resource attributes for all spans.
    ///
    /// Default: `None` (auto-detected from the Lambda environment)
    pub resource: Option<Resource>,

    /// Set this provider as the global OpenTelemetry provider.
    ///
    /// Default: `true`
    #[builder(default = true)]
    pub set_global_provider: bool,

    /// Enable console output via a `tracing_subscriber` fmt layer.
    ///
    /// Default: `false`
    #[builder(default = false)]
    pub enable_fmt_layer: bool,

    /// Environment variable name to use for the log level filter.
    ///
    /// Default: `None` (uses `RUST_LOG` when set, otherwise
    /// `AWS_LAMBDA_LOG_LEVEL`)
    pub env_var_name: Option<String>,
}

/// Handle returned by [`init_telemetry`].
///
/// Carries the tracer provider and the process cold-start tracker. `Clone`
/// and safe to share between invocations.
#[derive(Clone)]
pub struct TelemetryHandle {
    provider: Arc<SdkTracerProvider>,
    tracer: opentelemetry_sdk::trace::Tracer,
    cold_start: Arc<ColdStartTracker>,
}

impl TelemetryHandle {
    pub(crate) fn new(provider: Arc<SdkTracerProvider>) -> Self {
        let scope = InstrumentationScope::builder(env!("CARGO_PKG_NAME"))
            .with_version(Cow::Borrowed(env!("CARGO_PKG_VERSION")))
            .with_attributes(vec![
                KeyValue::new("library.language", "rust"),
                KeyValue::new("library.runtime", "aws_lambda"),
            ])
            .build();
        let tracer = provider.tracer_with_scope(scope);

        Self {
            provider,
            tracer,
            cold_start: Arc::new(ColdStartTracker::new()),
        }
    }

    /// Get the tracer instance for creating spans manually.
    pub fn get_tracer(&self) -> &opentelemetry_sdk::trace::Tracer {
        &self.tracer
    }

    /// The cold-start tracker shared by all invocations in this process.
    pub fn cold_start(&self) -> &ColdStartTracker {
        &self.cold_start
    }

    /// Complete telemetry processing for the current invocation.
    ///
    /// Force-flushes the provider so buffered spans reach the queue before
    /// the execution environment is frozen. Flush errors are logged, not
    /// returned.
    pub fn complete(&self) {
        if let Err(e) = self.provider.force_flush() {
            tracing::warn!(error = ?e, "Error flushing telemetry");
        }
    }
}

/// Builds a `Resource` from the standard Lambda environment variables.
///
/// The function name doubles as the service name unless `OTEL_SERVICE_NAME`
/// is set. `OTEL_RESOURCE_ATTRIBUTES` is picked up by the SDK's own
/// environment detector.
pub fn get_lambda_resource() -> Resource {
    let mut attributes = Vec::new();

    if let Ok(region) = env::var(env_vars::AWS_REGION) {
        attributes.push(KeyValue::new("cloud.provider", "aws"));
        attributes.push(KeyValue::new("cloud.region", region));
    }

    if let Ok(function_name) = env::var(env_vars::AWS_LAMBDA_FUNCTION_NAME) {
        attributes.push(KeyValue::new("faas.name", function_name.clone()));
        if env::var(env_vars::SERVICE_NAME).is_err() {
            attributes.push(KeyValue::new("service.name", function_name));
        }
    }

    if let Ok(version) = env::var(env_vars::AWS_LAMBDA_FUNCTION_VERSION) {
        attributes.push(KeyValue::new("faas.version", version));
    }

    if let Ok(memory) = env::var(env_vars::AWS_LAMBDA_FUNCTION_MEMORY_SIZE) {
        if let Ok(memory_mb) = memory.parse::<i64>() {
            attributes.push(KeyValue::new("faas.max_memory", memory_mb * 1024 * 1024));
        }
    }

    if let Ok(log_stream) = env::var(env_vars::AWS_LAMBDA_LOG_STREAM_NAME) {
        attributes.push(KeyValue::new("faas.instance", log_stream));
    }

    Resource::builder().with_attributes(attributes).build()
}

/// Initialize OpenTelemetry with SQS span export.
///
/// Wires the exporter into a batch span processor and tracer provider,
/// registers the W3C trace-context propagator, and installs a `tracing`
/// subscriber bridging spans into OpenTelemetry.
///
/// # Errors
///
/// Returns an error when the exporter configuration is invalid (unsupported
/// compression value, batch size over the SQS limit) or when a global
/// subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryHandle, Error> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let exporter = SqsSpanExporter::builder()
        .client(config.client)
        .queue_url(config.queue_url)
        .maybe_compression(config.compression)
        .build()?;
    let processor = sqs_batch_span_processor(exporter, config.max_export_batch_size)?;

    let resource = config.resource.unwrap_or_else(get_lambda_resource);
    let provider = Arc::new(
        SdkTracerProvider::builder()
            .with_span_processor(processor)
            .with_resource(resource)
            .build(),
    );

    if config.set_global_provider {
        global::set_tracer_provider(provider.as_ref().clone());
    }

    let env_var_name = config.env_var_name.as_deref().unwrap_or_else(|| {
        if env::var("RUST_LOG").is_ok() {
            "RUST_LOG"
        } else {
            env_vars::AWS_LAMBDA_LOG_LEVEL
        }
    });
    let env_filter = tracing_subscriber::EnvFilter::builder()
        .with_env_var(env_var_name)
        .from_env_lossy();

    let handle = TelemetryHandle::new(provider);

    let subscriber = tracing_subscriber::registry::Registry::default()
        .with(tracing_opentelemetry::OpenTelemetryLayer::new(
            handle.get_tracer().clone(),
        ))
        .with(env_filter);

    if config.enable_fmt_layer {
        tracing::subscriber::set_global_default(
            subscriber.with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .without_time()
                    .with_ansi(false),
            ),
        )?;
    } else {
        tracing::subscriber::set_global_default(subscriber)?;
    }

    Ok(handle)
}
