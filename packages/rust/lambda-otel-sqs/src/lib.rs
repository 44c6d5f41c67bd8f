//! OpenTelemetry instrumentation for AWS Lambda functions exporting over SQS.
//!
//! This crate instruments Lambda invocations and ships the resulting spans to
//! an Amazon SQS queue through [`otlp_sqs_span_exporter`]. It classifies the
//! trigger event into OpenTelemetry semantic-convention attributes, tracks
//! cold starts, and flushes buffered spans before each invocation returns so
//! nothing is lost when the execution environment is frozen.
//!
//! # Features
//!
//! - **SQS Span Export**: OTLP-encoded spans delivered as SQS messages
//! - **Trigger Classification**: API Gateway, ALB, SQS, SNS, S3, DynamoDB,
//!   Kinesis, EventBridge and CloudWatch Logs event shapes recognized
//! - **Cold-Start Tracking**: `faas.coldstart` set once per execution
//!   environment, provisioned concurrency reported as warm
//! - **Automatic Resource Detection**: service and FaaS attributes from the
//!   Lambda environment
//!
//! # Architecture
//!
//! - [`telemetry`]: initialization and per-invocation flushing
//! - [`handler`]: function wrapper creating the invocation span
//! - [`classifier`]: event-shape recognition
//! - [`attributes`]: semantic-convention attribute mapping
//! - [`cold_start`]: cold-start state
//!
//! # Quick Start
//!
//! ```no_run
//! use lambda_otel_sqs::{init_telemetry, traced_handler, TelemetryConfig};
//! use lambda_runtime::{service_fn, Error, LambdaEvent};
//! use serde_json::Value;
//!
//! async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
//!     Ok(event.payload)
//! }
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
//!
//!     lambda_runtime::run(service_fn(|event| {
//!         traced_handler("my-handler", event, telemetry.clone(), handler)
//!     }))
//!     .await
//! }
//! ```

pub use otlp_sqs_span_exporter::{Compression, SqsSpanExporter};

pub mod attributes;
pub mod classifier;
pub mod cold_start;
pub mod constants;
pub mod handler;
pub mod telemetry;

pub use attributes::{build_attributes, set_invocation_attributes};
pub use classifier::{classify_event, AwsDataSource, TriggerClassification, TriggerType};
pub use cold_start::ColdStartTracker;
pub use handler::traced_handler;
pub use telemetry::{get_lambda_resource, init_telemetry, TelemetryConfig, TelemetryHandle};

#[cfg(doctest)]
#[macro_use]
extern crate doc_comment;

#[cfg(doctest)]
use doc_comment::doctest;

#[cfg(doctest)]
doctest!("../README.md", readme);
