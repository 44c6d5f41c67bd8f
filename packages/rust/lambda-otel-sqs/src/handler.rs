//! Handler wrapper that instruments each Lambda invocation.
//!
//! [`traced_handler`] wraps a handler function with a SERVER span covering
//! the whole invocation. The span carries the FaaS and trigger attributes
//! built by [`crate::attributes`], records success or failure on the span
//! status, and flushes the provider through the [`TelemetryHandle`] before
//! returning, whether the handler succeeded or not.
//!
//! # Example
//!
//! ```no_run
//! use lambda_otel_sqs::{init_telemetry, traced_handler, TelemetryConfig};
//! use lambda_runtime::{service_fn, Error, LambdaEvent};
//! use serde_json::Value;
//!
//! async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
//!     Ok(serde_json::json!({ "statusCode": 200 }))
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
//!     let func = service_fn(|event| {
//!         traced_handler("my-handler", event, telemetry.clone(), handler)
//!     });
//!     lambda_runtime::run(func).await
//! }
//! ```

use std::future::Future;

use lambda_runtime::{Error, LambdaEvent};
use opentelemetry::KeyValue;
use serde_json::Value;
use tracing::field::Empty;
use tracing::Instrument;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::attributes::set_invocation_attributes;
use crate::telemetry::TelemetryHandle;

/// Runs `handler_fn` inside a SERVER span for this invocation.
///
/// A failing handler sets an error status on the span and records an
/// exception event carrying the error message. Invocation attributes are
/// applied after the handler returns so that the cold-start flag and trigger
/// attributes are recorded even when the handler fails. The provider is
/// flushed before the result is returned to the runtime.
pub async fn traced_handler<R, F, Fut>(
    name: &'static str,
    event: LambdaEvent<Value>,
    telemetry: TelemetryHandle,
    handler_fn: F,
) -> Result<R, Error>
where
    R: Send + 'static,
    F: FnOnce(LambdaEvent<Value>) -> Fut,
    Fut: Future<Output = Result<R, Error>> + Send,
{
    let result = {
        let span = tracing::info_span!(
            parent: None,
            "handler",
            otel.name = Empty,
            otel.kind = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty,
            requestId = %event.context.request_id,
        );
        span.record("otel.name", name);
        span.record("otel.kind", "SERVER");

        // The handler consumes the event; keep what attribute mapping needs.
        let payload = event.payload.clone();
        let context = event.context.clone();

        let result = handler_fn(event).instrument(span.clone()).await;

        match &result {
            Ok(_) => span.set_status(opentelemetry::trace::Status::Ok),
            Err(error) => {
                span.set_status(opentelemetry::trace::Status::error(error.to_string()));
                span.add_event(
                    "exception",
                    vec![KeyValue::new("exception.message", error.to_string())],
                );
            }
        }

        // Runs on success and failure alike, like a finally block, so every
        // invocation span carries the FaaS attributes.
        set_invocation_attributes(&span, &payload, &context, telemetry.cold_start());

        result
    };

    telemetry.complete();
    result
}
