//! Batch processor construction constrained to SQS limits.
//!
//! `SendMessageBatch` accepts at most 10 entries per request, so the generic
//! [`BatchSpanProcessor`] must never be configured with a larger export batch
//! size. This module owns that invariant; scheduling and buffering stay with
//! the SDK processor.

use opentelemetry_sdk::trace::{BatchConfigBuilder, BatchSpanProcessor, SpanExporter};

use crate::constants::limits::MAX_SQS_BATCH_SIZE;
use crate::ExporterBuildError;

/// Builds a [`BatchSpanProcessor`] capped at the SQS batch limit.
///
/// When `max_export_batch_size` is `None` the limit itself (10) is used.
/// Requesting a larger size is a configuration error and fails construction.
///
/// # Example
///
/// ```rust,no_run
/// use otlp_sqs_span_exporter::{sqs_batch_span_processor, SqsSpanExporter};
///
/// # async fn example() {
/// let config = aws_config::load_from_env().await;
/// let client = aws_sdk_sqs::Client::new(&config);
/// let exporter = SqsSpanExporter::builder()
///     .client(client)
///     .queue_url("https://sqs.us-east-1.amazonaws.com/123456789012/traces".to_string())
///     .build()
///     .unwrap();
///
/// let processor = sqs_batch_span_processor(exporter, Some(5)).unwrap();
/// # }
/// ```
pub fn sqs_batch_span_processor<E>(
    exporter: E,
    max_export_batch_size: Option<usize>,
) -> Result<BatchSpanProcessor, ExporterBuildError>
where
    E: SpanExporter + 'static,
{
    let batch_size = max_export_batch_size.unwrap_or(MAX_SQS_BATCH_SIZE);
    if batch_size > MAX_SQS_BATCH_SIZE {
        return Err(ExporterBuildError::BatchSizeTooLarge {
            requested: batch_size,
            limit: MAX_SQS_BATCH_SIZE,
        });
    }

    let config = BatchConfigBuilder::default()
        .with_max_export_batch_size(batch_size)
        .build();

    Ok(BatchSpanProcessor::builder(exporter)
        .with_batch_config(config)
        .build())
}
