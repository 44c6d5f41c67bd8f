//! A span exporter that publishes OpenTelemetry spans to Amazon SQS in OTLP format.
//!
//! This crate provides an implementation of OpenTelemetry's [`SpanExporter`] that encodes
//! spans to the OTLP protobuf wire format and publishes them to an SQS queue, one message
//! per span. It is intended for AWS Lambda functions where a queue is used as the telemetry
//! transport instead of a direct OTLP endpoint.
//!
//! # Features
//!
//! - One SQS message body per span: base64 text of the OTLP protobuf bytes
//! - Optional gzip or deflate compression, configurable via the standard
//!   `OTEL_EXPORTER_OTLP_TRACES_COMPRESSION` / `OTEL_EXPORTER_OTLP_COMPRESSION` variables
//! - Batch sends capped at the SQS limit of 10 entries per request
//! - Sends run on the tokio runtime the exporter was built in, so the SDK's
//!   batch processor can poll export futures from its reactor-less worker thread
//! - Idempotent shutdown that releases the SQS client
//!
//! # Example
//!
//! ```rust,no_run
//! use opentelemetry::trace::{Tracer, TracerProvider};
//! use opentelemetry_sdk::trace::SdkTracerProvider;
//! use otlp_sqs_span_exporter::{sqs_batch_span_processor, SqsSpanExporter};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = aws_config::load_from_env().await;
//!     let client = aws_sdk_sqs::Client::new(&config);
//!
//!     let exporter = SqsSpanExporter::builder()
//!         .client(client)
//!         .queue_url("https://sqs.us-east-1.amazonaws.com/123456789012/traces".to_string())
//!         .build()
//!         .expect("invalid exporter configuration");
//!
//!     let processor = sqs_batch_span_processor(exporter, None)
//!         .expect("invalid batch configuration");
//!
//!     let provider = SdkTracerProvider::builder()
//!         .with_span_processor(processor)
//!         .build();
//!
//!     let tracer = provider.tracer("my-service");
//!     tracer.in_span("parent-operation", |_cx| {
//!         println!("Doing work...");
//!     });
//!
//!     let _ = provider.shutdown();
//! }
//! ```
//!
//! # Message format
//!
//! Each queue message body is the base64 encoding of a single-span OTLP
//! `ExportTraceServiceRequest`, optionally compressed before encoding. The batch entry id
//! is the span id when the span carries a valid context, otherwise a random UUID.

use async_trait::async_trait;
use aws_sdk_sqs::types::SendMessageBatchRequestEntry;
use futures_util::future::BoxFuture;
use opentelemetry_proto::transform::common::tonic::ResourceAttributesWithSchema;
use opentelemetry_sdk::resource::Resource;
use opentelemetry_sdk::{
    error::OTelSdkError,
    trace::{SpanData, SpanExporter},
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use uuid::Uuid;

mod compression;
mod constants;
mod processor;
mod serializer;

pub use compression::Compression;
pub use constants::{env_vars, limits::MAX_SQS_BATCH_SIZE};
pub use processor::sqs_batch_span_processor;
pub use serializer::SpanSerializer;

#[cfg(doctest)]
#[macro_use]
extern crate doc_comment;

#[cfg(doctest)]
use doc_comment::doctest;

#[cfg(doctest)]
doctest!("../README.md", readme);

/// Errors raised while constructing the exporter or its batch processor.
///
/// These are the only failures surfaced as errors to callers; transport
/// failures at export time are reported through the [`SpanExporter`] result.
#[derive(Debug, Error)]
pub enum ExporterBuildError {
    /// The configured compression scheme is not one of none/deflate/gzip.
    #[error("unsupported compression scheme: {0}")]
    UnsupportedCompression(String),

    /// The requested export batch size exceeds the SQS per-request limit.
    #[error("requested batch size {requested} exceeds the SQS batch limit of {limit}")]
    BatchSizeTooLarge { requested: usize, limit: usize },

    /// The exporter was built outside a tokio runtime.
    ///
    /// Queue sends are driven by that runtime because the batch processor
    /// polls export futures from a thread without a reactor.
    #[error("no tokio runtime available; the exporter must be constructed inside one")]
    NoRuntime,
}

/// A single entry of a queue batch send: a unique id paired with a message body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueBatchEntry {
    /// Identifier, unique within one batch.
    pub id: String,
    /// Serialized span message body.
    pub body: String,
}

/// Trait for the queue transport.
///
/// This trait defines the interface for submitting one batch of entries and for
/// releasing the underlying connection. It is implemented by the SQS-backed
/// transport and by the test capture transport.
#[async_trait]
trait QueueBatchSender: Send + Sync + std::fmt::Debug {
    /// Submits all entries as a single batch request.
    async fn send_batch(&self, entries: Vec<QueueBatchEntry>) -> Result<(), OTelSdkError>;

    /// Releases the underlying transport. Sends after this fail.
    fn close(&self);
}

/// SQS-backed transport wrapping an [`aws_sdk_sqs::Client`].
#[derive(Debug)]
struct SqsQueue {
    client: Mutex<Option<aws_sdk_sqs::Client>>,
    queue_url: String,
    // The batch processor polls export futures from its own thread, which
    // has no reactor; sends must run on the runtime that built the exporter.
    runtime: tokio::runtime::Handle,
}

impl SqsQueue {
    fn new(
        client: aws_sdk_sqs::Client,
        queue_url: String,
        runtime: tokio::runtime::Handle,
    ) -> Self {
        Self {
            client: Mutex::new(Some(client)),
            queue_url,
            runtime,
        }
    }
}

#[async_trait]
impl QueueBatchSender for SqsQueue {
    async fn send_batch(&self, entries: Vec<QueueBatchEntry>) -> Result<(), OTelSdkError> {
        // Clone the client handle out of the lock; the send must not hold it.
        let client = {
            let guard = self.client.lock().map_err(|_| {
                OTelSdkError::InternalFailure("queue client lock poisoned".to_string())
            })?;
            guard.clone().ok_or(OTelSdkError::AlreadyShutdown)?
        };

        let mut batch = Vec::with_capacity(entries.len());
        for entry in entries {
            let request_entry = SendMessageBatchRequestEntry::builder()
                .id(entry.id)
                .message_body(entry.body)
                .build()
                .map_err(|e| {
                    OTelSdkError::InternalFailure(format!("invalid batch entry: {e}"))
                })?;
            batch.push(request_entry);
        }

        let queue_url = self.queue_url.clone();
        let send = self.runtime.spawn(async move {
            client
                .send_message_batch()
                .queue_url(queue_url)
                .set_entries(Some(batch))
                .send()
                .await
        });

        match send.await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(e)) => Err(OTelSdkError::InternalFailure(format!(
                "SendMessageBatch failed: {e}"
            ))),
            Err(e) => Err(OTelSdkError::InternalFailure(format!(
                "send task aborted: {e}"
            ))),
        }
    }

    fn close(&self) {
        if let Ok(mut guard) = self.client.lock() {
            guard.take();
        }
    }
}

/// Test transport that captures batches and counts close calls.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct TestQueue {
    batches: Mutex<Vec<Vec<QueueBatchEntry>>>,
    close_count: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl TestQueue {
    pub(crate) fn batches(&self) -> Vec<Vec<QueueBatchEntry>> {
        self.batches.lock().unwrap().clone()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.close_count.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
#[async_trait]
impl QueueBatchSender for TestQueue {
    async fn send_batch(&self, entries: Vec<QueueBatchEntry>) -> Result<(), OTelSdkError> {
        self.batches.lock().unwrap().push(entries);
        Ok(())
    }

    fn close(&self) {
        self.close_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// A span exporter that publishes spans to an SQS queue.
///
/// Each span in an export batch is serialized to its own message body and the
/// whole batch is submitted as one `SendMessageBatch` request. The exporter
/// never raises on transport errors; they are logged and reported through the
/// export result so span export cannot crash the instrumented function.
///
/// # Example
///
/// ```rust,no_run
/// use otlp_sqs_span_exporter::{Compression, SqsSpanExporter};
///
/// # async fn example() {
/// let config = aws_config::load_from_env().await;
/// let client = aws_sdk_sqs::Client::new(&config);
///
/// let exporter = SqsSpanExporter::builder()
///     .client(client)
///     .queue_url("https://sqs.us-east-1.amazonaws.com/123456789012/traces".to_string())
///     .compression(Compression::Gzip)
///     .build()
///     .expect("invalid exporter configuration");
/// # }
/// ```
#[derive(Debug)]
pub struct SqsSpanExporter {
    /// Serializer holding the configured compression scheme
    serializer: SpanSerializer,
    /// Optional resource to be included with all spans
    resource: Option<Resource>,
    /// Queue transport (SQS client or test capture)
    queue: Arc<dyn QueueBatchSender>,
    /// One-way shutdown flag, shared with in-flight export futures
    is_shutdown: Arc<AtomicBool>,
}

#[bon::bon]
impl SqsSpanExporter {
    /// Creates a new exporter for the given SQS client and queue URL.
    ///
    /// When no compression is given it is resolved from the environment; an
    /// unrecognized value fails construction rather than silently defaulting.
    ///
    /// Must be called inside a tokio runtime: the exporter keeps a handle to
    /// it and runs every queue send there, since the batch processor polls
    /// export futures from a plain thread.
    #[builder]
    pub fn new(
        client: aws_sdk_sqs::Client,
        queue_url: String,
        compression: Option<Compression>,
    ) -> Result<Self, ExporterBuildError> {
        let compression = match compression {
            Some(compression) => compression,
            None => Compression::from_env()?,
        };
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|_| ExporterBuildError::NoRuntime)?;

        Ok(Self {
            serializer: SpanSerializer::new(compression),
            resource: None,
            queue: Arc::new(SqsQueue::new(client, queue_url, runtime)),
            is_shutdown: Arc::new(AtomicBool::new(false)),
        })
    }
}

impl SqsSpanExporter {
    #[cfg(test)]
    pub(crate) fn with_test_queue(compression: Compression) -> (Self, Arc<TestQueue>) {
        let queue = Arc::new(TestQueue::default());
        let exporter = Self {
            serializer: SpanSerializer::new(compression),
            resource: None,
            queue: queue.clone() as Arc<dyn QueueBatchSender>,
            is_shutdown: Arc::new(AtomicBool::new(false)),
        };
        (exporter, queue)
    }

    fn batch_entry_id(span: &SpanData) -> String {
        if span.span_context.is_valid() {
            span.span_context.span_id().to_string()
        } else {
            Uuid::new_v4().simple().to_string()
        }
    }
}

impl SpanExporter for SqsSpanExporter {
    /// Export spans to the queue as one batch of single-span messages.
    ///
    /// Serialization happens synchronously; the returned future performs the
    /// queue send. After shutdown the future resolves to an error without
    /// touching the network.
    fn export(&self, batch: Vec<SpanData>) -> BoxFuture<'static, Result<(), OTelSdkError>> {
        if self.is_shutdown.load(Ordering::SeqCst) {
            log::warn!("exporter already shutdown, ignoring batch");
            return Box::pin(std::future::ready(Err(OTelSdkError::AlreadyShutdown)));
        }

        let entries = (|| {
            let resource = self
                .resource
                .clone()
                .unwrap_or_else(|| Resource::builder_empty().build());
            let resource_attrs = ResourceAttributesWithSchema::from(&resource);

            let mut entries = Vec::with_capacity(batch.len());
            for span in batch {
                let id = Self::batch_entry_id(&span);
                let body = self.serializer.serialize(vec![span], &resource_attrs)?;
                entries.push(QueueBatchEntry { id, body });
            }
            Ok(entries)
        })();

        let queue = Arc::clone(&self.queue);
        let is_shutdown = Arc::clone(&self.is_shutdown);

        Box::pin(async move {
            let entries: Vec<QueueBatchEntry> = entries?;
            if entries.is_empty() {
                return Ok(());
            }

            // Re-check right before the network call so a racing shutdown
            // cannot send through a closed transport.
            if is_shutdown.load(Ordering::SeqCst) {
                log::warn!(
                    "exporter shut down before batch could be sent, dropping {} spans",
                    entries.len()
                );
                return Err(OTelSdkError::AlreadyShutdown);
            }

            match queue.send_batch(entries).await {
                Ok(()) => Ok(()),
                Err(e) => {
                    log::error!("unexpected error exporting spans: {e}");
                    Err(e)
                }
            }
        })
    }

    /// Shuts down the exporter and releases the queue client.
    ///
    /// The first call transitions the exporter to its terminal state and closes
    /// the transport; later calls log a warning and do nothing.
    fn shutdown(&mut self) -> Result<(), OTelSdkError> {
        if self.is_shutdown.swap(true, Ordering::SeqCst) {
            log::warn!("exporter already shutdown, ignoring call");
            return Ok(());
        }

        self.queue.close();
        Ok(())
    }

    /// Force flushes any pending spans.
    ///
    /// Nothing is buffered in this exporter, so this always succeeds.
    fn force_flush(&mut self) -> Result<(), OTelSdkError> {
        Ok(())
    }

    /// Sets the resource included with every exported span.
    fn set_resource(&mut self, resource: &opentelemetry_sdk::Resource) {
        self.resource = Some(resource.clone());
    }
}
