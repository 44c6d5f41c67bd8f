//! Conversion of finished spans into SQS message bodies.
//!
//! Spans are grouped into an OTLP `ExportTraceServiceRequest`, encoded to
//! protobuf, compressed according to the configured scheme, and base64
//! encoded with the standard `+/` alphabet so the result is a valid SQS
//! message body. Serialization is pure: same spans, resource and scheme
//! always produce the same string.

use base64::{engine::general_purpose, Engine as Base64Engine};
use opentelemetry_proto::tonic::collector::trace::v1::ExportTraceServiceRequest;
use opentelemetry_proto::transform::common::tonic::ResourceAttributesWithSchema;
use opentelemetry_proto::transform::trace::tonic::group_spans_by_resource_and_scope;
use opentelemetry_sdk::error::OTelSdkError;
use opentelemetry_sdk::trace::SpanData;
use prost::Message;

use crate::Compression;

/// Serializes spans to base64 text of (optionally compressed) OTLP protobuf.
#[derive(Debug, Clone)]
pub struct SpanSerializer {
    compression: Compression,
}

impl SpanSerializer {
    /// Creates a serializer with a fixed compression scheme.
    pub fn new(compression: Compression) -> Self {
        Self { compression }
    }

    /// The scheme this serializer applies.
    pub fn compression(&self) -> Compression {
        self.compression
    }

    /// Serializes `spans` into a single message body.
    pub fn serialize(
        &self,
        spans: Vec<SpanData>,
        resource: &ResourceAttributesWithSchema,
    ) -> Result<String, OTelSdkError> {
        let resource_spans = group_spans_by_resource_and_scope(spans, resource);
        let request = ExportTraceServiceRequest { resource_spans };
        let payload = request.encode_to_vec();

        let compressed = self
            .compression
            .compress(payload)
            .map_err(|e| OTelSdkError::InternalFailure(format!("compression failed: {e}")))?;

        Ok(general_purpose::STANDARD.encode(compressed))
    }
}
