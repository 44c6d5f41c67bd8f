//! Constants for the otlp-sqs-span-exporter package.
//!
//! This file centralizes all constants to ensure consistency across the codebase
//! and provide a single source of truth for configuration parameters.

/// Environment variable names for configuration.
pub mod env_vars {
    /// Compression for OTLP trace export (takes precedence over OTLP_COMPRESSION).
    pub const OTLP_TRACES_COMPRESSION: &str = "OTEL_EXPORTER_OTLP_TRACES_COMPRESSION";

    /// Global compression for OTLP export.
    pub const OTLP_COMPRESSION: &str = "OTEL_EXPORTER_OTLP_COMPRESSION";
}

/// Default values for configuration parameters.
pub mod defaults {
    use crate::Compression;

    /// Default compression scheme when none is configured.
    pub const COMPRESSION: Compression = Compression::None;
}

/// Limits imposed by the SQS transport.
pub mod limits {
    /// Maximum number of entries accepted by a single `SendMessageBatch` request.
    pub const MAX_SQS_BATCH_SIZE: usize = 10;
}
