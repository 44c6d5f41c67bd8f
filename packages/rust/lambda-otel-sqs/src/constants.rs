//! Constants for the lambda-otel-sqs package.
//!
//! This file centralizes all constants to ensure consistency across the codebase
//! and provide a single source of truth for configuration parameters.

/// Environment variable names for configuration.
pub mod env_vars {
    /// How the Lambda execution environment was initialized
    /// ("on-demand", "provisioned-concurrency" or "snap-start").
    pub const LAMBDA_INITIALIZATION_TYPE: &str = "AWS_LAMBDA_INITIALIZATION_TYPE";

    /// AWS Lambda function name.
    pub const AWS_LAMBDA_FUNCTION_NAME: &str = "AWS_LAMBDA_FUNCTION_NAME";

    /// Service name for telemetry.
    pub const SERVICE_NAME: &str = "OTEL_SERVICE_NAME";

    /// AWS region of the execution environment.
    pub const AWS_REGION: &str = "AWS_REGION";

    /// AWS Lambda function version.
    pub const AWS_LAMBDA_FUNCTION_VERSION: &str = "AWS_LAMBDA_FUNCTION_VERSION";

    /// Configured memory size in megabytes.
    pub const AWS_LAMBDA_FUNCTION_MEMORY_SIZE: &str = "AWS_LAMBDA_FUNCTION_MEMORY_SIZE";

    /// CloudWatch log stream of the current execution environment.
    pub const AWS_LAMBDA_LOG_STREAM_NAME: &str = "AWS_LAMBDA_LOG_STREAM_NAME";

    /// Lambda-managed log level, used for the subscriber filter when
    /// `RUST_LOG` is not set.
    pub const AWS_LAMBDA_LOG_LEVEL: &str = "AWS_LAMBDA_LOG_LEVEL";
}

/// Well-known values inspected in events and environment variables.
pub mod values {
    /// Initialization type that disables cold-start reporting.
    pub const PROVISIONED_CONCURRENCY: &str = "provisioned-concurrency";

    /// EventBridge detail-type emitted by scheduled rules.
    pub const SCHEDULED_EVENT: &str = "Scheduled Event";
}
