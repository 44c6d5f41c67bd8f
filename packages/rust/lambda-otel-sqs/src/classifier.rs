//! Event-source classification for Lambda trigger payloads.
//!
//! Lambda hands every trigger to the handler as an opaque JSON document whose
//! shape depends on the invoking service. This module inspects that shape and
//! maps it to a closed pair of enums: the concrete AWS data source and the
//! abstract trigger category used for the `faas.trigger` attribute.
//!
//! Classification is total and deterministic: every input maps to a result,
//! with unrecognized shapes falling back to [`AwsDataSource::Other`] rather
//! than failing. For batched events only the first record is inspected; a
//! mixed-source batch is classified by its first record. This is a deliberate
//! simplification.

use serde_json::Value;
use std::fmt::{self, Display};

use crate::constants::values;

/// The AWS service whose event shape triggered the invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwsDataSource {
    /// API Gateway REST API (v1 proxy events)
    ApiGateway,
    /// API Gateway HTTP API (v2 events)
    HttpApi,
    /// Application Load Balancer target group
    Elb,
    /// SQS queue
    Sqs,
    /// SNS topic
    Sns,
    /// S3 bucket notification
    S3,
    /// DynamoDB stream
    DynamoDb,
    /// Kinesis stream
    Kinesis,
    /// EventBridge rule
    EventBridge,
    /// CloudWatch Logs subscription
    CloudWatchLogs,
    /// Unrecognized event shape
    Other,
}

impl Display for AwsDataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AwsDataSource::ApiGateway => write!(f, "aws.api_gateway"),
            AwsDataSource::HttpApi => write!(f, "aws.http_api"),
            AwsDataSource::Elb => write!(f, "aws.elb"),
            AwsDataSource::Sqs => write!(f, "aws.sqs"),
            AwsDataSource::Sns => write!(f, "aws.sns"),
            AwsDataSource::S3 => write!(f, "aws.s3"),
            AwsDataSource::DynamoDb => write!(f, "aws.dynamodb"),
            AwsDataSource::Kinesis => write!(f, "aws.kinesis"),
            AwsDataSource::EventBridge => write!(f, "aws.event_bridge"),
            AwsDataSource::CloudWatchLogs => write!(f, "aws.cloudwatch_logs"),
            AwsDataSource::Other => write!(f, "aws.other"),
        }
    }
}

/// Common trigger types for Lambda functions.
///
/// These variants follow OpenTelemetry semantic conventions:
/// - `Datasource`: Database/storage triggers
/// - `Http`: HTTP/API triggers
/// - `PubSub`: Message/event triggers
/// - `Timer`: Schedule/cron triggers
/// - `Other`: Fallback for unknown types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TriggerType {
    /// Database trigger
    Datasource,
    /// HTTP/API trigger
    Http,
    /// Message/event trigger
    PubSub,
    /// Schedule/cron trigger
    Timer,
    /// Other/unknown trigger
    #[default]
    Other,
}

impl Display for TriggerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TriggerType::Datasource => write!(f, "datasource"),
            TriggerType::Http => write!(f, "http"),
            TriggerType::PubSub => write!(f, "pubsub"),
            TriggerType::Timer => write!(f, "timer"),
            TriggerType::Other => write!(f, "other"),
        }
    }
}

/// Result of classifying one trigger event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerClassification {
    /// Concrete AWS service recognized from the event shape.
    pub data_source: AwsDataSource,
    /// Abstract trigger category for the `faas.trigger` attribute.
    pub trigger: TriggerType,
}

/// Classifies a trigger event by its shape.
///
/// Checks run in a fixed order because some shapes could structurally
/// overlap: HTTP request contexts first, then EventBridge envelopes, then
/// record batches, then CloudWatch Logs payloads.
pub fn classify_event(event: &Value) -> TriggerClassification {
    // HTTP triggers
    if let Some(request_context) = event.get("requestContext") {
        if request_context.get("apiId").is_some() {
            return TriggerClassification {
                data_source: AwsDataSource::ApiGateway,
                trigger: TriggerType::Http,
            };
        }
        if request_context.get("http").is_some() {
            return TriggerClassification {
                data_source: AwsDataSource::HttpApi,
                trigger: TriggerType::Http,
            };
        }
        if request_context.get("elb").is_some() {
            return TriggerClassification {
                data_source: AwsDataSource::Elb,
                trigger: TriggerType::Http,
            };
        }
    }

    // EventBridge
    if event.get("source").is_some() {
        if let Some(detail_type) = event.get("detail-type") {
            let trigger = if detail_type.as_str() == Some(values::SCHEDULED_EVENT) {
                TriggerType::Timer
            } else {
                TriggerType::PubSub
            };
            return TriggerClassification {
                data_source: AwsDataSource::EventBridge,
                trigger,
            };
        }
    }

    // SNS/SQS/S3/DynamoDB/Kinesis record batches
    if let Some(records) = event.get("Records").and_then(Value::as_array) {
        if let Some(record) = records.first() {
            let event_source = record.get("eventSource").and_then(Value::as_str);
            let recognized = match event_source {
                Some("aws:sns") => Some((AwsDataSource::Sns, TriggerType::PubSub)),
                Some("aws:sqs") => Some((AwsDataSource::Sqs, TriggerType::PubSub)),
                Some("aws:s3") => Some((AwsDataSource::S3, TriggerType::Datasource)),
                Some("aws:dynamodb") => Some((AwsDataSource::DynamoDb, TriggerType::Datasource)),
                Some("aws:kinesis") => Some((AwsDataSource::Kinesis, TriggerType::Datasource)),
                _ => None,
            };
            if let Some((data_source, trigger)) = recognized {
                return TriggerClassification {
                    data_source,
                    trigger,
                };
            }
        }
    }

    // CloudWatch Logs
    if let Some(awslogs) = event.get("awslogs") {
        if awslogs.get("data").is_some() {
            return TriggerClassification {
                data_source: AwsDataSource::CloudWatchLogs,
                trigger: TriggerType::Datasource,
            };
        }
    }

    TriggerClassification {
        data_source: AwsDataSource::Other,
        trigger: TriggerType::Other,
    }
}
