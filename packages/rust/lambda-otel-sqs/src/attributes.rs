//! Semantic-convention attributes for Lambda invocation spans.
//!
//! Builds the FaaS resource attributes shared by every invocation plus a
//! trigger-specific set (HTTP request attributes for API Gateway and ALB
//! events, messaging attributes for SQS batches). Values are pulled straight
//! from the raw event JSON and the runtime [`Context`]; missing fields map to
//! empty strings or zero so attribute extraction never fails an invocation.

use lambda_runtime::Context;
use opentelemetry::KeyValue;
use serde_json::Value;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::classifier::{classify_event, AwsDataSource};
use crate::cold_start::ColdStartTracker;

/// Builds the attribute sets for one invocation, one or two of them.
///
/// The first set applies to every invocation. A second, trigger-specific set
/// is present only for data sources with a dedicated attribute mapping (HTTP
/// request contexts and SQS batches).
pub fn build_attributes(
    event: &Value,
    context: &Context,
    cold_start: &ColdStartTracker,
) -> Vec<Vec<KeyValue>> {
    let classification = classify_event(event);

    let region = context
        .invoked_function_arn
        .split(':')
        .nth(3)
        .unwrap_or_default();

    let general = vec![
        KeyValue::new("faas.invocation_id", context.request_id.clone()),
        KeyValue::new(
            "faas.invoked_name",
            context.env_config.function_name.clone(),
        ),
        KeyValue::new("faas.invoked_region", region.to_string()),
        KeyValue::new("faas.invoked_provider", "aws"),
        KeyValue::new("faas.max_memory", context.env_config.memory as i64),
        KeyValue::new("faas.version", context.env_config.version.clone()),
        KeyValue::new("faas.coldstart", cold_start.check_cold_start()),
        KeyValue::new("faas.trigger", classification.trigger.to_string()),
        KeyValue::new("cloud.resource_id", context.invoked_function_arn.clone()),
    ];

    let specific = match classification.data_source {
        AwsDataSource::ApiGateway | AwsDataSource::HttpApi | AwsDataSource::Elb => {
            http_attributes(event)
        }
        AwsDataSource::Sqs => sqs_attributes(event),
        AwsDataSource::Sns
        | AwsDataSource::S3
        | AwsDataSource::DynamoDb
        | AwsDataSource::Kinesis
        | AwsDataSource::EventBridge
        | AwsDataSource::CloudWatchLogs
        | AwsDataSource::Other => Vec::new(),
    };

    let mut sets = vec![general];
    if !specific.is_empty() {
        sets.push(specific);
    }
    sets
}

/// Applies all attributes for this invocation to `span`.
pub fn set_invocation_attributes(
    span: &Span,
    event: &Value,
    context: &Context,
    cold_start: &ColdStartTracker,
) {
    for set in build_attributes(event, context, cold_start) {
        for kv in set {
            span.set_attribute(kv.key, kv.value);
        }
    }
}

fn event_str<'a>(event: &'a Value, key: &str) -> &'a str {
    event.get(key).and_then(Value::as_str).unwrap_or_default()
}

fn http_attributes(event: &Value) -> Vec<KeyValue> {
    let body_size = event
        .get("body")
        .and_then(Value::as_str)
        .map(|body| body.len() as i64)
        .unwrap_or(0);

    let protocol = event
        .get("requestContext")
        .and_then(|rc| rc.get("protocol"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let (protocol_name, protocol_version) = split_protocol(protocol);

    let user_agent = event
        .get("headers")
        .and_then(|headers| headers.get("User-Agent"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    vec![
        KeyValue::new("http.request.method", event_str(event, "httpMethod").to_string()),
        KeyValue::new("http.route", event_str(event, "resource").to_string()),
        KeyValue::new("url.full", event_str(event, "path").to_string()),
        KeyValue::new("http.request.body.size", body_size),
        KeyValue::new("network.protocol.name", protocol_name),
        KeyValue::new("network.protocol.version", protocol_version),
        KeyValue::new("user_agent.original", user_agent.to_string()),
    ]
}

// "HTTP/1.1" splits into ("HTTP", "1.1"); a value with no slash is used
// as both name and version.
fn split_protocol(protocol: &str) -> (String, String) {
    match protocol.split_once('/') {
        Some((name, _)) => {
            let version = protocol.rsplit('/').next().unwrap_or(protocol);
            (name.to_string(), version.to_string())
        }
        None => (protocol.to_string(), protocol.to_string()),
    }
}

fn sqs_attributes(event: &Value) -> Vec<KeyValue> {
    let records = event
        .get("Records")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    let source_arn = records
        .first()
        .and_then(|record| record.get("eventSourceARN"))
        .and_then(Value::as_str)
        .unwrap_or_default();

    // The queue name is the last ARN segment, e.g.
    // arn:aws:sqs:us-east-1:123456789012:MyQueue -> MyQueue
    let queue_name = source_arn.rsplit(':').next().unwrap_or_default();

    vec![
        KeyValue::new("messaging.system", "aws.sqs"),
        KeyValue::new("messaging.operation", "receive"),
        KeyValue::new("messaging.batch.message_count", records.len() as i64),
        KeyValue::new("messaging.destination.name", queue_name.to_string()),
        KeyValue::new("cloud.resource_id", source_arn.to_string()),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use lambda_runtime::Config;
    use opentelemetry::Value as OtelValue;
    use serde_json::json;
    use std::sync::Arc;

    fn test_context() -> Context {
        let mut config = Config::default();
        config.function_name = "my-function".to_string();
        config.memory = 256;
        config.version = "$LATEST".to_string();

        let mut context = Context::default();
        context.request_id = "test-request-id".to_string();
        context.invoked_function_arn =
            "arn:aws:lambda:us-east-1:123456789012:function:my-function".to_string();
        context.env_config = Arc::new(config);
        context
    }

    fn find<'a>(set: &'a [KeyValue], key: &str) -> &'a OtelValue {
        &set.iter()
            .find(|kv| kv.key.as_str() == key)
            .unwrap_or_else(|| panic!("missing attribute {key}"))
            .value
    }

    fn as_string(value: &OtelValue) -> String {
        match value {
            OtelValue::String(s) => s.to_string(),
            other => panic!("expected string value, got {other:?}"),
        }
    }

    fn as_i64(value: &OtelValue) -> i64 {
        match value {
            OtelValue::I64(n) => *n,
            other => panic!("expected i64 value, got {other:?}"),
        }
    }

    #[test]
    fn test_general_attributes_from_context() {
        let tracker = ColdStartTracker::new();
        let sets = build_attributes(&json!({}), &test_context(), &tracker);
        assert_eq!(sets.len(), 1);

        let general = &sets[0];
        assert_eq!(as_string(find(general, "faas.invocation_id")), "test-request-id");
        assert_eq!(as_string(find(general, "faas.invoked_name")), "my-function");
        assert_eq!(as_string(find(general, "faas.invoked_region")), "us-east-1");
        assert_eq!(as_string(find(general, "faas.invoked_provider")), "aws");
        assert_eq!(as_i64(find(general, "faas.max_memory")), 256);
        assert_eq!(as_string(find(general, "faas.version")), "$LATEST");
        assert_eq!(as_string(find(general, "faas.trigger")), "other");
        assert_eq!(
            as_string(find(general, "cloud.resource_id")),
            "arn:aws:lambda:us-east-1:123456789012:function:my-function"
        );
    }

    #[test]
    fn test_coldstart_attribute_flips_after_first_call() {
        let tracker = ColdStartTracker::new();
        let context = test_context();
        let event = json!({});

        let first = build_attributes(&event, &context, &tracker);
        assert_eq!(find(&first[0], "faas.coldstart"), &OtelValue::Bool(true));

        let second = build_attributes(&event, &context, &tracker);
        assert_eq!(find(&second[0], "faas.coldstart"), &OtelValue::Bool(false));
    }

    #[test]
    fn test_malformed_arn_yields_empty_region() {
        let tracker = ColdStartTracker::new();
        let mut context = test_context();
        context.invoked_function_arn = "not-an-arn".to_string();

        let sets = build_attributes(&json!({}), &context, &tracker);
        assert_eq!(as_string(find(&sets[0], "faas.invoked_region")), "");
    }

    #[test]
    fn test_api_gateway_http_attributes() {
        let event = json!({
            "httpMethod": "POST",
            "resource": "/{proxy+}",
            "path": "/path/to/resource",
            "body": "eyJ0ZXN0IjoiYm9keSJ9",
            "headers": {"User-Agent": "Custom User Agent String"},
            "requestContext": {
                "apiId": "1234567890",
                "protocol": "HTTP/1.1"
            }
        });

        let sets = build_attributes(&event, &test_context(), &ColdStartTracker::new());
        assert_eq!(as_string(find(&sets[0], "faas.trigger")), "http");

        let http = &sets[1];
        assert_eq!(as_string(find(http, "http.request.method")), "POST");
        assert_eq!(as_string(find(http, "http.route")), "/{proxy+}");
        assert_eq!(as_string(find(http, "url.full")), "/path/to/resource");
        assert_eq!(as_i64(find(http, "http.request.body.size")), 20);
        assert_eq!(as_string(find(http, "network.protocol.name")), "HTTP");
        assert_eq!(as_string(find(http, "network.protocol.version")), "1.1");
        assert_eq!(
            as_string(find(http, "user_agent.original")),
            "Custom User Agent String"
        );
    }

    #[test]
    fn test_http_attributes_default_when_fields_missing() {
        let event = json!({"requestContext": {"apiId": "1234567890"}});
        let sets = build_attributes(&event, &test_context(), &ColdStartTracker::new());

        let http = &sets[1];
        assert_eq!(as_string(find(http, "http.request.method")), "");
        assert_eq!(as_string(find(http, "http.route")), "");
        assert_eq!(as_string(find(http, "url.full")), "");
        assert_eq!(as_i64(find(http, "http.request.body.size")), 0);
        assert_eq!(as_string(find(http, "network.protocol.name")), "");
        assert_eq!(as_string(find(http, "network.protocol.version")), "");
        assert_eq!(as_string(find(http, "user_agent.original")), "");
    }

    #[test]
    fn test_protocol_without_slash_is_both_name_and_version() {
        assert_eq!(
            split_protocol("SPDY"),
            ("SPDY".to_string(), "SPDY".to_string())
        );
    }

    #[test]
    fn test_sqs_messaging_attributes() {
        let event = json!({
            "Records": [
                {
                    "eventSource": "aws:sqs",
                    "eventSourceARN": "arn:aws:sqs:us-east-1:123456789012:MyQueue"
                },
                {
                    "eventSource": "aws:sqs",
                    "eventSourceARN": "arn:aws:sqs:us-east-1:123456789012:MyQueue"
                }
            ]
        });

        let sets = build_attributes(&event, &test_context(), &ColdStartTracker::new());
        assert_eq!(as_string(find(&sets[0], "faas.trigger")), "pubsub");

        let sqs = &sets[1];
        assert_eq!(as_string(find(sqs, "messaging.system")), "aws.sqs");
        assert_eq!(as_string(find(sqs, "messaging.operation")), "receive");
        assert_eq!(as_i64(find(sqs, "messaging.batch.message_count")), 2);
        assert_eq!(as_string(find(sqs, "messaging.destination.name")), "MyQueue");
        assert_eq!(
            as_string(find(sqs, "cloud.resource_id")),
            "arn:aws:sqs:us-east-1:123456789012:MyQueue"
        );
    }

    #[test]
    fn test_sqs_attributes_tolerate_missing_arn() {
        let event = json!({"Records": [{"eventSource": "aws:sqs"}]});
        let sets = build_attributes(&event, &test_context(), &ColdStartTracker::new());

        let sqs = &sets[1];
        assert_eq!(as_i64(find(sqs, "messaging.batch.message_count")), 1);
        assert_eq!(as_string(find(sqs, "messaging.destination.name")), "");
        assert_eq!(as_string(find(sqs, "cloud.resource_id")), "");
    }

    #[test]
    fn test_unmapped_sources_yield_only_the_general_set() {
        let events = [
            json!({"Records": [{"eventSource": "aws:sns"}]}),
            json!({"source": "my.app", "detail-type": "Order Placed"}),
            json!({"awslogs": {"data": "H4sIAAAA"}}),
            json!({}),
        ];
        for event in events {
            let sets = build_attributes(&event, &test_context(), &ColdStartTracker::new());
            assert_eq!(sets.len(), 1, "expected a single set for {event}");
        }
    }

    #[test]
    fn test_mapped_sources_yield_two_sets() {
        let http = json!({"requestContext": {"apiId": "abc123"}});
        let sqs = json!({"Records": [{"eventSource": "aws:sqs"}]});
        for event in [http, sqs] {
            let sets = build_attributes(&event, &test_context(), &ColdStartTracker::new());
            assert_eq!(sets.len(), 2, "expected two sets for {event}");
        }
    }
}
