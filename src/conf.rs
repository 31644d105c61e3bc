//! Defines configuration as read from the environment.

use serde::Deserialize;

/// Default `otel_service_name` value.
fn default_service_name() -> String {
    String::from("OTel-POC-project")
}

/// Default `otlp_traces_endpoint` value.
fn default_traces_endpoint() -> String {
    String::from("https://otlp.nr-data.net:4317")
}

/// Default `otlp_metrics_endpoint` value.
fn default_metrics_endpoint() -> String {
    String::from("https://otlp.nr-data.net:4317/v1/metrics")
}

/// Default `otlp_metrics_interval_ms` value.
fn default_metrics_interval_ms() -> u64 {
    60_000
}

/// Default `aws_lambda_function_name` value.
fn default_function_name() -> String {
    String::from("ote-poc-v3")
}

/// The bridge drains a queue into a table and reports telemetry to an
/// OTLP backend. The configuration must be given as environment
/// variables.
#[derive(Clone, Deserialize)]
pub struct Settings {
    /// The key sent as the `api-key` header with every telemetry
    /// export.
    pub newrelic_api_key: String,

    /// The DynamoDB table that receives the message payloads.
    pub db_table_name: String,

    /// The URL of the SQS queue that is polled for messages.
    pub sqs_url: String,

    /// The `service.name` attached to every exported span and metric.
    #[serde(default = "default_service_name")]
    pub otel_service_name: String,

    /// Where spans are exported to, using OTLP over gRPC.
    #[serde(default = "default_traces_endpoint")]
    pub otlp_traces_endpoint: String,

    /// Where metrics are exported to, using OTLP over HTTP.
    #[serde(default = "default_metrics_endpoint")]
    pub otlp_metrics_endpoint: String,

    /// How often accumulated metrics are exported, in milliseconds.
    #[serde(default = "default_metrics_interval_ms")]
    pub otlp_metrics_interval_ms: u64,

    /// The function name reported on the root span. Lambda populates
    /// this variable for every function.
    #[serde(default = "default_function_name")]
    pub aws_lambda_function_name: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("newrelic_api_key", &"<redacted>")
            .field("db_table_name", &self.db_table_name)
            .field("sqs_url", &self.sqs_url)
            .field("otel_service_name", &self.otel_service_name)
            .field("otlp_traces_endpoint", &self.otlp_traces_endpoint)
            .field("otlp_metrics_endpoint", &self.otlp_metrics_endpoint)
            .field("otlp_metrics_interval_ms", &self.otlp_metrics_interval_ms)
            .field("aws_lambda_function_name", &self.aws_lambda_function_name)
            .finish()
    }
}

/// Read the settings from the process environment.
pub fn from_env() -> anyhow::Result<Settings> {
    envy::from_env().map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn required_values_and_defaults() {
        let settings: Settings = envy::from_iter(vars(&[
            ("NEWRELIC_API_KEY", "secret"),
            ("DB_TABLE_NAME", "records"),
            ("SQS_URL", "https://sqs.us-east-1.amazonaws.com/1/in"),
        ]))
        .unwrap();
        assert_eq!(settings.db_table_name, "records");
        assert_eq!(settings.sqs_url, "https://sqs.us-east-1.amazonaws.com/1/in");
        assert_eq!(settings.otel_service_name, "OTel-POC-project");
        assert_eq!(settings.otlp_traces_endpoint, "https://otlp.nr-data.net:4317");
        assert_eq!(settings.otlp_metrics_interval_ms, 60_000);
        assert_eq!(settings.aws_lambda_function_name, "ote-poc-v3");
    }

    #[test]
    fn missing_table_is_rejected() {
        let result: Result<Settings, _> = envy::from_iter(vars(&[
            ("NEWRELIC_API_KEY", "secret"),
            ("SQS_URL", "https://sqs.us-east-1.amazonaws.com/1/in"),
        ]));
        let message = result.err().unwrap().to_string();
        assert!(message.contains("db_table_name"), "{}", message);
    }

    #[test]
    fn debug_hides_api_key() {
        let settings: Settings = envy::from_iter(vars(&[
            ("NEWRELIC_API_KEY", "secret"),
            ("DB_TABLE_NAME", "records"),
            ("SQS_URL", "q"),
            ("OTLP_METRICS_INTERVAL_MS", "1000"),
        ]))
        .unwrap();
        let printed = format!("{:?}", settings);
        assert!(!printed.contains("secret"));
        assert_eq!(settings.otlp_metrics_interval_ms, 1000);
    }
}
