//! Defines the shared AWS SDK configuration and the service clients
//! built from it.

use aws_config::{from_env, SdkConfig};
use std::env;

/// Normalize an endpoint override, adding a scheme if it lacks one.
fn endpoint_with_scheme(endpoint_url: String) -> String {
    if endpoint_url.starts_with("http://") || endpoint_url.starts_with("https://") {
        endpoint_url
    } else {
        format!("https://{}", endpoint_url)
    }
}

/// Load the AWS configuration from the environment. When
/// `AWS_ENDPOINT_URL` is set, every client is pointed at it.
pub async fn load_config() -> SdkConfig {
    if let Ok(endpoint_url) = env::var("AWS_ENDPOINT_URL") {
        from_env()
            .endpoint_url(endpoint_with_scheme(endpoint_url))
            .region("us-east-1") // should be OK since the endpoint was overridden
            .load()
            .await
    } else {
        from_env().load().await
    }
}

/// Build the SQS client.
pub fn sqs(config: &SdkConfig) -> aws_sdk_sqs::Client {
    aws_sdk_sqs::Client::new(config)
}

/// Build the DynamoDB client.
pub fn dynamodb(config: &SdkConfig) -> aws_sdk_dynamodb::Client {
    aws_sdk_dynamodb::Client::new(config)
}

#[cfg(test)]
mod tests {
    use super::endpoint_with_scheme;

    #[test]
    fn endpoint_scheme_is_added_when_missing() {
        assert_eq!(
            endpoint_with_scheme(String::from("localhost:4566")),
            "https://localhost:4566"
        );
        assert_eq!(
            endpoint_with_scheme(String::from("http://localhost:4566")),
            "http://localhost:4566"
        );
    }
}
