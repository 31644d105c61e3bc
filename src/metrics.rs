use opentelemetry::metrics::{Counter, Histogram, Meter};
use opentelemetry::KeyValue;
use std::time::Instant;

/// The downstream a latency measurement is attributed to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dependency {
    Lambda,
    Sqs,
    DynamoDb,
}

impl Dependency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dependency::Lambda => "Lambda function",
            Dependency::Sqs => "SQS",
            Dependency::DynamoDb => "DynamoDB",
        }
    }
}

/// The instruments reported by the handler. Created once at cold start
/// and shared by every invocation.
pub struct Metrics {
    pub messages_received: Counter<u64>,
    pub messages_processed: Counter<u64>,
    pub incoming_requests: Counter<u64>,
    pub successful_requests: Counter<u64>,
    pub failed_requests: Counter<u64>,
    pub invocations: Counter<u64>,
    pub request_latency: Histogram<f64>,
    pub request_size: Histogram<u64>,
    pub response_size: Histogram<u64>,
    pub dependencies_latency: Histogram<f64>,
}

impl Metrics {
    pub fn from_meter(meter: &Meter) -> Self {
        Self {
            messages_received: meter
                .u64_counter("sqs_messages_received")
                .with_description("Number of SQS messages received")
                .with_unit("1")
                .build(),
            messages_processed: meter
                .u64_counter("sqs_messages_processed")
                .with_description("Number of SQS messages processed")
                .with_unit("1")
                .build(),
            incoming_requests: meter
                .u64_counter("incoming_requests")
                .with_description("Count of incoming Lambda requests")
                .with_unit("1")
                .build(),
            successful_requests: meter
                .u64_counter("successful_requests")
                .with_description("Count of successful Lambda requests")
                .with_unit("1")
                .build(),
            failed_requests: meter
                .u64_counter("failed_requests")
                .with_description("Count of failed Lambda requests")
                .with_unit("1")
                .build(),
            invocations: meter
                .u64_counter("aws.lambda.invocations")
                .with_description("Number of AWS Lambda invocations")
                .with_unit("1")
                .build(),
            request_latency: meter
                .f64_histogram("request_latency")
                .with_description("Latency of Lambda request processing")
                .with_unit("ms")
                .build(),
            request_size: meter
                .u64_histogram("request_size")
                .with_description("Size of Lambda request payloads")
                .with_unit("bytes")
                .build(),
            response_size: meter
                .u64_histogram("response_size")
                .with_description("Size of Lambda response payloads")
                .with_unit("bytes")
                .build(),
            dependencies_latency: meter
                .f64_histogram("dependencies_latency")
                .with_description("Latency of calls to dependencies from Lambda")
                .with_unit("ms")
                .build(),
        }
    }

    pub fn record_incoming(&self) {
        self.incoming_requests.add(1, &[]);
        self.invocations.add(1, &[]);
    }

    pub fn record_batch_received(&self, count: usize) {
        self.messages_received.add(count as u64, &[]);
    }

    pub fn record_batch_processed(&self, count: usize) {
        self.messages_processed.add(count as u64, &[]);
        self.successful_requests.add(count as u64, &[]);
    }

    /// An empty poll still counts as one successful request.
    pub fn record_empty_batch(&self) {
        self.successful_requests.add(1, &[]);
    }

    pub fn record_failure(&self) {
        self.failed_requests.add(1, &[]);
    }

    pub fn record_request_size(&self, bytes: usize) {
        self.request_size.record(bytes as u64, &[]);
    }

    pub fn record_response_size(&self, bytes: usize) {
        self.response_size.record(bytes as u64, &[]);
    }

    pub fn record_dependency_latency(&self, dependency: Dependency, millis: f64) {
        self.dependencies_latency
            .record(millis, &[KeyValue::new("dependency", dependency.as_str())]);
    }

    /// Start timing a call to `dependency`. The elapsed time is
    /// recorded when the returned guard is dropped.
    pub fn time_dependency(&self, dependency: Dependency) -> DependencyTimer<'_> {
        DependencyTimer {
            metrics: self,
            dependency,
            started: Instant::now(),
        }
    }
}

/// Records the time elapsed since its creation into
/// `dependencies_latency` when dropped. The whole-invocation timer
/// ([`Dependency::Lambda`]) also records into `request_latency`.
pub struct DependencyTimer<'a> {
    metrics: &'a Metrics,
    dependency: Dependency,
    started: Instant,
}

impl Drop for DependencyTimer<'_> {
    fn drop(&mut self) {
        let millis = self.started.elapsed().as_secs_f64() * 1000.0;
        if self.dependency == Dependency::Lambda {
            self.metrics.request_latency.record(millis, &[]);
        }
        self.metrics.record_dependency_latency(self.dependency, millis);
    }
}
