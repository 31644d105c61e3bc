//! Defines the OpenTelemetry providers that spans and metrics are
//! exported through, and the `tracing` subscriber feeding them.

use crate::conf::Settings;
use anyhow::{Context, Result};
use opentelemetry::metrics::{Meter, MeterProvider as _};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig, WithTonicConfig};
use opentelemetry_sdk::metrics::{PeriodicReader, SdkMeterProvider};
use opentelemetry_sdk::trace::{BatchSpanProcessor, SdkTracerProvider};
use opentelemetry_sdk::Resource;
use std::collections::HashMap;
use std::time::Duration;
use tonic::metadata::{MetadataMap, MetadataValue};
use tonic::transport::ClientTlsConfig;
use tracing::warn;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// The instrumentation scope name used for the tracer and meter.
const SCOPE: &str = "sqs-dynamodb-bridge";

/// The header carrying the backend's ingest key.
const API_KEY_HEADER: &str = "api-key";

/// Handles to the process-wide tracer and meter providers. Cloning is
/// cheap; every clone refers to the same providers.
#[derive(Clone)]
pub struct Telemetry {
    tracer_provider: SdkTracerProvider,
    meter_provider: SdkMeterProvider,
}

impl Telemetry {
    /// Build both providers from the settings.
    pub fn new(settings: &Settings) -> Result<Self> {
        let resource = Resource::builder()
            .with_attributes([KeyValue::new(
                "service.name",
                settings.otel_service_name.clone(),
            )])
            .build();
        Ok(Telemetry {
            tracer_provider: build_tracer_provider(settings, resource.clone())?,
            meter_provider: build_meter_provider(settings, resource)?,
        })
    }

    /// Install the global `tracing` subscriber: formatted log lines plus
    /// a layer that exports spans through the tracer provider.
    pub fn init_subscriber(&self) -> Result<()> {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        let tracer = self.tracer_provider.tracer(SCOPE);
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .without_time(),
            )
            .with(tracing_opentelemetry::layer().with_tracer(tracer))
            .try_init()
            .context("Failed to install the tracing subscriber")
    }

    /// The meter handlers create their instruments from.
    pub fn meter(&self) -> Meter {
        self.meter_provider.meter(SCOPE)
    }

    /// Export whatever is pending. Failures are logged and otherwise
    /// ignored. Blocks until the exporters respond.
    pub fn flush(&self) {
        if let Err(e) = self.tracer_provider.force_flush() {
            warn!(error = %e, "Failed to flush tracer provider");
        }
        if let Err(e) = self.meter_provider.force_flush() {
            warn!(error = %e, "Failed to flush meter provider");
        }
    }

    /// Flush and shut down both providers.
    pub fn shutdown(self) -> Result<()> {
        self.tracer_provider
            .force_flush()
            .context("Failed to flush tracer provider")?;
        self.tracer_provider
            .shutdown()
            .context("Failed to shut down tracer provider")?;
        self.meter_provider
            .force_flush()
            .context("Failed to flush meter provider")?;
        self.meter_provider
            .shutdown()
            .context("Failed to shut down meter provider")?;
        Ok(())
    }
}

fn build_tracer_provider(settings: &Settings, resource: Resource) -> Result<SdkTracerProvider> {
    let mut metadata = MetadataMap::new();
    metadata.insert(
        API_KEY_HEADER,
        MetadataValue::try_from(settings.newrelic_api_key.as_str())
            .context("The telemetry API key is not a valid header value")?,
    );
    let mut builder = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&settings.otlp_traces_endpoint)
        .with_metadata(metadata);
    if settings.otlp_traces_endpoint.starts_with("https://") {
        builder = builder.with_tls_config(ClientTlsConfig::new().with_native_roots());
    }
    let exporter = builder.build().with_context(|| {
        format!(
            "Failed to build span exporter for {:?}",
            settings.otlp_traces_endpoint
        )
    })?;

    Ok(SdkTracerProvider::builder()
        .with_span_processor(BatchSpanProcessor::builder(exporter).build())
        .with_resource(resource)
        .build())
}

fn build_meter_provider(settings: &Settings, resource: Resource) -> Result<SdkMeterProvider> {
    let exporter = opentelemetry_otlp::MetricExporter::builder()
        .with_http()
        .with_endpoint(&settings.otlp_metrics_endpoint)
        .with_protocol(opentelemetry_otlp::Protocol::HttpBinary)
        .with_headers(HashMap::from([(
            String::from(API_KEY_HEADER),
            settings.newrelic_api_key.clone(),
        )]))
        .build()
        .with_context(|| {
            format!(
                "Failed to build metric exporter for {:?}",
                settings.otlp_metrics_endpoint
            )
        })?;

    let reader = PeriodicReader::builder(exporter)
        .with_interval(Duration::from_millis(settings.otlp_metrics_interval_ms))
        .build();

    Ok(SdkMeterProvider::builder()
        .with_reader(reader)
        .with_resource(resource)
        .build())
}
