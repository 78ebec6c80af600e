use anyhow::Result;
use opentelemetry::{KeyValue, global, trace::TracerProvider as _};
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{LogExporter, SpanExporter, WithExportConfig};
use opentelemetry_sdk::{
    self as sdk,
    logs::{SdkLogger, SdkLoggerProvider},
    resource::Resource,
};
use tracing::{info, warn};
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::AppConfig;

/// Keeps the OTLP providers alive; flushes them on drop.
pub struct TelemetryGuard {
    tracer_provider: Option<sdk::trace::SdkTracerProvider>,
    logger_provider: Option<SdkLoggerProvider>,
}

impl TelemetryGuard {
    pub fn init(config: &AppConfig) -> Result<Self> {
        let env_filter = EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&config.log.level))
            .unwrap_or_else(|_| EnvFilter::new("info"));

        let OtelPipelines { traces, logs } = build_otel_pipelines(config)?;
        let (trace_layer, tracer_provider) = match traces {
            Some(traces) => (Some(traces.layer), Some(traces.provider)),
            None => (None, None),
        };
        let (log_layer, logger_provider) = match logs {
            Some(logs) => (Some(logs.layer), Some(logs.provider)),
            None => (None, None),
        };
        let exporting = tracer_provider.is_some() || logger_provider.is_some();

        tracing_subscriber::registry()
            .with(trace_layer)
            .with(log_layer)
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_file(false)
                    .with_line_number(false)
                    .json(),
            )
            .try_init()?;

        if exporting {
            info!(
                traces = tracer_provider.is_some(),
                logs = logger_provider.is_some(),
                "OpenTelemetry export enabled (json stdout retained)"
            );
        }

        Ok(Self {
            tracer_provider,
            logger_provider,
        })
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(err) = provider.shutdown()
        {
            warn!(error = ?err, "failed to shutdown tracer provider cleanly");
        }
        if let Some(provider) = self.logger_provider.take()
            && let Err(err) = provider.shutdown()
        {
            warn!(error = ?err, "failed to shutdown logger provider cleanly");
        }
    }
}

struct TracePipeline {
    layer: OpenTelemetryLayer<Registry, sdk::trace::Tracer>,
    provider: sdk::trace::SdkTracerProvider,
}

struct LogPipeline {
    layer: OpenTelemetryTracingBridge<SdkLoggerProvider, SdkLogger>,
    provider: SdkLoggerProvider,
}

#[derive(Default)]
struct OtelPipelines {
    traces: Option<TracePipeline>,
    logs: Option<LogPipeline>,
}

fn build_otel_pipelines(config: &AppConfig) -> Result<OtelPipelines> {
    let endpoint = match &config.otel.endpoint {
        Some(endpoint) if !endpoint.trim().is_empty() => endpoint.clone(),
        _ => return Ok(OtelPipelines::default()),
    };

    let resource = Resource::builder()
        .with_service_name(config.otel.service_name.clone())
        .with_attribute(KeyValue::new(
            "deployment.environment.name",
            config.environment.clone(),
        ))
        .build();

    let traces = if config.otel.disable_traces {
        None
    } else {
        let span_exporter = SpanExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint.clone())
            .build()?;

        let provider = sdk::trace::SdkTracerProvider::builder()
            .with_resource(resource.clone())
            .with_batch_exporter(span_exporter)
            .build();

        let tracer = provider.tracer(config.otel.service_name.clone());
        global::set_tracer_provider(provider.clone());
        Some(TracePipeline {
            layer: tracing_opentelemetry::layer().with_tracer(tracer),
            provider,
        })
    };

    let logs = if config.otel.disable_logs {
        None
    } else {
        let log_exporter = LogExporter::builder()
            .with_tonic()
            .with_endpoint(endpoint)
            .build()?;

        let provider = SdkLoggerProvider::builder()
            .with_resource(resource)
            .with_batch_exporter(log_exporter)
            .build();
        Some(LogPipeline {
            layer: OpenTelemetryTracingBridge::new(&provider),
            provider,
        })
    };

    Ok(OtelPipelines { traces, logs })
}
