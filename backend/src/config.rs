use std::{
    fs,
    net::SocketAddr,
    path::PathBuf,
    time::Duration,
};

use anyhow::{Context, Result, ensure};
use clap::Parser;

use crate::providers::{OmdbSettings, YoutubeSettings, omdb, youtube};

/// CLI / env configuration parsed at process startup.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "cinefind-backend",
    about = "Movie and series search API over OMDb and YouTube",
    version,
    disable_help_subcommand = true
)]
struct CliConfig {
    /// OMDb API key
    #[arg(long, env = "OMDB_API_KEY", hide_env_values = true)]
    omdb_api_key: Option<String>,

    /// Base URL of the OMDb API
    #[arg(long, env = "CINEFIND_OMDB_BASE_URL", default_value = omdb::DEFAULT_BASE_URL)]
    omdb_base_url: String,

    /// YouTube Data API key used for trailer lookups
    #[arg(long, env = "YOUTUBE_API_KEY", hide_env_values = true)]
    youtube_api_key: Option<String>,

    /// Base URL of the YouTube search endpoint
    #[arg(long, env = "CINEFIND_YOUTUBE_BASE_URL", default_value = youtube::DEFAULT_BASE_URL)]
    youtube_base_url: String,

    /// Directory holding persisted state (favorites)
    #[arg(long, env = "CINEFIND_DATA_DIR", default_value = "./.data")]
    data_dir: PathBuf,

    /// Address to bind the HTTP server to (e.g., 0.0.0.0:8080)
    #[arg(long, env = "CINEFIND_BIND_ADDR", default_value = "0.0.0.0:8080")]
    listen_addr: SocketAddr,

    /// Timeout for each upstream request, in seconds
    #[arg(long, env = "CINEFIND_UPSTREAM_TIMEOUT_SECS", default_value_t = 10)]
    upstream_timeout_secs: u64,

    /// Maximum detail lookups in flight per search
    #[arg(long, env = "CINEFIND_DETAIL_CONCURRENCY", default_value_t = 8)]
    detail_concurrency: usize,

    /// Lifetime of cached search pages, in seconds (0 disables)
    #[arg(long, env = "CINEFIND_SEARCH_CACHE_TTL_SECS", default_value_t = 3600)]
    search_cache_ttl_secs: u64,

    /// Lifetime of cached detail and trailer lookups, in seconds (0 disables)
    #[arg(long, env = "CINEFIND_DETAIL_CACHE_TTL_SECS", default_value_t = 86400)]
    detail_cache_ttl_secs: u64,

    /// Optional OTLP endpoint (grpc or http/proto) for OpenTelemetry export
    #[arg(long, env = "OTEL_EXPORTER_OTLP_ENDPOINT")]
    otel_endpoint: Option<String>,

    /// Logical service name for telemetry (resource attribute)
    #[arg(long, env = "OTEL_SERVICE_NAME", default_value = "cinefind-backend")]
    otel_service_name: String,

    /// Disable OTLP trace export even if an endpoint is set
    #[arg(long, env = "CINEFIND_OTEL_DISABLE_TRACES", default_value_t = false)]
    otel_disable_traces: bool,

    /// Disable OTLP log export even if an endpoint is set
    #[arg(long, env = "CINEFIND_OTEL_DISABLE_LOGS", default_value_t = false)]
    otel_disable_logs: bool,

    /// Deployment environment tag for telemetry (e.g., development, staging, prod)
    #[arg(long, env = "CINEFIND_ENV", default_value = "development")]
    environment: String,

    /// Default log filter when RUST_LOG is not provided
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Comma-separated list of allowed CORS origins
    #[arg(long, env = "CINEFIND_CORS_ALLOWED_ORIGINS", value_delimiter = ',')]
    cors_allowed_origins: Vec<String>,
}

/// Fully validated configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub data_dir: PathBuf,
    pub listen_addr: SocketAddr,
    pub upstream: UpstreamConfig,
    pub otel: OtelConfig,
    pub log: LogConfig,
    pub environment: String,
    pub cors_allowed_origins: Vec<String>,
}

/// Remote API endpoints, credentials and request policy.
#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub omdb_api_key: Option<String>,
    pub omdb_base_url: String,
    pub youtube_api_key: Option<String>,
    pub youtube_base_url: String,
    pub timeout: Duration,
    pub detail_concurrency: usize,
    pub search_cache_ttl: Duration,
    pub detail_cache_ttl: Duration,
}

impl UpstreamConfig {
    pub fn omdb_settings(&self) -> OmdbSettings {
        OmdbSettings {
            base_url: self.omdb_base_url.clone(),
            api_key: self.omdb_api_key.clone(),
            timeout: self.timeout,
            search_ttl: self.search_cache_ttl,
            detail_ttl: self.detail_cache_ttl,
        }
    }

    pub fn youtube_settings(&self) -> YoutubeSettings {
        YoutubeSettings {
            base_url: self.youtube_base_url.clone(),
            api_key: self.youtube_api_key.clone(),
            timeout: self.timeout,
            ttl: self.detail_cache_ttl,
        }
    }
}

/// OpenTelemetry exporter configuration.
#[derive(Debug, Clone)]
pub struct OtelConfig {
    pub endpoint: Option<String>,
    pub service_name: String,
    pub disable_traces: bool,
    pub disable_logs: bool,
}

/// Structured logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: String,
}

impl AppConfig {
    /// Parse CLI/env arguments and return a validated configuration.
    pub fn load() -> Result<Self> {
        let cli = CliConfig::parse();
        Self::try_from(cli)
    }
}

impl TryFrom<CliConfig> for AppConfig {
    type Error = anyhow::Error;

    fn try_from(value: CliConfig) -> Result<Self> {
        fs::create_dir_all(&value.data_dir).with_context(|| {
            format!("failed to create data dir '{}'", value.data_dir.display())
        })?;
        ensure!(
            value.detail_concurrency >= 1,
            "detail concurrency must be at least 1"
        );
        ensure!(
            value.upstream_timeout_secs >= 1,
            "upstream timeout must be at least 1 second"
        );

        Ok(Self {
            data_dir: value.data_dir,
            listen_addr: value.listen_addr,
            upstream: UpstreamConfig {
                omdb_api_key: non_blank(value.omdb_api_key),
                omdb_base_url: value.omdb_base_url,
                youtube_api_key: non_blank(value.youtube_api_key),
                youtube_base_url: value.youtube_base_url,
                timeout: Duration::from_secs(value.upstream_timeout_secs),
                detail_concurrency: value.detail_concurrency,
                search_cache_ttl: Duration::from_secs(value.search_cache_ttl_secs),
                detail_cache_ttl: Duration::from_secs(value.detail_cache_ttl_secs),
            },
            environment: value.environment,
            otel: OtelConfig {
                endpoint: value.otel_endpoint,
                service_name: value.otel_service_name,
                disable_traces: value.otel_disable_traces,
                disable_logs: value.otel_disable_logs,
            },
            log: LogConfig {
                level: value.log_level,
            },
            cors_allowed_origins: value
                .cors_allowed_origins
                .into_iter()
                .map(|origin| origin.trim().to_string())
                .filter(|origin| !origin.is_empty())
                .collect(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|value| !value.trim().is_empty())
}
