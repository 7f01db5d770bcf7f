use std::path::PathBuf;
use std::str::FromStr;

use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("missing required configuration: {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub auth: AuthSettings,
    pub media: MediaSettings,
    pub scheduler: SchedulerSettings,
    pub webhook: WebhookSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    /// The single process-wide bearer token.
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaSettings {
    /// Root for per-job working directories.
    pub work_dir: PathBuf,
    /// Where finished subtitle artifacts land; defaults to `work_dir`.
    pub output_dir: PathBuf,
    pub ytdlp_bin: String,
    pub ffmpeg_bin: String,
    pub whisper_bin: String,
    pub whisper_model: PathBuf,
    /// Submissions probed strictly longer than this many seconds are
    /// rejected; equal is accepted.
    pub max_video_length: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    pub sync_threshold_seconds: u64,
    pub worker_concurrency: usize,
    pub queue_capacity: usize,
    pub free_job_limit: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookSettings {
    pub url: Option<String>,
    pub secret: Option<String>,
    /// Event kinds to deliver; empty means all.
    pub events: Vec<String>,
    pub timeout_seconds: u64,
    pub max_retries: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// When set, jobs persist to Postgres instead of the in-memory map.
    pub url: Option<String>,
    pub max_connections: u32,
    /// Startup connection attempts before the boot is failed.
    pub connect_attempts: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    pub enable_json: bool,
}

impl Settings {
    /// Load once at startup; changing a knob requires a restart.
    pub fn from_env() -> Result<Self, SettingsError> {
        let api_key = required("SKALD_API_KEY")?;
        let work_dir = PathBuf::from(optional("SKALD_WORK_DIR").unwrap_or_else(|| "./work".to_string()));
        let output_dir = optional("SKALD_OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| work_dir.clone());

        Ok(Self {
            server: ServerSettings {
                host: optional("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                port: parsed("SERVER_PORT", 3000)?,
            },
            auth: AuthSettings { api_key },
            media: MediaSettings {
                work_dir,
                output_dir,
                ytdlp_bin: optional("SKALD_YTDLP_BIN").unwrap_or_else(|| "yt-dlp".to_string()),
                ffmpeg_bin: optional("SKALD_FFMPEG_BIN").unwrap_or_else(|| "ffmpeg".to_string()),
                whisper_bin: optional("SKALD_WHISPER_BIN")
                    .unwrap_or_else(|| "whisper-cli".to_string()),
                whisper_model: PathBuf::from(
                    optional("SKALD_WHISPER_MODEL")
                        .unwrap_or_else(|| "./models/ggml-base.en.bin".to_string()),
                ),
                max_video_length: parsed_optional("SKALD_MAX_VIDEO_LENGTH")?,
            },
            scheduler: SchedulerSettings {
                sync_threshold_seconds: parsed("SKALD_SYNC_THRESHOLD_SECONDS", 120)?,
                worker_concurrency: parsed("SKALD_WORKER_CONCURRENCY", 4)?,
                queue_capacity: parsed("SKALD_QUEUE_CAPACITY", 256)?,
                free_job_limit: parsed_optional("SKALD_FREE_JOB_LIMIT")?,
            },
            webhook: WebhookSettings {
                url: optional("SKALD_WEBHOOK_URL"),
                secret: optional("SKALD_WEBHOOK_SECRET"),
                events: optional("SKALD_WEBHOOK_EVENTS")
                    .map(|v| {
                        v.split(',')
                            .map(|e| e.trim().to_string())
                            .filter(|e| !e.is_empty())
                            .collect()
                    })
                    .unwrap_or_default(),
                timeout_seconds: parsed("SKALD_WEBHOOK_TIMEOUT_SECONDS", 10)?,
                max_retries: parsed("SKALD_WEBHOOK_MAX_RETRIES", 3)?,
            },
            database: DatabaseSettings {
                url: optional("SKALD_DATABASE_URL"),
                max_connections: parsed("SKALD_DATABASE_MAX_CONNECTIONS", 5)?,
                connect_attempts: parsed("SKALD_DATABASE_CONNECT_ATTEMPTS", 5)?,
            },
            logging: LoggingSettings {
                level: optional("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
                enable_json: optional("LOG_JSON")
                    .map(|v| v.to_lowercase() == "true" || v == "1")
                    .unwrap_or(false),
            },
        })
    }
}

fn optional(key: &'static str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required(key: &'static str) -> Result<String, SettingsError> {
    optional(key).ok_or(SettingsError::Missing(key))
}

fn parsed<T: FromStr>(key: &'static str, default: T) -> Result<T, SettingsError> {
    match optional(key) {
        Some(value) => value
            .parse()
            .map_err(|_| SettingsError::InvalidValue { key, value }),
        None => Ok(default),
    }
}

fn parsed_optional<T: FromStr>(key: &'static str) -> Result<Option<T>, SettingsError> {
    match optional(key) {
        Some(value) => value
            .parse()
            .map(Some)
            .map_err(|_| SettingsError::InvalidValue { key, value }),
        None => Ok(None),
    }
}
