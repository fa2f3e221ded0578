//! Application configuration loaded from environment variables.
//!
//! Everything is read once at startup. Only the JWT signing key is
//! mandatory; third-party API keys default to empty so a local instance
//! can boot without them (the affected routes then fail upstream).

use std::env;

/// Default upload body limit (32 MiB).
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 32 << 20;

/// Bucket names for each kind of uploaded media.
#[derive(Debug, Clone)]
pub struct Buckets {
    pub audio: String,
    pub images: String,
    pub profile_pics: String,
    pub journeys: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Frontend URL allowed by CORS
    pub frontend_url: String,
    /// GCP project ID (Firestore)
    pub gcp_project_id: String,
    /// Server port
    pub port: u16,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,

    /// Object storage API root (overridden for a local storage emulator)
    pub storage_base_url: String,
    pub buckets: Buckets,

    /// Local Whisper transcription service
    pub whisper_url: String,
    pub lingo_api_url: String,
    pub lingo_api_key: String,
    pub assemblyai_api_url: String,
    pub assemblyai_api_key: String,
    pub opencage_api_url: String,
    pub opencage_api_key: String,

    /// Path to the ffmpeg binary
    pub ffmpeg_path: String,
    /// Avatar used when signup has no profile picture
    pub default_profile_pic: String,
    pub max_upload_bytes: usize,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let storage_base_url = match env::var("STORAGE_EMULATOR_HOST") {
            Ok(host) => host,
            Err(_) => var_or("STORAGE_BASE_URL", "https://storage.googleapis.com"),
        };

        Ok(Self {
            frontend_url: var_or("FRONTEND_URL", "http://localhost:8081"),
            gcp_project_id: var_or("GCP_PROJECT_ID", "local-dev"),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),

            storage_base_url,
            buckets: Buckets {
                audio: var_or("AUDIO_BUCKET", "audiofiles"),
                images: var_or("IMAGE_BUCKET", "spotimages"),
                profile_pics: var_or("PROFILE_BUCKET", "profilepics"),
                journeys: var_or("JOURNEY_BUCKET", "journeymap"),
            },

            whisper_url: var_or("WHISPER_URL", "http://127.0.0.1:5002"),
            lingo_api_url: var_or("LINGO_API_URL", "https://engine.lingo.dev"),
            lingo_api_key: secret_or_empty("LINGO_API_KEY"),
            assemblyai_api_url: var_or("ASSEMBLYAI_API_URL", "https://api.assemblyai.com/v2"),
            assemblyai_api_key: secret_or_empty("ASSEMBLYAI_API_KEY"),
            opencage_api_url: var_or(
                "OPENCAGE_API_URL",
                "https://api.opencagedata.com/geocode/v1/json",
            ),
            opencage_api_key: secret_or_empty("OPENCAGE_API_KEY"),

            ffmpeg_path: var_or("FFMPEG_PATH", "ffmpeg"),
            default_profile_pic: var_or("DEFAULT_PROFILE_PIC", ""),
            max_upload_bytes: env::var("MAX_UPLOAD_BYTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
        })
    }

    /// Config for tests; no environment access.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:8081".to_string(),
            gcp_project_id: "test-project".to_string(),
            port: 8080,
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            storage_base_url: "http://127.0.0.1:4443".to_string(),
            buckets: Buckets {
                audio: "audiofiles".to_string(),
                images: "spotimages".to_string(),
                profile_pics: "profilepics".to_string(),
                journeys: "journeymap".to_string(),
            },
            whisper_url: "http://127.0.0.1:5002".to_string(),
            lingo_api_url: "http://127.0.0.1:9".to_string(),
            lingo_api_key: "test_lingo".to_string(),
            assemblyai_api_url: "http://127.0.0.1:9".to_string(),
            assemblyai_api_key: "test_assembly".to_string(),
            opencage_api_url: "http://127.0.0.1:9".to_string(),
            opencage_api_key: "test_opencage".to_string(),
            ffmpeg_path: "ffmpeg".to_string(),
            default_profile_pic: "https://example.com/default.png".to_string(),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn secret_or_empty(name: &str) -> String {
    env::var(name).map(|v| v.trim().to_string()).unwrap_or_default()
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
