use std::path::PathBuf;
use serde::{Deserialize, Serialize};

/// Ceiling shared with the upload page (70 MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 70 * 1024 * 1024;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub max_file_size: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct DatabaseFileConfig {
    pub url: Option<String>,
    pub max_connections: Option<u32>,
    pub run_migrations: Option<bool>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CloudinaryFileConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_base: Option<String>,
    pub folder: Option<String>,
    pub signature_algorithm: Option<SignatureAlgorithm>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AuthFileConfig {
    pub public_key_pem: Option<String>,
    pub secret: Option<String>,
    pub issuer: Option<String>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct LimitsFileConfig {
    pub upload_timeout: Option<u64>,
    pub keep_alive_interval: Option<u64>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseFileConfig,
    #[serde(default)]
    pub cloudinary: CloudinaryFileConfig,
    #[serde(default)]
    pub auth: AuthFileConfig,
    #[serde(default)]
    pub limits: LimitsFileConfig,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignatureAlgorithm {
    #[default]
    Sha1,
    Sha256,
}

impl std::str::FromStr for SignatureAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sha1" => Ok(Self::Sha1),
            "sha256" => Ok(Self::Sha256),
            other => Err(format!("unknown signature algorithm '{}'", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub run_migrations: bool,
}

#[derive(Clone, Debug)]
pub struct CloudinaryConfig {
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    pub api_base: String,
    pub folder: String,
    pub signature_algorithm: SignatureAlgorithm,
}

/// Account credentials, present only when all three values are set.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryConfig {
    pub fn credentials(&self) -> Option<CloudinaryCredentials> {
        let present = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);

        Some(CloudinaryCredentials {
            cloud_name: present(&self.cloud_name)?,
            api_key: present(&self.api_key)?,
            api_secret: present(&self.api_secret)?,
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct AuthConfig {
    pub public_key_pem: Option<String>,
    pub secret: Option<String>,
    pub issuer: Option<String>,
}

#[derive(Clone, Debug)]
pub struct LimitsConfig {
    pub upload_timeout: u64,
    /// Seconds between background liveness pings; 0 disables the task
    pub keep_alive_interval: u64,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub max_file_size: u64,
    pub database: DatabaseConfig,
    pub cloudinary: CloudinaryConfig,
    pub auth: AuthConfig,
    pub limits: LimitsConfig,
}

impl Config {
    /// Load `config.toml` from the working directory (if any), then apply
    /// environment overrides.
    pub fn load() -> anyhow::Result<Self> {
        let base_dir = std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."));

        let config_path = base_dir.join("config.toml");
        let config_file = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Some(toml::from_str::<ConfigFile>(&content)?)
        } else {
            None
        };

        Ok(Self::resolve(config_file, |key| std::env::var(key).ok()))
    }

    /// Merge file values with variables looked up through `env`.
    /// Env wins over the file, the file wins over defaults.
    pub fn resolve<F>(config_file: Option<ConfigFile>, env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = config_file.unwrap_or_default();
        let defaults = Self::default();
        let env_non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let host = env_non_empty("HOST")
            .or(file.server.host)
            .unwrap_or(defaults.host);

        let port = env("PORT")
            .and_then(|p| p.parse().ok())
            .or(file.server.port)
            .unwrap_or(defaults.port);

        let max_file_size = env("MAX_FILE_SIZE")
            .and_then(|v| v.parse().ok())
            .or(file.server.max_file_size)
            .unwrap_or(defaults.max_file_size);

        let database = DatabaseConfig {
            url: env_non_empty("DATABASE_URL")
                .or(file.database.url)
                .unwrap_or(defaults.database.url),
            max_connections: env("DATABASE_MAX_CONNECTIONS")
                .and_then(|v| v.parse().ok())
                .or(file.database.max_connections)
                .filter(|&v| v > 0)
                .unwrap_or(defaults.database.max_connections),
            run_migrations: env("RUN_MIGRATIONS")
                .and_then(|v| parse_bool(&v))
                .or(file.database.run_migrations)
                .unwrap_or(defaults.database.run_migrations),
        };

        let cloudinary = CloudinaryConfig {
            cloud_name: env_non_empty("NEXT_PUBLIC_CLOUDINARY_CLOUD_NAME")
                .or_else(|| env_non_empty("CLOUDINARY_CLOUD_NAME"))
                .or(file.cloudinary.cloud_name),
            api_key: env_non_empty("CLOUDINARY_API_KEY").or(file.cloudinary.api_key),
            api_secret: env_non_empty("CLOUDINARY_API_SECRET").or(file.cloudinary.api_secret),
            api_base: env_non_empty("CLOUDINARY_API_BASE")
                .or(file.cloudinary.api_base)
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.cloudinary.api_base),
            folder: env_non_empty("CLOUDINARY_UPLOAD_FOLDER")
                .or(file.cloudinary.folder)
                .unwrap_or(defaults.cloudinary.folder),
            signature_algorithm: env("CLOUDINARY_SIGNATURE_ALGORITHM")
                .and_then(|v| v.parse().ok())
                .or(file.cloudinary.signature_algorithm)
                .unwrap_or(defaults.cloudinary.signature_algorithm),
        };

        let auth = AuthConfig {
            public_key_pem: env_non_empty("AUTH_JWT_PUBLIC_KEY")
                .or_else(|| env_non_empty("CLERK_JWT_KEY"))
                .or(file.auth.public_key_pem)
                // PEM keys pasted into .env files usually carry literal "\n"
                .map(|pem| pem.replace("\\n", "\n")),
            secret: env_non_empty("AUTH_JWT_SECRET").or(file.auth.secret),
            issuer: env_non_empty("AUTH_JWT_ISSUER").or(file.auth.issuer),
        };

        let limits = LimitsConfig {
            upload_timeout: env("UPLOAD_TIMEOUT_SECONDS")
                .and_then(|v| v.parse().ok())
                .or(file.limits.upload_timeout)
                .unwrap_or(defaults.limits.upload_timeout),
            keep_alive_interval: env("KEEP_ALIVE_INTERVAL_SECONDS")
                .and_then(|v| v.parse().ok())
                .or(file.limits.keep_alive_interval)
                .unwrap_or(defaults.limits.keep_alive_interval),
        };

        Self {
            host,
            port,
            max_file_size,
            database,
            cloudinary,
            auth,
            limits,
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            database: DatabaseConfig {
                url: "postgres://localhost:5432/video_uploads".to_string(),
                max_connections: 5,
                run_migrations: true,
            },
            cloudinary: CloudinaryConfig {
                cloud_name: None,
                api_key: None,
                api_secret: None,
                api_base: "https://api.cloudinary.com".to_string(),
                folder: "video-uploads".to_string(),
                signature_algorithm: SignatureAlgorithm::Sha1,
            },
            auth: AuthConfig::default(),
            limits: LimitsConfig {
                upload_timeout: 300,
                keep_alive_interval: 0,
            },
        }
    }
}
