use config::{Config, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 单独的环境变量覆盖：(配置键, 环境变量名)
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("app.environment", "APP_ENV"),
    ("app.log_level", "RUST_LOG"),
    ("server.host", "SERVER_HOST"),
    ("server.port", "SERVER_PORT"),
    ("server.unix_socket_path", "UNIX_SOCKET"),
    ("server.workers", "CPU_COUNT"),
    ("jwt.secret", "JWT_SECRET"),
    ("database.url", "DATABASE_URL"),
    ("cache.redis.url", "REDIS_URL"),
    ("cache.redis.key_prefix", "REDIS_KEY_PREFIX"),
    ("cache.default_ttl", "CACHE_TTL"),
    ("upload.dir", "UPLOAD_DIR"),
];

impl AppConfig {
    /// 加载配置
    ///
    /// 优先级从低到高：`config.toml`、`config.{APP_ENV}.toml`、`LMS_*` 环境变量、`ENV_OVERRIDES`。
    pub fn load() -> Result<Self, ConfigError> {
        let environment = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());

        let mut builder = Config::builder()
            .add_source(File::with_name("config").required(false))
            .add_source(File::with_name(&format!("config.{environment}")).required(false))
            .add_source(
                Environment::with_prefix("LMS")
                    .separator("_")
                    .try_parsing(true),
            );

        for (key, var) in ENV_OVERRIDES {
            builder = builder.set_override_option(*key, std::env::var(var).ok())?;
        }

        let mut app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.normalize();
        app_config.validate()?;
        Ok(app_config)
    }

    fn normalize(&mut self) {
        if self.server.workers == 0 {
            self.server.workers = num_cpus::get().min(self.server.max_workers);
        }
        // 上传扩展名统一为小写并带点号
        self.upload.allowed_types = self
            .upload
            .allowed_types
            .iter()
            .map(|t| {
                let t = t.trim().to_lowercase();
                if t.starts_with('.') { t } else { format!(".{t}") }
            })
            .collect();
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.is_empty() {
            return Err(ConfigError::Message("jwt.secret must not be empty".into()));
        }
        if self.upload.dir.trim().is_empty() {
            return Err(ConfigError::Message("upload.dir must not be empty".into()));
        }
        if self.upload.max_size == 0 {
            return Err(ConfigError::Message("upload.max_size must be positive".into()));
        }
        Ok(())
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置，启动时调用一次
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Unix 套接字路径，未配置时为 None
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        Some(self.server.unix_socket_path.as_str()).filter(|p| !p.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> AppConfig {
        let toml = include_str!("../../config.toml");
        Config::builder()
            .add_source(File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap()
    }

    #[test]
    fn test_normalize_upload_types() {
        let mut config = base_config();
        config.upload.allowed_types = vec!["PDF".into(), " .Mp4 ".into()];
        config.normalize();
        assert_eq!(config.upload.allowed_types, vec![".pdf", ".mp4"]);
        assert!(config.server.workers > 0);
    }

    #[test]
    fn test_validate_rejects_empty_secret() {
        let mut config = base_config();
        assert!(config.validate().is_ok());
        config.jwt.secret.clear();
        assert!(config.validate().is_err());
    }
}
