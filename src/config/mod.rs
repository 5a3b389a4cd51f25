use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

const INSECURE_DEV_SECRET: &str = "insecure-development-secret-change-me";
const TESTING_SECRET: &str = "testing-secret-not-for-production";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Testing,
    Production,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseEngine {
    Postgres,
    Memory,
}

impl std::str::FromStr for DatabaseEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" | "pg" => Ok(DatabaseEngine::Postgres),
            "memory" | "mem" => Ok(DatabaseEngine::Memory),
            other => Err(format!("unknown database engine: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub engine: DatabaseEngine,
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub page_size: u64,
    pub max_page_size: u64,
    pub enable_request_logging: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    #[serde(skip_serializing)]
    pub jwt_secret: String,
    pub access_token_minutes: i64,
    pub refresh_token_days: i64,
    pub rotate_refresh_tokens: bool,
    pub blacklist_after_rotation: bool,
    pub update_last_login: bool,
    pub cors_allow_all: bool,
    pub cors_origins: Vec<String>,
    pub password_min_length: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("testing") | Ok("test") => Environment::Testing,
            _ => Environment::Development,
        };

        match environment {
            Environment::Production => Self::production(),
            Environment::Testing => Self::testing(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Server overrides
        if let Ok(v) = env::var("HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }

        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = Some(v);
        }
        if let Ok(v) = env::var("DATABASE_ENGINE") {
            self.database.engine = v.parse().unwrap_or(self.database.engine);
        }
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }

        if let Ok(v) = env::var("API_PAGE_SIZE") {
            self.api.page_size = v.parse().unwrap_or(self.api.page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }

        if let Ok(v) = env::var("SECRET_KEY") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_TOKEN_MINUTES") {
            self.security.access_token_minutes = v.parse().unwrap_or(self.security.access_token_minutes);
        }
        if let Ok(v) = env::var("JWT_REFRESH_TOKEN_DAYS") {
            self.security.refresh_token_days = v.parse().unwrap_or(self.security.refresh_token_days);
        }
        if let Ok(v) = env::var("JWT_ROTATE_REFRESH_TOKENS") {
            self.security.rotate_refresh_tokens = v.parse().unwrap_or(self.security.rotate_refresh_tokens);
        }
        if let Ok(v) = env::var("JWT_BLACKLIST_AFTER_ROTATION") {
            self.security.blacklist_after_rotation = v.parse().unwrap_or(self.security.blacklist_after_rotation);
        }
        if let Ok(v) = env::var("JWT_UPDATE_LAST_LOGIN") {
            self.security.update_last_login = v.parse().unwrap_or(self.security.update_last_login);
        }
        if let Ok(v) = env::var("CORS_ALLOW_ALL") {
            self.security.cors_allow_all = v.parse().unwrap_or(self.security.cors_allow_all);
        }
        if let Ok(v) = env::var("CORS_ALLOWED_ORIGINS") {
            self.security.cors_origins = parse_list(&v);
        }
        if let Ok(v) = env::var("PASSWORD_MIN_LENGTH") {
            self.security.password_min_length = v.parse().unwrap_or(self.security.password_min_length);
        }

        self
    }

    /// Checks settings that would make the service unsafe or unable to start.
    pub fn validate(&self) -> Result<(), String> {
        if self.security.jwt_secret.trim().is_empty() {
            return Err("SECRET_KEY must be set".to_string());
        }
        if self.environment == Environment::Production && self.security.jwt_secret == INSECURE_DEV_SECRET {
            return Err("SECRET_KEY must be changed for production".to_string());
        }
        if self.database.engine == DatabaseEngine::Postgres && self.database.url.is_none() {
            return Err("DATABASE_URL is required for the postgres engine".to_string());
        }
        if self.api.page_size == 0 || self.api.max_page_size < self.api.page_size {
            return Err("API_PAGE_SIZE must be between 1 and API_MAX_PAGE_SIZE".to_string());
        }
        Ok(())
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// Default tracing filter when RUST_LOG is not set
    pub fn default_log_filter(&self) -> &'static str {
        match self.environment {
            Environment::Production => "warn,hr_admin_api=info",
            _ => "info,tower_http=info",
        }
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 8000 },
            database: DatabaseConfig {
                engine: DatabaseEngine::Memory,
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
            },
            api: ApiConfig { page_size: 20, max_page_size: 100, enable_request_logging: true },
            security: SecurityConfig {
                jwt_secret: INSECURE_DEV_SECRET.to_string(),
                access_token_minutes: 60,
                refresh_token_days: 7,
                rotate_refresh_tokens: true,
                blacklist_after_rotation: true,
                update_last_login: true,
                cors_allow_all: true,
                cors_origins: default_origins(),
                password_min_length: 8,
            },
        }
    }

    pub fn testing() -> Self {
        Self {
            environment: Environment::Testing,
            server: ServerConfig { host: "127.0.0.1".to_string(), port: 8000 },
            database: DatabaseConfig {
                engine: DatabaseEngine::Memory,
                url: None,
                max_connections: 5,
                connection_timeout: 5,
                run_migrations: true,
            },
            api: ApiConfig { page_size: 20, max_page_size: 100, enable_request_logging: false },
            security: SecurityConfig {
                jwt_secret: TESTING_SECRET.to_string(),
                access_token_minutes: 60,
                refresh_token_days: 7,
                rotate_refresh_tokens: true,
                blacklist_after_rotation: true,
                update_last_login: true,
                cors_allow_all: true,
                cors_origins: default_origins(),
                password_min_length: 8,
            },
        }
    }

    pub fn production() -> Self {
        Self {
            environment: Environment::Production,
            server: ServerConfig { host: "0.0.0.0".to_string(), port: 8000 },
            database: DatabaseConfig {
                engine: DatabaseEngine::Postgres,
                url: None,
                max_connections: 50,
                connection_timeout: 5,
                run_migrations: false,
            },
            api: ApiConfig { page_size: 20, max_page_size: 100, enable_request_logging: false },
            security: SecurityConfig {
                jwt_secret: String::new(),
                access_token_minutes: 60,
                refresh_token_days: 7,
                rotate_refresh_tokens: true,
                blacklist_after_rotation: true,
                update_last_login: true,
                cors_allow_all: false,
                cors_origins: default_origins(),
                password_min_length: 8,
            },
        }
    }
}

fn default_origins() -> Vec<String> {
    vec!["http://localhost:3000".to_string(), "http://localhost:8000".to_string()]
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Read once from the environment on first access
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_development {
    () => {
        $crate::config::CONFIG.environment == $crate::config::Environment::Development
    };
}

#[macro_export]
macro_rules! is_production {
    () => {
        $crate::config::CONFIG.environment == $crate::config::Environment::Production
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.database.engine, DatabaseEngine::Memory);
        assert_eq!(config.api.page_size, 20);
        assert!(config.security.cors_allow_all);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.database.engine, DatabaseEngine::Postgres);
        assert!(!config.security.cors_allow_all);
        assert!(!config.database.run_migrations);
    }

    #[test]
    fn production_requires_secret_and_database_url() {
        let mut config = AppConfig::production();
        assert!(config.validate().is_err());

        config.security.jwt_secret = INSECURE_DEV_SECRET.to_string();
        config.database.url = Some("postgres://localhost/hr".to_string());
        assert_eq!(
            config.validate().unwrap_err(),
            "SECRET_KEY must be changed for production"
        );

        config.security.jwt_secret = "a-real-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn token_lifetimes_match_session_defaults() {
        let config = AppConfig::testing();
        assert_eq!(config.security.access_token_minutes, 60);
        assert_eq!(config.security.refresh_token_days, 7);
        assert!(config.security.rotate_refresh_tokens);
        assert!(config.security.blacklist_after_rotation);
    }

    #[test]
    fn parses_engine_and_origin_lists() {
        assert_eq!("PostgreSQL".parse::<DatabaseEngine>(), Ok(DatabaseEngine::Postgres));
        assert_eq!("memory".parse::<DatabaseEngine>(), Ok(DatabaseEngine::Memory));
        assert!("sqlite".parse::<DatabaseEngine>().is_err());
        assert_eq!(
            parse_list("http://a.test, http://b.test,,"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }
}
