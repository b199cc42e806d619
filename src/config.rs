use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

fn default_connect_timeout_secs() -> u64 {
    8
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::parse(&config_str)?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // no file: environment and defaults only
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = env::var("DATABASE_URL")
                    .map_err(|_| "DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                        connect_timeout_secs: get_env_parse(
                            "DB_CONNECT_TIMEOUT_SECS",
                            default_connect_timeout_secs(),
                        ),
                    },
                    logging: LoggingConfig::default(),
                }
            }
            Err(e) => {
                return Err(format!("failed to read config file {config_path}: {e}").into());
            }
        };

        // environment wins even when the file exists
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("DB_CONNECT_TIMEOUT_SECS")
            && let Ok(t) = v.parse()
        {
            config.database.connect_timeout_secs = t;
        }
        if let Ok(v) = env::var("LOG_LEVEL") {
            config.logging.level = v;
        }

        Ok(config)
    }

    pub fn parse(config_str: &str) -> Result<Self, Box<dyn std::error::Error>> {
        toml::from_str(config_str).map_err(|e| format!("failed to parse config file: {e}").into())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
