use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    #[serde(default)]
    pub groupbuy: GroupBuyConfig,
    pub ledger: AccountLedgerConfig,
    pub orders: OrderFactoryConfig,
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
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64, // seconds
}

/// 拼团引擎参数
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupBuyConfig {
    /// 团默认有效时长（小时），发起请求可覆盖
    pub team_expire_hours: i64,
    /// 发起请求可指定的有效时长上限（小时）
    pub max_team_duration_hours: i64,
    /// 过期团扫描间隔（秒）
    pub sweep_interval_secs: u64,
    /// 余额/订单等上游调用超时（毫秒）
    pub upstream_timeout_ms: u64,
    /// 活动团列表默认返回上限
    pub activity_teams_limit: u64,
}

impl Default for GroupBuyConfig {
    fn default() -> Self {
        Self {
            team_expire_hours: 24,
            max_team_duration_hours: 72,
            sweep_interval_secs: 300,
            upstream_timeout_ms: 5000,
            activity_teams_limit: 20,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountLedgerConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderFactoryConfig {
    pub base_url: String,
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // 有配置文件：先解析再用环境变量覆盖
                toml::from_str(&config_str)
                    .with_context(|| format!("解析配置文件失败: {config_path}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 无配置文件：使用环境变量与默认值构建
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL")
                    .context("缺少 DATABASE_URL 环境变量，且未找到配置文件 config.toml")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                    },
                    groupbuy: GroupBuyConfig {
                        team_expire_hours: get_env_parse("TEAM_EXPIRE_HOURS", 24i64),
                        max_team_duration_hours: get_env_parse("MAX_TEAM_DURATION_HOURS", 72i64),
                        sweep_interval_secs: get_env_parse("SWEEP_INTERVAL_SECS", 300u64),
                        upstream_timeout_ms: get_env_parse("UPSTREAM_TIMEOUT_MS", 5000u64),
                        activity_teams_limit: get_env_parse("ACTIVITY_TEAMS_LIMIT", 20u64),
                    },
                    ledger: AccountLedgerConfig {
                        base_url: get_env("LEDGER_BASE_URL")
                            .unwrap_or_else(|| "http://localhost:8061".to_string()),
                    },
                    orders: OrderFactoryConfig {
                        base_url: get_env("ORDERS_BASE_URL")
                            .unwrap_or_else(|| "http://localhost:8062".to_string()),
                    },
                }
            }
            Err(e) => {
                bail!("无法读取配置文件 {config_path}: {e}");
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
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
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("TEAM_EXPIRE_HOURS")
            && let Ok(n) = v.parse()
        {
            config.groupbuy.team_expire_hours = n;
        }
        if let Ok(v) = env::var("MAX_TEAM_DURATION_HOURS")
            && let Ok(n) = v.parse()
        {
            config.groupbuy.max_team_duration_hours = n;
        }
        if let Ok(v) = env::var("SWEEP_INTERVAL_SECS")
            && let Ok(n) = v.parse()
        {
            config.groupbuy.sweep_interval_secs = n;
        }
        if let Ok(v) = env::var("UPSTREAM_TIMEOUT_MS")
            && let Ok(n) = v.parse()
        {
            config.groupbuy.upstream_timeout_ms = n;
        }
        if let Ok(v) = env::var("ACTIVITY_TEAMS_LIMIT")
            && let Ok(n) = v.parse()
        {
            config.groupbuy.activity_teams_limit = n;
        }
        if let Ok(v) = env::var("LEDGER_BASE_URL") {
            config.ledger.base_url = v;
        }
        if let Ok(v) = env::var("ORDERS_BASE_URL") {
            config.orders.base_url = v;
        }

        Ok(config)
    }
}
