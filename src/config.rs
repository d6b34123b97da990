use crate::application::booking::{BookingSettings, DEFAULT_STORE_TIMEOUT};
use crate::domain::{Money, pricing::DEFAULT_EXTRA_CHARGE_PER_HOUR};
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

const DEFAULT_DATABASE_URL: &str = "postgres://localhost/rental_booking";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// 設定読み込みのエラー
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// 環境変数から読み込むアプリケーション設定
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub store_timeout: Duration,
    pub default_extra_charge_per_hour: Money,
    /// 起動時にデモ用の車両と利用者を投入するか
    pub seed_demo_data: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            db_max_connections: DEFAULT_MAX_CONNECTIONS,
            store_timeout: DEFAULT_STORE_TIMEOUT,
            default_extra_charge_per_hour: DEFAULT_EXTRA_CHARGE_PER_HOUR,
            seed_demo_data: false,
        }
    }
}

impl AppConfig {
    /// プロセスの環境変数から設定を読み込む
    ///
    /// 未設定の項目は既定値。値が解釈できない場合は `ConfigError`。
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 任意の参照関数から設定を組み立てる
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store_timeout_ms: Option<u64> = parse_var(&lookup, "STORE_TIMEOUT_MS")?;
        let extra_charge: Option<u64> = parse_var(&lookup, "DEFAULT_EXTRA_CHARGE_PER_HOUR")?;

        Ok(Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            db_max_connections: parse_var(&lookup, "DB_MAX_CONNECTIONS")?
                .unwrap_or(defaults.db_max_connections),
            store_timeout: store_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.store_timeout),
            default_extra_charge_per_hour: extra_charge
                .map(Money::new)
                .unwrap_or(defaults.default_extra_charge_per_hour),
            seed_demo_data: parse_var(&lookup, "SEED_DEMO_DATA")?
                .unwrap_or(defaults.seed_demo_data),
        })
    }

    pub fn booking_settings(&self) -> BookingSettings {
        BookingSettings {
            store_timeout: self.store_timeout,
            default_extra_charge_per_hour: self.default_extra_charge_per_hour,
        }
    }
}

fn parse_var<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { name, value: raw }),
    }
}
