use std::time::Duration;

use anyhow::Context;

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub midtrans: MidtransConfig,
}

#[derive(Debug, Clone)]
pub struct MidtransConfig {
    pub server_key: String,
    pub is_production: bool,
    /// Replaces the Snap host chosen by `is_production`
    pub snap_base_url: Option<String>,
    /// Replaces the Core API host chosen by `is_production`
    pub core_base_url: Option<String>,
    pub timeout: Option<Duration>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let non_empty = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let server_key =
            non_empty("MIDTRANS_SERVER_KEY").context("MIDTRANS_SERVER_KEY must be set")?;
        let port = match non_empty("PORT") {
            Some(port) => port
                .trim()
                .parse()
                .with_context(|| format!("PORT {port:?} is not a valid port"))?,
            None => DEFAULT_PORT,
        };
        let is_production = match non_empty("MIDTRANS_IS_PRODUCTION") {
            Some(flag) => parse_flag(&flag)
                .with_context(|| format!("MIDTRANS_IS_PRODUCTION {flag:?} is not a boolean"))?,
            None => false,
        };
        let timeout = match non_empty("MIDTRANS_TIMEOUT_SECS") {
            Some(secs) => Some(Duration::from_secs(
                secs.trim()
                    .parse()
                    .with_context(|| format!("MIDTRANS_TIMEOUT_SECS {secs:?} is not a number"))?,
            )),
            None => None,
        };

        Ok(Self {
            port,
            midtrans: MidtransConfig {
                server_key,
                is_production,
                snap_base_url: non_empty("MIDTRANS_SNAP_BASE_URL"),
                core_base_url: non_empty("MIDTRANS_CORE_BASE_URL"),
                timeout,
            },
        })
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}
