use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum::http::HeaderValue;
use strum::{Display, EnumString};
use wheel_shared::constants::{
    WheelLayout, DEFAULT_FRAME_INTERVAL_MS, DEFAULT_ROTATIONS, DEFAULT_SPIN_DURATION_MS, MAX_ROTATIONS,
    MAX_SPIN_DURATION_MS, MIN_ROTATIONS, MIN_SPIN_DURATION_MS,
};
use wheel_shared::easing::Easing;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_ALLOWED_ORIGINS: &str = "http://127.0.0.1:8080,http://127.0.0.1:3000";

/// How the server picks stop angles when the client does not ask for one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum AngleMode {
    Uniform,
    Weighted,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub layout: WheelLayout,
    pub rotation_count: u32,
    pub spin_duration: Duration,
    pub frame_interval: Duration,
    pub easing: Easing,
    pub angle_mode: AngleMode,
    pub allowed_origins: Vec<HeaderValue>,
}

#[derive(Debug)]
pub enum ConfigLoadError {
    Invalid { key: &'static str, value: String },
    OutOfRange { key: &'static str, value: u64, min: u64, max: u64 },
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invalid { key, value } => write!(f, "Invalid value for {}: {:?}", key, value),
            Self::OutOfRange { key, value, min, max } => {
                write!(f, "{} must be between {} and {}, got {}", key, min, max, value)
            }
        }
    }
}

impl std::error::Error for ConfigLoadError {}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigLoadError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source. Missing keys take defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigLoadError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let rotation_count = parse_or(&lookup, "WHEEL_ROTATIONS", DEFAULT_ROTATIONS)?;
        check_range("WHEEL_ROTATIONS", rotation_count as u64, MIN_ROTATIONS as u64, MAX_ROTATIONS as u64)?;

        let duration_ms = parse_or(&lookup, "WHEEL_SPIN_DURATION_MS", DEFAULT_SPIN_DURATION_MS)?;
        check_range("WHEEL_SPIN_DURATION_MS", duration_ms, MIN_SPIN_DURATION_MS, MAX_SPIN_DURATION_MS)?;

        let frame_ms = parse_or(&lookup, "WHEEL_FRAME_INTERVAL_MS", DEFAULT_FRAME_INTERVAL_MS)?;
        check_range("WHEEL_FRAME_INTERVAL_MS", frame_ms, 1, 1000)?;

        let origins = lookup("WHEEL_ALLOWED_ORIGINS").unwrap_or_else(|| DEFAULT_ALLOWED_ORIGINS.to_string());
        let allowed_origins = origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(|origin| {
                origin.parse::<HeaderValue>().map_err(|_| ConfigLoadError::Invalid {
                    key: "WHEEL_ALLOWED_ORIGINS",
                    value: origin.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            bind_addr: parse_or(&lookup, "WHEEL_BIND_ADDR", parse_default(DEFAULT_BIND_ADDR)?)?,
            layout: parse_or(&lookup, "WHEEL_LAYOUT", WheelLayout::Classic)?,
            rotation_count,
            spin_duration: Duration::from_millis(duration_ms),
            frame_interval: Duration::from_millis(frame_ms),
            easing: parse_or(&lookup, "WHEEL_EASING", Easing::default())?,
            angle_mode: parse_or(&lookup, "WHEEL_ANGLE_MODE", AngleMode::Uniform)?,
            allowed_origins,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigLoadError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigLoadError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}

fn parse_default(addr: &str) -> Result<SocketAddr, ConfigLoadError> {
    addr.parse().map_err(|_| ConfigLoadError::Invalid {
        key: "WHEEL_BIND_ADDR",
        value: addr.to_string(),
    })
}

fn check_range(key: &'static str, value: u64, min: u64, max: u64) -> Result<(), ConfigLoadError> {
    if value < min || value > max {
        return Err(ConfigLoadError::OutOfRange { key, value, min, max });
    }
    Ok(())
}
