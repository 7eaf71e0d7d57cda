use std::net::SocketAddr;
use tracing::warn;
use uncalc_core::measurement::DEFAULT_GRAVITY;

pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Server settings read from the environment
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    /// Gravity for new sessions, m/s^2
    pub gravity: f64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            gravity: DEFAULT_GRAVITY,
        }
    }
}

impl ServerConfig {
    /// `UNCALC_ADDR` and `UNCALC_GRAVITY`; unparsable values fall back to defaults
    pub fn from_env() -> Self {
        Self::from_vars(
            std::env::var("UNCALC_ADDR").ok().as_deref(),
            std::env::var("UNCALC_GRAVITY").ok().as_deref(),
        )
    }

    fn from_vars(addr: Option<&str>, gravity: Option<&str>) -> Self {
        let mut config = Self::default();
        if let Some(addr) = addr {
            match addr.parse() {
                Ok(parsed) => config.addr = parsed,
                Err(_) => warn!("Invalid UNCALC_ADDR {:?}, using {}", addr, DEFAULT_ADDR),
            }
        }
        if let Some(gravity) = gravity {
            match gravity.parse::<f64>() {
                Ok(g) if g.is_finite() && g > 0.0 => config.gravity = g,
                _ => warn!("Invalid UNCALC_GRAVITY {:?}, using {}", gravity, DEFAULT_GRAVITY),
            }
        }
        config
    }
}
