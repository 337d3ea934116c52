//! # API Configuration Module
//!
//! Loads the server configuration from environment variables, with defaults
//! for everything except the database, which is optional.
//!
//! ## Environment Variables
//!
//! - `API_HOST`: host address to bind to (default: "0.0.0.0")
//! - `API_PORT`: port to listen on (default: 3000)
//! - `DATABASE_URL`: PostgreSQL connection string (optional; in-memory store when unset)
//! - `DATABASE_MAX_CONNECTIONS`: pool size (default: 5)
//! - `DATABASE_STATEMENT_TIMEOUT_MS`: per-transaction timeout (default: 5000)
//! - `LOG_LEVEL`: logging level (default: "info")
//! - `API_CORS_ORIGINS`: comma-separated list of allowed CORS origins
//! - `API_REQUEST_TIMEOUT_SECONDS`: request timeout (default: 30)
//! - `SWEEP_INTERVAL_SECONDS`: expiry sweeper period (default: 60)
//! - `REFERENCE_TIMEZONE`: IANA zone in which dates are read (default: "UTC")

use std::{env, str::FromStr, time::Duration};

use carebook_db::GatewayOptions;
use carebook_engine::{BookingPolicy, sweeper::DEFAULT_SWEEP_INTERVAL};
use chrono_tz::Tz;
use eyre::{Result, WrapErr, eyre};
use tracing::Level;

/// Configuration for the Carebook server
///
/// # Example
///
/// ```no_run
/// use carebook_api::config::ApiConfig;
///
/// fn example() -> eyre::Result<()> {
///     let config = ApiConfig::from_env()?;
///     println!("Starting server on {}", config.server_addr());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Host address for the API server (e.g., "127.0.0.1", "0.0.0.0")
    pub host: String,

    /// Port for the API server to listen on
    pub port: u16,

    /// PostgreSQL connection string; `None` selects the in-memory store
    pub database_url: Option<String>,

    pub database_max_connections: u32,

    pub statement_timeout: Duration,

    /// Log level for the application
    pub log_level: Level,

    /// CORS allowed origins (optional)
    pub cors_origins: Option<Vec<String>>,

    /// Request timeout in seconds
    pub request_timeout: u64,

    pub sweep_interval: Duration,

    /// Timezone in which calendar dates in queries are interpreted
    pub reference_tz: Tz,
}

fn parsed<T: FromStr>(name: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|err| eyre!("Invalid {name} value {raw:?}: {err}")),
        _ => Ok(default),
    }
}

impl ApiConfig {
    /// Creates a new ApiConfig from environment variables
    ///
    /// # Errors
    ///
    /// Fails when a numeric setting cannot be parsed or `REFERENCE_TIMEZONE`
    /// is not a known IANA zone.
    pub fn from_env() -> Result<Self> {
        // Network settings
        let host = env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = parsed("API_PORT", 3000)?;

        // Database settings
        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty());
        let database_max_connections = parsed("DATABASE_MAX_CONNECTIONS", 5)?;
        let statement_timeout = Duration::from_millis(parsed("DATABASE_STATEMENT_TIMEOUT_MS", 5000)?);

        // Logging settings
        let log_level = match env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()).as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "info" => Level::INFO,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        };

        // CORS settings
        let cors_origins = env::var("API_CORS_ORIGINS").ok().map(|origins| {
            origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        });

        let request_timeout = parsed("API_REQUEST_TIMEOUT_SECONDS", 30)?;

        // Booking settings
        let sweep_interval =
            Duration::from_secs(parsed("SWEEP_INTERVAL_SECONDS", DEFAULT_SWEEP_INTERVAL.as_secs())?);
        if sweep_interval.is_zero() {
            return Err(eyre!("SWEEP_INTERVAL_SECONDS must be positive"));
        }
        let reference_tz = env::var("REFERENCE_TIMEZONE")
            .ok()
            .filter(|tz| !tz.trim().is_empty())
            .map(|tz| {
                Tz::from_str(tz.trim())
                    .map_err(|err| eyre!(err))
                    .wrap_err_with(|| format!("Invalid REFERENCE_TIMEZONE {tz:?}"))
            })
            .transpose()?
            .unwrap_or(chrono_tz::UTC);

        Ok(Self {
            host,
            port,
            database_url,
            database_max_connections,
            statement_timeout,
            log_level,
            cors_origins,
            request_timeout,
            sweep_interval,
            reference_tz,
        })
    }

    /// Returns the server address as a string (e.g., "127.0.0.1:8080")
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn gateway_options(&self) -> GatewayOptions {
        GatewayOptions {
            database_url: self.database_url.clone(),
            max_connections: self.database_max_connections,
            statement_timeout: self.statement_timeout,
        }
    }

    pub fn booking_policy(&self) -> BookingPolicy {
        BookingPolicy::default().with_reference_tz(self.reference_tz)
    }
}
