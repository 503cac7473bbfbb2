use std::net::SocketAddr;
use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "MediTrack";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_EXPIRY_WARNING_DAYS: i64 = 30;
pub const DEFAULT_UPCOMING_DUTY_DAYS: i64 = 7;
pub const DEFAULT_ANNOUNCEMENT_LIMIT: u32 = 5;
/// Longest look-ahead or expiry window accepted from clients and config.
pub const MAX_WINDOW_DAYS: i64 = 3650;

/// Get the application data directory (~/MediTrack/).
/// Falls back to the working directory when no home directory is known.
pub fn app_data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Default SQLite database location.
pub fn default_db_path() -> PathBuf {
    app_data_dir().join("meditrack.db")
}

/// Log filter used when `RUST_LOG` is not set.
pub fn default_log_filter() -> &'static str {
    if cfg!(debug_assertions) {
        "meditrack=debug,meditrack_lib=debug,tower=info"
    } else {
        "meditrack=info,meditrack_lib=info,warn"
    }
}

/// Windows used by the BHW dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardSettings {
    pub expiry_warning_days: i64,
    pub upcoming_duty_days: i64,
    pub announcement_limit: u32,
}

impl Default for DashboardSettings {
    fn default() -> Self {
        Self {
            expiry_warning_days: DEFAULT_EXPIRY_WARNING_DAYS,
            upcoming_duty_days: DEFAULT_UPCOMING_DUTY_DAYS,
            announcement_limit: DEFAULT_ANNOUNCEMENT_LIMIT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub db_path: PathBuf,
    pub bind_addr: SocketAddr,
    pub dashboard: DashboardSettings,
}

impl ServerConfig {
    /// Read `MEDITRACK_*` environment variables. Unparseable values fall
    /// back to their defaults with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let db_path = lookup("MEDITRACK_DB_PATH")
            .filter(|p| !p.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(default_db_path);

        let bind_addr = parse_or_default(
            "MEDITRACK_BIND_ADDR",
            lookup("MEDITRACK_BIND_ADDR"),
            default_bind_addr(),
        );
        let expiry_warning_days = parse_or_default(
            "MEDITRACK_EXPIRY_WARNING_DAYS",
            lookup("MEDITRACK_EXPIRY_WARNING_DAYS"),
            DEFAULT_EXPIRY_WARNING_DAYS,
        );
        let upcoming_duty_days = parse_or_default(
            "MEDITRACK_UPCOMING_DUTY_DAYS",
            lookup("MEDITRACK_UPCOMING_DUTY_DAYS"),
            DEFAULT_UPCOMING_DUTY_DAYS,
        );

        Self {
            db_path,
            bind_addr,
            dashboard: DashboardSettings {
                expiry_warning_days: window_days(
                    "MEDITRACK_EXPIRY_WARNING_DAYS",
                    expiry_warning_days,
                    DEFAULT_EXPIRY_WARNING_DAYS,
                ),
                upcoming_duty_days: window_days(
                    "MEDITRACK_UPCOMING_DUTY_DAYS",
                    upcoming_duty_days,
                    DEFAULT_UPCOMING_DUTY_DAYS,
                ),
                announcement_limit: DEFAULT_ANNOUNCEMENT_LIMIT,
            },
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8080))
}

fn parse_or_default<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> T {
    match raw {
        None => default,
        Some(value) => match value.trim().parse() {
            Ok(parsed) => parsed,
            Err(_) => {
                tracing::warn!(key, value = %value, "Invalid configuration value, using default");
                default
            }
        },
    }
}

fn window_days(key: &str, value: i64, default: i64) -> i64 {
    if (0..=MAX_WINDOW_DAYS).contains(&value) {
        value
    } else {
        tracing::warn!(key, value, max = MAX_WINDOW_DAYS, "Window out of range, using default");
        default
    }
}
