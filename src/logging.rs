// Conditional logging macros - only active in debug builds

use crate::config::Config;
use env_logger::{Builder, Env, Target};
use std::fs::{self, OpenOptions};

const DEFAULT_FILTER: &str = "info";

#[cfg(debug_assertions)]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        log::debug!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {{
        if false {
            log::debug!($($arg)*);
        }
    }};
}

#[cfg(debug_assertions)]
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {
        log::info!($($arg)*);
    };
}

#[cfg(not(debug_assertions))]
#[macro_export]
macro_rules! info_log {
    ($($arg:tt)*) => {{
        if false {
            log::info!($($arg)*);
        }
    }};
}

/// Send log records to `memento.log` in the data directory.
///
/// The filter comes from `RUST_LOG`, defaulting to `info`. Returns false when
/// the log file cannot be opened or a logger is already installed; the app
/// then runs without logging.
pub fn init(config: &Config) -> bool {
    let path = config.log_path();
    let file = fs::create_dir_all(&config.data_dir)
        .and_then(|()| OpenOptions::new().create(true).append(true).open(&path));
    let file = match file {
        Ok(file) => file,
        Err(e) => {
            eprintln!("Logging disabled, cannot open {}: {e}", path.display());
            return false;
        }
    };

    Builder::from_env(Env::default().default_filter_or(DEFAULT_FILTER))
        .target(Target::Pipe(Box::new(file)))
        .format_timestamp_secs()
        .try_init()
        .is_ok()
}
