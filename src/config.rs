use crate::cli::Cli;
use crate::quiz::DEFAULT_POOL_SIZE;
use std::path::{Path, PathBuf};

pub const APP_DIR_NAME: &str = "memento";
pub const WORDS_FILE: &str = "words.json";
pub const STATS_FILE: &str = "stats.json";
pub const LOG_FILE: &str = "memento.log";

/// Resolved runtime settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Holds both documents, the log, and CSV exchange files.
    pub data_dir: PathBuf,
    pub quiz_size: usize,
    pub plain: bool,
}

impl Config {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            quiz_size: DEFAULT_POOL_SIZE,
            plain: false,
        }
    }

    pub fn from_cli(cli: &Cli) -> Self {
        Self {
            data_dir: cli.data_dir.clone().unwrap_or_else(default_data_dir),
            quiz_size: cli.quiz_size,
            plain: cli.plain,
        }
    }

    pub fn words_path(&self) -> PathBuf {
        self.data_dir.join(WORDS_FILE)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.data_dir.join(STATS_FILE)
    }

    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(LOG_FILE)
    }

    /// Resolve a user-supplied exchange file name; absolute paths are kept as given.
    pub fn exchange_path(&self, name: &str) -> PathBuf {
        let name = Path::new(name.trim());
        self.data_dir.join(name)
    }
}

/// Platform data directory for memento, or `./data` when the platform has none.
pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join(APP_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from("data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_live_in_data_dir() {
        let config = Config::new("/tmp/memento-test");
        assert_eq!(config.words_path(), PathBuf::from("/tmp/memento-test/words.json"));
        assert_eq!(config.stats_path(), PathBuf::from("/tmp/memento-test/stats.json"));
        assert_eq!(config.log_path(), PathBuf::from("/tmp/memento-test/memento.log"));
    }

    #[test]
    fn test_exchange_path_relative_and_absolute() {
        let config = Config::new("/tmp/memento-test");
        assert_eq!(
            config.exchange_path(" words.csv "),
            PathBuf::from("/tmp/memento-test/words.csv")
        );
        assert_eq!(
            config.exchange_path("/elsewhere/list.csv"),
            PathBuf::from("/elsewhere/list.csv")
        );
    }

    #[test]
    fn test_from_cli_uses_defaults() {
        let cli = Cli {
            data_dir: None,
            quiz_size: DEFAULT_POOL_SIZE,
            plain: false,
        };
        let config = Config::from_cli(&cli);
        assert_eq!(config.data_dir, default_data_dir());
        assert_eq!(config.quiz_size, 15);
    }

    #[test]
    fn test_from_cli_with_data_dir() {
        let cli = Cli {
            data_dir: Some(PathBuf::from("custom")),
            quiz_size: 5,
            plain: true,
        };
        let config = Config::from_cli(&cli);
        assert_eq!(config.words_path(), PathBuf::from("custom/words.json"));
        assert_eq!(config.quiz_size, 5);
        assert!(config.plain);
    }
}
