use clap::Parser;
use std::path::PathBuf;

use crate::config::{Config, TilerKind};
use crate::error::ConfigError;

const DEBUG_LOG_FILE: &str = "spacemap.log";

/// Command-line arguments.
///
/// ```rust
/// use clap::Parser;
/// use spacemap::args::Args;
///
/// let args = Args::parse_from(["spacemap", "--max-depth", "3", "/tmp"]);
/// assert_eq!(args.max_depth, Some(3));
/// assert!(args.directory.ends_with("tmp"));
/// ```
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Visually summarize disk usage of DIRECTORY (the current directory by default)"
)]
pub struct Args {
    #[arg(default_value = ".", value_hint = clap::ValueHint::DirPath)]
    pub directory: PathBuf,

    #[arg(long, help = "Initial depth cap, 0 for unlimited")]
    pub max_depth: Option<usize>,

    #[arg(long, value_enum, help = "Layout strategy")]
    pub tiler: Option<TilerKind>,

    #[arg(long, help = "Padding around each cell, in terminal cells")]
    pub padding: Option<f64>,

    #[arg(long, value_hint = clap::ValueHint::FilePath, help = "Read settings from a JSON file")]
    pub config: Option<PathBuf>,

    #[arg(long, value_hint = clap::ValueHint::FilePath, help = "Write logs to this file")]
    pub log_file: Option<PathBuf>,

    #[arg(long, help = "Log to spacemap.log unless --log-file is given")]
    pub debug: bool,
}

impl Args {
    /// Settings from `--config` (or defaults) with flags applied on top.
    pub fn resolve_config(&self) -> Result<Config, ConfigError> {
        let mut config = match &self.config {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(max_depth) = self.max_depth {
            config.max_depth = max_depth;
        }
        if let Some(tiler) = self.tiler {
            config.tiler = tiler;
        }
        if let Some(padding) = self.padding {
            config.padding = padding;
        }
        if self.log_file.is_some() {
            config.log_file = self.log_file.clone();
        } else if self.debug && config.log_file.is_none() {
            config.log_file = Some(PathBuf::from(DEBUG_LOG_FILE));
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let args = Args::parse_from(["spacemap"]);
        assert_eq!(args.directory, PathBuf::from("."));

        let config = args.resolve_config().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_flags_override_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "max_depth": 4, "tiler": "horizontal", "padding": 0.0 }}"#).unwrap();
        let path = file.path().to_string_lossy().to_string();

        let args = Args::parse_from(["spacemap", "--config", &path, "--tiler", "vertical"]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.tiler, TilerKind::Vertical);
        assert_eq!(config.padding, 0.0);
    }

    #[test]
    fn test_debug_picks_default_log_file() {
        let args = Args::parse_from(["spacemap", "--debug"]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from(DEBUG_LOG_FILE)));

        let args = Args::parse_from(["spacemap", "--debug", "--log-file", "/tmp/x.log"]);
        let config = args.resolve_config().unwrap();
        assert_eq!(config.log_file, Some(PathBuf::from("/tmp/x.log")));
    }

    #[test]
    fn test_tiler_names() {
        let args = Args::parse_from(["spacemap", "--tiler", "slice-and-dice"]);
        assert_eq!(args.tiler, Some(TilerKind::SliceAndDice));
        assert!(Args::try_parse_from(["spacemap", "--tiler", "spiral"]).is_err());
    }
}
