//! User settings from `cellflow.toml`.
//!
//! ```toml
//! [grid]
//! rows = 20
//! cols = 8
//!
//! [chart]
//! width = 120
//! height = 40
//! ```
//!
//! A missing file means defaults. A file that cannot be read or parsed is
//! reported as a warning and ignored.

use directories::ProjectDirs;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const MAX_CONFIG_FILE_BYTES: u64 = 65_536; // 64 KiB

/// Smallest canvas textplots will draw, in points.
pub const MIN_CHART_WIDTH: u32 = 32;
pub const MIN_CHART_HEIGHT: u32 = 3;

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub grid: GridSection,
    pub chart: ChartSection,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GridSection {
    pub rows: Option<usize>,
    pub cols: Option<usize>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChartSection {
    pub width: u32,
    pub height: u32,
}

impl Default for ChartSection {
    fn default() -> Self {
        ChartSection {
            width: 100,
            height: 40,
        }
    }
}

/// Load settings from `explicit` or, failing that, the user config dir.
/// Returns the settings plus any warnings to show the user.
pub fn load_config(explicit: Option<&Path>) -> (Config, Vec<String>) {
    let mut warnings = Vec::new();
    let Some(path) = explicit.map(Path::to_path_buf).or_else(user_config_path) else {
        return (Config::default(), warnings);
    };

    if !path.exists() {
        if explicit.is_some() {
            warnings.push(format!("Config file not found: {}", path.display()));
        }
        return (Config::default(), warnings);
    }

    let config = match std::fs::metadata(&path) {
        Ok(meta) if meta.len() > MAX_CONFIG_FILE_BYTES => {
            warnings.push(format!(
                "Refusing to read {}: file too large ({} bytes, max {})",
                path.display(),
                meta.len(),
                MAX_CONFIG_FILE_BYTES
            ));
            None
        }
        Ok(_) => match std::fs::read_to_string(&path) {
            Ok(content) => match parse_config(&content) {
                Ok(config) => Some(config),
                Err(err) => {
                    warnings.push(format!("Failed to parse {}: {}", path.display(), err));
                    None
                }
            },
            Err(err) => {
                warnings.push(format!("Failed to read {}: {}", path.display(), err));
                None
            }
        },
        Err(err) => {
            warnings.push(format!(
                "Failed to read metadata for {}: {}",
                path.display(),
                err
            ));
            None
        }
    };

    (config.unwrap_or_default(), warnings)
}

fn parse_config(content: &str) -> Result<Config, String> {
    let config: Config = toml::from_str(content).map_err(|e| e.to_string())?;
    if config.grid.rows == Some(0) || config.grid.cols == Some(0) {
        return Err("grid rows and cols must be at least 1".to_string());
    }
    if config.chart.width < MIN_CHART_WIDTH || config.chart.height < MIN_CHART_HEIGHT {
        return Err(format!(
            "chart must be at least {}x{}",
            MIN_CHART_WIDTH, MIN_CHART_HEIGHT
        ));
    }
    Ok(config)
}

fn user_config_path() -> Option<PathBuf> {
    let proj = ProjectDirs::from("", "", "cellflow")?;
    let mut path = proj.config_dir().to_path_buf();
    path.push("cellflow.toml");
    Some(path)
}
