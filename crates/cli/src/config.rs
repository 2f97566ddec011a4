//! CLI configuration read from the environment.
use std::env;
use std::path::PathBuf;

/// Where the CLI keeps its roster and finds its content.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliConfig {
    pub roster_path: PathBuf,
    /// Directory with `config.toml`, `tables.toml` and `sheets/`; bundled data when unset.
    pub content_dir: Option<PathBuf>,
}

impl CliConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `ROSTER_PATH` - Roster file (default: `roster.jsonl` in the platform data directory)
    /// - `CONTENT_DIR` - Content directory (default: bundled content)
    pub fn from_env() -> Self {
        Self {
            roster_path: env::var_os("ROSTER_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(default_roster_path),
            content_dir: env::var_os("CONTENT_DIR").map(PathBuf::from),
        }
    }
}

/// Platform data directory, e.g. `~/.local/share/character-sheet/roster.jsonl` on Linux.
fn default_roster_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "character-sheet")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .unwrap_or_else(|| PathBuf::from("./save_data"))
        .join("roster.jsonl")
}
