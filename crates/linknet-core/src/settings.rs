use clap::{CommandFactory, Parser};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Connection-archive insight pipeline for exported social-network data
#[derive(Parser, Debug, Clone)]
#[command(
    name = "linknet",
    about = "Analyze an exported connections archive: aggregates, timelines and a relationship graph",
    version
)]
pub struct Settings {
    /// Path to the exported archive (zip) or an already-extracted directory
    pub archive: Option<PathBuf>,

    /// Drop name and email columns before any processing
    #[arg(long)]
    pub privacy: bool,

    /// How many rows of each aggregate table to display (0-50)
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u16).range(0..=50))]
    pub top_n: u16,

    /// Minimum aggregate count for a category to become a graph node (2-50)
    #[arg(long, default_value = "6", value_parser = clap::value_parser!(u64).range(2..=50))]
    pub cutoff: u64,

    /// Size graph nodes by log(count) instead of linearly
    #[arg(long)]
    pub log_scale: bool,

    /// Similarity threshold for consolidating "Data Scientist" variants (0-100)
    #[arg(long, default_value = "75", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub ds_threshold: u8,

    /// Similarity threshold for consolidating "Software Engineer" variants (0-100)
    #[arg(long, default_value = "85", value_parser = clap::value_parser!(u8).range(0..=100))]
    pub swe_threshold: u8,

    /// Column the relationship graph is built over
    #[arg(long, default_value = "company", value_parser = ["company", "position"])]
    pub network_column: String,

    /// Override the company denylist regex (default filters freelance,
    /// self-employed, and names containing '.' or '-')
    #[arg(long)]
    pub company_denylist: Option<String>,

    /// Directory the graph exports are written into
    #[arg(long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Logging level
    #[arg(long, default_value = "INFO", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Clear saved configuration
    #[arg(long)]
    pub clear: bool,
}

// ── LastUsedParams ─────────────────────────────────────────────────────────────

/// Persisted last-used parameters saved to `~/.linknet/last_used.json`.
#[derive(Debug, Serialize, Deserialize, Default, Clone)]
pub struct LastUsedParams {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_n: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cutoff: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_scale: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_column: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ds_threshold: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub swe_threshold: Option<u8>,
}

impl LastUsedParams {
    /// Return the default path to the persisted config file.
    /// Uses `~/.linknet/last_used.json`.
    pub fn config_path() -> PathBuf {
        Self::config_path_in(&dirs::home_dir().unwrap_or_else(|| PathBuf::from(".")))
    }

    /// Return the config path rooted at `base_dir` (used for testing).
    pub fn config_path_in(base_dir: &std::path::Path) -> PathBuf {
        base_dir.join(".linknet").join("last_used.json")
    }

    /// Load persisted params from the default path.
    /// Returns `Default` when the file is absent or cannot be parsed.
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load persisted params from an explicit path.
    pub fn load_from(path: &std::path::Path) -> Self {
        let Ok(content) = std::fs::read_to_string(path) else {
            return Self::default();
        };
        serde_json::from_str(&content).unwrap_or_default()
    }

    /// Atomically write params to the default path, creating parent
    /// directories if needed.
    pub fn save(&self) -> Result<(), std::io::Error> {
        self.save_to(&Self::config_path())
    }

    /// Atomically write params to an explicit path.
    pub fn save_to(&self, path: &std::path::Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;

        // Write to a temp file then rename for atomicity.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, &json)?;
        std::fs::rename(&tmp, path)?;

        Ok(())
    }

    /// Delete the config file at an explicit path if it exists.
    pub fn clear_at(path: &std::path::Path) -> Result<(), std::io::Error> {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

// ── Settings impl ──────────────────────────────────────────────────────────────

impl Settings {
    /// Parse CLI arguments, merge with last-used params where no explicit CLI
    /// value was provided, and persist the result.
    pub fn load_with_last_used() -> Self {
        Self::load_with_last_used_impl(
            std::env::args_os().collect(),
            &LastUsedParams::config_path(),
        )
    }

    /// Full implementation – accepts args and an explicit config path so that
    /// tests can redirect to a temporary directory.
    pub fn load_with_last_used_impl(
        args: Vec<std::ffi::OsString>,
        config_path: &std::path::Path,
    ) -> Self {
        // Build raw ArgMatches so we can query ValueSource.
        let matches = Settings::command().get_matches_from(args.clone());

        // Parse into the typed struct using the same args.
        let mut settings = Settings::parse_from(args);

        if settings.clear {
            let _ = LastUsedParams::clear_at(config_path);
            return Self::apply_debug(settings);
        }

        let last = LastUsedParams::load_from(config_path);

        // Merge last-used values for fields that were NOT explicitly set on
        // the command line (CLI always wins). The archive path and the
        // privacy flag are never loaded from last-used.
        if !is_arg_explicitly_set(&matches, "top_n") {
            if let Some(v) = last.top_n {
                settings.top_n = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "cutoff") {
            if let Some(v) = last.cutoff {
                settings.cutoff = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "log_scale") {
            if let Some(v) = last.log_scale {
                settings.log_scale = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "network_column") {
            if let Some(v) = last.network_column {
                settings.network_column = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "ds_threshold") {
            if let Some(v) = last.ds_threshold {
                settings.ds_threshold = v;
            }
        }
        if !is_arg_explicitly_set(&matches, "swe_threshold") {
            if let Some(v) = last.swe_threshold {
                settings.swe_threshold = v;
            }
        }

        settings = Self::apply_debug(settings);

        // Persist current settings for next run.
        let params = LastUsedParams::from(&settings);
        let _ = params.save_to(config_path);

        settings
    }

    /// `--debug` overrides the log level.
    fn apply_debug(mut settings: Settings) -> Settings {
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }
}

// ── Conversion ─────────────────────────────────────────────────────────────────

impl From<&Settings> for LastUsedParams {
    fn from(s: &Settings) -> Self {
        LastUsedParams {
            top_n: Some(s.top_n),
            cutoff: Some(s.cutoff),
            log_scale: Some(s.log_scale),
            network_column: Some(s.network_column.clone()),
            ds_threshold: Some(s.ds_threshold),
            swe_threshold: Some(s.swe_threshold),
        }
    }
}

// ── Helper: check if an arg was explicitly set on the command line ─────────────

/// Returns `true` when `name` was supplied explicitly on the command line
/// (not via default value or environment variable).
fn is_arg_explicitly_set(matches: &clap::ArgMatches, name: &str) -> bool {
    matches.value_source(name) == Some(clap::parser::ValueSource::CommandLine)
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn tmp_config_path(tmp: &TempDir) -> PathBuf {
        LastUsedParams::config_path_in(tmp.path())
    }

    fn round_trip(tmp: &TempDir, params: &LastUsedParams) -> LastUsedParams {
        let path = tmp_config_path(tmp);
        params.save_to(&path).expect("save");
        LastUsedParams::load_from(&path)
    }

    // ── LastUsedParams persistence ────────────────────────────────────────────

    #[test]
    fn test_last_used_params_save_load() {
        let tmp = TempDir::new().expect("tempdir");
        let params = LastUsedParams {
            top_n: Some(25),
            cutoff: Some(4),
            log_scale: Some(true),
            network_column: Some("position".to_string()),
            ds_threshold: Some(70),
            swe_threshold: Some(90),
        };

        let loaded = round_trip(&tmp, &params);

        assert_eq!(loaded.top_n, Some(25));
        assert_eq!(loaded.cutoff, Some(4));
        assert_eq!(loaded.log_scale, Some(true));
        assert_eq!(loaded.network_column, Some("position".to_string()));
        assert_eq!(loaded.ds_threshold, Some(70));
        assert_eq!(loaded.swe_threshold, Some(90));
    }

    #[test]
    fn test_last_used_params_clear() {
        let tmp = TempDir::new().expect("tempdir");
        let path = tmp_config_path(&tmp);

        let params = LastUsedParams {
            top_n: Some(15),
            ..Default::default()
        };
        params.save_to(&path).expect("save");
        assert!(path.exists(), "file must exist after save");

        LastUsedParams::clear_at(&path).expect("clear");
        assert!(!path.exists(), "file must be gone after clear");
    }

    #[test]
    fn test_last_used_params_default_when_missing() {
        let tmp = TempDir::new().expect("tempdir");
        let loaded = LastUsedParams::load_from(&tmp_config_path(&tmp));
        assert!(loaded.top_n.is_none());
        assert!(loaded.cutoff.is_none());
        assert!(loaded.log_scale.is_none());
        assert!(loaded.network_column.is_none());
    }

    // ── Settings defaults and parsing ─────────────────────────────────────────

    #[test]
    fn test_settings_default_values() {
        let settings = Settings::parse_from(["linknet"]);

        assert!(settings.archive.is_none());
        assert!(!settings.privacy);
        assert_eq!(settings.top_n, 10);
        assert_eq!(settings.cutoff, 6);
        assert!(!settings.log_scale);
        assert_eq!(settings.ds_threshold, 75);
        assert_eq!(settings.swe_threshold, 85);
        assert_eq!(settings.network_column, "company");
        assert!(settings.company_denylist.is_none());
        assert_eq!(settings.out_dir, PathBuf::from("."));
        assert_eq!(settings.log_level, "INFO");
        assert!(settings.log_file.is_none());
        assert!(!settings.debug);
        assert!(!settings.clear);
    }

    #[test]
    fn test_settings_cli_archive_positional() {
        let settings = Settings::parse_from(["linknet", "export.zip"]);
        assert_eq!(settings.archive, Some(PathBuf::from("export.zip")));
    }

    #[test]
    fn test_settings_cli_cutoff() {
        let settings = Settings::parse_from(["linknet", "--cutoff", "12"]);
        assert_eq!(settings.cutoff, 12);
    }

    #[test]
    fn test_settings_cli_cutoff_out_of_range_rejected() {
        let result = Settings::try_parse_from(["linknet", "--cutoff", "1"]);
        assert!(result.is_err(), "cutoff below 2 must be rejected");
    }

    #[test]
    fn test_settings_cli_top_n_out_of_range_rejected() {
        let result = Settings::try_parse_from(["linknet", "--top-n", "51"]);
        assert!(result.is_err(), "top-n above 50 must be rejected");
    }

    #[test]
    fn test_settings_cli_network_column_validated() {
        let result = Settings::try_parse_from(["linknet", "--network-column", "salary"]);
        assert!(result.is_err());
        let settings = Settings::parse_from(["linknet", "--network-column", "position"]);
        assert_eq!(settings.network_column, "position");
    }

    // ── load_with_last_used (uses config path injection) ──────────────────────

    #[test]
    fn test_load_with_last_used_merges_persisted_cutoff() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let params = LastUsedParams {
            cutoff: Some(9),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");

        let settings = Settings::load_with_last_used_impl(vec!["linknet".into()], &config_path);
        assert_eq!(settings.cutoff, 9);
    }

    #[test]
    fn test_load_with_last_used_cli_overrides_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let params = LastUsedParams {
            cutoff: Some(9),
            top_n: Some(5),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");

        let settings = Settings::load_with_last_used_impl(
            vec!["linknet".into(), "--cutoff".into(), "3".into()],
            &config_path,
        );
        assert_eq!(settings.cutoff, 3, "explicit CLI value must win");
        assert_eq!(settings.top_n, 5, "unset field still merges");
    }

    #[test]
    fn test_load_with_last_used_clear_removes_file() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let params = LastUsedParams {
            top_n: Some(20),
            ..Default::default()
        };
        params.save_to(&config_path).expect("save");
        assert!(config_path.exists(), "file must exist before clear");

        Settings::load_with_last_used_impl(
            vec!["linknet".into(), "--clear".into()],
            &config_path,
        );

        assert!(!config_path.exists(), "file must be gone after --clear");
    }

    #[test]
    fn test_load_with_last_used_debug_overrides_log_level() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        let settings = Settings::load_with_last_used_impl(
            vec!["linknet".into(), "--debug".into()],
            &config_path,
        );
        assert_eq!(settings.log_level, "DEBUG");
    }

    #[test]
    fn test_load_with_last_used_persists_after_run() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec!["linknet".into(), "--top-n".into(), "30".into()],
            &config_path,
        );

        assert!(
            config_path.exists(),
            "config file must be persisted after run"
        );
        let loaded = LastUsedParams::load_from(&config_path);
        assert_eq!(loaded.top_n, Some(30));
    }

    #[test]
    fn test_load_with_last_used_archive_never_persisted() {
        let tmp = TempDir::new().expect("tempdir");
        let config_path = tmp_config_path(&tmp);

        Settings::load_with_last_used_impl(
            vec!["linknet".into(), "export.zip".into()],
            &config_path,
        );

        let content = std::fs::read_to_string(&config_path).expect("read config");
        assert!(
            !content.contains("export.zip"),
            "archive path must not be written to last-used params"
        );
    }
}
