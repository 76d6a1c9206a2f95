use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::convert::encoding_for_label;
use crate::domain::header::HeaderRenamer;

/// File name looked up in the working directory before the home directory.
pub const LOCAL_CONFIG_FILE: &str = "csvsnake.json";

/// Everything one conversion run needs. Supplied by the caller; the converter
/// never falls back to built-in paths.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Source CSV
    pub input_path: PathBuf,
    /// Destination CSV, replaced atomically on success
    pub output_path: PathBuf,
    /// WHATWG label of the source encoding
    #[serde(default = "default_encoding")]
    pub encoding: String,
    #[serde(default)]
    pub line_ending: LineEnding,
    /// Header overrides applied before the casing rule
    #[serde(default)]
    pub overrides: BTreeMap<String, String>,
    #[serde(default = "default_true")]
    pub builtin_overrides: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineEnding {
    #[default]
    Lf,
    Crlf,
}

impl LineEnding {
    pub fn terminator(self) -> csv::Terminator {
        match self {
            LineEnding::Lf => csv::Terminator::Any(b'\n'),
            LineEnding::Crlf => csv::Terminator::CRLF,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::Crlf => "\r\n",
        }
    }
}

fn default_encoding() -> String {
    "utf-8".into()
}

fn default_true() -> bool {
    true
}

impl ConvertConfig {
    /// Config with default options for the given pair of paths.
    pub fn new(input_path: impl Into<PathBuf>, output_path: impl Into<PathBuf>) -> Self {
        Self {
            input_path: input_path.into(),
            output_path: output_path.into(),
            encoding: default_encoding(),
            line_ending: LineEnding::default(),
            overrides: BTreeMap::new(),
            builtin_overrides: true,
        }
    }

    /// Load from a JSON file. Relative paths inside it are taken relative to
    /// the file's own directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let mut config: ConvertConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config JSON in {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.resolve_relative(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Find the config file: `./csvsnake.json`, then `~/.csvsnake/config.json`.
    pub fn discover() -> Result<PathBuf> {
        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.is_file() {
            return Ok(local);
        }
        let home = default_config_path()?;
        if home.is_file() {
            return Ok(home);
        }
        anyhow::bail!(
            "No config found; create {} or {}",
            local.display(),
            home.display()
        )
    }

    pub fn resolve_relative(&mut self, base: &Path) {
        if self.input_path.is_relative() {
            self.input_path = base.join(&self.input_path);
        }
        if self.output_path.is_relative() {
            self.output_path = base.join(&self.output_path);
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.input_path.as_os_str().is_empty() {
            anyhow::bail!("Config must set input_path");
        }
        if self.output_path.as_os_str().is_empty() {
            anyhow::bail!("Config must set output_path");
        }
        if self.input_path == self.output_path {
            anyhow::bail!(
                "input_path and output_path must differ: {}",
                self.input_path.display()
            );
        }
        self.source_encoding()?;
        for key in self.overrides.keys() {
            if key.trim().is_empty() {
                anyhow::bail!("Override keys must not be blank");
            }
        }
        Ok(())
    }

    pub fn source_encoding(&self) -> Result<&'static encoding_rs::Encoding> {
        encoding_for_label(&self.encoding)
            .with_context(|| format!("Unknown encoding label: {}", self.encoding))
    }

    /// The header renamer this config describes.
    pub fn renamer(&self) -> HeaderRenamer {
        let mut renamer = if self.builtin_overrides {
            HeaderRenamer::with_builtin_overrides()
        } else {
            HeaderRenamer::new()
        };
        renamer.extend(&self.overrides);
        renamer
    }
}

/// Returns the per-user config path: `~/.csvsnake/config.json`
pub fn default_config_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Could not determine home directory")?;
    Ok(home.join(".csvsnake").join("config.json"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_config(dir: &Path, json: &str) -> PathBuf {
        let path = dir.join("csvsnake.json");
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_load_minimal_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{ "input_path": "/data/pedigrees.csv", "output_path": "/data/pedigrees_snake.csv" }"#,
        );

        let config = ConvertConfig::load(&path).unwrap();
        assert_eq!(config.input_path, PathBuf::from("/data/pedigrees.csv"));
        assert_eq!(config.encoding, "utf-8");
        assert_eq!(config.line_ending, LineEnding::Lf);
        assert!(config.builtin_overrides);
        assert!(config.overrides.is_empty());
    }

    #[test]
    fn test_load_resolves_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{ "input_path": "in.csv", "output_path": "out/in_snake.csv" }"#,
        );

        let config = ConvertConfig::load(&path).unwrap();
        assert_eq!(config.input_path, dir.path().join("in.csv"));
        assert_eq!(config.output_path, dir.path().join("out/in_snake.csv"));
    }

    #[test]
    fn test_load_full() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{
                "input_path": "/a.csv",
                "output_path": "/b.csv",
                "encoding": "Shift_JIS",
                "line_ending": "crlf",
                "overrides": { "OwnerName": "owner" },
                "builtin_overrides": false
            }"#,
        );

        let config = ConvertConfig::load(&path).unwrap();
        assert_eq!(config.source_encoding().unwrap(), encoding_rs::SHIFT_JIS);
        assert_eq!(config.line_ending, LineEnding::Crlf);

        let renamer = config.renamer();
        assert_eq!(renamer.rename("OwnerName"), "owner");
        assert_eq!(renamer.rename("FFJCU"), "ffjcu");
    }

    #[test]
    fn test_load_rejects_unknown_encoding() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{ "input_path": "/a.csv", "output_path": "/b.csv", "encoding": "klingon" }"#,
        );
        let err = ConvertConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("klingon"));
    }

    #[test]
    fn test_load_rejects_same_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            dir.path(),
            r#"{ "input_path": "/a.csv", "output_path": "/a.csv" }"#,
        );
        assert!(ConvertConfig::load(&path).is_err());
    }

    #[test]
    fn test_load_rejects_missing_output() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), r#"{ "input_path": "/a.csv" }"#);
        assert!(ConvertConfig::load(&path).is_err());
    }

    #[test]
    fn test_validate_rejects_blank_override_key() {
        let mut config = ConvertConfig::new("/a.csv", "/b.csv");
        config.overrides.insert("  ".into(), "x".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ConvertConfig::load(&dir.path().join("nope.json")).is_err());
    }

    #[test]
    fn test_renamer_merges_builtin_and_configured() {
        let mut config = ConvertConfig::new("/a.csv", "/b.csv");
        config.overrides.insert("OwnerName".into(), "owner".into());
        let renamer = config.renamer();
        assert_eq!(renamer.rename("FFJCU"), "ff_jcu");
        assert_eq!(renamer.rename("OwnerName"), "owner");
        assert_eq!(renamer.rename("CatName"), "cat_name");
    }
}
