use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

/// Persisted user preferences. Dark mode is the only one.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Config {
  pub dark_mode: Option<bool>,
}

impl Config {
  pub fn path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "healthtube").map(|dirs| dirs.config_dir().join("prefs.toml"))
  }

  pub fn load() -> Self {
    if let Some(config_file) = Self::path()
      && let Ok(content) = std::fs::read_to_string(config_file)
    {
      return Self::parse(&content);
    }
    Self::default()
  }

  /// Parse prefs, falling back to defaults for unreadable content.
  pub fn parse(content: &str) -> Self {
    toml::from_str(content).unwrap_or_else(|e| {
      warn!(err = %e, "config: ignoring malformed prefs.toml");
      Self::default()
    })
  }

  pub fn save(&self) {
    if let Some(config_file) = Self::path()
      && let Some(config_dir) = config_file.parent()
      && std::fs::create_dir_all(config_dir).is_ok()
      && let Ok(content) = toml::to_string(self)
      && let Err(e) = std::fs::write(&config_file, content)
    {
      warn!(err = %e, path = %config_file.display(), "config: failed to save prefs");
    }
  }

  /// Unset means light.
  pub fn is_dark(&self) -> bool {
    self.dark_mode.unwrap_or(false)
  }

  pub fn toggle_dark_mode(&mut self) -> bool {
    let dark = !self.is_dark();
    self.dark_mode = Some(dark);
    dark
  }
}
