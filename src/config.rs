use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// UI preferences persisted between runs. Per-video clip records live in the
/// clip store, not here.
#[derive(Serialize, Deserialize, Default, Debug)]
pub struct Config {
  pub theme_name: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = ProjectDirs::from("", "", "ytloop") {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(config_file)
        && let Ok(config) = toml::from_str(&content)
      {
        return config;
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    let Some(proj_dirs) = ProjectDirs::from("", "", "ytloop") else { return };
    let config_dir = proj_dirs.config_dir();
    if let Err(e) = std::fs::create_dir_all(config_dir) {
      warn!(err = %e, "config: could not create config dir");
      return;
    }
    match toml::to_string(self) {
      Ok(content) => {
        if let Err(e) = std::fs::write(config_dir.join("prefs.toml"), content) {
          warn!(err = %e, "config: could not write prefs");
        }
      }
      Err(e) => warn!(err = %e, "config: could not serialize prefs"),
    }
  }
}
