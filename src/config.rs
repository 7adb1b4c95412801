use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use tracing::warn;

use crate::storage::DATA_FILE;

const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
	pub data_dir: Option<PathBuf>,
	pub log_filter: Option<String>,
}

// Missing or unreadable config degrades to defaults; a malformed file is
// logged and ignored.
pub fn load_config() -> Config {
	let path = config_dir().join(CONFIG_FILE);
	let raw = match fs::read_to_string(&path) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Config::default(),
		Err(err) => {
			warn!("failed to read {}: {err}", path.display());
			return Config::default();
		}
	};

	match toml::from_str(&raw) {
		Ok(config) => config,
		Err(err) => {
			warn!("invalid config {}: {err}", path.display());
			Config::default()
		}
	}
}

pub fn resolve_data_dir(cli_dir: Option<PathBuf>, config: &Config) -> PathBuf {
	if let Some(dir) = cli_dir {
		return dir;
	}

	if let Some(dir) = env::var_os("DEVRATING_DATA_DIR") {
		if !dir.is_empty() {
			return PathBuf::from(dir);
		}
	}

	if let Some(dir) = &config.data_dir {
		return dir.clone();
	}

	default_data_dir()
}

pub fn data_file(data_dir: &Path) -> PathBuf {
	data_dir.join(DATA_FILE)
}

fn default_data_dir() -> PathBuf {
	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join("devrating");
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join("devrating");
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path)
			.join(".local")
			.join("state")
			.join("devrating");
	}

	PathBuf::from(".devrating")
}

fn config_dir() -> PathBuf {
	if let Some(path) = env::var_os("DEVRATING_CONFIG_DIR") {
		return PathBuf::from(path);
	}

	if let Some(path) = env::var_os("XDG_CONFIG_HOME") {
		return PathBuf::from(path).join("devrating");
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path).join(".config").join("devrating");
	}

	PathBuf::from(".devrating")
}
