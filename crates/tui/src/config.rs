//! User configuration, read once at startup from
//! `<config dir>/dap-tui/config.toml`.

use std::io::Read;
use std::path::{Path, PathBuf};

use eyre::Context;
use serde::Deserialize;

const APP_DIR: &str = "dap-tui";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Where logs are written.
    pub log_file: PathBuf,
    /// Number of file previews the picker keeps around.
    pub preview_cache_capacity: usize,
    /// Port for the debug adapter; 0 picks a free one.
    pub dap_port: u16,
    /// How deep variables are fetched from the debugger.
    pub variable_depth: usize,
    /// Children fetched per variable.
    pub max_children: usize,
    /// Where compiled binaries go.
    pub build_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let log_file = dirs::data_local_dir()
            .map(|dir| dir.join(APP_DIR))
            .unwrap_or_default()
            .join("dap-tui.log");
        Self {
            log_file,
            preview_cache_capacity: 64,
            dap_port: 0,
            variable_depth: 3,
            max_children: 64,
            build_dir: std::env::temp_dir().join(APP_DIR),
        }
    }
}

impl Config {
    /// The default config file location, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Load the config from the default location. A missing file yields the
    /// defaults.
    pub fn load() -> eyre::Result<Self> {
        match Self::default_path() {
            Some(path) => load_from(path),
            None => {
                tracing::debug!("no config directory, using defaults");
                Ok(Self::default())
            }
        }
    }
}

pub fn load(mut reader: impl Read) -> eyre::Result<Config> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .context("reading configuration")?;
    let config = toml::from_str(&text).context("parsing configuration")?;
    Ok(config)
}

pub fn load_from(path: impl AsRef<Path>) -> eyre::Result<Config> {
    let path = path.as_ref();
    let span = tracing::debug_span!("config", path = %path.display());
    let _guard = span.enter();

    let f = match std::fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("config file not found, using defaults");
            return Ok(Config::default());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("opening config file {}", path.display()));
        }
    };
    let config = load(f).with_context(|| format!("loading config file {}", path.display()))?;
    tracing::debug!(?config, "loaded config");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = load("".as_bytes()).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn partial_file_overrides_given_keys() {
        let config = load(
            r#"
            dap_port = 4711
            max_children = 10
            log_file = "/tmp/x.log"
            "#
            .as_bytes(),
        )
        .unwrap();
        assert_eq!(config.dap_port, 4711);
        assert_eq!(config.max_children, 10);
        assert_eq!(config.log_file, PathBuf::from("/tmp/x.log"));
        assert_eq!(config.variable_depth, 3);
        assert_eq!(config.preview_cache_capacity, 64);
    }

    #[test]
    fn malformed_file_is_an_error() {
        assert!(load("dap_port = \"many\"".as_bytes()).is_err());
        assert!(load("colour = 3".as_bytes()).is_err());
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_from(dir.path().join("nope.toml")).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "variable_depth = 5\n").unwrap();
        assert_eq!(load_from(&path).unwrap().variable_depth, 5);
    }
}
