//! Configuration management for the goweb site engine.
//!
//! Parses `goweb.toml` files with serde. Every section has defaults, so an
//! absent file (or an empty one) yields a runnable configuration. CLI flags
//! can be applied during load via [`CliSettings`].

use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "goweb.toml";

/// Configuration load failure.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: Box<toml::de::Error>,
    },
}

/// CLI settings that override configuration file values.
///
/// All fields are optional; only set values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override server host.
    pub host: Option<String>,
    /// Override server port.
    pub port: Option<u16>,
    /// Override the primary content directory.
    pub content_dir: Option<PathBuf>,
    /// Override the Go tree root for package docs.
    pub goroot: Option<PathBuf>,
}

/// Application configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Server configuration.
    pub server: ServerSection,
    /// Content-serving configuration.
    pub content: ContentSection,
    /// Package documentation configuration.
    pub godoc: GodocSection,
}

/// `[server]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    /// Server host address.
    pub host: String,
    /// Server port.
    pub port: u16,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_owned(),
            port: 6060,
        }
    }
}

/// `[content]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ContentSection {
    /// Primary content directory.
    pub dir: PathBuf,
    /// Additional directories overlaid *under* the primary one: on file
    /// collisions the primary wins, directory listings merge.
    pub overlay_dirs: Vec<PathBuf>,
}

impl Default for ContentSection {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("content"),
            overlay_dirs: Vec::new(),
        }
    }
}

/// `[godoc]` section.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct GodocSection {
    /// Root of the Go tree served under `/pkg/` and `/cmd/`.
    /// `None` disables package documentation.
    pub goroot: Option<PathBuf>,
    /// Source directory under the root.
    pub src_dir: String,
    /// API manifest directory under the root.
    pub api_dir: String,
}

impl Default for GodocSection {
    fn default() -> Self {
        Self {
            goroot: None,
            src_dir: "src".to_owned(),
            api_dir: "api".to_owned(),
        }
    }
}

impl Config {
    /// Load configuration.
    ///
    /// With an explicit `path` the file must exist; otherwise
    /// `goweb.toml` in the working directory is used when present, and
    /// defaults apply when it is not. CLI settings are applied last.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] for unreadable or unparsable files.
    pub fn load(path: Option<&Path>, cli: Option<&CliSettings>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let default = Path::new(CONFIG_FILENAME);
                if default.exists() {
                    Self::from_file(default)?
                } else {
                    Self::default()
                }
            }
        };

        if let Some(cli) = cli {
            if let Some(host) = &cli.host {
                config.server.host.clone_from(host);
            }
            if let Some(port) = cli.port {
                config.server.port = port;
            }
            if let Some(dir) = &cli.content_dir {
                config.content.dir.clone_from(dir);
            }
            if let Some(goroot) = &cli.goroot {
                config.godoc.goroot = Some(goroot.clone());
            }
        }
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source: Box::new(source),
        })
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 6060);
        assert_eq!(config.content.dir, PathBuf::from("content"));
        assert!(config.godoc.goroot.is_none());
        assert_eq!(config.godoc.src_dir, "src");
    }

    #[test]
    fn test_load_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goweb.toml");
        std::fs::write(
            &path,
            "[server]\nport = 8080\n\n[content]\ndir = \"www\"\n\n[godoc]\ngoroot = \"/opt/go\"\n",
        )
        .unwrap();

        let config = Config::load(Some(&path), None).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.content.dir, PathBuf::from("www"));
        assert_eq!(config.godoc.goroot, Some(PathBuf::from("/opt/go")));
    }

    #[test]
    fn test_cli_overrides() {
        let cli = CliSettings {
            port: Some(9999),
            content_dir: Some(PathBuf::from("elsewhere")),
            ..CliSettings::default()
        };
        let config = Config::load(Some(Path::new("/definitely/missing")), Some(&cli));
        assert!(config.is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goweb.toml");
        std::fs::write(&path, "[server]\nport = 8080\n").unwrap();
        let config = Config::load(Some(&path), Some(&cli)).unwrap();
        assert_eq!(config.server.port, 9999);
        assert_eq!(config.content.dir, PathBuf::from("elsewhere"));
    }

    #[test]
    fn test_missing_explicit_file_errors() {
        let err = Config::load(Some(Path::new("/no/such/goweb.toml")), None).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("goweb.toml");
        std::fs::write(&path, "[server\nport=").unwrap();
        let err = Config::load(Some(&path), None).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }
}
