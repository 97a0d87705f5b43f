use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::watcher::debounce::DEFAULT_INTERVAL;

/// Name of the configuration file inside an `mdp` config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Config file names of older releases. They are no longer read.
static LEGACY_CONFIG_FILES: [&str; 2] = ["config.yaml", "config.yml"];

/// Keys accepted in `config.toml`. Anything missing falls back to a default.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct FileConfig {
    /// Where generated pages are written. `~` is expanded.
    output_dir: Option<String>,
    /// Program (plus leading arguments) used to open a generated page.
    browser_command: Option<String>,
    /// Theme name, resolved to `<config_dir>/themes/<theme>.html`.
    theme: Option<String>,
    /// Quiet period before a burst of saves triggers a regeneration.
    debounce_ms: Option<u64>,
}

/// Resolved settings, consulted once before any generation.
#[derive(Debug, Clone)]
pub struct Config {
    pub output_dir: PathBuf,
    pub browser_command: String,
    pub theme: Option<String>,
    /// Directory of the config file in use; themes live under it.
    pub config_dir: PathBuf,
    pub debounce: Duration,
}

/// Home and platform configuration directories.
#[derive(Debug, Clone)]
pub struct Dirs {
    pub home: PathBuf,
    pub config: PathBuf,
}

impl Dirs {
    pub fn detect() -> Result<Self> {
        let base = directories::BaseDirs::new().context("could not determine home directory")?;
        Ok(Self {
            home: base.home_dir().to_path_buf(),
            config: base.config_dir().to_path_buf(),
        })
    }

    /// Candidate config files, most specific first.
    fn candidates(&self) -> Vec<PathBuf> {
        let mut candidates = vec![self.config.join("mdp").join(CONFIG_FILE)];
        let dotconfig = self.home.join(".config").join("mdp").join(CONFIG_FILE);
        if !candidates.contains(&dotconfig) {
            candidates.push(dotconfig);
        }
        candidates
    }

    /// Existing YAML config files next to the candidates, which are ignored.
    fn legacy_files(&self) -> Vec<PathBuf> {
        self.candidates()
            .iter()
            .filter_map(|c| c.parent())
            .flat_map(|dir| LEGACY_CONFIG_FILES.iter().map(move |name| dir.join(name)))
            .filter(|p| p.is_file())
            .collect()
    }
}

/// `open` on macOS, `explorer` on Windows, `xdg-open` elsewhere.
pub fn default_browser_command() -> &'static str {
    if cfg!(target_os = "macos") {
        "open"
    } else if cfg!(windows) {
        "explorer"
    } else {
        "xdg-open"
    }
}

impl Config {
    /// Load from `explicit` if given, else from the first existing candidate.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        Self::load_with(explicit, &Dirs::detect()?)
    }

    /// Like [`Config::load`] with the home/config directories supplied.
    ///
    /// An explicit path that does not exist yields defaults, as does the absence of
    /// any candidate file. A file that exists but cannot be read or parsed is an error.
    pub fn load_with(explicit: Option<&Path>, dirs: &Dirs) -> Result<Self> {
        let path = match explicit {
            Some(p) => Some(p.to_path_buf()),
            None => {
                for legacy in dirs.legacy_files() {
                    tracing::warn!(
                        path = %legacy.display(),
                        "ignoring YAML config file, move its settings to {CONFIG_FILE}"
                    );
                }
                dirs.candidates().into_iter().find(|p| p.is_file())
            }
        };

        let (file, config_dir) = match path {
            Some(path) => {
                let config_dir = path
                    .parent()
                    .map(Path::to_path_buf)
                    .unwrap_or_default();
                (read_file_config(&path)?, config_dir)
            }
            None => {
                let first = dirs.config.join("mdp");
                (FileConfig::default(), first)
            }
        };

        Ok(Self::resolve(file, config_dir, dirs))
    }

    fn resolve(file: FileConfig, config_dir: PathBuf, dirs: &Dirs) -> Self {
        let output_dir = match file.output_dir.filter(|s| !s.is_empty()) {
            Some(raw) => expand_tilde(&raw, &dirs.home),
            None => dirs.home.join(".mdp"),
        };
        let browser_command = file
            .browser_command
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| default_browser_command().to_string());
        let debounce = file
            .debounce_ms
            .map(Duration::from_millis)
            .unwrap_or(DEFAULT_INTERVAL);

        Self {
            output_dir,
            browser_command,
            theme: file.theme.filter(|t| !t.is_empty()),
            config_dir,
            debounce,
        }
    }
}

fn read_file_config(path: &Path) -> Result<FileConfig> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            return Ok(FileConfig::default());
        }
        Err(err) => {
            return Err(err).with_context(|| format!("failed to read {}", path.display()));
        }
    };
    toml::from_str(&contents).with_context(|| format!("failed to parse {}", path.display()))
}

fn expand_tilde(raw: &str, home: &Path) -> PathBuf {
    let expanded = shellexpand::tilde_with_context(raw, || home.to_str());
    PathBuf::from(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn fake_dirs() -> (TempDir, Dirs) {
        let root = tempfile::tempdir().expect("tempdir");
        let dirs = Dirs {
            home: root.path().join("home"),
            config: root.path().join("xdg"),
        };
        (root, dirs)
    }

    fn write_config(dir: &Path, contents: &str) -> PathBuf {
        fs::create_dir_all(dir).unwrap();
        let path = dir.join(CONFIG_FILE);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_defaults_without_any_file() {
        let (_root, dirs) = fake_dirs();
        let config = Config::load_with(None, &dirs).unwrap();
        assert_eq!(config.output_dir, dirs.home.join(".mdp"));
        assert_eq!(config.browser_command, default_browser_command());
        assert_eq!(config.theme, None);
        assert_eq!(config.config_dir, dirs.config.join("mdp"));
        assert_eq!(config.debounce, DEFAULT_INTERVAL);
    }

    #[test]
    fn test_explicit_file_overrides_defaults() {
        let (root, dirs) = fake_dirs();
        let path = write_config(
            &root.path().join("custom"),
            "output_dir = \"/srv/previews\"\nbrowser_command = \"firefox\"\ntheme = \"github\"\ndebounce_ms = 250\n",
        );

        let config = Config::load_with(Some(&path), &dirs).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("/srv/previews"));
        assert_eq!(config.browser_command, "firefox");
        assert_eq!(config.theme.as_deref(), Some("github"));
        assert_eq!(config.config_dir, root.path().join("custom"));
        assert_eq!(config.debounce, Duration::from_millis(250));
    }

    #[test]
    fn test_output_dir_tilde_is_expanded() {
        let (root, dirs) = fake_dirs();
        let path = write_config(&root.path().join("c"), "output_dir = \"~/previews\"\n");
        let config = Config::load_with(Some(&path), &dirs).unwrap();
        assert_eq!(config.output_dir, dirs.home.join("previews"));
    }

    #[test]
    fn test_empty_values_fall_back_to_defaults() {
        let (root, dirs) = fake_dirs();
        let path = write_config(
            &root.path().join("c"),
            "output_dir = \"\"\nbrowser_command = \"\"\ntheme = \"\"\n",
        );
        let config = Config::load_with(Some(&path), &dirs).unwrap();
        assert_eq!(config.output_dir, dirs.home.join(".mdp"));
        assert_eq!(config.browser_command, default_browser_command());
        assert_eq!(config.theme, None);
    }

    #[test]
    fn test_platform_config_dir_wins_over_dotconfig() {
        let (_root, dirs) = fake_dirs();
        write_config(&dirs.home.join(".config/mdp"), "theme = \"dot\"\n");
        write_config(&dirs.config.join("mdp"), "theme = \"platform\"\n");

        let config = Config::load_with(None, &dirs).unwrap();
        assert_eq!(config.theme.as_deref(), Some("platform"));
        assert_eq!(config.config_dir, dirs.config.join("mdp"));
    }

    #[test]
    fn test_dotconfig_is_used_when_platform_file_missing() {
        let (_root, dirs) = fake_dirs();
        write_config(&dirs.home.join(".config/mdp"), "theme = \"dot\"\n");

        let config = Config::load_with(None, &dirs).unwrap();
        assert_eq!(config.theme.as_deref(), Some("dot"));
        assert_eq!(config.config_dir, dirs.home.join(".config/mdp"));
    }

    #[test]
    fn test_yaml_config_is_detected_but_not_read() {
        let (_root, dirs) = fake_dirs();
        let dir = dirs.config.join("mdp");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("config.yml"), "theme: yaml\n").unwrap();

        assert_eq!(dirs.legacy_files(), vec![dir.join("config.yml")]);
        let config = Config::load_with(None, &dirs).unwrap();
        assert_eq!(config.theme, None);
    }

    #[test]
    fn test_missing_explicit_file_yields_defaults() {
        let (root, dirs) = fake_dirs();
        let missing = root.path().join("nowhere").join(CONFIG_FILE);
        let config = Config::load_with(Some(&missing), &dirs).unwrap();
        assert_eq!(config.output_dir, dirs.home.join(".mdp"));
        assert_eq!(config.config_dir, root.path().join("nowhere"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let (root, dirs) = fake_dirs();
        let path = write_config(&root.path().join("c"), "output_dir = [not toml");
        let err = Config::load_with(Some(&path), &dirs).unwrap_err();
        assert!(format!("{err:#}").contains("failed to parse"), "got: {err:#}");
    }
}
