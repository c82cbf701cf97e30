// Configuration module for videoteca
// Handles directory layout, TOML configuration file and environment overrides

use serde::Deserialize;
use std::path::{Path, PathBuf};

const APP_NAME: &str = "videoteca";
const CONFIG_FILENAME: &str = "config.toml";
const METADATA_FILENAME: &str = "metadata.csv";

/// TOML configuration file structure
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ConfigFile {
    /// Server configuration
    pub server: ServerConfig,

    /// Directory paths (overrides the current-directory defaults)
    pub paths: PathsConfig,

    /// Scanner configuration
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Server port (default: 8080)
    pub port: u16,

    /// Bind address (default: 0.0.0.0)
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "0.0.0.0".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root of the video tree (contains `movies/` and `series/`)
    pub videos_dir: Option<PathBuf>,

    /// Directory holding the metadata file
    pub data_dir: Option<PathBuf>,

    /// Web front-end served at `/`
    pub public_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    /// Playable file extensions (lowercase, without dots)
    /// Default: mp4, webm, ogg, mov, avi, mkv
    pub video_extensions: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            video_extensions: ["mp4", "webm", "ogg", "mov", "avi", "mkv"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

/// Resolved directory layout
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Root of the video tree
    pub videos_dir: PathBuf,

    /// Directory for persistent data (metadata.csv)
    pub data_dir: PathBuf,

    /// Static front-end files
    pub public_dir: PathBuf,
}

impl AppPaths {
    /// Resolve paths. Priority: environment variable, config file, current directory.
    pub fn new(config_overrides: &PathsConfig) -> Self {
        let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

        Self {
            videos_dir: Self::resolve(
                "VIDEOTECA_VIDEOS_DIR",
                &config_overrides.videos_dir,
                cwd.join("videos"),
            ),
            data_dir: Self::resolve(
                "VIDEOTECA_DATA_DIR",
                &config_overrides.data_dir,
                cwd.join("data"),
            ),
            public_dir: Self::resolve(
                "VIDEOTECA_PUBLIC_DIR",
                &config_overrides.public_dir,
                cwd.join("public"),
            ),
        }
    }

    /// Paths rooted at an arbitrary directory
    #[cfg(test)]
    pub fn rooted_at(root: &Path) -> Self {
        Self {
            videos_dir: root.join("videos"),
            data_dir: root.join("data"),
            public_dir: root.join("public"),
        }
    }

    fn resolve(env_var: &str, config_override: &Option<PathBuf>, fallback: PathBuf) -> PathBuf {
        if let Ok(path) = std::env::var(env_var) {
            return PathBuf::from(path);
        }

        if let Some(ref path) = config_override {
            return path.clone();
        }

        fallback
    }

    pub fn movies_dir(&self) -> PathBuf {
        self.videos_dir.join("movies")
    }

    pub fn series_dir(&self) -> PathBuf {
        self.videos_dir.join("series")
    }

    /// Get the metadata file path
    pub fn metadata_path(&self) -> PathBuf {
        self.data_dir.join(METADATA_FILENAME)
    }

    /// Ensure the video and data directories exist
    pub async fn ensure_dirs(&self) -> std::io::Result<()> {
        tokio::fs::create_dir_all(self.movies_dir()).await?;
        tokio::fs::create_dir_all(self.series_dir()).await?;
        tokio::fs::create_dir_all(&self.data_dir).await?;
        Ok(())
    }

    /// Log the configured paths
    pub fn log_paths(&self) {
        tracing::info!("Movies: {}", self.movies_dir().display());
        tracing::info!("Series: {}", self.series_dir().display());
        tracing::info!("Metadata file: {}", self.metadata_path().display());
        tracing::debug!("Public directory: {}", self.public_dir.display());
    }
}

/// Application configuration - combines TOML file with environment overrides
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Application paths
    pub paths: AppPaths,

    /// Server port
    pub port: u16,

    /// Bind address
    pub bind_address: String,

    /// Scanner configuration
    pub scanner: ScannerConfig,
}

impl AppConfig {
    /// Load configuration from TOML file and environment
    ///
    /// Priority (highest to lowest):
    /// 1. Environment variables
    /// 2. TOML config file
    /// 3. Default values
    pub fn load() -> Self {
        let config_dir = Self::find_config_dir();
        let config_file = Self::load_config_file(&config_dir);
        Self::build(config_file)
    }

    /// Configuration with default settings rooted at `root`
    #[cfg(test)]
    pub fn rooted_at(root: &Path) -> Self {
        let defaults = ConfigFile::default();
        Self {
            paths: AppPaths::rooted_at(root),
            port: defaults.server.port,
            bind_address: defaults.server.bind_address,
            scanner: defaults.scanner,
        }
    }

    /// Find the config directory (for locating config.toml)
    fn find_config_dir() -> PathBuf {
        if let Ok(path) = std::env::var("VIDEOTECA_CONFIG_DIR") {
            return PathBuf::from(path);
        }

        if let Some(dir) = dirs::config_dir() {
            return dir.join(APP_NAME);
        }

        std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }

    /// Load and parse the TOML config file
    fn load_config_file(config_dir: &Path) -> ConfigFile {
        let config_path = config_dir.join(CONFIG_FILENAME);

        if !config_path.exists() {
            tracing::debug!(
                "No config file found at {}, using defaults",
                config_path.display()
            );
            return ConfigFile::default();
        }

        match std::fs::read_to_string(&config_path) {
            Ok(contents) => match toml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded configuration from {}", config_path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to parse config file {}: {}. Using defaults.",
                        config_path.display(),
                        e
                    );
                    ConfigFile::default()
                }
            },
            Err(e) => {
                tracing::warn!(
                    "Failed to read config file {}: {}. Using defaults.",
                    config_path.display(),
                    e
                );
                ConfigFile::default()
            }
        }
    }

    /// Build configuration from config file with environment overrides
    fn build(config_file: ConfigFile) -> Self {
        let paths = AppPaths::new(&config_file.paths);

        // Port: env > config > default
        let port = Self::env_port().unwrap_or(config_file.server.port);

        // Bind address: env > config > default
        let bind_address =
            Self::env_bind_address().unwrap_or_else(|| config_file.server.bind_address.clone());

        let mut scanner = config_file.scanner;
        scanner.video_extensions = normalize_extensions(&scanner.video_extensions);
        if scanner.video_extensions.is_empty() {
            tracing::warn!("No video extensions configured, falling back to defaults");
            scanner = ScannerConfig::default();
        }

        Self {
            paths,
            port,
            bind_address,
            scanner,
        }
    }

    fn env_port() -> Option<u16> {
        std::env::var("VIDEOTECA_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
    }

    fn env_bind_address() -> Option<String> {
        std::env::var("VIDEOTECA_BIND_ADDRESS").ok()
    }

    /// Log configuration status
    pub fn log_config(&self) {
        self.paths.log_paths();
        tracing::info!("Server listening on {}:{}", self.bind_address, self.port);
        tracing::debug!(
            "Playable extensions: {}",
            self.scanner.video_extensions.join(", ")
        );
    }
}

/// Lowercase extensions and strip any leading dot ("`.MKV`" -> "`mkv`")
fn normalize_extensions(extensions: &[String]) -> Vec<String> {
    extensions
        .iter()
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_file() {
        let config = ConfigFile::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.bind_address, "0.0.0.0");
        assert_eq!(
            config.scanner.video_extensions,
            vec!["mp4", "webm", "ogg", "mov", "avi", "mkv"]
        );
        assert!(config.paths.videos_dir.is_none());
    }

    #[test]
    fn test_parse_config_toml() {
        let toml_str = r#"
[server]
port = 9000
bind_address = "127.0.0.1"

[paths]
videos_dir = "/srv/videos"
data_dir = "/var/lib/videoteca"

[scanner]
video_extensions = ["mkv", "m4v"]
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.server.bind_address, "127.0.0.1");
        assert_eq!(config.paths.videos_dir, Some(PathBuf::from("/srv/videos")));
        assert_eq!(
            config.paths.data_dir,
            Some(PathBuf::from("/var/lib/videoteca"))
        );
        assert_eq!(config.scanner.video_extensions, vec!["mkv", "m4v"]);
    }

    #[test]
    fn test_partial_config_toml() {
        let toml_str = r#"
[server]
port = 3000
"#;
        let config: ConfigFile = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.bind_address, "0.0.0.0"); // default
        assert_eq!(config.scanner.video_extensions.len(), 6); // default
    }

    #[test]
    fn test_derived_paths() {
        let paths = AppPaths::rooted_at(Path::new("/library"));
        assert_eq!(paths.movies_dir(), PathBuf::from("/library/videos/movies"));
        assert_eq!(paths.series_dir(), PathBuf::from("/library/videos/series"));
        assert_eq!(
            paths.metadata_path(),
            PathBuf::from("/library/data/metadata.csv")
        );
    }

    #[test]
    fn test_normalize_extensions() {
        let raw = vec![".MKV".to_string(), " mp4 ".to_string(), "".to_string()];
        assert_eq!(normalize_extensions(&raw), vec!["mkv", "mp4"]);
    }

    #[tokio::test]
    async fn test_ensure_dirs_creates_layout() {
        let tmp = tempfile::tempdir().unwrap();
        let paths = AppPaths::rooted_at(tmp.path());
        paths.ensure_dirs().await.unwrap();

        assert!(paths.movies_dir().is_dir());
        assert!(paths.series_dir().is_dir());
        assert!(paths.data_dir.is_dir());
    }
}
