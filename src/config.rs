use crate::theme::Theme;
use client_report_types::PageLayout;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Environment variable naming a config file when none is given explicitly.
pub const CONFIG_ENV_VAR: &str = "CLIENT_REPORT_CONFIG";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Settings shared by the report pipelines and the CLI.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportConfig {
    pub page: PageLayout,
    pub theme: Theme,
    pub output_dir: PathBuf,
    pub logo_path: PathBuf,
    pub template_path: PathBuf,
    pub database_path: PathBuf,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page: PageLayout::default(),
            theme: Theme::default(),
            output_dir: PathBuf::from("."),
            logo_path: PathBuf::from("assets/logo.png"),
            template_path: PathBuf::from("assets/ReportTemplate.xhtml"),
            database_path: PathBuf::from("clients.db"),
        }
    }
}

impl ReportConfig {
    /// Loads `path`, or the file named by `$CLIENT_REPORT_CONFIG`, or falls
    /// back to defaults when neither is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let env_path = std::env::var_os(CONFIG_ENV_VAR)
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);
        match path.map(Path::to_path_buf).or(env_path) {
            Some(path) => Self::from_file(&path),
            None => {
                log::debug!("No config file given, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: ReportConfig = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve relative paths in the config based on the config file's directory
    fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.output_dir,
            &mut self.logo_path,
            &mut self.template_path,
            &mut self.database_path,
        ] {
            if path.is_relative() {
                *path = base.join(path.as_path());
            }
        }
    }
}
