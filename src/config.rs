use config::{Config, Environment, File, FileFormat};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;

pub const DEFAULT_RESOURCE_PATH: &str = "rstudio/project_templates.dcf";
pub const DEFAULT_LOCAL_TEMPLATES_PATH: &str = "~/.R/rstudio/project_templates.dcf";
const ENV_PREFIX: &str = "TEMPLATE_INDEXER";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexerConfig {
    /// Library directories to enumerate. Falls back to `R_LIBS` and
    /// `R_LIBS_USER` when empty.
    pub library_paths: Vec<PathBuf>,
    /// Resource file looked up inside each package directory
    pub resource_path: String,
    /// User template file; `~` expands to the home directory
    pub local_templates_path: Option<String>,
    /// Skip package scanning entirely
    pub disable_packages: bool,
    /// Packages per batch; 0 means one per CPU
    pub batch_size: usize,
}

impl Default for IndexerConfig {
    fn default() -> Self {
        Self {
            library_paths: Vec::new(),
            resource_path: DEFAULT_RESOURCE_PATH.to_string(),
            local_templates_path: Some(DEFAULT_LOCAL_TEMPLATES_PATH.to_string()),
            disable_packages: false,
            batch_size: 0,
        }
    }
}

impl IndexerConfig {
    /// Layer defaults, the config file and `TEMPLATE_INDEXER_*` variables.
    ///
    /// Without an explicit `path`, the per-user config file is used if it
    /// exists.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder();

        match path {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
            }
            None => {
                if let Some(default_path) = Self::default_config_path() {
                    builder = builder.add_source(
                        File::from(default_path)
                            .format(FileFormat::Toml)
                            .required(false),
                    );
                }
            }
        }

        let settings = builder
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .try_parsing(true)
                    .list_separator(":")
                    .with_list_parse_key("library_paths"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn default_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "template-indexer")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Configured library paths, or the R library environment variables.
    pub fn effective_library_paths(&self) -> Vec<PathBuf> {
        if !self.library_paths.is_empty() {
            return self.library_paths.clone();
        }

        ["R_LIBS", "R_LIBS_USER"]
            .iter()
            .filter_map(|var| std::env::var(var).ok())
            .flat_map(|value| {
                value
                    .split(':')
                    .filter(|part| !part.is_empty())
                    .map(resolve_aliased_path)
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    pub fn local_templates_path(&self) -> Option<PathBuf> {
        self.local_templates_path
            .as_deref()
            .filter(|path| !path.is_empty())
            .map(resolve_aliased_path)
    }

    pub fn effective_batch_size(&self) -> usize {
        if self.batch_size == 0 {
            num_cpus::get().max(1)
        } else {
            self.batch_size
        }
    }
}

/// Expand a leading `~` to the user's home directory.
pub fn resolve_aliased_path(path: &str) -> PathBuf {
    let home = BaseDirs::new().map(|dirs| dirs.home_dir().to_path_buf());
    expand_home(path, home.as_deref())
}

fn expand_home(path: &str, home: Option<&Path>) -> PathBuf {
    match (path, home) {
        ("~", Some(home)) => home.to_path_buf(),
        (_, Some(home)) if path.starts_with("~/") => home.join(&path[2..]),
        _ => PathBuf::from(path),
    }
}
