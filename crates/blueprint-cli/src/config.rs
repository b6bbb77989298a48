use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use blueprint_catalog::Engine;
use blueprint_core::BlueprintOptions;
use serde::{Deserialize, Serialize};

use crate::CliError;

pub const DEFAULT_CONFIG_PATH: &str = "blueprint.toml";
pub const DEFAULT_PROFILE: &str = "default";

/// Catalog settings of a profile.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Engine assumed for catalog documents that do not name one.
    pub engine: Option<String>,
}

impl CatalogSettings {
    pub fn engine(&self) -> Result<Option<Engine>, CliError> {
        self.engine
            .as_deref()
            .map(str::parse::<Engine>)
            .transpose()
            .map_err(CliError::from)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigurationProfile {
    pub database_blueprint: BlueprintOptions,
    pub catalog: CatalogSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlueprintConfig {
    #[serde(default)]
    pub profiles: BTreeMap<String, ConfigurationProfile>,
}

impl Default for BlueprintConfig {
    fn default() -> Self {
        Self {
            profiles: BTreeMap::from([(
                DEFAULT_PROFILE.to_string(),
                ConfigurationProfile::default(),
            )]),
        }
    }
}

/// Configuration together with the file it came from.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub path: PathBuf,
    /// False when the file was missing and built-in defaults are in use.
    pub from_file: bool,
    pub config: BlueprintConfig,
}

impl LoadedConfig {
    pub fn profile(&self, name: &str) -> Result<&ConfigurationProfile, CliError> {
        self.config
            .profiles
            .get(name)
            .ok_or_else(|| CliError::UnknownProfile {
                name: name.to_string(),
                path: self.path.clone(),
            })
    }
}

/// Load a config file, falling back to the built-in profiles when it is missing.
pub fn load_config(path: Option<&Path>) -> Result<LoadedConfig, CliError> {
    let path = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));

    if !path.exists() {
        tracing::debug!(event = "config_defaults", path = %path.display());
        return Ok(LoadedConfig {
            path,
            from_file: false,
            config: BlueprintConfig::default(),
        });
    }

    let content = std::fs::read_to_string(&path).map_err(|source| CliError::ConfigIo {
        path: path.clone(),
        source,
    })?;
    let config = parse_config(&content)?;
    tracing::debug!(
        event = "config_loaded",
        path = %path.display(),
        profiles = config.profiles.len()
    );
    Ok(LoadedConfig {
        path,
        from_file: true,
        config,
    })
}

pub fn parse_config(content: &str) -> Result<BlueprintConfig, CliError> {
    Ok(toml::from_str(content)?)
}
