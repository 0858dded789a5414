use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Connection parameters for one configured backend target, as supplied by
/// the host platform's instance registry.
///
/// Immutable for the life of an engine instance. The credential is never
/// written back to disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceConfig {
    pub name: String,
    /// Hostname, optionally carrying an explicit `host:port`.
    pub host: String,
    #[serde(default)]
    pub port: Option<u16>,
    pub user: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    /// Target-database hint for backends that scope sessions to a schema.
    #[serde(default)]
    pub database: Option<String>,
}

impl InstanceConfig {
    pub fn display_string(&self) -> String {
        let mut out = format!("{}@{}", self.user, self.host);
        if let Some(port) = self.port {
            out.push_str(&format!(":{port}"));
        }
        if let Some(database) = &self.database {
            out.push_str(&format!("/{database}"));
        }
        out
    }

    /// Resolve the server address, splitting an embedded `host:port` and
    /// falling back to the configured port, then the dialect default.
    pub fn server_address(&self, default_port: u16) -> (String, u16) {
        if let Some((host, port)) = self.host.rsplit_once(':') {
            if let Ok(port) = port.parse::<u16>() {
                return (host.to_string(), port);
            }
        }
        (self.host.clone(), self.port.unwrap_or(default_port))
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct SavedInstances {
    instances: Vec<InstanceConfig>,
}

/// Location of the shared instance registry file.
pub fn registry_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sqlgate")
        .join("instances.toml")
}

pub fn load_instances() -> Result<Vec<InstanceConfig>> {
    load_instances_from(&registry_path())
}

pub fn load_instances_from(path: &Path) -> Result<Vec<InstanceConfig>> {
    if !path.exists() {
        return Ok(vec![]);
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read instance registry {}", path.display()))?;
    let saved: SavedInstances =
        toml::from_str(&content).context("instance registry is not valid TOML")?;
    Ok(saved.instances)
}

pub fn save_instances(instances: &[InstanceConfig]) -> Result<()> {
    save_instances_to(&registry_path(), instances)
}

pub fn save_instances_to(path: &Path, instances: &[InstanceConfig]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let saved = SavedInstances {
        instances: instances.to_vec(),
    };
    let content = toml::to_string_pretty(&saved)?;
    std::fs::write(path, content)
        .with_context(|| format!("failed to write instance registry {}", path.display()))?;
    Ok(())
}
