use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};

pub const DATABASE_ENV: &str = "ATIVOS_DATABASE";
pub const HOST_ENV: &str = "ATIVOS_HOST";
pub const PORT_ENV: &str = "ATIVOS_PORT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct AtivosConfig {
    pub database: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

/// Fully resolved runtime settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub database: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Settings {
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|e| anyhow::anyhow!("invalid host '{}': {}", self.host, e))?;
        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Values given on the command line; they win over everything else
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

pub fn default_config_path() -> PathBuf {
    PathBuf::from("ativos.toml")
}

pub fn default_database_path_in(base: &Path) -> PathBuf {
    base.join(".ativos").join("ativos.db")
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Option<AtivosConfig>> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(default_config_path);
    if !path.exists() {
        return Ok(None);
    }

    let contents = std::fs::read_to_string(&path)?;
    let config: AtivosConfig = toml::from_str(&contents)?;
    Ok(Some(config))
}

pub fn write_config(path: &Path, config: &AtivosConfig, force: bool) -> anyhow::Result<()> {
    if path.exists() && !force {
        anyhow::bail!("config already exists at {} (use --force to overwrite)", path.display());
    }

    let contents = toml::to_string_pretty(config)?;
    std::fs::write(path, contents)?;
    Ok(())
}

/// Resolve settings: command line, then environment, then config file, then defaults.
pub fn resolve(
    overrides: Overrides,
    file: Option<AtivosConfig>,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let file = file.unwrap_or_default();

    let database = overrides
        .database
        .or_else(|| env(DATABASE_ENV).map(PathBuf::from))
        .or_else(|| file.database.map(PathBuf::from))
        .unwrap_or_else(|| default_database_path_in(Path::new(".")));

    let host = overrides
        .host
        .or_else(|| env(HOST_ENV))
        .or(file.host)
        .unwrap_or_else(|| DEFAULT_HOST.to_string());

    let port = match overrides.port {
        Some(port) => port,
        None => match env(PORT_ENV) {
            Some(raw) => raw
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid {} '{}': {}", PORT_ENV, raw, e))?,
            None => file.port.unwrap_or(DEFAULT_PORT),
        },
    };

    Ok(Settings { database, host, port })
}

/// Resolve settings against the process environment
pub fn resolve_from_env(overrides: Overrides, file: Option<AtivosConfig>) -> anyhow::Result<Settings> {
    resolve(overrides, file, |key| std::env::var(key).ok())
}

pub fn ensure_db_dir(db_path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn ensure_gitignore(project_root: &Path) -> anyhow::Result<()> {
    let gitignore_path = project_root.join(".gitignore");
    let entry = ".ativos/";

    let mut content = String::new();
    if gitignore_path.exists() {
        content = std::fs::read_to_string(&gitignore_path)?;
        if content.lines().any(|line| line.trim() == entry) {
            return Ok(());
        }
        if !content.is_empty() && !content.ends_with('\n') {
            content.push('\n');
        }
    }
    content.push_str(entry);
    content.push('\n');
    std::fs::write(&gitignore_path, content)?;
    Ok(())
}
