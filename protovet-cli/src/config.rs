//! Configuration file loading for protovet.
//!
//! Discovers and loads `protovet.toml` from the repository root and
//! resolves the paths every command needs. CLI flags take precedence over
//! config file settings.

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use serde::Deserialize;
use tracing::debug;

/// The config file name to search for.
pub const CONFIG_FILE_NAME: &str = "protovet.toml";

/// Top-level configuration from protovet.toml.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProtovetConfig {
    /// Repository-relative paths to the tracked artifacts.
    pub paths: PathsConfig,

    /// Where the protocol spec comes from.
    pub spec: SpecConfig,

    /// Implementation-index extraction settings.
    pub scan: ScanConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// The coverage manifest document.
    pub manifest: String,

    /// Root of the implementation source tree.
    pub sources: String,

    /// Client-side API surface file.
    pub client_source: String,

    /// Server-side API surface file.
    pub server_source: String,

    /// File declaring the error type and its code mapping.
    pub error_source: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            manifest: "coverage/manifest.toml".to_string(),
            sources: "Sources".to_string(),
            client_source: "Sources/Client/Client.swift".to_string(),
            server_source: "Sources/Server/Server.swift".to_string(),
            error_source: "Sources/Base/Error.swift".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpecConfig {
    /// Upstream repository holding the protocol schema.
    pub repo_url: String,

    /// Existing local checkout; when set, no cache or network is used.
    pub local_root: Option<String>,

    /// Cache directory for fetched copies.
    pub cache_dir: Option<String>,

    /// Protocol version override; the manifest's pin wins otherwise.
    pub version: Option<String>,
}

impl Default for SpecConfig {
    fn default() -> Self {
        Self {
            repo_url: protovet_schema::DEFAULT_SPEC_REPO_URL.to_string(),
            local_root: None,
            cache_dir: None,
            version: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// External AST extractor argv; empty means pattern scan only.
    pub ast_command: Vec<String>,

    /// Working directory for the AST extractor.
    pub ast_workdir: Option<String>,

    /// Timeout for the AST extractor run.
    pub timeout_secs: u64,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            ast_command: vec![],
            ast_workdir: None,
            timeout_secs: 60,
        }
    }
}

/// Load config from the repo root, or return defaults if absent.
pub fn load_or_default(repo_root: &Utf8Path) -> anyhow::Result<ProtovetConfig> {
    let path = repo_root.join(CONFIG_FILE_NAME);
    if !path.exists() {
        debug!("no config file at {path}; using defaults");
        return Ok(ProtovetConfig::default());
    }
    let contents = fs::read_to_string(&path).with_context(|| format!("read config {path}"))?;
    let config: ProtovetConfig =
        toml::from_str(&contents).with_context(|| format!("parse config {path}"))?;
    debug!("loaded config from {path}");
    Ok(config)
}

/// Join a config path onto the repo root unless it is already absolute.
pub fn resolve(repo_root: &Utf8Path, path: &str) -> Utf8PathBuf {
    let p = Utf8Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        repo_root.join(p)
    }
}

/// Cache directory for fetched spec copies.
pub fn spec_cache_dir(config: &SpecConfig, repo_root: &Utf8Path) -> Utf8PathBuf {
    if let Some(dir) = &config.cache_dir {
        return resolve(repo_root, dir);
    }
    Utf8PathBuf::from_path_buf(std::env::temp_dir().join("protovet-spec-cache"))
        .unwrap_or_else(|_| repo_root.join(".protovet-spec-cache"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn defaults_when_config_absent() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        let config = load_or_default(&root).expect("defaults");
        assert_eq!(config.paths.manifest, "coverage/manifest.toml");
        assert_eq!(config.spec.repo_url, protovet_schema::DEFAULT_SPEC_REPO_URL);
        assert!(config.scan.ast_command.is_empty());
        assert_eq!(config.scan.timeout_secs, 60);
    }

    #[test]
    fn parses_partial_config() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        fs::write(
            root.join(CONFIG_FILE_NAME),
            r#"
[paths]
manifest = "verification/manifest.toml"

[spec]
local_root = "../spec"

[scan]
ast_command = ["swift", "run", "extract-types"]
timeout_secs = 30
"#,
        )
        .expect("write config");

        let config = load_or_default(&root).expect("load");
        assert_eq!(config.paths.manifest, "verification/manifest.toml");
        // Unset fields keep their defaults.
        assert_eq!(config.paths.sources, "Sources");
        assert_eq!(config.spec.local_root.as_deref(), Some("../spec"));
        assert_eq!(config.scan.ast_command.len(), 3);
        assert_eq!(config.scan.timeout_secs, 30);
    }

    #[test]
    fn invalid_config_is_an_error() {
        let temp = TempDir::new().expect("temp dir");
        let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8");
        fs::write(root.join(CONFIG_FILE_NAME), "[paths]\nmanifest = 42\n").expect("write");
        assert!(load_or_default(&root).is_err());
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let root = Utf8Path::new("/repo");
        assert_eq!(resolve(root, "Sources"), Utf8PathBuf::from("/repo/Sources"));
        assert_eq!(resolve(root, "/abs/Sources"), Utf8PathBuf::from("/abs/Sources"));
    }
}
