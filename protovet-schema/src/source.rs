use camino::{Utf8Path, Utf8PathBuf};
use fs_err as fs;
use std::process::Command;
use thiserror::Error;
use tracing::{debug, warn};

/// Upstream repository holding the protocol schema.
pub const DEFAULT_SPEC_REPO_URL: &str =
    "https://github.com/modelcontextprotocol/modelcontextprotocol.git";

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("schema not found at {path}")]
    SchemaMissing { path: Utf8PathBuf },

    #[error("spec root not found at {path}")]
    SpecRootMissing { path: Utf8PathBuf },

    #[error("failed to clone specification repository: {message}")]
    CloneFailed { message: String },

    #[error("failed to parse {path}: {message}")]
    Parse { path: Utf8PathBuf, message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// How to obtain a spec checkout.
#[derive(Debug, Clone)]
pub struct AcquireOptions {
    pub repo_url: String,

    /// Where a fetched copy is kept between runs.
    pub cache_dir: Utf8PathBuf,

    /// Existing local checkout; when set, no cache or network is touched.
    pub local_root: Option<Utf8PathBuf>,

    /// Prefer the cached copy over a fresh clone.
    pub skip_clone: bool,
}

/// Resolve a spec root directory.
///
/// Precedence: explicit local checkout, then the cache (when `skip_clone`),
/// then a fresh shallow clone refreshed into the cache. A failed clone
/// degrades to the cached copy if one exists; with no cache it is fatal.
/// This is a one-shot fallback, not a retry loop.
pub fn acquire_spec(opts: &AcquireOptions) -> Result<Utf8PathBuf, SchemaError> {
    if let Some(root) = &opts.local_root {
        if !root.exists() {
            return Err(SchemaError::SpecRootMissing { path: root.clone() });
        }
        debug!(root = %root, "using local spec checkout");
        return Ok(root.clone());
    }

    if opts.skip_clone && opts.cache_dir.exists() {
        debug!(cache = %opts.cache_dir, "using cached spec copy");
        return Ok(opts.cache_dir.clone());
    }

    match clone_into_cache(&opts.repo_url, &opts.cache_dir) {
        Ok(()) => Ok(opts.cache_dir.clone()),
        Err(e) if opts.cache_dir.exists() => {
            warn!("spec clone failed ({e}); falling back to cached copy");
            Ok(opts.cache_dir.clone())
        }
        Err(e) => Err(e),
    }
}

fn clone_into_cache(repo_url: &str, cache_dir: &Utf8Path) -> Result<(), SchemaError> {
    let staging = Utf8PathBuf::from(format!("{cache_dir}.clone-{}", std::process::id()));
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    if let Some(parent) = cache_dir.parent() {
        fs::create_dir_all(parent)?;
    }

    debug!(url = repo_url, dest = %staging, "cloning spec repository");
    let output = Command::new("git")
        .args(["clone", "--depth", "1", "--quiet", repo_url, staging.as_str()])
        .output()
        .map_err(|e| SchemaError::CloneFailed {
            message: e.to_string(),
        })?;

    if !output.status.success() {
        // Leave no staging directory behind on failure.
        if staging.exists() {
            let _ = fs::remove_dir_all(&staging);
        }
        return Err(SchemaError::CloneFailed {
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    if cache_dir.exists() {
        fs::remove_dir_all(cache_dir)?;
    }
    fs::rename(&staging, cache_dir)?;
    Ok(())
}

/// Path of the schema document for one protocol version.
pub fn schema_path(spec_root: &Utf8Path, version: &str) -> Utf8PathBuf {
    spec_root.join("schema").join(version).join("schema.json")
}

/// Load and parse the schema document. Missing file is fatal and the error
/// carries the expected path.
pub fn load_schema(spec_root: &Utf8Path, version: &str) -> Result<serde_json::Value, SchemaError> {
    let path = schema_path(spec_root, version);
    if !path.exists() {
        return Err(SchemaError::SchemaMissing { path });
    }
    let contents = fs::read_to_string(&path)?;
    serde_json::from_str(&contents).map_err(|e| SchemaError::Parse {
        path,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn utf8_root(temp: &TempDir) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("utf8 temp path")
    }

    #[test]
    fn load_schema_reports_expected_path_when_missing() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_root(&temp);
        let err = load_schema(&root, "2025-11-25").expect_err("missing schema");
        let msg = err.to_string();
        assert!(msg.contains("schema not found"));
        assert!(msg.contains("2025-11-25"));
        assert!(msg.contains("schema.json"));
    }

    #[test]
    fn load_schema_reads_valid_document() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_root(&temp);
        let dir = root.join("schema").join("2025-11-25");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("schema.json"), r#"{"$defs": {}}"#).expect("write");

        let schema = load_schema(&root, "2025-11-25").expect("load");
        assert!(schema.get("$defs").is_some());
    }

    #[test]
    fn load_schema_rejects_malformed_json() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_root(&temp);
        let dir = root.join("schema").join("v1");
        fs::create_dir_all(&dir).expect("mkdir");
        fs::write(dir.join("schema.json"), "{not json").expect("write");

        let err = load_schema(&root, "v1").expect_err("malformed");
        assert!(matches!(err, SchemaError::Parse { .. }));
    }

    #[test]
    fn acquire_prefers_local_root() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_root(&temp);
        let opts = AcquireOptions {
            repo_url: "file:///nonexistent".to_string(),
            cache_dir: root.join("cache"),
            local_root: Some(root.clone()),
            skip_clone: false,
        };
        let resolved = acquire_spec(&opts).expect("local root");
        assert_eq!(resolved, root);
    }

    #[test]
    fn acquire_fails_on_missing_local_root() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_root(&temp);
        let opts = AcquireOptions {
            repo_url: "file:///nonexistent".to_string(),
            cache_dir: root.join("cache"),
            local_root: Some(root.join("absent")),
            skip_clone: false,
        };
        let err = acquire_spec(&opts).expect_err("missing root");
        assert!(matches!(err, SchemaError::SpecRootMissing { .. }));
    }

    #[test]
    fn acquire_uses_cache_when_skipping_clone() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_root(&temp);
        let cache = root.join("cache");
        fs::create_dir_all(&cache).expect("mkdir");

        let opts = AcquireOptions {
            repo_url: "file:///nonexistent".to_string(),
            cache_dir: cache.clone(),
            local_root: None,
            skip_clone: true,
        };
        assert_eq!(acquire_spec(&opts).expect("cache"), cache);
    }

    #[test]
    fn failed_clone_without_cache_is_fatal() {
        let temp = TempDir::new().expect("temp dir");
        let root = utf8_root(&temp);
        let opts = AcquireOptions {
            repo_url: root.join("no-such-repo").to_string(),
            cache_dir: root.join("cache"),
            local_root: None,
            skip_clone: false,
        };
        let err = acquire_spec(&opts).expect_err("clone failure");
        assert!(matches!(err, SchemaError::CloneFailed { .. }));
    }
}
