//! Per-file metadata resolution
//!
//! A metadata specification is resolved once per batch into a
//! [`MetadataResolver`], which is then asked for the metadata of each file.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;

use serde_json::Value;
use tokio::process::Command;

use crate::error::{Error, Result};
use crate::traits::Metadata;

/// Pure function from filename to metadata, for embedding callers
pub type MetadataFn = Arc<dyn Fn(&str) -> Result<Metadata> + Send + Sync>;

/// How the metadata of each uploaded file is obtained
#[derive(Clone)]
pub enum MetadataSpec {
    /// One fixed mapping applied to every file
    Inline(Metadata),
    /// Executable invoked with the filename, printing a JSON object on stdout
    Script(PathBuf),
    /// Function of the filename
    Computed(MetadataFn),
}

impl fmt::Debug for MetadataSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(map) => f.debug_tuple("Inline").field(map).finish(),
            Self::Script(path) => f.debug_tuple("Script").field(path).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

impl MetadataSpec {
    /// Interpret a user-supplied string.
    ///
    /// Anything that parses as JSON must be a flat object and becomes
    /// [`MetadataSpec::Inline`]; everything else is taken as a script path.
    pub fn parse(spec: &str) -> Result<Self> {
        match serde_json::from_str::<Value>(spec) {
            Ok(value) => flatten(value)
                .map(Self::Inline)
                .map_err(Error::InvalidMetadataSpec),
            Err(_) => Ok(Self::Script(PathBuf::from(spec))),
        }
    }

    /// Wrap a function of the filename
    pub fn computed<F>(f: F) -> Self
    where
        F: Fn(&str) -> Result<Metadata> + Send + Sync + 'static,
    {
        Self::Computed(Arc::new(f))
    }

    /// Resolve into a resolver, checking that a script exists.
    pub fn resolve(self) -> Result<MetadataResolver> {
        let spec = match self {
            Self::Script(path) => {
                let path = if path.is_relative() && !path.starts_with(".") {
                    Path::new(".").join(path)
                } else {
                    path
                };
                if !path.is_file() {
                    return Err(Error::InvalidMetadataSpec(format!(
                        "not valid JSON and no script found at {}",
                        path.display()
                    )));
                }
                Self::Script(path)
            }
            other => other,
        };
        tracing::debug!(spec = ?spec, "resolved metadata spec");
        Ok(MetadataResolver { spec })
    }
}

/// Resolved metadata source, shared read-only by all workers of a batch
#[derive(Debug, Clone)]
pub struct MetadataResolver {
    spec: MetadataSpec,
}

impl MetadataResolver {
    /// Metadata for one file
    pub async fn metadata_for(&self, filename: &str) -> Result<Metadata> {
        match &self.spec {
            MetadataSpec::Inline(map) => Ok(map.clone()),
            MetadataSpec::Computed(f) => f(filename),
            MetadataSpec::Script(script) => run_script(script, filename).await,
        }
    }
}

async fn run_script(script: &Path, filename: &str) -> Result<Metadata> {
    let output = Command::new(script)
        .arg(filename)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| Error::MetadataScriptFailure(format!("{}: {e}", script.display())))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::MetadataScriptFailure(format!(
            "{} exited with {} for {filename}: {}",
            script.display(),
            output.status,
            stderr.trim()
        )));
    }

    let value: Value = serde_json::from_slice(&output.stdout).map_err(|e| {
        Error::MetadataScriptFailure(format!(
            "{} printed invalid JSON for {filename}: {e}",
            script.display()
        ))
    })?;

    flatten(value).map_err(|e| {
        Error::MetadataScriptFailure(format!("{} for {filename}: {e}", script.display()))
    })
}

/// Object metadata is flat: scalar values are stringified, nesting is refused.
fn flatten(value: Value) -> std::result::Result<Metadata, String> {
    let map = match value {
        Value::Object(map) => map,
        other => return Err(format!("expected a JSON object, got {other}")),
    };

    map.into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => Ok((key, s)),
            Value::Number(n) => Ok((key, n.to_string())),
            Value::Bool(b) => Ok((key, b.to_string())),
            other => Err(format!("value for '{key}' must be a scalar, got {other}")),
        })
        .collect()
}
