//! Loading of deployment SQL scripts.
//!
//! Scripts are written for a client tool that understands `DELIMITER` directives:
//! procedure bodies contain `;`, so the script switches the terminator to
//! something like `//` around each `CREATE PROCEDURE` and back afterwards. The
//! drivers here take the whole file as one multi-statement batch, so the
//! directives are dropped and the custom terminator is turned back into `;`.

use std::path::{Component, Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::error::GatewayError;

static DELIMITER_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*DELIMITER\s+(\S+)\s*$").expect("delimiter directive pattern is valid")
});

/// Reads scripts from one fixed directory.
#[derive(Debug, Clone)]
pub struct ScriptLoader {
    dir: PathBuf,
}

impl ScriptLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Read `name` from the scripts directory and normalize its delimiters.
    ///
    /// The file is read fresh on every call.
    ///
    /// # Errors
    /// `GatewayError::ScriptNotFound` if the file does not exist or `name` is not
    /// a plain file name; `GatewayError::ScriptIo` for other read failures.
    pub async fn load(&self, name: &str) -> Result<String, GatewayError> {
        let path = self.resolve(name)?;
        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(GatewayError::ScriptNotFound(name.to_string()));
            }
            Err(source) => {
                return Err(GatewayError::ScriptIo {
                    name: name.to_string(),
                    source,
                });
            }
        };
        debug!(script = name, bytes = raw.len(), "loaded script");
        Ok(normalize_delimiters(&raw))
    }

    fn resolve(&self, name: &str) -> Result<PathBuf, GatewayError> {
        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(file)), None) => Ok(self.dir.join(file)),
            _ => Err(GatewayError::ScriptNotFound(name.to_string())),
        }
    }
}

/// Drop `DELIMITER` lines and replace the active custom terminator with `;`.
///
/// Text outside a custom-delimiter region is passed through untouched, so
/// semicolons already inside procedure bodies survive. Nesting is not
/// validated; the script is expected to follow the convention.
#[must_use]
pub fn normalize_delimiters(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut active: Option<String> = None;

    for line in raw.split_inclusive('\n') {
        let content = line.trim_end_matches(['\r', '\n']);
        if let Some(caps) = DELIMITER_DIRECTIVE.captures(content) {
            let token = &caps[1];
            active = (token != ";").then(|| token.to_string());
            continue;
        }

        match &active {
            Some(token) => out.push_str(&line.replace(token.as_str(), ";")),
            None => out.push_str(line),
        }
    }

    out
}
