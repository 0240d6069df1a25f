use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::model::Session;

const SESSION_FILE: &str = "session.json";

/// Local persistence for connection parameters.
///
/// No version concept: last write wins, the file is overwritten wholesale,
/// and nothing survives `clear()`. The store is process-external (survives
/// restarts) but not shared across concurrent processes.
#[derive(Clone, Debug)]
pub struct SessionStore {
    root: PathBuf,
}

impl SessionStore {
    pub fn open(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Default store location: `$REPORTCTL_HOME`, else `~/.reportctl`.
    pub fn default_root() -> Result<PathBuf> {
        if let Some(dir) = std::env::var_os("REPORTCTL_HOME") {
            return Ok(PathBuf::from(dir));
        }
        dirs::home_dir()
            .map(|home| home.join(".reportctl"))
            .ok_or_else(|| std::io::Error::other("cannot determine home directory").into())
    }

    pub fn path(&self) -> PathBuf {
        self.root.join(SESSION_FILE)
    }

    pub fn read(&self) -> Result<Option<Session>> {
        let path = self.path();
        if !path.exists() {
            return Ok(None);
        }
        let bytes = fs::read(&path)?;
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    pub fn write(&self, session: &Session) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(session)?;
        write_atomic(&self.path(), &bytes)
    }

    pub fn clear(&self) -> Result<()> {
        let path = self.path();
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Write via temp file + rename so a crash never leaves a half-written
/// session behind. The token inside is plaintext, so the file is owner-only.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = path.with_extension(format!("tmp.{}", std::process::id()));
    fs::write(&tmp, bytes)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp, fs::Permissions::from_mode(0o600))?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}
