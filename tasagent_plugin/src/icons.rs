use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

pub const MIC_NO_CONNECTION_FILE: &str = "MicMonitorIcon.png";
pub const MIC_NORMAL_FILE: &str = "NormalMic.png";
pub const MIC_MODIFIED_FILE: &str = "ModdedMic.png";
pub const LOCK_NO_CONNECTION_FILE: &str = "UndeterminedLockIcon.png";
pub const LOCK_OPEN_FILE: &str = "UnlockedIcon.png";
pub const LOCK_LOCKED_FILE: &str = "LockedIcon.png";

#[derive(Debug, Error)]
#[error("failed to read icon {path}: {source}")]
pub struct IconError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}

/// An encoded image ready for `setImage`. Cheap to clone.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Icon(Arc<str>);

impl Icon {
    pub fn from_png_bytes(bytes: &[u8]) -> Self {
        Self(format!("data:image/png;base64,{}", STANDARD.encode(bytes)).into())
    }

    pub fn from_data_uri(uri: impl Into<Arc<str>>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct IconSet {
    pub mic_no_connection: Icon,
    pub mic_normal: Icon,
    pub mic_modified: Icon,
    pub lock_no_connection: Icon,
    pub lock_open: Icon,
    pub lock_locked: Icon,
}

impl IconSet {
    /// Reads all six icons once; any missing file fails startup.
    pub fn load(dir: &Path) -> Result<Self, IconError> {
        let read = |name: &str| -> Result<Icon, IconError> {
            let path = dir.join(name);
            std::fs::read(&path)
                .map(|bytes| Icon::from_png_bytes(&bytes))
                .map_err(|source| IconError { path, source })
        };

        Ok(Self {
            mic_no_connection: read(MIC_NO_CONNECTION_FILE)?,
            mic_normal: read(MIC_NORMAL_FILE)?,
            mic_modified: read(MIC_MODIFIED_FILE)?,
            lock_no_connection: read(LOCK_NO_CONNECTION_FILE)?,
            lock_open: read(LOCK_OPEN_FILE)?,
            lock_locked: read(LOCK_LOCKED_FILE)?,
        })
    }
}
