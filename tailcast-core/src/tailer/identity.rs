//! Stable file identity used to detect rotation

use std::fs::Metadata;

/// Identity of a file object, independent of the path it is reachable by.
///
/// On unix this is the device and inode pair. Elsewhere it falls back to the
/// creation time, which is a weaker approximation: a replacement created within
/// the timestamp resolution of the replaced file looks identical, and in that case
/// only the size-decrease check catches the change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileIdentity {
    #[cfg(unix)]
    dev: u64,
    #[cfg(unix)]
    ino: u64,
    #[cfg(not(unix))]
    created: Option<std::time::SystemTime>,
}

impl FileIdentity {
    /// Identity of the file described by `metadata`
    #[cfg(unix)]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        use std::os::unix::fs::MetadataExt;

        Self {
            dev: metadata.dev(),
            ino: metadata.ino(),
        }
    }

    /// Identity of the file described by `metadata`
    #[cfg(not(unix))]
    pub fn from_metadata(metadata: &Metadata) -> Self {
        Self {
            created: metadata.created().ok(),
        }
    }
}

impl std::fmt::Display for FileIdentity {
    #[cfg(unix)]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.dev, self.ino)
    }

    #[cfg(not(unix))]
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.created {
            Some(created) => write!(f, "created@{:?}", created),
            None => write!(f, "unknown"),
        }
    }
}
