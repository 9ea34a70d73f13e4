/**
 * Avatar File Storage
 *
 * This module stores uploaded avatar images on local disk under a unique
 * generated file name and returns the public path the file is served from
 * (the router mounts the avatar directory under `/static/avatars` via
 * `ServeDir`).
 */

use std::path::{Path, PathBuf};

use uuid::Uuid;

/// Public URL prefix avatars are served under.
pub const AVATAR_URL_PREFIX: &str = "/static/avatars";

/// Local-disk avatar store.
#[derive(Clone, Debug)]
pub struct AvatarStore {
    root: PathBuf,
}

impl AvatarStore {
    /// Create a store rooted at `root`. The directory is created lazily on
    /// first save.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory the files live in, for mounting as a static service.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Save one uploaded file and return its public path.
    ///
    /// The stored name is freshly generated per upload so a re-upload never
    /// overwrites and caches never serve a stale image. The extension of the
    /// client's file name is kept, nothing else of it is trusted.
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> std::io::Result<String> {
        let file_name = unique_file_name(extension_of(original_name));

        tokio::fs::create_dir_all(&self.root).await?;
        tokio::fs::write(self.root.join(&file_name), bytes).await?;

        tracing::info!("Stored avatar {} ({} bytes)", file_name, bytes.len());
        Ok(format!("{AVATAR_URL_PREFIX}/{file_name}"))
    }
}

/// Generate a unique file name, optionally keeping an extension.
fn unique_file_name(extension: Option<&str>) -> String {
    let stem = Uuid::new_v4().simple().to_string();
    match extension {
        Some(ext) if !ext.is_empty() => format!("{stem}.{ext}"),
        _ => stem,
    }
}

/// Extension of a client-supplied file name, filtered to something safe to
/// embed in a path segment.
fn extension_of(original_name: &str) -> Option<&str> {
    Path::new(original_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| {
            !ext.is_empty() && ext.len() <= 8 && ext.chars().all(|c| c.is_ascii_alphanumeric())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_names_do_not_collide() {
        let a = unique_file_name(Some("png"));
        let b = unique_file_name(Some("png"));
        assert_ne!(a, b);
        assert!(a.ends_with(".png"));
    }

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(extension_of("me.png"), Some("png"));
        assert_eq!(extension_of("archive.tar.gz"), Some("gz"));
        assert_eq!(extension_of("noext"), None);
        assert_eq!(extension_of("weird.p/ng"), None);
        assert_eq!(extension_of("dots..."), None);
    }

    #[tokio::test]
    async fn save_writes_file_and_returns_public_path() {
        let dir = tempfile::tempdir().unwrap();
        let store = AvatarStore::new(dir.path());

        let public_path = store.save("portrait.jpeg", b"not-really-a-jpeg").await.unwrap();
        assert!(public_path.starts_with("/static/avatars/"));
        assert!(public_path.ends_with(".jpeg"));

        let file_name = public_path.rsplit('/').next().unwrap();
        let on_disk = tokio::fs::read(dir.path().join(file_name)).await.unwrap();
        assert_eq!(on_disk, b"not-really-a-jpeg");
    }
}
