use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};

/// A photo read from disk, ready to hand to the identifier.
#[derive(Debug)]
pub struct Photo {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

/// Read a photo and settle its media type.
pub async fn load(path: &Path, mime_override: Option<&str>, default_mime: &str) -> Result<Photo> {
    let path = expand_home(path);
    let bytes = tokio::fs::read(&path)
        .await
        .with_context(|| format!("failed to read {}", path.display()))?;
    if bytes.is_empty() {
        bail!("{} is empty", path.display());
    }
    let mime_type = guess_mime(&path, mime_override, default_mime);
    tracing::debug!(path = %path.display(), bytes = bytes.len(), %mime_type, "photo loaded");
    Ok(Photo {
        path,
        bytes,
        mime_type,
    })
}

/// Explicit override wins, then the file extension. Anything that does not
/// look like an image falls back to `default_mime`.
pub fn guess_mime(path: &Path, mime_override: Option<&str>, default_mime: &str) -> String {
    if let Some(m) = mime_override.map(str::trim).filter(|m| !m.is_empty()) {
        return m.to_string();
    }
    match mime_guess::from_path(path).first() {
        Some(mime) if mime.type_() == mime_guess::mime::IMAGE => mime.essence_str().to_string(),
        _ => default_mime.to_string(),
    }
}

/// Expand a leading `~/` to the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guess_from_extension() {
        assert_eq!(guess_mime(Path::new("a.png"), None, "image/jpeg"), "image/png");
        assert_eq!(guess_mime(Path::new("a.JPG"), None, "image/png"), "image/jpeg");
        assert_eq!(guess_mime(Path::new("leaf.webp"), None, "image/jpeg"), "image/webp");
    }

    #[test]
    fn test_override_wins() {
        assert_eq!(
            guess_mime(Path::new("a.png"), Some("image/heic"), "image/jpeg"),
            "image/heic"
        );
        assert_eq!(guess_mime(Path::new("a.png"), Some("  "), "image/jpeg"), "image/png");
    }

    #[test]
    fn test_non_image_falls_back() {
        assert_eq!(guess_mime(Path::new("notes.txt"), None, "image/jpeg"), "image/jpeg");
        assert_eq!(guess_mime(Path::new("no_extension"), None, "image/jpeg"), "image/jpeg");
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home(Path::new("plain/path.jpg")), PathBuf::from("plain/path.jpg"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/p.jpg")), home.join("p.jpg"));
        }
    }

    #[tokio::test]
    async fn test_load_reads_bytes() {
        let dir = std::env::temp_dir().join(format!("bloombot-photo-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("leaf.png");
        std::fs::write(&file, [0x89, b'P', b'N', b'G']).unwrap();

        let photo = load(&file, None, "image/jpeg").await.unwrap();
        assert_eq!(photo.bytes, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(photo.mime_type, "image/png");

        std::fs::write(&file, b"").unwrap();
        assert!(load(&file, None, "image/jpeg").await.is_err());
        assert!(load(&dir.join("missing.png"), None, "image/jpeg").await.is_err());

        let _ = std::fs::remove_dir_all(&dir);
    }
}
