use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::CheckError;

const IMAGE_EXTENSIONS: [&str; 8] = ["png", "jpg", "jpeg", "bmp", "tif", "tiff", "webp", "gif"];

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Image files directly inside `dir`, sorted by name.
pub fn list_ticket_images(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.is_file() && is_image_path(&path) {
            images.push(path);
        }
    }
    images.sort();
    Ok(images)
}

/// Copies an uploaded image into `upload_dir`, keeping its file name.
pub fn store_upload(source: &Path, upload_dir: &Path) -> Result<PathBuf, CheckError> {
    if !is_image_path(source) {
        return Err(CheckError::InvalidUpload(
            "Uploaded file must be an image".to_string(),
        ));
    }
    let file_name = source
        .file_name()
        .ok_or_else(|| CheckError::InvalidUpload("Uploaded file has no name".to_string()))?;

    let destination = upload_dir.join(file_name);
    fs::create_dir_all(upload_dir)
        .and_then(|_| fs::copy(source, &destination))
        .with_context(|| format!("Failed to save uploaded image {}", source.display()))
        .map_err(CheckError::Storage)?;
    Ok(destination)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extensions() {
        assert!(is_image_path(Path::new("ticket.PNG")));
        assert!(is_image_path(Path::new("a/b/ticket.jpeg")));
        assert!(!is_image_path(Path::new("ticket.pdf")));
        assert!(!is_image_path(Path::new("ticket")));
    }

    #[test]
    fn test_store_upload_copies_images_only() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("ticket.png");
        fs::write(&source, b"fake image").unwrap();
        let notes = dir.path().join("notes.txt");
        fs::write(&notes, b"hello").unwrap();

        let uploads = dir.path().join("uploads");
        let saved = store_upload(&source, &uploads).unwrap();
        assert_eq!(saved, uploads.join("ticket.png"));
        assert_eq!(fs::read(&saved).unwrap(), b"fake image");

        let err = store_upload(&notes, &uploads).unwrap_err();
        assert!(matches!(err, CheckError::InvalidUpload(_)));

        let images = list_ticket_images(&uploads).unwrap();
        assert_eq!(images, vec![saved]);
    }
}
