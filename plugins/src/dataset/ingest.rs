use std::path::{Path, PathBuf};

use anyhow::Context;
use tagflow_core::api::Task;
use uuid::Uuid;

use super::archive::{ingest_archive, is_archive_path};

pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "bmp", "gif", "tif", "tiff"];

/// Caption files that mark an image as already labeled, in lookup order.
pub const SIDECAR_EXTENSIONS: &[&str] = &["txt", "caption"];

const ARCHIVE_METADATA_DIR: &str = "__MACOSX";

pub fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.iter().any(|x| e.eq_ignore_ascii_case(x)))
        .unwrap_or(false)
}

pub(super) fn is_hidden_or_metadata(rel: &Path) -> bool {
    rel.components().any(|c| {
        let s = c.as_os_str().to_string_lossy();
        s == ARCHIVE_METADATA_DIR || s.starts_with('.')
    })
}

/// Ingest a `.zip` archive or a directory, depending on what `path` is.
/// `recursive` only applies to directories; archives are always read whole.
pub async fn ingest_path(path: &Path, recursive: bool) -> anyhow::Result<Vec<Task>> {
    let is_file = tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false);
    if is_file && is_archive_path(path) {
        return ingest_archive(path).await;
    }
    ingest_dir(path, recursive).await
}

/// Scan `dir` for images and build one task per image.
///
/// An image with a non-empty sibling caption file arrives `completed` with
/// that caption as its tags. Task names are paths relative to `dir`.
pub async fn ingest_dir(dir: &Path, recursive: bool) -> anyhow::Result<Vec<Task>> {
    let meta = tokio::fs::metadata(dir)
        .await
        .with_context(|| format!("cannot read input directory {}", dir.display()))?;
    if !meta.is_dir() {
        anyhow::bail!("{} is not a directory", dir.display());
    }

    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = if recursive {
        format!("{}/**/*", escaped)
    } else {
        format!("{}/*", escaped)
    };

    let mut images: Vec<PathBuf> = Vec::new();
    for entry in glob::glob(&pattern).context("invalid scan pattern")? {
        match entry {
            Ok(path) => {
                let rel = path.strip_prefix(dir).unwrap_or(&path);
                if is_hidden_or_metadata(rel) || !path.is_file() || !is_image_path(&path) {
                    continue;
                }
                images.push(path);
            }
            Err(e) => tracing::warn!("Glob error: {}", e),
        }
    }
    images.sort();

    let mut tasks = Vec::with_capacity(images.len());
    let mut labeled = 0usize;
    for path in images {
        let content = tokio::fs::read(&path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))?;
        let name = path
            .strip_prefix(dir)
            .unwrap_or(&path)
            .to_string_lossy()
            .replace('\\', "/");
        let id = Uuid::new_v4().to_string();

        let task = match read_sidecar(&path).await {
            Some(tags) => {
                labeled += 1;
                Task::labeled(id, name, content, tags)
            }
            None => Task::new(id, name, content),
        };
        tasks.push(task);
    }

    tracing::info!(
        dir = %dir.display(),
        images = tasks.len(),
        labeled,
        "directory ingested"
    );
    Ok(tasks)
}

async fn read_sidecar(image: &Path) -> Option<String> {
    for ext in SIDECAR_EXTENSIONS {
        let candidate = image.with_extension(ext);
        if let Ok(text) = tokio::fs::read_to_string(&candidate).await {
            let text = text.trim();
            if !text.is_empty() {
                return Some(text.to_string());
            }
        }
    }
    None
}
