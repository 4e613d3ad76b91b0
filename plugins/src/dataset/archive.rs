use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use bytes::Bytes;
use tagflow_core::api::Task;
use uuid::Uuid;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use super::export::ExportReport;
use super::ingest::{is_hidden_or_metadata, is_image_path, SIDECAR_EXTENSIONS};

pub fn is_archive_path(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Build one task per image entry of a `.zip` archive.
///
/// Same rules as a directory scan: `__MACOSX` and dot entries are skipped, and
/// a non-empty `<stem>.txt` / `<stem>.caption` next to the image marks it
/// `completed`. Task names are the entry paths.
pub async fn ingest_archive(path: &Path) -> anyhow::Result<Vec<Task>> {
    let data = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read archive {}", path.display()))?;

    let tasks = tokio::task::spawn_blocking(move || read_archive(&data))
        .await
        .context("archive reader panicked")?
        .with_context(|| format!("cannot unpack {}", path.display()))?;

    tracing::info!(
        archive = %path.display(),
        images = tasks.len(),
        labeled = tasks.iter().filter(|t| t.tags.is_some()).count(),
        "archive ingested"
    );
    Ok(tasks)
}

fn read_archive(data: &[u8]) -> anyhow::Result<Vec<Task>> {
    let mut zip = ZipArchive::new(Cursor::new(data)).context("not a zip archive")?;

    let mut images: Vec<(String, Vec<u8>)> = Vec::new();
    // "<stem>.<sidecar ext>" -> caption
    let mut captions: HashMap<String, String> = HashMap::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if entry.is_dir() {
            continue;
        }
        let name = entry.name().replace('\\', "/");
        let rel = Path::new(&name);
        if is_hidden_or_metadata(rel) {
            continue;
        }

        if is_image_path(rel) {
            let mut buf = Vec::with_capacity(entry.size() as usize);
            entry
                .read_to_end(&mut buf)
                .with_context(|| format!("failed to read {name}"))?;
            images.push((name, buf));
        } else if let Some(ext) = sidecar_extension(rel) {
            let mut text = String::new();
            if let Err(e) = entry.read_to_string(&mut text) {
                tracing::warn!(entry = %name, error = %e, "unreadable caption skipped");
                continue;
            }
            let text = text.trim();
            if !text.is_empty() {
                captions.insert(format!("{}.{}", stem(&name), ext), text.to_string());
            }
        }
    }
    images.sort_by(|a, b| a.0.cmp(&b.0));

    let tasks = images
        .into_iter()
        .map(|(name, content)| {
            let id = Uuid::new_v4().to_string();
            let caption = SIDECAR_EXTENSIONS
                .iter()
                .find_map(|ext| captions.get(&format!("{}.{}", stem(&name), ext)));
            match caption {
                Some(tags) => Task::labeled(id, name, content, tags.clone()),
                None => Task::new(id, name, content),
            }
        })
        .collect();
    Ok(tasks)
}

fn sidecar_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?;
    SIDECAR_EXTENSIONS
        .iter()
        .copied()
        .find(|x| ext.eq_ignore_ascii_case(x))
}

/// Entry name without its extension.
fn stem(name: &str) -> &str {
    match name.rfind('.') {
        Some(i) if !name[i..].contains('/') => &name[..i],
        _ => name,
    }
}

fn caption_name(name: &str) -> String {
    format!("{}.txt", stem(name))
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Write every task as `<name>` plus `<stem>.txt` into a `.zip` at `out`.
/// Unlabeled tasks get an empty caption entry.
pub async fn export_archive(tasks: &[Task], out: &Path) -> anyhow::Result<ExportReport> {
    if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("cannot create output directory {}", parent.display()))?;
    }

    let entries: Vec<(String, Bytes, String)> = tasks
        .iter()
        .map(|t| (t.name.clone(), t.content.clone(), t.tags.clone().unwrap_or_default()))
        .collect();
    let path: PathBuf = out.to_path_buf();

    let report = tokio::task::spawn_blocking(move || write_archive(&path, &entries))
        .await
        .context("archive writer panicked")?
        .with_context(|| format!("failed to write {}", out.display()))?;

    tracing::info!(out = %out.display(), images = report.images, labeled = report.labeled, "dataset archive exported");
    Ok(report)
}

fn write_archive(path: &Path, entries: &[(String, Bytes, String)]) -> anyhow::Result<ExportReport> {
    let file = std::fs::File::create(path)?;
    let mut zip = ZipWriter::new(file);
    let mut written = HashSet::new();
    let mut report = ExportReport::default();

    for (name, content, tags) in entries {
        if !written.insert(name.as_str()) {
            tracing::warn!(entry = %name, "duplicate name, keeping the first");
            continue;
        }
        zip.start_file(name.as_str(), entry_options())?;
        zip.write_all(content)?;
        zip.start_file(caption_name(name), entry_options())?;
        zip.write_all(tags.as_bytes())?;

        report.images += 1;
        if !tags.is_empty() {
            report.labeled += 1;
        }
    }

    zip.finish()?;
    Ok(report)
}
