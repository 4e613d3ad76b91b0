use std::path::Path;

use anyhow::Context;
use tagflow_core::api::{Task, TaskStatus};

use super::archive::{export_archive, is_archive_path};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub images: usize,
    /// Captions written with non-empty tags.
    pub labeled: usize,
}

/// Write every task as `<name>` plus `<stem>.txt` under `out`. Unlabeled
/// tasks get an empty caption file. An `out` ending in `.zip` is written as
/// one archive instead of a directory.
pub async fn export_dataset(tasks: &[Task], out: &Path) -> anyhow::Result<ExportReport> {
    if is_archive_path(out) {
        return export_archive(tasks, out).await;
    }

    tokio::fs::create_dir_all(out)
        .await
        .with_context(|| format!("cannot create output directory {}", out.display()))?;

    let mut report = ExportReport::default();
    for task in tasks {
        let image_path = out.join(&task.name);
        if let Some(parent) = image_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&image_path, &task.content)
            .await
            .with_context(|| format!("failed to write {}", image_path.display()))?;

        let tags = task.tags.as_deref().unwrap_or_default();
        let caption_path = image_path.with_extension("txt");
        tokio::fs::write(&caption_path, tags)
            .await
            .with_context(|| format!("failed to write {}", caption_path.display()))?;

        report.images += 1;
        if !tags.is_empty() {
            report.labeled += 1;
        }
        if task.status != TaskStatus::Completed {
            tracing::debug!(task = %task.name, status = %task.status, "exporting unfinished task");
        }
    }

    tracing::info!(out = %out.display(), images = report.images, labeled = report.labeled, "dataset exported");
    Ok(report)
}
