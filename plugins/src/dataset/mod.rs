//! Dataset I/O: turning a directory or `.zip` archive into tasks and labeled
//! tasks back into image/caption pairs.

mod archive;
mod export;
mod ingest;

pub use archive::{export_archive, ingest_archive, is_archive_path};
pub use export::{export_dataset, ExportReport};
pub use ingest::{ingest_dir, ingest_path, is_image_path, IMAGE_EXTENSIONS, SIDECAR_EXTENSIONS};
