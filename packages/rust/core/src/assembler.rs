//! Output directory writer.
//!
//! Every file is written to a temp sibling and renamed into place, so a
//! reader never observes a half-written page or index.

use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::debug;

use reviewpress_shared::{Result, ReviewPressError};

use crate::render::RenderedPage;

/// Metadata for a single written output file.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct WrittenFile {
    pub path: PathBuf,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Create the output directory (and parents) if needed.
pub fn ensure_out_dir(out_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(out_dir).map_err(|e| ReviewPressError::io(out_dir, e))?;
    debug!(path = %out_dir.display(), "output directory ready");
    Ok(())
}

/// Write a rendered page under `out_dir`.
pub fn write_page(out_dir: &Path, page: &RenderedPage) -> Result<WrittenFile> {
    let target = out_dir.join(&page.relative_path);
    write_atomic(&target, page.html.as_bytes())?;

    Ok(WrittenFile {
        path: target,
        sha256: sha256_hex(page.html.as_bytes()),
        size_bytes: page.html.len(),
    })
}

/// Write a JSON file (pretty-printed) atomically.
pub fn write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data).map_err(|e| {
        ReviewPressError::io(path, std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    })?;
    write_atomic(path, json.as_bytes())?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Write to `.<name>.tmp` in the target's directory, then rename over the target.
pub fn write_atomic(target: &Path, contents: &[u8]) -> Result<()> {
    let file_name = target
        .file_name()
        .ok_or_else(|| {
            ReviewPressError::io(
                target,
                std::io::Error::new(std::io::ErrorKind::InvalidInput, "target has no file name"),
            )
        })?
        .to_string_lossy();
    let temp = target.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, contents).map_err(|e| ReviewPressError::io(&temp, e))?;
    if let Err(e) = std::fs::rename(&temp, target) {
        let _ = std::fs::remove_file(&temp);
        return Err(ReviewPressError::io(target, e));
    }

    debug!(path = %target.display(), size = contents.len(), "wrote file");
    Ok(())
}

fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}
