//! Writing generated media to local files
//!
//! Every item is first written to a `.part` file owned by a
//! [`TempManifest`]. Only when all items decoded and wrote cleanly are the
//! parts renamed into place. Renamed targets stay tracked until every rename
//! has succeeded, so a failure part way through leaves no outputs behind.

use std::path::{Path, PathBuf};

use base64::Engine;
use tracing::{debug, info};

use crate::manifest::TempManifest;
use crate::types::{MediaItem, MediaPayload};
use crate::{Error, Result};

/// Final file name for one item: `<prefix>_<index>.<ext>`
pub fn output_file_name(prefix: &str, item: &MediaItem) -> String {
    format!("{}_{}.{}", prefix, item.index, item.extension())
}

/// Decode and write every inline item into `dir`.
///
/// Remote-id items have nothing to write and are skipped. Returns the final
/// paths in item order.
pub fn persist_items(items: &[MediaItem], dir: &Path, prefix: &str) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;

    let mut manifest = TempManifest::new();
    let mut staged = Vec::new();

    for item in items {
        let MediaPayload::Inline { data } = &item.payload else {
            debug!(index = item.index, "Skipping remote item");
            continue;
        };

        let bytes = base64::engine::general_purpose::STANDARD
            .decode(data.trim())
            .map_err(|e| Error::Internal {
                message: format!("media item {} is not valid base64", item.index),
                source: e.into(),
            })?;

        let target = dir.join(output_file_name(prefix, item));
        let part = target.with_extension(format!("{}.part", item.extension()));
        manifest.track(&part);
        std::fs::write(&part, &bytes)?;
        staged.push((part, target));
    }

    debug!(parts = manifest.len(), dir = %dir.display(), "Staged media items");

    let mut written = Vec::with_capacity(staged.len());
    for (part, target) in staged {
        std::fs::rename(&part, &target)?;
        manifest.release(&part);
        manifest.track(&target);
        written.push(target);
    }

    for target in &written {
        manifest.release(target);
        info!(path = %target.display(), "Saved media item");
    }
    Ok(written)
}
