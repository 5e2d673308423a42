use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::{ReleaseNotesError, Result};

/// Write `content` to `path`, replacing anything already there.
///
/// `.json` targets get pretty-printed JSON. Anything else is written as raw
/// text: a string is written as its bytes, other values as pretty JSON text.
/// A failure to create the parent directory is only logged; the open that
/// follows reports the real problem.
pub fn write_file<T: Serialize + ?Sized>(path: &Path, content: &T) -> Result<PathBuf> {
    info!("writing {}", path.display());

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("failed to create {}: {e}", parent.display());
        }
    }

    let write_err = |source: io::Error| ReleaseNotesError::Write {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(write_err)?;
    let mut writer = BufWriter::new(file);

    if is_json(path) {
        serde_json::to_writer_pretty(&mut writer, content)
            .map_err(|e| write_err(io::Error::from(e)))?;
    } else {
        let written = match serde_json::to_value(content)? {
            serde_json::Value::String(text) => writer.write_all(text.as_bytes()),
            other => serde_json::to_writer_pretty(&mut writer, &other).map_err(io::Error::from),
        };
        written.map_err(write_err)?;
    }

    writer.flush().map_err(write_err)?;

    info!("written to {}", path.display());
    Ok(path.to_path_buf())
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "json")
}
