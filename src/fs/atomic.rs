//! Atomic filesystem writes.
//!
//! All atomic writes follow this pattern:
//! 1. Write content to a temporary file in the same directory as the target
//! 2. Copy the target's permissions onto the temporary file (if the target exists)
//! 3. Sync the temporary file to disk
//! 4. Rename it over the target
//!
//! Rename is atomic when source and destination are on the same filesystem,
//! which is why the temporary file is created next to the target. On crash a
//! stray `.{filename}.*.tmp` file may remain in that directory.
//!
//! Errors are returned as `io::Error` with the original `ErrorKind` preserved,
//! so callers can tell transient failures from permanent ones.

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write bytes to a file.
///
/// Missing parent directories are created. An existing target keeps its
/// permission bits.
///
/// ```no_run
/// use ecce::fs::atomic_write;
/// use std::path::Path;
///
/// atomic_write(Path::new("slides.md"), b"# Slides\n")?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn atomic_write<P: AsRef<Path>>(path: P, content: &[u8]) -> io::Result<()> {
    let path = path.as_ref();

    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !parent.exists() {
        fs::create_dir_all(parent).map_err(|e| annotate(e, "create directory", parent))?;
    }

    let mut temp = create_temp_sibling(path, parent)?;

    temp.write_all(content)
        .map_err(|e| annotate(e, "write temporary file for", path))?;

    if let Ok(metadata) = fs::metadata(path) {
        fs::set_permissions(temp.path(), metadata.permissions())
            .map_err(|e| annotate(e, "copy permissions for", path))?;
    }

    temp.as_file()
        .sync_all()
        .map_err(|e| annotate(e, "sync temporary file for", path))?;

    // A failed persist drops the temp file, which removes it.
    temp.persist(path)
        .map_err(|e| annotate(e.error, "atomically replace", path))?;

    sync_parent_dir(parent);
    Ok(())
}

/// Atomically write a string to a file.
///
/// Convenience wrapper around `atomic_write` for string content.
pub fn atomic_write_file<P: AsRef<Path>>(path: P, content: &str) -> io::Result<()> {
    atomic_write(path, content.as_bytes())
}

fn create_temp_sibling(target: &Path, parent: &Path) -> io::Result<NamedTempFile> {
    let filename = target
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid file path '{}'", target.display()),
            )
        })?;

    tempfile::Builder::new()
        .prefix(&format!(".{}.", filename))
        .suffix(".tmp")
        .tempfile_in(parent)
        .map_err(|e| annotate(e, "create temporary file for", target))
}

/// Persist the directory entry after the rename. Best effort.
#[cfg(unix)]
fn sync_parent_dir(parent: &Path) {
    if let Ok(dir) = File::open(parent) {
        let _ = dir.sync_all();
    }
}

#[cfg(not(unix))]
fn sync_parent_dir(_parent: &Path) {}

fn annotate(err: io::Error, op: &str, path: &Path) -> io::Error {
    io::Error::new(
        err.kind(),
        format!("failed to {} '{}': {}", op, path.display(), err),
    )
}
