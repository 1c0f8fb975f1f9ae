use std::path::{Path, PathBuf};
use tracing::trace;

/// Resolve `path` against the directory holding the running executable, unless it is absolute.
pub fn resolve_output_path(path: &Path) -> std::io::Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }

    let exe = std::env::current_exe()?;
    let dir = exe.parent().ok_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "executable has no parent directory",
        )
    })?;
    trace!("resolving {} against {}", path.display(), dir.display());
    Ok(dir.join(path))
}

/// Create the parent directories of `path`, as necessary.
pub(crate) fn ensure_parent(path: &Path) -> std::io::Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir),
        _ => Ok(()),
    }
}
