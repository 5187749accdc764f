use std::fs;
use std::path::{Path, PathBuf};

/// Create the configured data directory if needed and return it.
pub fn resolve_data_dir(data_dir: &Path) -> std::io::Result<PathBuf> {
    ensure_dir(data_dir)?;
    Ok(data_dir.to_path_buf())
}

fn ensure_dir(path: &Path) -> std::io::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}
