use anyhow::Result;
use std::{
    fs::{self, File},
    io::Write,
    path::Path,
};

/// Check that a dataset path exists and has a `.csv` extension.
pub fn validate_csv_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_lowercase());
    if ext.as_deref() != Some("csv") {
        anyhow::bail!("File must have a .csv extension: {}", path.display());
    }
    if !path.exists() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

pub fn write_bytes_to_file<P: AsRef<Path>>(path: P, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let mut file = File::create(path)?;
    file.write_all(bytes)?;
    Ok(())
}
