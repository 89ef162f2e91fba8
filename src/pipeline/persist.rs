//! Write the document and confirm it is plausibly complete.

use crate::error::ExportError;
use std::path::Path;
use tracing::info;

/// Write `pdf` to `path`, creating parent directories, and return the size
/// read back from disk.
///
/// The size check uses the file's metadata rather than `pdf.len()` so a
/// short write is caught too.
pub fn save(path: &Path, pdf: &[u8], min_bytes: u64) -> Result<u64, ExportError> {
    let write_err = |source| ExportError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(write_err)?;
    }
    std::fs::write(path, pdf).map_err(write_err)?;

    let bytes = std::fs::metadata(path).map_err(write_err)?.len();
    if bytes < min_bytes {
        return Err(ExportError::OutputTooSmall {
            path: path.to_path_buf(),
            bytes,
            min: min_bytes,
        });
    }

    info!("PDF generated successfully: {} ({bytes} bytes)", path.display());
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("assets/pdf/cv.pdf");
        let bytes = save(&path, &[b'%'; 2048], 1000).unwrap();
        assert_eq!(bytes, 2048);
        assert!(path.is_file());
    }

    #[test]
    fn rejects_small_output_but_leaves_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cv.pdf");
        let err = save(&path, b"%PDF-1.4", 1000).unwrap_err();
        match err {
            ExportError::OutputTooSmall { bytes, min, .. } => {
                assert_eq!(bytes, 8);
                assert_eq!(min, 1000);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(path.exists());
    }

    #[test]
    fn exactly_minimum_is_accepted() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cv.pdf");
        assert_eq!(save(&path, &vec![0u8; 1000], 1000).unwrap(), 1000);
    }

    #[test]
    fn unwritable_target_reports_write_failure() {
        let dir = TempDir::new().unwrap();
        // A directory where the file should go.
        let path = dir.path().join("cv.pdf");
        std::fs::create_dir(&path).unwrap();
        let err = save(&path, &[0u8; 2000], 1000).unwrap_err();
        assert_eq!(err.kind(), "output-write");
    }
}
