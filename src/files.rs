use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Result, SrtkitError};

/// True when the path ends in `.srt`, any case.
pub fn is_srt(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("srt"))
}

/// Read a whole file as UTF-8 text.
pub fn read_text(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(SrtkitError::FileNotFound(path.display().to_string()));
    }
    Ok(std::fs::read_to_string(path)?)
}

/// Replace `path` with `content` via a temporary file in the same directory,
/// so an interrupted run never leaves a half-written file behind.
pub fn write_atomic(path: &Path, content: &str) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut tmp = NamedTempFile::new_in(&dir)?;
    tmp.write_all(content.as_bytes())?;
    // The temp file starts out private; keep the target's mode.
    if let Ok(metadata) = std::fs::metadata(path) {
        tmp.as_file().set_permissions(metadata.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| SrtkitError::Io(e.error))?;

    debug!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Every `.srt` file under `root`, sorted for stable output.
pub fn find_srt_files(root: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file() && is_srt(e.path()))
        .map(|e| e.into_path())
        .collect();
    files.sort();
    files
}

/// `path` relative to `base` for display, or `path` itself when unrelated.
pub fn display_relative(path: &Path, base: &Path) -> String {
    pathdiff::diff_paths(path, base)
        .filter(|rel| !rel.as_os_str().is_empty())
        .unwrap_or_else(|| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_srt() {
        assert!(is_srt(Path::new("a/b.srt")));
        assert!(is_srt(Path::new("B.SRT")));
        assert!(!is_srt(Path::new("b.srt.bak")));
        assert!(!is_srt(Path::new("srt")));
    }

    #[test]
    fn test_write_atomic_replaces_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.srt");
        std::fs::write(&path, "old").unwrap();

        write_atomic(&path, "new\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomic_keeps_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.srt");
        std::fs::write(&path, "old").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        write_atomic(&path, "x\n").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_write_atomic_creates_new_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fresh.srt");

        write_atomic(&path, "x\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "x\n");
    }

    #[test]
    fn test_read_missing_file() {
        let err = read_text(Path::new("definitely/not/here.srt")).unwrap_err();
        assert!(matches!(err, SrtkitError::FileNotFound(_)));
    }

    #[test]
    fn test_find_srt_files_recurses() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("x/y")).unwrap();
        std::fs::write(dir.path().join("b.srt"), "").unwrap();
        std::fs::write(dir.path().join("x/y/a.SRT"), "").unwrap();
        std::fs::write(dir.path().join("x/notes.txt"), "").unwrap();

        let found = find_srt_files(dir.path());
        let rel: Vec<String> = found.iter().map(|p| display_relative(p, dir.path())).collect();
        let nested: std::path::PathBuf = ["x", "y", "a.SRT"].iter().collect();
        assert_eq!(rel, vec!["b.srt".to_string(), nested.display().to_string()]);
    }
}
