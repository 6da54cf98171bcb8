//! Output path resolution and the existence/overwrite gate

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Why a task was skipped without invoking the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SkipReason {
    /// The output file exists and overwrite is disabled
    AlreadyExists,
}

/// Resolve the output path of one task.
///
/// Whole-track tasks map to `{base}.a{track}.{ext}`, per-channel tasks to
/// `{base}.a{track}.ch{channel}.{ext}`, so two tasks of one container never
/// share a path.
pub fn resolve(
    container_base_name: &str,
    output_dir: &Path,
    track_index: usize,
    channel_index: Option<u16>,
    extension: &str,
) -> PathBuf {
    let file_name = match channel_index {
        Some(ch) => format!(
            "{}.a{}.ch{}.{}",
            container_base_name, track_index, ch, extension
        ),
        None => format!("{}.a{}.{}", container_base_name, track_index, extension),
    };
    output_dir.join(file_name)
}

/// Base name used for a container's outputs (file name without extension)
pub fn container_base_name(container_path: &Path) -> String {
    container_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string())
}

/// Existence gate, evaluated at execution time
pub fn check_existing(output_path: &Path, overwrite: bool) -> Option<SkipReason> {
    if !overwrite && output_path.exists() {
        Some(SkipReason::AlreadyExists)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_whole_track() {
        let path = resolve("a", Path::new("/out"), 0, None, "m4a");
        assert_eq!(path, PathBuf::from("/out/a.a0.m4a"));
    }

    #[test]
    fn test_resolve_per_channel() {
        let path = resolve("b", Path::new("/out"), 2, Some(1), "wav");
        assert_eq!(path, PathBuf::from("/out/b.a2.ch1.wav"));
    }

    #[test]
    fn test_container_base_name() {
        assert_eq!(container_base_name(Path::new("/media/My Show.S01.mkv")), "My Show.S01");
        assert_eq!(container_base_name(Path::new("clip")), "clip");
    }

    #[test]
    fn test_check_existing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("x.a0.m4a");

        assert_eq!(check_existing(&path, false), None);
        std::fs::write(&path, b"data").unwrap();
        assert_eq!(check_existing(&path, false), Some(SkipReason::AlreadyExists));
        assert_eq!(check_existing(&path, true), None);
    }
}
