//! Input discovery - expands directory arguments into video files

use std::path::{Path, PathBuf};

use crate::error::{ExtractError, Result};

/// Extensions treated as video containers when scanning a directory
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "flv", "wmv", "webm", "m4v"];

pub fn is_video_file(path: &Path) -> bool {
    path.extension()
        .map(|ext| {
            let ext = ext.to_string_lossy().to_lowercase();
            VIDEO_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Video files directly inside `dir`, sorted
pub fn list_videos(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut videos = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && is_video_file(&path) {
            videos.push(path);
        }
    }
    videos.sort();
    Ok(videos)
}

/// Expand command-line inputs into container paths.
///
/// Files are taken as given (whatever their extension); directories are
/// replaced by the video files they contain. Duplicates keep their first
/// position.
pub fn expand_inputs(inputs: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut containers: Vec<PathBuf> = Vec::new();
    for input in inputs {
        let found = if input.is_dir() {
            let videos = list_videos(input)?;
            if videos.is_empty() {
                tracing::warn!("No video files found in {:?}", input);
            }
            videos
        } else if input.exists() {
            vec![input.clone()]
        } else {
            return Err(ExtractError::InvalidInput(format!(
                "{} does not exist",
                input.display()
            )));
        };

        for path in found {
            if !containers.contains(&path) {
                containers.push(path);
            }
        }
    }
    Ok(containers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_video_file() {
        assert!(is_video_file(Path::new("a.mkv")));
        assert!(is_video_file(Path::new("B.MP4")));
        assert!(!is_video_file(Path::new("notes.txt")));
        assert!(!is_video_file(Path::new("noext")));
    }

    #[test]
    fn test_expand_directory() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["b.mkv", "a.MOV", "readme.txt"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mkv")).unwrap();

        let found = expand_inputs(&[dir.path().to_path_buf()]).unwrap();

        assert_eq!(
            found,
            vec![dir.path().join("a.MOV"), dir.path().join("b.mkv")]
        );
    }

    #[test]
    fn test_expand_files_and_duplicates() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("clip.ts");
        std::fs::write(&file, b"").unwrap();

        let found = expand_inputs(&[file.clone(), file.clone()]).unwrap();
        assert_eq!(found, vec![file]);
    }

    #[test]
    fn test_missing_input() {
        let err = expand_inputs(&[PathBuf::from("/definitely/not/here.mkv")]).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidInput(_)));
    }
}
