//! Discovery of the ordered page image files for a reading session.

use std::cmp::Ordering;
use std::iter::Peekable;
use std::path::{Path, PathBuf};
use std::str::Chars;

use thiserror::Error;

/// Supported image extensions
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "bmp", "webp", "tiff", "tif"];

/// Check if a filename (string) has a supported image extension.
/// Works with both full paths and just filenames.
pub fn is_image_filename(name: &str) -> bool {
    let lower = name.to_lowercase();
    IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(&format!(".{}", ext)))
}

fn is_image_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(is_image_filename)
}

/// Compare file names with digit runs ordered by value, so `page2` sorts
/// before `page10`.
fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut left = a.chars().peekable();
    let mut right = b.chars().peekable();

    loop {
        let (l, r) = match (left.peek(), right.peek()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(&l), Some(&r)) => (l, r),
        };

        if l.is_ascii_digit() && r.is_ascii_digit() {
            let l_run = take_digits(&mut left);
            let r_run = take_digits(&mut right);
            let l_value = l_run.trim_start_matches('0');
            let r_value = r_run.trim_start_matches('0');
            let by_value = l_value
                .len()
                .cmp(&r_value.len())
                .then_with(|| l_value.cmp(r_value));
            if by_value != Ordering::Equal {
                return by_value;
            }
        } else {
            if l != r {
                return l.cmp(&r);
            }
            left.next();
            right.next();
        }
    }
}

fn take_digits(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(char::is_ascii_digit) {
        run.push(c);
    }
    run
}

/// Errors while collecting page files.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("No paths provided")]
    NoPaths,

    #[error("Failed to read folder {path:?}: {source}")]
    ReadFolder {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No image files found")]
    NoImages,
}

/// Ordered list of page image files. Index in the list is the page index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageSources {
    paths: Vec<PathBuf>,
}

impl PageSources {
    /// Discover image files in a folder, non-recursively.
    pub fn from_folder(folder: &Path) -> Result<Self, SourceError> {
        let mut paths = Vec::new();
        Self::scan_folder(folder, &mut paths)?;
        Self::finish(paths)
    }

    /// Create sources from a list of paths (files and/or folders).
    ///
    /// Files are added directly, folders contribute their image files.
    /// Non-image files are ignored.
    pub fn from_paths(paths: &[PathBuf]) -> Result<Self, SourceError> {
        if paths.is_empty() {
            return Err(SourceError::NoPaths);
        }

        let mut images = Vec::new();
        for path in paths {
            if path.is_file() && is_image_file(path) {
                images.push(path.clone());
            } else if path.is_dir() {
                Self::scan_folder(path, &mut images)?;
            } else {
                log::warn!("Skipping {:?}: not an image file or folder", path);
            }
        }
        Self::finish(images)
    }

    fn scan_folder(folder: &Path, images: &mut Vec<PathBuf>) -> Result<(), SourceError> {
        let entries = std::fs::read_dir(folder).map_err(|source| SourceError::ReadFolder {
            path: folder.to_path_buf(),
            source,
        })?;

        images.extend(
            entries
                .filter_map(|entry| entry.ok())
                .map(|entry| entry.path())
                .filter(|path| path.is_file() && is_image_file(path)),
        );
        Ok(())
    }

    fn finish(mut paths: Vec<PathBuf>) -> Result<Self, SourceError> {
        if paths.is_empty() {
            return Err(SourceError::NoImages);
        }

        // Page order follows file names in natural order, then full path
        paths.sort_by(|a, b| {
            let name = |p: &Path| {
                p.file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default()
            };
            natural_cmp(&name(a), &name(b)).then_with(|| a.cmp(b))
        });
        paths.dedup();

        log::info!("Found {} page images", paths.len());
        Ok(Self { paths })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    /// File name of the page at `index`, for display and manifest lookup.
    pub fn name(&self, index: usize) -> Option<String> {
        self.get(index)
            .and_then(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_image_filename() {
        assert!(is_image_filename("0001.jpg"));
        assert!(is_image_filename("page.PNG"));
        assert!(is_image_filename("path/to/page.webp"));
        assert!(!is_image_filename("panels.json"));
        assert!(!is_image_filename("png"));
        assert!(!is_image_filename(""));
    }

    #[test]
    fn test_from_folder_sorts_and_filters() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["0003.jpg", "0001.png", "notes.txt", "0002.JPEG"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("sub.png")).unwrap();

        let sources = PageSources::from_folder(dir.path()).unwrap();
        assert_eq!(sources.len(), 3);
        assert_eq!(sources.name(0).as_deref(), Some("0001.png"));
        assert_eq!(sources.name(1).as_deref(), Some("0002.JPEG"));
        assert_eq!(sources.name(2).as_deref(), Some("0003.jpg"));
        assert_eq!(sources.name(3), None);
    }

    #[test]
    fn test_natural_cmp() {
        assert_eq!(natural_cmp("page2.png", "page10.png"), Ordering::Less);
        assert_eq!(natural_cmp("page10.png", "page9.png"), Ordering::Greater);
        assert_eq!(natural_cmp("p007.png", "p7.png"), Ordering::Less);
        assert_eq!(natural_cmp("a.png", "b.png"), Ordering::Less);
        assert_eq!(natural_cmp("ch1", "ch1-extra"), Ordering::Less);
        assert_eq!(natural_cmp("x.png", "x.png"), Ordering::Equal);
    }

    #[test]
    fn test_unpadded_page_numbers_keep_reading_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page2.png", "page10.png", "page1.png"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }

        let sources = PageSources::from_folder(dir.path()).unwrap();
        let names: Vec<String> = (0..sources.len())
            .filter_map(|i| sources.name(i))
            .collect();
        assert_eq!(names, vec!["page1.png", "page2.png", "page10.png"]);
    }

    #[test]
    fn test_from_paths_mixes_files_and_folders() {
        let dir = tempfile::tempdir().unwrap();
        let chapter = dir.path().join("chapter");
        std::fs::create_dir(&chapter).unwrap();
        std::fs::write(chapter.join("b.png"), b"x").unwrap();
        let single = dir.path().join("a.png");
        std::fs::write(&single, b"x").unwrap();

        let sources = PageSources::from_paths(&[chapter.clone(), single.clone()]).unwrap();
        assert_eq!(sources.paths(), &[single, chapter.join("b.png")]);
    }

    #[test]
    fn test_empty_inputs() {
        assert!(matches!(
            PageSources::from_paths(&[]),
            Err(SourceError::NoPaths)
        ));

        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            PageSources::from_folder(dir.path()),
            Err(SourceError::NoImages)
        ));
        assert!(matches!(
            PageSources::from_folder(&dir.path().join("missing")),
            Err(SourceError::ReadFolder { .. })
        ));
    }
}
