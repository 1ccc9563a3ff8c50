//! Folder listing and frame decoding.
use std::cmp::Ordering;
use std::fs;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage};
use tracing::{debug, info, warn};

use crate::error::{Error, Result, StageContext};

/// Raster extensions accepted as input, compared case-insensitively
pub const INPUT_EXTENSIONS: &[&str] = &["png", "webp", "jpg", "jpeg", "jfif", "bmp", "tiff", "tga"];

pub fn is_supported_input(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| INPUT_EXTENSIONS.iter().any(|s| e.eq_ignore_ascii_case(s)))
        .unwrap_or(false)
}

/// Natural ("human") ordering: digit runs compare by value, text runs
/// case-insensitively, so `page2` sorts before `page10`.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let mut ai = a.chars().peekable();
    let mut bi = b.chars().peekable();
    loop {
        match (ai.peek().copied(), bi.peek().copied()) {
            (None, None) => return a.cmp(b),
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(ca), Some(cb)) if ca.is_ascii_digit() && cb.is_ascii_digit() => {
                let da = take_digits(&mut ai);
                let db = take_digits(&mut bi);
                let na = da.trim_start_matches('0');
                let nb = db.trim_start_matches('0');
                let ord = na
                    .len()
                    .cmp(&nb.len())
                    .then_with(|| na.cmp(nb))
                    .then_with(|| da.len().cmp(&db.len()));
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (Some(ca), Some(cb)) => {
                let ord = ca.to_lowercase().cmp(cb.to_lowercase());
                if ord != Ordering::Equal {
                    return ord;
                }
                ai.next();
                bi.next();
            }
        }
    }
}

fn take_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut digits = String::new();
    while let Some(c) = chars.next_if(|c| c.is_ascii_digit()) {
        digits.push(c);
    }
    digits
}

/// Supported raster files directly inside `folder`, naturally sorted.
pub fn list_image_files(folder: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<PathBuf> = fs::read_dir(folder)
        .stage("list input", folder)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file() && is_supported_input(p))
        .collect();
    files.sort_by(|a, b| natural_cmp(&file_name(a), &file_name(b)));
    debug!("Found {} input images in {:?}", files.len(), folder);
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Decode one frame by content, whatever its extension says, into 8-bit RGBA.
pub fn load_frame(path: &Path) -> Result<RgbaImage> {
    let unreadable = |reason: String| Error::UnreadableImage {
        path: path.to_path_buf(),
        reason,
    };
    let image = ImageReader::open(path)
        .map_err(|e| unreadable(e.to_string()))?
        .with_guessed_format()
        .map_err(|e| unreadable(e.to_string()))?
        .decode()
        .map_err(|e| unreadable(e.to_string()))?;
    Ok(image.to_rgba8())
}

/// Decode every path in order, skipping unreadable files with a warning.
pub fn load_frames(paths: &[PathBuf]) -> Vec<RgbaImage> {
    let mut frames = Vec::with_capacity(paths.len());
    for path in paths {
        match load_frame(path) {
            Ok(frame) => frames.push(frame),
            Err(e) => warn!("Skipping {}", e),
        }
    }
    info!("Loaded {} of {} frames", frames.len(), paths.len());
    frames
}

/// Widths read from image headers without decoding pixel data.
pub fn header_widths(paths: &[PathBuf]) -> Vec<u32> {
    paths
        .iter()
        .filter_map(|p| {
            let dims = ImageReader::open(p)
                .and_then(|r| r.with_guessed_format())
                .ok()
                .and_then(|r| r.into_dimensions().ok());
            if dims.is_none() {
                warn!("Could not read dimensions of {:?}", p);
            }
            dims.map(|(w, _)| w)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, Rgba};

    #[test]
    fn natural_order_compares_numbers_by_value() {
        let mut names = vec!["page10.png", "Page2.png", "page1.png", "page02b.png", "cover.jpg"];
        names.sort_by(|a, b| natural_cmp(a, b));
        assert_eq!(
            names,
            vec!["cover.jpg", "page1.png", "Page2.png", "page02b.png", "page10.png"]
        );
    }

    #[test]
    fn lists_only_supported_files_in_natural_order() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10.png", "2.JPG", "1.webp", "notes.txt", "3.gif"] {
            fs::write(dir.path().join(name), b"x").unwrap();
        }
        fs::create_dir(dir.path().join("4.png")).unwrap();
        let files = list_image_files(dir.path()).unwrap();
        let names: Vec<_> = files.iter().map(|p| file_name(p)).collect();
        assert_eq!(names, vec!["1.webp", "2.JPG", "10.png"]);
    }

    #[test]
    fn decodes_by_content_not_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mislabeled.jpg");
        RgbaImage::from_pixel(3, 2, Rgba([1, 2, 3, 255]))
            .save_with_format(&path, ImageFormat::Png)
            .unwrap();
        let frame = load_frame(&path).unwrap();
        assert_eq!(frame.dimensions(), (3, 2));
        assert_eq!(header_widths(&[path]), vec![3]);
    }

    #[test]
    fn unreadable_files_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("1.png");
        let bad = dir.path().join("2.png");
        RgbaImage::new(4, 4).save(&good).unwrap();
        fs::write(&bad, b"garbage").unwrap();
        assert!(matches!(load_frame(&bad), Err(Error::UnreadableImage { .. })));
        assert_eq!(load_frames(&[good, bad]).len(), 1);
    }
}
