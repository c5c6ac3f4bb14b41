//! Build an image pool by scanning a photo library directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Component, Path};

use image::GenericImageView;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::accent;
use crate::error::{Error, Result};
use crate::pool::{AccentColors, Image, ImagePool};

const DEFAULT_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Options controlling directory scanning.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional maximum recursion depth. `None` or `Some(0)` means unlimited.
    pub max_depth: Option<usize>,
    /// Optional override for allowed extensions (case-insensitive, leading dot optional).
    pub extensions: Option<Vec<String>>,
    /// File names (`name.ext`) kept in the pool without palette extraction.
    pub exclude: Vec<String>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            recursive: true,
            max_depth: None,
            extensions: None,
            exclude: Vec::new(),
        }
    }
}

/// Return `true` if `path` has an allowed image extension.
#[must_use]
pub fn is_supported_image(path: &Path, extensions: Option<&[String]>) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .is_some_and(|ext| match extensions {
            Some(allowed) => allowed
                .iter()
                .any(|e| e.trim_start_matches('.').eq_ignore_ascii_case(ext)),
            None => DEFAULT_EXTENSIONS
                .iter()
                .any(|e| e.eq_ignore_ascii_case(ext)),
        })
}

fn is_excluded(path: &Path, exclude: &[String]) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|name| exclude.iter().any(|e| e == name))
}

/// Scan `root` and describe every decodable image. Undecodable files are skipped.
///
/// # Errors
/// [`Error::BadDir`] if `root` is not a directory, [`Error::EmptyPool`] if
/// nothing usable was found.
pub fn scan_library(root: &Path, opts: &ScanOptions) -> Result<ImagePool> {
    if !root.is_dir() {
        return Err(Error::BadDir(root.to_string_lossy().into_owned()));
    }

    let mut wd = WalkDir::new(root).follow_links(true).sort_by_file_name();
    if !opts.recursive {
        wd = wd.max_depth(1);
    } else if let Some(d) = opts.max_depth
        && d > 0
    {
        wd = wd.max_depth(d);
    }

    let mut images = Vec::new();
    for entry in wd
        .into_iter()
        .filter_entry(|e| !should_skip_dir(e))
        .flatten()
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_supported_image(path, opts.extensions.as_deref())
        {
            continue;
        }
        let extract = !is_excluded(path, &opts.exclude);
        if !extract {
            debug!(path = %path.display(), "excluded from accent extraction");
        }
        match describe_image(root, path, extract) {
            Ok(image) => {
                debug!(src = %image.src, aspect = image.aspect_ratio, "scanned image");
                images.push(image);
            }
            Err(err) => warn!(path = %path.display(), "skipping image: {err}"),
        }
    }
    info!(root = %root.display(), found = images.len(), "library scan complete");
    ImagePool::new(images)
}

/// Describe one image: relative `src`, display aspect ratio and accent palette.
///
/// With `extract` unset the palette is neutral and only the header is read.
pub fn describe_image(root: &Path, path: &Path, extract: bool) -> Result<Image> {
    let src = relative_src(root, path);
    let header_dims = || {
        image::image_dimensions(path).map_err(|source| Error::Decode {
            path: path.to_path_buf(),
            source,
        })
    };
    let (colors, (width, height)) = match extract.then(|| accent::color_override(path)) {
        None => (accent::neutral(), header_dims()?),
        Some(Some(color)) => (AccentColors::uniform(color), header_dims()?),
        Some(None) => {
            let decoded = image::ImageReader::open(path)?
                .with_guessed_format()?
                .decode()
                .map_err(|source| Error::Decode {
                    path: path.to_path_buf(),
                    source,
                })?;
            (accent::accent_colors_for(path, &decoded), decoded.dimensions())
        }
    };
    if width == 0 || height == 0 {
        return Err(Error::InvalidImage {
            src,
            reason: "image has zero width or height".into(),
        });
    }

    let orientation = read_exif_orientation(path).unwrap_or(1);
    let (width, height) = if matches!(orientation, 5..=8) {
        (height, width)
    } else {
        (width, height)
    };
    Ok(Image {
        src,
        aspect_ratio: f64::from(width) / f64::from(height),
        colors,
    })
}

/// `/`-separated path of `path` below `root`.
fn relative_src(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn read_exif_orientation(path: &Path) -> Option<u16> {
    let file = File::open(path).ok()?;
    let mut buf = BufReader::new(file);
    let exif = exif::Reader::new().read_from_container(&mut buf).ok()?;
    let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
    field.value.get_uint(0).map(|v| v as u16)
}

fn should_skip_dir(entry: &DirEntry) -> bool {
    // Never skip the root; tempfile roots can be dot-dirs.
    if entry.depth() == 0 {
        return false;
    }
    if !entry.file_type().is_dir() {
        return false;
    }
    entry
        .file_name()
        .to_str()
        .is_some_and(|n| n.starts_with('.'))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn supported_extensions_are_case_insensitive() {
        assert!(is_supported_image(Path::new("a/B.JPG"), None));
        assert!(is_supported_image(Path::new("c.webp"), None));
        assert!(!is_supported_image(Path::new("notes.txt"), None));
        assert!(!is_supported_image(Path::new("raw.tiff"), None));
    }

    #[test]
    fn extension_override_replaces_defaults() {
        let allowed = vec![".PNG".to_string(), "tiff".to_string()];
        assert!(is_supported_image(Path::new("a.png"), Some(&allowed)));
        assert!(is_supported_image(Path::new("raw.TIFF"), Some(&allowed)));
        assert!(!is_supported_image(Path::new("b.jpg"), Some(&allowed)));
    }

    #[test]
    fn exclusion_matches_file_name_only() {
        let exclude = vec!["logo.png".to_string()];
        assert!(is_excluded(Path::new("/photos/brand/logo.png"), &exclude));
        assert!(!is_excluded(Path::new("/photos/logo.jpg"), &exclude));
    }

    #[test]
    fn src_is_slash_separated_and_relative() {
        let root = PathBuf::from("/photos");
        let path = root.join("2021").join("dunes.jpg");
        assert_eq!(relative_src(&root, &path), "2021/dunes.jpg");
    }
}
