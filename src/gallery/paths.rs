//! Storage path prediction for uploaded photos.
//!
//! Originals live at `image/<file name>`. The external resize pipeline is
//! expected to write a WebP rendition at `image/webp/<stem>_2048x2048.webp`,
//! but nothing guarantees it ever does, so the predicted path is advisory.

use serde::Serialize;

use super::GalleryError;

pub const UPLOAD_PREFIX: &str = "image/";
pub const DERIVED_PREFIX: &str = "image/webp/";
pub const DERIVED_SUFFIX: &str = "_2048x2048.webp";
/// Bounding square of the standard rendition, matching `DERIVED_SUFFIX`.
pub const STANDARD_DIMENSION: u32 = 2048;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PredictedPaths {
    pub original_path: String,
    pub standard_path: String,
}

pub fn predict(file_name: &str) -> PredictedPaths {
    PredictedPaths {
        original_path: format!("{}{}", UPLOAD_PREFIX, file_name),
        standard_path: format!(
            "{}{}{}",
            DERIVED_PREFIX,
            strip_extension(file_name),
            DERIVED_SUFFIX
        ),
    }
}

/// Predicts from a stored original such as `image/beach.jpg`, keyed on its
/// final path segment.
pub fn predict_from_original(original_path: &str) -> PredictedPaths {
    let name = original_path
        .rsplit('/')
        .next()
        .unwrap_or(original_path);
    predict(name)
}

/// Removes the last `.`-delimited extension; names without a `.` come back unchanged.
pub fn strip_extension(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(index) => &file_name[..index],
        None => file_name,
    }
}

/// Human-friendly title derived from a file name: `my_summer-trip.jpg` -> `my summer trip`.
pub fn clean_title(file_name: &str) -> String {
    let title = strip_extension(file_name)
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");

    if title.is_empty() {
        file_name.to_string()
    } else {
        title
    }
}

pub fn validate_file_name(file_name: &str) -> Result<(), GalleryError> {
    if file_name.trim().is_empty()
        || file_name == "."
        || file_name == ".."
        || file_name.contains(['/', '\\'])
    {
        return Err(GalleryError::InvalidInput(format!(
            "invalid file name: {:?}",
            file_name
        )));
    }
    Ok(())
}
