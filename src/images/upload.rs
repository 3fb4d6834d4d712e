//! Validation of uploaded image files.
//!
//! Every file in an upload request is checked here before anything is sent
//! to the media store: the name's extension (when it has one) and the
//! sniffed content must both be JPEG or PNG.

use bytes::Bytes;
use gallery_common::{Error, ImageFormat, Result};

/// Maximum number of files accepted in one upload request.
pub const MAX_FILES_PER_UPLOAD: usize = 10;

/// A validated image ready to be sent to the media store.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied file name, or a generated one if none was sent.
    pub file_name: String,
    /// Format detected from the file content.
    pub format: ImageFormat,
    /// Raw file bytes.
    pub data: Bytes,
}

impl ImageUpload {
    /// Validate one multipart file part.
    pub fn from_part(file_name: Option<&str>, data: Bytes) -> Result<Self> {
        let display_name = file_name.unwrap_or("<unnamed>");

        if data.is_empty() {
            return Err(Error::Validation(format!("File {display_name} is empty")));
        }

        if let Some(ext) = file_name.and_then(extension) {
            if ImageFormat::from_extension(ext).is_none() {
                return Err(Error::Validation(format!(
                    "File {display_name} has unsupported format '{ext}'; allowed: jpg, jpeg, png"
                )));
            }
        }

        let format = sniff_format(&data).ok_or_else(|| {
            Error::Validation(format!(
                "File {display_name} is not a JPEG or PNG image"
            ))
        })?;

        let file_name = match file_name {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => format!("upload.{}", format.extension()),
        };

        Ok(Self {
            file_name,
            format,
            data,
        })
    }
}

/// Extension of a file name, if it has a non-empty one.
fn extension(file_name: &str) -> Option<&str> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext)
}

/// Detect JPEG or PNG from magic bytes.
fn sniff_format(data: &[u8]) -> Option<ImageFormat> {
    match image::guess_format(data).ok()? {
        image::ImageFormat::Jpeg => Some(ImageFormat::Jpeg),
        image::ImageFormat::Png => Some(ImageFormat::Png),
        _ => None,
    }
}
