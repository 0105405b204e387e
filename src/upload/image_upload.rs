use std::{fmt, str::FromStr, time::Duration};

use serde::{Deserialize, Serialize};
use url::Url;

use super::{File, FormData, UploadEntity};
use crate::ObjectResponse;

/// Image dimensions, written `{width}x{height}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Size {
    /// Pixels.
    pub width: u32,
    /// Pixels.
    pub height: u32,
}

impl Size {
    /// `width` x `height`.
    pub fn new(width: u32, height: u32) -> Size {
        Size { width, height }
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Text that does not parse as a [`Size`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid image size {0:?}, expected WIDTHxHEIGHT")]
pub struct InvalidSize(String);

impl FromStr for Size {
    type Err = InvalidSize;

    fn from_str(s: &str) -> Result<Size, InvalidSize> {
        let invalid = || InvalidSize(s.to_owned());
        let (width, height) = s.split_once('x').ok_or_else(invalid)?;
        Ok(Size {
            width: width.parse().map_err(|_| invalid())?,
            height: height.parse().map_err(|_| invalid())?,
        })
    }
}

/// Resized variants the backend should produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageOptions {
    /// Sent as `small_size`.
    pub small_size: Option<Size>,
    /// Sent as `medium_size`.
    pub medium_size: Option<Size>,
    /// Sent as `large_size`.
    pub large_size: Option<Size>,
}

/// Image sent to `images/upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// Sent as the `file` part.
    pub file: File,
    /// Entity the image belongs to.
    pub entity: Option<UploadEntity>,
    /// Resizing options.
    pub options: Option<ImageOptions>,
    /// Overrides the manager's default timeout.
    pub timeout: Option<Duration>,
}

impl ImageUpload {
    /// Upload of `file` with default sizes.
    pub fn new(file: File) -> ImageUpload {
        ImageUpload {
            file,
            entity: None,
            options: None,
            timeout: None,
        }
    }

    /// Upload of raw bytes, see [`File::new`].
    pub fn from_data(data: Vec<u8>) -> ImageUpload {
        ImageUpload::new(File::new(data))
    }

    /// Attach the upload to `entity`.
    pub fn entity(mut self, entity: UploadEntity) -> ImageUpload {
        self.entity = Some(entity);
        self
    }

    /// Request specific sizes.
    pub fn options(mut self, options: ImageOptions) -> ImageUpload {
        self.options = Some(options);
        self
    }

    /// Timeout of the upload request.
    pub fn timeout(mut self, timeout: Duration) -> ImageUpload {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn append_to(&self, form_data: &mut FormData) {
        form_data.append_file("file", &self.file);
        if let Some(entity) = &self.entity {
            entity.append_to(form_data);
        }
        if let Some(options) = &self.options {
            let sizes = [
                ("small_size", options.small_size),
                ("medium_size", options.medium_size),
                ("large_size", options.large_size),
            ];
            for (name, size) in sizes {
                let Some(size) = size else { continue };
                form_data.append_text(name, size);
            }
        }
    }
}

/// Locations of an uploaded image and its resized variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedImage {
    /// Image as uploaded.
    pub original: Url,
    /// Small variant.
    pub small: Url,
    /// Medium variant.
    pub medium: Url,
    /// Large variant.
    pub large: Url,
}

/// Response of [`RequestManager::upload_image`](crate::RequestManager::upload_image).
pub type ImageUploadResponse = ObjectResponse<UploadedImage>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_parses_and_prints() {
        assert_eq!("640x480".parse(), Ok(Size::new(640, 480)));
        assert_eq!(Size::new(64, 32).to_string(), "64x32");
        assert!("640".parse::<Size>().is_err());
        assert!("ax480".parse::<Size>().is_err());
        assert!("1x2x3".parse::<Size>().is_err());
    }

    #[test]
    fn only_set_sizes_are_sent() {
        let upload = ImageUpload::from_data(b"GIF89a".to_vec()).options(ImageOptions {
            medium_size: Some(Size::new(300, 200)),
            ..ImageOptions::default()
        });
        let mut form = FormData::with_boundary("B");
        upload.append_to(&mut form);

        let data = String::from_utf8(form.data()).unwrap();
        assert!(data.contains("filename=\"file.gif\"\r\nContent-Type: image/gif"));
        assert!(data.contains("name=\"medium_size\"\r\n\r\n300x200"));
        assert!(!data.contains("small_size"));
        assert!(!data.contains("large_size"));
    }
}
