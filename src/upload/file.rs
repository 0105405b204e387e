use std::path::Path;

/// MIME type and extension of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileType {
    /// e.g. `image/png`.
    pub mime_type: &'static str,
    /// Extension without the dot.
    pub extension: &'static str,
}

impl FileType {
    /// Unrecognized content.
    pub const DEFAULT: FileType = FileType::new("application/octet-stream", "bin");
    /// JPEG image.
    pub const JPEG: FileType = FileType::new("image/jpeg", "jpg");
    /// PNG image.
    pub const PNG: FileType = FileType::new("image/png", "png");
    /// GIF image.
    pub const GIF: FileType = FileType::new("image/gif", "gif");
    /// TIFF image.
    pub const TIFF: FileType = FileType::new("image/tiff", "tiff");
    /// PDF document.
    pub const PDF: FileType = FileType::new("application/pdf", "pdf");
    /// MP3 audio.
    pub const MP3: FileType = FileType::new("audio/mpeg3", "mp3");

    const fn new(mime_type: &'static str, extension: &'static str) -> FileType {
        FileType {
            mime_type,
            extension,
        }
    }

    /// Detect the type from the leading bytes. Unknown content is [`FileType::DEFAULT`].
    pub fn sniff(data: &[u8]) -> FileType {
        // https://en.wikipedia.org/wiki/List_of_file_signatures
        const SIGNATURES: &[(&[u8], FileType)] = &[
            (&[0xFF, 0xD8, 0xFF], FileType::JPEG),
            (&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A], FileType::PNG),
            (&[0x47, 0x49, 0x46, 0x38, 0x37, 0x61], FileType::GIF),
            (&[0x47, 0x49, 0x46, 0x38, 0x39, 0x61], FileType::GIF),
            (&[0x49, 0x20, 0x49], FileType::TIFF),
            (&[0x49, 0x49, 0x2A, 0x00], FileType::TIFF),
            (&[0x4D, 0x4D, 0x00, 0x2A], FileType::TIFF),
            (&[0x25, 0x50, 0x44, 0x46, 0x2D], FileType::PDF),
            (&[0x49, 0x44, 0x33], FileType::MP3),
        ];

        SIGNATURES
            .iter()
            .find(|(signature, _)| data.starts_with(signature))
            .map(|(_, file_type)| *file_type)
            .unwrap_or(FileType::DEFAULT)
    }
}

/// File content with the metadata sent alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
    /// Raw content.
    pub data: Vec<u8>,
    /// Sent as the part's `Content-Type`.
    pub mime_type: String,
    /// Sent as the part's `filename`.
    pub file_name: String,
}

impl File {
    /// File with MIME type and name (`file.{ext}`) derived from its content.
    pub fn new(data: Vec<u8>) -> File {
        let file_type = FileType::sniff(&data);
        File {
            data,
            mime_type: file_type.mime_type.to_owned(),
            file_name: format!("file.{}", file_type.extension),
        }
    }

    /// Read a file from disk, keeping its name.
    pub fn open(path: impl AsRef<Path>) -> std::io::Result<File> {
        let path = path.as_ref();
        let mut file = File::new(std::fs::read(path)?);
        if let Some(file_name) = path.file_name().and_then(|name| name.to_str()) {
            file.file_name = file_name.to_owned();
        }
        Ok(file)
    }

    /// Override the sniffed MIME type.
    pub fn with_mime_type(mut self, mime_type: impl Into<String>) -> File {
        self.mime_type = mime_type.into();
        self
    }

    /// Override the file name.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> File {
        self.file_name = file_name.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sniffs_known_signatures() {
        assert_eq!(FileType::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), FileType::JPEG);
        assert_eq!(FileType::sniff(b"\x89PNG\r\n\x1a\n...."), FileType::PNG);
        assert_eq!(FileType::sniff(b"GIF89a"), FileType::GIF);
        assert_eq!(FileType::sniff(b"MM\x00\x2a"), FileType::TIFF);
        assert_eq!(FileType::sniff(b"%PDF-1.7"), FileType::PDF);
        assert_eq!(FileType::sniff(b"ID3\x03"), FileType::MP3);
    }

    #[test]
    fn unknown_content_is_octet_stream() {
        assert_eq!(FileType::sniff(b""), FileType::DEFAULT);
        assert_eq!(FileType::sniff(&[0xFF, 0xD8]), FileType::DEFAULT);

        let file = File::new(b"hello".to_vec());
        assert_eq!(file.mime_type, "application/octet-stream");
        assert_eq!(file.file_name, "file.bin");
    }

    #[test]
    fn explicit_metadata_wins() {
        let file = File::new(b"%PDF-1.4".to_vec()).with_file_name("report.pdf");
        assert_eq!(file.mime_type, "application/pdf");
        assert_eq!(file.file_name, "report.pdf");
    }
}
