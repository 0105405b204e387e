use std::path::Path;

use super::File;

/// Builder of a `multipart/form-data` body.
///
/// Each part is preceded by `\r\n--{boundary}\r\n`. The closing `\r\n--{boundary}--\r\n` is
/// added by [`data`](FormData::data), and only when at least one part was appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormData {
    data: Vec<u8>,
    boundary: String,
}

impl Default for FormData {
    fn default() -> FormData {
        FormData::new()
    }
}

impl FormData {
    /// Form data with a random UUID boundary.
    pub fn new() -> FormData {
        FormData::with_boundary(uuid::Uuid::new_v4().to_string().to_uppercase())
    }

    /// Form data with a fixed boundary.
    pub fn with_boundary(boundary: impl Into<String>) -> FormData {
        FormData {
            data: Vec::new(),
            boundary: boundary.into(),
        }
    }

    /// Boundary between parts, without the leading dashes.
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Whether no part was appended.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The encoded body, closing boundary included.
    pub fn data(&self) -> Vec<u8> {
        self.clone().into_data()
    }

    /// Like [`data`](FormData::data), without the copy.
    pub fn into_data(mut self) -> Vec<u8> {
        if !self.data.is_empty() {
            self.push_boundary(true);
        }
        self.data
    }

    /// Append a file part.
    pub fn append_file_data(&mut self, name: &str, data: &[u8], file_name: &str, mime_type: &str) {
        self.push_boundary(false);
        self.data.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                sanitize_param(name),
                sanitize_file_name(file_name)
            )
            .as_bytes(),
        );
        self.data
            .extend_from_slice(format!("Content-Type: {mime_type}\r\n\r\n").as_bytes());
        self.data.extend_from_slice(data);
    }

    /// Append `file` under `name`.
    pub fn append_file(&mut self, name: &str, file: &File) {
        self.append_file_data(name, &file.data, &file.file_name, &file.mime_type);
    }

    /// Read the file at `path` and append it, with its MIME type sniffed from its content.
    pub fn append_file_at(&mut self, name: &str, path: impl AsRef<Path>) -> std::io::Result<()> {
        let file = File::open(path)?;
        self.append_file(name, &file);
        Ok(())
    }

    /// Append a plain field.
    pub fn append_data(&mut self, name: &str, data: &[u8]) {
        self.push_boundary(false);
        self.data.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                sanitize_param(name)
            )
            .as_bytes(),
        );
        self.data.extend_from_slice(data);
    }

    /// Append a plain field from its text form.
    pub fn append_text(&mut self, name: &str, value: impl ToString) {
        self.append_data(name, value.to_string().as_bytes());
    }

    /// Append each value as a `name[]` field.
    pub fn append_texts<T: ToString>(&mut self, name: &str, values: impl IntoIterator<Item = T>) {
        let name = format!("{name}[]");
        for value in values {
            self.append_text(&name, value);
        }
    }

    /// Append each value as a `name[]` field.
    pub fn append_data_array<'a>(&mut self, name: &str, values: impl IntoIterator<Item = &'a [u8]>) {
        let name = format!("{name}[]");
        for value in values {
            self.append_data(&name, value);
        }
    }

    fn push_boundary(&mut self, closing: bool) {
        let suffix = if closing { "--" } else { "" };
        self.data
            .extend_from_slice(format!("\r\n--{}{suffix}\r\n", self.boundary).as_bytes());
    }
}

fn sanitize_param(name: &str) -> String {
    name.chars().filter(|c| !matches!(c, '"' | '\r' | '\n')).collect()
}

fn sanitize_file_name(file_name: &str) -> String {
    file_name
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | ':' | '?' | '%' | '*' | '|' | '"' | '<' | '>'))
        .collect()
}
