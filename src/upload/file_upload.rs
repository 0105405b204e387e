use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use super::{File, FormData};
use crate::ObjectResponse;

/// Backend entity an upload is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadEntity {
    /// Sent as `entity_name`.
    pub name: String,
    /// Sent as `entity_id` when set.
    pub id: Option<String>,
}

impl UploadEntity {
    /// Entity `name`, optionally a specific `id`.
    pub fn new(name: impl Into<String>, id: Option<String>) -> UploadEntity {
        UploadEntity {
            name: name.into(),
            id,
        }
    }

    pub(crate) fn append_to(&self, form_data: &mut FormData) {
        form_data.append_text("entity_name", &self.name);
        if let Some(id) = &self.id {
            form_data.append_text("entity_id", id);
        }
    }
}

/// File sent to `files/upload`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUpload {
    /// Sent as the `file` part.
    pub file: File,
    /// Entity the file belongs to.
    pub entity: Option<UploadEntity>,
    /// Overrides the manager's default timeout.
    pub timeout: Option<Duration>,
}

impl FileUpload {
    /// Upload of `file`, attached to no entity.
    pub fn new(file: File) -> FileUpload {
        FileUpload {
            file,
            entity: None,
            timeout: None,
        }
    }

    /// Upload of raw bytes, see [`File::new`].
    pub fn from_data(data: Vec<u8>) -> FileUpload {
        FileUpload::new(File::new(data))
    }

    /// Attach the upload to `entity`.
    pub fn entity(mut self, entity: UploadEntity) -> FileUpload {
        self.entity = Some(entity);
        self
    }

    /// Timeout of the upload request.
    pub fn timeout(mut self, timeout: Duration) -> FileUpload {
        self.timeout = Some(timeout);
        self
    }

    pub(crate) fn append_to(&self, form_data: &mut FormData) {
        form_data.append_file("file", &self.file);
        if let Some(entity) = &self.entity {
            entity.append_to(form_data);
        }
    }
}

/// Location of an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedFile {
    /// Public URL of the file.
    pub url: Url,
}

/// Response of [`RequestManager::upload`](crate::RequestManager::upload).
pub type FileUploadResponse = ObjectResponse<UploadedFile>;
