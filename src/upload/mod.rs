//! File and image uploads as `multipart/form-data`.
mod file;
mod file_upload;
mod form_data;
mod image_upload;

pub use file::{File, FileType};
pub use file_upload::{FileUpload, FileUploadResponse, UploadEntity, UploadedFile};
pub use form_data::FormData;
pub use image_upload::{ImageOptions, ImageUpload, ImageUploadResponse, InvalidSize, Size, UploadedImage};

use crate::{request::DataRequest, HttpMethod, RequestError, RequestManager};

impl RequestManager {
    /// Request uploading `upload` to `files/upload`.
    ///
    /// Uploads always embed the user's authentication token.
    pub fn upload_request(&self, upload: &FileUpload) -> DataRequest {
        let mut form_data = FormData::new();
        upload.append_to(&mut form_data);
        self.multipart_request("files/upload", form_data, upload.timeout)
    }

    /// Request uploading `upload` to `images/upload`.
    pub fn image_upload_request(&self, upload: &ImageUpload) -> DataRequest {
        let mut form_data = FormData::new();
        upload.append_to(&mut form_data);
        self.multipart_request("images/upload", form_data, upload.timeout)
    }

    /// Upload a file. Requires a stored user token.
    pub async fn upload(&self, upload: &FileUpload) -> Result<FileUploadResponse, RequestError> {
        self.upload_request(upload).response_object().await
    }

    /// Upload an image. Requires a stored user token.
    pub async fn upload_image(
        &self,
        upload: &ImageUpload,
    ) -> Result<ImageUploadResponse, RequestError> {
        self.image_upload_request(upload).response_object().await
    }

    fn multipart_request(
        &self,
        path: &str,
        form_data: FormData,
        timeout: Option<std::time::Duration>,
    ) -> DataRequest {
        let request = self
            .request(path, HttpMethod::Post, None)
            .set_form_data(form_data)
            .use_user_token();
        match timeout {
            Some(timeout) => request.set_timeout(timeout),
            None => request,
        }
    }
}
