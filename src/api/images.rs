use tracing::info;
use uuid::Uuid;

use super::client::decode;
use super::{ApiClient, ApiError};
use crate::builder::{PendingFile, UploadedFile, Uploader};

pub const MCQ_IMAGES: &str = "/mcq-images";
pub const REARRANGE_IMAGES: &str = "/rearrange-images";

impl ApiClient {
    /// Posts one image as `multipart/form-data` under the `file` field.
    pub fn upload_image(&self, endpoint: &str, file: &PendingFile) -> Result<UploadedFile, ApiError> {
        let boundary = format!("qbank-{}", Uuid::new_v4().simple());
        let body = multipart_body(&boundary, file);
        let uploaded: UploadedFile = decode(self.send_raw(
            endpoint,
            &format!("multipart/form-data; boundary={}", boundary),
            &body,
        )?)?;
        info!(file = %file.file_name, url = %uploaded.url, "image uploaded");
        Ok(uploaded)
    }
}

fn multipart_body(boundary: &str, file: &PendingFile) -> Vec<u8> {
    let name = file.file_name.replace(['"', '\r', '\n'], "_");
    let mut body = Vec::with_capacity(file.bytes.len() + 256);
    body.extend_from_slice(format!("--{}\r\n", boundary).as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"file\"; filename=\"{}\"\r\n",
            name
        )
        .as_bytes(),
    );
    body.extend_from_slice(format!("Content-Type: {}\r\n\r\n", file.content_type).as_bytes());
    body.extend_from_slice(&file.bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());
    body
}

/// Uploads form images to one of the image endpoints.
#[derive(Debug, Clone)]
pub struct ImageUploader {
    client: ApiClient,
    endpoint: &'static str,
}

impl ImageUploader {
    pub fn for_mcq(client: ApiClient) -> Self {
        Self {
            client,
            endpoint: MCQ_IMAGES,
        }
    }

    pub fn for_rearrange(client: ApiClient) -> Self {
        Self {
            client,
            endpoint: REARRANGE_IMAGES,
        }
    }

    pub fn endpoint(&self) -> &str {
        self.endpoint
    }
}

impl Uploader for ImageUploader {
    fn upload(&self, file: &PendingFile) -> Result<UploadedFile, ApiError> {
        self.client.upload_image(self.endpoint, file)
    }
}
