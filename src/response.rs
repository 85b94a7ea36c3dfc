use serde::{Deserialize, Serialize};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub base64_document: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    #[serde(rename = "fileID", skip_serializing_if = "Option::is_none")]
    pub file_id: Option<String>,
}

impl UploadResponse {
    pub fn uploaded(message: String, file_id: String) -> Self {
        Self {
            success: true,
            message,
            file_id: Some(file_id),
        }
    }

    pub fn failure(message: String) -> Self {
        Self {
            success: false,
            message,
            file_id: None,
        }
    }
}
