use crate::storage::Credentials;
use envconfig::Envconfig;
use std::time::Duration;

#[derive(Envconfig)]
pub struct Config {
    #[envconfig(from = "PORT", default = "8080")]
    pub port: u16,

    #[envconfig(from = "STORAGE_USERNAME", default = "")]
    pub storage_username: String,

    #[envconfig(from = "STORAGE_PASSWORD", default = "")]
    pub storage_password: String,

    #[envconfig(from = "STORAGE_TARGET_FOLDER_ID", default = "")]
    pub target_folder_id: String,

    #[envconfig(from = "STORAGE_API_URL", default = "http://127.0.0.1:9000")]
    pub storage_api_url: String,

    #[envconfig(from = "STORAGE_DISPLAY_NAME", default = "Proton Drive")]
    pub storage_display_name: String,

    #[envconfig(from = "UPLOAD_TIMEOUT_SECS", default = "120")]
    pub upload_timeout_secs: u64,
}

impl Config {
    pub fn upload_config(&self) -> UploadConfig {
        let credentials = if self.storage_username.is_empty() || self.storage_password.is_empty()
        {
            let missing = [
                ("STORAGE_USERNAME", &self.storage_username),
                ("STORAGE_PASSWORD", &self.storage_password),
            ]
            .into_iter()
            .filter(|(_, value)| value.is_empty())
            .map(|(name, _)| name)
            .collect::<Vec<_>>()
            .join(", ");

            CredentialsConfig::Missing(missing)
        } else {
            CredentialsConfig::Provided(Credentials {
                username: self.storage_username.clone(),
                password: self.storage_password.clone(),
            })
        };

        UploadConfig {
            credentials,
            target_folder_id: Some(self.target_folder_id.clone()).filter(|id| !id.is_empty()),
            timeout: Duration::from_secs(self.upload_timeout_secs),
        }
    }
}

#[derive(Debug, Clone)]
pub enum CredentialsConfig {
    Provided(Credentials),
    /// Comma separated names of the unset variables.
    Missing(String),
}

/// Settings the upload handler reads on every request.
#[derive(Debug, Clone)]
pub struct UploadConfig {
    pub credentials: CredentialsConfig,
    pub target_folder_id: Option<String>,
    pub timeout: Duration,
}
