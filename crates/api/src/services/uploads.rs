//! Cloudinary image storage.
//!
//! Uploads and deletes are signed requests: the parameters are sorted,
//! joined as `k=v&k=v`, suffixed with the API secret and hashed with SHA-256.

use std::collections::BTreeMap;
use std::time::Duration;

use axum::extract::multipart::MultipartError;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::CloudinaryConfig;

const CLOUDINARY_API: &str = "https://api.cloudinary.com/v1_1";
const DELIVERY_HOST: &str = "res.cloudinary.com";

/// Most files accepted by one multi-file upload.
pub const MAX_FILES_PER_REQUEST: usize = 10;

/// Named `c_fill` renditions returned by the responsive URL endpoint.
pub const RESPONSIVE_SIZES: [(&str, u32, u32); 5] = [
    ("xs", 320, 240),
    ("sm", 640, 480),
    ("md", 1024, 768),
    ("lg", 1280, 960),
    ("xl", 1920, 1440),
];

/// Errors that can occur during uploads.
#[derive(Debug, Error)]
pub enum UploadError {
    /// Cloudinary credentials are missing.
    #[error("Image storage is not configured")]
    NotConfigured,

    /// The expected multipart field was absent.
    #[error("No file provided in field '{0}'")]
    MissingFile(&'static str),

    #[error("Too many files: {count} (maximum {max})")]
    TooManyFiles { count: usize, max: usize },

    #[error("File type not allowed: {0}")]
    UnsupportedFormat(String),

    #[error("File too large: {size} bytes (maximum {max})")]
    TooLarge { size: u64, max: u64 },

    /// The multipart body could not be read.
    #[error("Invalid multipart body: {0}")]
    Multipart(#[from] MultipartError),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// A file received from the client.
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Cloudinary's upload response, trimmed to what clients need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedImage {
    pub public_id: String,
    pub url: String,
    pub secure_url: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

/// Delivery URLs for a stored image.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ImageInfo {
    pub public_id: String,
    pub url: String,
    pub secure_url: String,
}

#[derive(Clone)]
struct Credentials {
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
}

/// Cloudinary client plus local validation rules.
#[derive(Clone)]
pub struct UploadService {
    client: reqwest::Client,
    credentials: Option<Credentials>,
    folder: String,
    allowed_formats: Vec<String>,
    max_file_size: u64,
}

impl UploadService {
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CloudinaryConfig) -> Result<Self, UploadError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        let credentials = match (&config.cloud_name, &config.api_key, &config.api_secret) {
            (Some(cloud_name), Some(api_key), Some(api_secret)) => Some(Credentials {
                cloud_name: cloud_name.clone(),
                api_key: api_key.clone(),
                api_secret: api_secret.clone(),
            }),
            _ => None,
        };

        Ok(Self {
            client,
            credentials,
            folder: config.folder.clone(),
            allowed_formats: config
                .allowed_formats
                .iter()
                .map(|f| f.trim().trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            max_file_size: config.max_file_size,
        })
    }

    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.credentials.is_some()
    }

    #[must_use]
    pub const fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    fn credentials(&self) -> Result<&Credentials, UploadError> {
        self.credentials.as_ref().ok_or(UploadError::NotConfigured)
    }

    /// Check extension and size before anything is sent upstream.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::UnsupportedFormat` or `UploadError::TooLarge`.
    pub fn validate(&self, file_name: &str, size: u64) -> Result<(), UploadError> {
        let extension = file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();

        if extension.is_empty() || !self.allowed_formats.contains(&extension) {
            return Err(UploadError::UnsupportedFormat(if extension.is_empty() {
                file_name.to_string()
            } else {
                format!(".{extension}")
            }));
        }

        if size > self.max_file_size {
            return Err(UploadError::TooLarge {
                size,
                max: self.max_file_size,
            });
        }

        Ok(())
    }

    /// Validate and upload one image into the configured folder.
    ///
    /// # Errors
    ///
    /// Returns validation errors before any network call, then provider errors.
    pub async fn upload(&self, file: IncomingFile) -> Result<UploadedImage, UploadError> {
        self.validate(&file.file_name, file.bytes.len() as u64)?;
        let credentials = self.credentials()?;

        let timestamp = Utc::now().timestamp().to_string();
        let mut params = BTreeMap::new();
        params.insert("folder", self.folder.clone());
        params.insert("timestamp", timestamp.clone());
        let signature = sign_params(&params, credentials.api_secret.expose_secret());

        let form = Form::new()
            .part("file", Part::bytes(file.bytes).file_name(file.file_name.clone()))
            .text("api_key", credentials.api_key.clone())
            .text("timestamp", timestamp)
            .text("folder", self.folder.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");

        let url = format!("{CLOUDINARY_API}/{}/image/upload", credentials.cloud_name);
        let response = self.client.post(&url).multipart(form).send().await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UploadError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let image: UploadedImage = response
            .json()
            .await
            .map_err(|e| UploadError::Parse(e.to_string()))?;

        tracing::info!(public_id = %image.public_id, file_name = %file.file_name, "Image uploaded");
        Ok(image)
    }

    /// Upload several images, validating all of them first.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::TooManyFiles` above the per-request limit, any
    /// validation error, or the first provider error.
    pub async fn upload_many(
        &self,
        files: Vec<IncomingFile>,
    ) -> Result<Vec<UploadedImage>, UploadError> {
        if files.is_empty() {
            return Err(UploadError::MissingFile("files"));
        }
        if files.len() > MAX_FILES_PER_REQUEST {
            return Err(UploadError::TooManyFiles {
                count: files.len(),
                max: MAX_FILES_PER_REQUEST,
            });
        }
        for file in &files {
            self.validate(&file.file_name, file.bytes.len() as u64)?;
        }

        let mut uploaded = Vec::with_capacity(files.len());
        for file in files {
            uploaded.push(self.upload(file).await?);
        }
        Ok(uploaded)
    }

    /// Delete an image by public id.
    ///
    /// # Errors
    ///
    /// Returns provider errors.
    pub async fn delete(&self, public_id: &str) -> Result<(), UploadError> {
        let credentials = self.credentials()?;

        let timestamp = Utc::now().timestamp().to_string();
        let mut params = BTreeMap::new();
        params.insert("public_id", public_id.to_string());
        params.insert("timestamp", timestamp.clone());
        let signature = sign_params(&params, credentials.api_secret.expose_secret());

        let url = format!("{CLOUDINARY_API}/{}/image/destroy", credentials.cloud_name);
        let response = self
            .client
            .post(&url)
            .form(&[
                ("public_id", public_id),
                ("timestamp", timestamp.as_str()),
                ("api_key", credentials.api_key.as_str()),
                ("signature", signature.as_str()),
                ("signature_algorithm", "sha256"),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UploadError::Api {
                status: status.as_u16(),
                message,
            });
        }

        tracing::info!(public_id = %public_id, "Image deleted");
        Ok(())
    }

    /// Plain and HTTPS delivery URLs.
    ///
    /// # Errors
    ///
    /// Returns `UploadError::NotConfigured` without credentials.
    pub fn info(&self, public_id: &str) -> Result<ImageInfo, UploadError> {
        let cloud = &self.credentials()?.cloud_name;
        Ok(ImageInfo {
            public_id: public_id.to_string(),
            url: format!("http://{DELIVERY_HOST}/{cloud}/image/upload/{public_id}"),
            secure_url: image_url(cloud, public_id, None),
        })
    }

    /// One `c_fill` URL per entry of [`RESPONSIVE_SIZES`].
    ///
    /// # Errors
    ///
    /// Returns `UploadError::NotConfigured` without credentials.
    pub fn responsive_urls(&self, public_id: &str) -> Result<BTreeMap<String, String>, UploadError> {
        let cloud = &self.credentials()?.cloud_name;
        Ok(RESPONSIVE_SIZES
            .iter()
            .map(|(name, width, height)| {
                let transform = format!("w_{width},h_{height},c_fill");
                ((*name).to_string(), image_url(cloud, public_id, Some(&transform)))
            })
            .collect())
    }
}

/// HTTPS delivery URL, optionally with a transformation segment.
#[must_use]
pub fn image_url(cloud_name: &str, public_id: &str, transformation: Option<&str>) -> String {
    match transformation {
        Some(t) => format!("https://{DELIVERY_HOST}/{cloud_name}/image/upload/{t}/{public_id}"),
        None => format!("https://{DELIVERY_HOST}/{cloud_name}/image/upload/{public_id}"),
    }
}

/// Hex SHA-256 of the sorted `k=v&...` string followed by the secret.
#[must_use]
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let to_sign = params
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(to_sign.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn service(configured: bool) -> UploadService {
        let mut config = CloudinaryConfig::default();
        if configured {
            config.cloud_name = Some("demo".to_string());
            config.api_key = Some("1234".to_string());
            config.api_secret = Some(SecretString::from(String::from("s3cret")));
        }
        UploadService::new(&config).unwrap()
    }

    #[test]
    fn test_signature_sorts_params_and_appends_secret() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1700000000".to_string());
        params.insert("folder", "hardware-store".to_string());

        let expected = hex::encode(Sha256::digest(
            b"folder=hardware-store&timestamp=1700000000s3cret",
        ));
        assert_eq!(sign_params(&params, "s3cret"), expected);
    }

    #[test]
    fn test_signature_changes_with_secret() {
        let mut params = BTreeMap::new();
        params.insert("public_id", "hardware-store/hammer".to_string());
        assert_ne!(sign_params(&params, "a"), sign_params(&params, "b"));
    }

    #[test]
    fn test_responsive_urls() {
        let urls = service(true).responsive_urls("hardware-store/hammer").unwrap();
        assert_eq!(urls.len(), 5);
        assert_eq!(
            urls["xs"],
            "https://res.cloudinary.com/demo/image/upload/w_320,h_240,c_fill/hardware-store/hammer"
        );
        assert_eq!(
            urls["xl"],
            "https://res.cloudinary.com/demo/image/upload/w_1920,h_1440,c_fill/hardware-store/hammer"
        );
    }

    #[test]
    fn test_info_urls() {
        let info = service(true).info("abc").unwrap();
        assert_eq!(info.url, "http://res.cloudinary.com/demo/image/upload/abc");
        assert_eq!(info.secure_url, "https://res.cloudinary.com/demo/image/upload/abc");
    }

    #[test]
    fn test_extension_check() {
        let uploads = service(true);
        assert!(uploads.validate("photo.JPG", 10).is_ok());
        assert!(uploads.validate("photo.webp", 10).is_ok());
        assert!(matches!(
            uploads.validate("malware.exe", 10),
            Err(UploadError::UnsupportedFormat(ext)) if ext == ".exe"
        ));
        assert!(matches!(
            uploads.validate("no_extension", 10),
            Err(UploadError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_size_check() {
        let uploads = service(true);
        let max = uploads.max_file_size();
        assert!(uploads.validate("a.png", max).is_ok());
        assert!(matches!(
            uploads.validate("a.png", max + 1),
            Err(UploadError::TooLarge { .. })
        ));
    }

    #[tokio::test]
    async fn test_too_many_files_rejected_before_upload() {
        let files = (0..11)
            .map(|i| IncomingFile {
                file_name: format!("{i}.png"),
                bytes: vec![0; 4],
            })
            .collect();
        assert!(matches!(
            service(false).upload_many(files).await,
            Err(UploadError::TooManyFiles { count: 11, max: 10 })
        ));
    }

    #[tokio::test]
    async fn test_unconfigured_upload_validates_first() {
        let uploads = service(false);
        let bad = IncomingFile {
            file_name: "script.sh".to_string(),
            bytes: vec![1],
        };
        assert!(matches!(
            uploads.upload(bad).await,
            Err(UploadError::UnsupportedFormat(_))
        ));

        let good = IncomingFile {
            file_name: "photo.png".to_string(),
            bytes: vec![1],
        };
        assert!(matches!(uploads.upload(good).await, Err(UploadError::NotConfigured)));
    }
}
