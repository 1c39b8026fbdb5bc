// service/media_service.rs
use async_trait::async_trait;
use base64::Engine;
use serde::Deserialize;
use std::sync::Arc;

use crate::{db::db::DBClient, service::error::ServiceError};

/// The file/voice collaborator. It accepts base64 media and returns a
/// durable opaque reference; transcriptions arrive later through the
/// `/media/transcriptions` callback. The core never processes media
/// itself.
#[async_trait]
pub trait FileStore: Send + Sync + std::fmt::Debug {
    async fn store_voice(&self, audio_b64: &str) -> Result<String, ServiceError>;
    async fn store_photo(&self, image_b64: &str) -> Result<String, ServiceError>;
}

#[derive(Debug, Clone)]
pub struct HttpFileStore {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
struct StoreResponse {
    reference: String,
}

impl HttpFileStore {
    pub fn new(base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    async fn store(&self, kind: &str, payload_b64: &str) -> Result<String, ServiceError> {
        // Reject garbage before shipping it to the collaborator.
        base64::engine::general_purpose::STANDARD
            .decode(payload_b64)
            .map_err(|e| ServiceError::Validation(format!("Invalid base64 payload: {}", e)))?;

        let response = self
            .client
            .post(format!("{}/files", self.base_url))
            .json(&serde_json::json!({ "kind": kind, "data": payload_b64 }))
            .send()
            .await
            .map_err(|e| ServiceError::Media(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ServiceError::Media(format!(
                "File service returned {}",
                response.status()
            )));
        }

        let body: StoreResponse = response
            .json()
            .await
            .map_err(|e| ServiceError::Media(e.to_string()))?;

        Ok(body.reference)
    }
}

#[async_trait]
impl FileStore for HttpFileStore {
    async fn store_voice(&self, audio_b64: &str) -> Result<String, ServiceError> {
        self.store("voice", audio_b64).await
    }

    async fn store_photo(&self, image_b64: &str) -> Result<String, ServiceError> {
        self.store("photo", image_b64).await
    }
}

/// Receives the asynchronous transcription callback and attaches the
/// text to the stored reference.
#[derive(Debug, Clone)]
pub struct MediaService {
    db_client: Arc<DBClient>,
}

impl MediaService {
    pub fn new(db_client: Arc<DBClient>) -> Self {
        Self { db_client }
    }

    pub async fn attach_transcription(
        &self,
        media_ref: &str,
        primary: Option<String>,
        secondary: Option<String>,
    ) -> Result<(), ServiceError> {
        sqlx::query(
            r#"
            INSERT INTO media_transcriptions
            (media_ref, transcription_primary, transcription_secondary)
            VALUES ($1, $2, $3)
            ON CONFLICT (media_ref) DO UPDATE
            SET transcription_primary = EXCLUDED.transcription_primary,
                transcription_secondary = EXCLUDED.transcription_secondary,
                received_at = NOW()
            "#,
        )
        .bind(media_ref)
        .bind(primary)
        .bind(secondary)
        .execute(&self.db_client.pool)
        .await?;

        Ok(())
    }
}
