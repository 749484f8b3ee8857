//! REST API client for the HRMS import endpoints.
//!
//! [`ImportApi`] is the seam the pipeline controller talks through;
//! [`HrmsApi`] implements it over HTTP with [`reqwest`].

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use hrms_core::import_pipeline::{
    AnalyzeResult, ConfirmResult, EntityType, ImportProgress, ImportSessionDetail, PreviewResult,
};
use hrms_core::types::{AttachmentId, ColumnMapping, SessionId};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// The backend operations the import wizard depends on.
#[async_trait]
pub trait ImportApi: Send + Sync {
    /// `POST /imports/analyze`: inspect an uploaded file and propose a
    /// column mapping.
    async fn analyze(
        &self,
        attachment_id: AttachmentId,
        entity_type: Option<&str>,
    ) -> ClientResult<AnalyzeResult>;

    /// `POST /imports/{id}/preview`: validate rows under a mapping.
    async fn generate_preview(
        &self,
        session_id: SessionId,
        column_mapping: Option<&ColumnMapping>,
        import_params: Option<&Value>,
    ) -> ClientResult<PreviewResult>;

    /// `POST /imports/{id}/confirm`: start the import.
    async fn confirm_import(&self, session_id: SessionId) -> ClientResult<ConfirmResult>;

    /// `GET /imports/{id}/progress`
    async fn get_import_progress(&self, session_id: SessionId) -> ClientResult<ImportProgress>;

    /// `GET /imports/{id}`
    async fn get_import_session(&self, session_id: SessionId)
        -> ClientResult<ImportSessionDetail>;

    /// `GET /imports/entity-types`
    async fn get_entity_types(&self) -> ClientResult<Vec<EntityType>>;
}

#[derive(Debug, Serialize)]
struct AnalyzeRequest<'a> {
    attachment_id: AttachmentId,
    #[serde(skip_serializing_if = "Option::is_none")]
    entity_type: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct PreviewRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    column_mapping: Option<&'a ColumnMapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    import_params: Option<&'a Value>,
}

/// HTTP client for the HRMS REST API.
#[derive(Debug, Clone)]
pub struct HrmsApi {
    client: reqwest::Client,
    api_url: String,
    api_token: Option<String>,
}

impl HrmsApi {
    /// * `api_url` - Base URL, e.g. `http://localhost:8000/api/v1`.
    pub fn new(api_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), api_url)
    }

    /// Create an API client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, api_url: impl Into<String>) -> Self {
        Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            api_token: None,
        }
    }

    /// Build a client with the configured timeout and bearer token.
    pub fn from_config(config: &ClientConfig) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;
        let api = Self::with_client(client, config.api_url.clone());
        Ok(match &config.api_token {
            Some(token) => api.with_token(token.clone()),
            None => api,
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    // ---- private helpers ----

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let builder = self
            .client
            .request(method, format!("{}{}", self.api_url, path));
        match &self.api_token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Returns the response unchanged on a success status, otherwise a
    /// [`ClientError::Api`] carrying the status and body text.
    async fn ensure_success(response: reqwest::Response) -> ClientResult<reqwest::Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> ClientResult<T> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait]
impl ImportApi for HrmsApi {
    async fn analyze(
        &self,
        attachment_id: AttachmentId,
        entity_type: Option<&str>,
    ) -> ClientResult<AnalyzeResult> {
        let body = AnalyzeRequest {
            attachment_id,
            entity_type,
        };
        let response = self
            .request(reqwest::Method::POST, "/imports/analyze")
            .json(&body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn generate_preview(
        &self,
        session_id: SessionId,
        column_mapping: Option<&ColumnMapping>,
        import_params: Option<&Value>,
    ) -> ClientResult<PreviewResult> {
        let body = PreviewRequest {
            column_mapping,
            import_params,
        };
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/imports/{session_id}/preview"),
            )
            .json(&body)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn confirm_import(&self, session_id: SessionId) -> ClientResult<ConfirmResult> {
        let response = self
            .request(
                reqwest::Method::POST,
                &format!("/imports/{session_id}/confirm"),
            )
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn get_import_progress(&self, session_id: SessionId) -> ClientResult<ImportProgress> {
        let response = self
            .request(
                reqwest::Method::GET,
                &format!("/imports/{session_id}/progress"),
            )
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn get_import_session(
        &self,
        session_id: SessionId,
    ) -> ClientResult<ImportSessionDetail> {
        let response = self
            .request(reqwest::Method::GET, &format!("/imports/{session_id}"))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn get_entity_types(&self) -> ClientResult<Vec<EntityType>> {
        let response = self
            .request(reqwest::Method::GET, "/imports/entity-types")
            .send()
            .await?;
        Self::parse_response(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        assert_eq!(
            HrmsApi::new("http://hr.local/api/v1/").api_url(),
            "http://hr.local/api/v1"
        );
    }

    #[test]
    fn preview_body_omits_missing_parts() {
        let body = PreviewRequest {
            column_mapping: None,
            import_params: None,
        };
        assert_eq!(serde_json::to_value(&body).unwrap(), serde_json::json!({}));

        let mapping: ColumnMapping = [("Emp No".to_string(), "employee_id".to_string())]
            .into_iter()
            .collect();
        let params = serde_json::json!({ "update_existing": true });
        let body = PreviewRequest {
            column_mapping: Some(&mapping),
            import_params: Some(&params),
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({
                "column_mapping": { "Emp No": "employee_id" },
                "import_params": { "update_existing": true },
            })
        );
    }

    #[test]
    fn analyze_body_omits_missing_entity_type() {
        let body = AnalyzeRequest {
            attachment_id: 42,
            entity_type: None,
        };
        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            serde_json::json!({ "attachment_id": 42 })
        );
    }
}
