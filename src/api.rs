use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::ApiConfig;
use crate::models::{StudentId, StudentRecord};
use crate::wire::{self, NewStudent, Normalized, StudentPayload, StudentUpdate, StudentsPayload};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("backend answered {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("could not decode backend response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("backend rejected the request: {0}")]
    Rejected(String),
    #[error("backend returned a record without an id")]
    MissingId,
    #[error("backend url '{0}' cannot take a path")]
    BadBaseUrl(String),
}

/// `{ success, message }` envelope used by the auth endpoints.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

#[derive(Serialize)]
struct EmailBody<'a> {
    email: &'a str,
}

#[derive(Serialize)]
struct CodeBody<'a> {
    email: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetBody<'a> {
    email: &'a str,
    code: &'a str,
    new_password: &'a str,
}

#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|source| ApiError::Transport {
                url: config.base_url.clone(),
                source,
            })?;
        Ok(ApiClient {
            client,
            base_url: config.base_url.clone(),
            token: config.token.clone(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// `students/{id}` with the id escaped as a single path segment.
    pub fn record_url(&self, id: &StudentId) -> Result<Url, ApiError> {
        let bad_base = || ApiError::BadBaseUrl(self.base_url.clone());
        let mut url = Url::parse(&self.base_url).map_err(|_| bad_base())?;
        url.path_segments_mut()
            .map_err(|_| bad_base())?
            .pop_if_empty()
            .push("students")
            .push(&id.0);
        Ok(url)
    }

    pub async fn fetch_students(&self) -> Result<Normalized, ApiError> {
        let payload: StudentsPayload = self.send(self.client.get(self.url("students"))).await?;
        let normalized = wire::normalize_all(payload.into_raw());
        tracing::info!(
            count = normalized.records.len(),
            rejected = normalized.rejected,
            issues = normalized.issues.len(),
            "fetched students"
        );
        Ok(normalized)
    }

    pub async fn create_student(&self, student: &NewStudent) -> Result<StudentRecord, ApiError> {
        let payload: StudentPayload = self
            .send(self.client.post(self.url("students")).json(student))
            .await?;
        single_record(payload)
    }

    pub async fn update_student(
        &self,
        id: &StudentId,
        update: &StudentUpdate,
    ) -> Result<StudentRecord, ApiError> {
        let payload: StudentPayload = self
            .send(self.client.put(self.record_url(id)?).json(update))
            .await?;
        single_record(payload)
    }

    pub async fn forgot_password(&self, email: &str) -> Result<String, ApiError> {
        self.auth("auth/forgot-password", &EmailBody { email }).await
    }

    pub async fn verify_reset_code(&self, email: &str, code: &str) -> Result<String, ApiError> {
        self.auth("auth/verify-reset-code", &CodeBody { email, code })
            .await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<String, ApiError> {
        let body = ResetBody {
            email,
            code,
            new_password,
        };
        self.auth("auth/reset-password", &body).await
    }

    async fn auth<B: Serialize>(&self, path: &str, body: &B) -> Result<String, ApiError> {
        let response: AuthResponse = self.send(self.client.post(self.url(path)).json(body)).await?;
        if response.success {
            Ok(response.message)
        } else {
            Err(ApiError::Rejected(response.message))
        }
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };
        let request = request.build().map_err(|source| ApiError::Transport {
            url: self.base_url.clone(),
            source,
        })?;
        let url = request.url().to_string();
        tracing::debug!(method = %request.method(), %url, "calling backend");

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|source| ApiError::Transport {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|source| ApiError::Transport { url, source })?;

        if !status.is_success() {
            return Err(ApiError::Status { status, body });
        }
        decode(&body)
    }
}

pub fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    Ok(serde_json::from_str(body)?)
}

fn single_record(payload: StudentPayload) -> Result<StudentRecord, ApiError> {
    let mut issues = Vec::new();
    let record = wire::normalize(payload.into_raw(), &mut issues).ok_or(ApiError::MissingId)?;
    for issue in issues {
        tracing::warn!(student = %record.id, field = issue.field, "{}", issue.message);
    }
    Ok(record)
}
