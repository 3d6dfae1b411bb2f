use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;
use uuid::Uuid;

use crate::config::Config;
use crate::dto::attempt_dto::{SubmitQuizAttemptRequest, SubmitQuizAttemptResponse};
use crate::error::{Error, Result};
use crate::models::quiz::Quiz;
use crate::models::quiz_attempt::QuizAttempt;

/// The slice of the quiz backend an attempt depends on.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuizApi: Send + Sync {
    async fn get_quiz_for_taking(&self, quiz_id: Uuid) -> Result<Quiz>;

    async fn submit_quiz_attempt(
        &self,
        quiz_id: Uuid,
        payload: &SubmitQuizAttemptRequest,
    ) -> Result<SubmitQuizAttemptResponse>;

    async fn get_attempt_details(&self, attempt_id: Uuid) -> Result<QuizAttempt>;
}

#[derive(Clone)]
pub struct HttpQuizApi {
    client: Client,
    base_url: Url,
    token: Option<String>,
}

impl HttpQuizApi {
    pub fn new(base_url: &str, token: Option<String>, client: Client) -> Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self {
            client,
            base_url,
            token,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Self::new(&config.api_base_url, config.api_token.clone(), client)
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn read_json<T: DeserializeOwned>(resp: Response, what: &str) -> Result<T> {
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("{} not found", what)));
        }
        let txt = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(Error::Api {
                status: status.as_u16(),
                message: error_message(&txt),
            });
        }
        Ok(serde_json::from_str(&txt)?)
    }
}

/// Pulls `message` or `error` out of a JSON error body, else the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("error"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[async_trait]
impl QuizApi for HttpQuizApi {
    async fn get_quiz_for_taking(&self, quiz_id: Uuid) -> Result<Quiz> {
        let url = self.endpoint(&format!("api/quiz/{}/take", quiz_id))?;
        tracing::debug!(%url, "fetching quiz for taking");
        let resp = self
            .authorize(self.client.get(url))
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::read_json(resp, "Quiz").await
    }

    async fn submit_quiz_attempt(
        &self,
        quiz_id: Uuid,
        payload: &SubmitQuizAttemptRequest,
    ) -> Result<SubmitQuizAttemptResponse> {
        let url = self.endpoint(&format!("api/quiz/{}/attempts", quiz_id))?;
        let resp = self
            .authorize(self.client.post(url))
            .header("Accept", "application/json")
            .json(payload)
            .send()
            .await?;

        Self::read_json(resp, "Quiz").await
    }

    async fn get_attempt_details(&self, attempt_id: Uuid) -> Result<QuizAttempt> {
        let url = self.endpoint(&format!("api/quiz/attempts/{}", attempt_id))?;
        let resp = self
            .authorize(self.client.get(url))
            .header("Accept", "application/json")
            .send()
            .await?;

        Self::read_json(resp, "Attempt").await
    }
}
