use async_trait::async_trait;
use log::{ debug, warn };
use reqwest::Client as HttpClient;
use serde_json::Value as JsonValue;
use url::Url;
use super::{ reply_text, ChatConfig, ChatRequest, ChatService, ChatServiceError };

#[derive(Debug, Clone)]
pub struct HttpChatService {
    http: HttpClient,
    endpoint: Url,
}

impl HttpChatService {
    pub fn new(base_url: &str) -> Result<Self, ChatServiceError> {
        let raw = format!("{}/chat", base_url.trim_end_matches('/'));
        let endpoint = Url::parse(&raw).map_err(|e| ChatServiceError::InvalidEndpoint(raw, e))?;
        Ok(Self { http: HttpClient::new(), endpoint })
    }

    pub fn from_config(config: &ChatConfig) -> Result<Self, ChatServiceError> {
        Self::new(&config.base_url)
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl ChatService for HttpChatService {
    async fn chat(&self, request: &ChatRequest) -> Result<String, ChatServiceError> {
        debug!("POST {} with {} message(s)", self.endpoint, request.messages.len());
        let resp = self.http.post(self.endpoint.clone()).json(request).send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!("Chat endpoint answered with HTTP {}", status);
        }
        let bytes = resp.bytes().await?;
        let body: JsonValue = serde_json::from_slice(&bytes)?;
        Ok(reply_text(body))
    }
}
