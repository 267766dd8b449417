use crate::{
    ChatBackend, ClientError, ClientResult, Identity, MagicianCard, Presence, Project,
    ReactionMap, RoomMessage,
};
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::{Client, RequestBuilder, Url, header};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

const KNOWN_LOGIN_PAGE: usize = 200;

#[derive(Debug, Clone)]
pub struct HttpBackendConfig {
    pub base_url: String,
    pub token: Option<String>,
    pub timeout: Duration,
}

/// `ChatBackend` over HTTP/JSON.
pub struct HttpBackend {
    base: Url,
    has_token: bool,
    client: Client,
}

impl HttpBackend {
    pub fn new(config: HttpBackendConfig) -> ClientResult<Self> {
        let base = Url::parse(config.base_url.trim_end_matches('/'))
            .map_err(|error| ClientError::Transport(format!("invalid base url: {error}")))?;
        if base.cannot_be_a_base() {
            return Err(ClientError::Transport(format!(
                "invalid base url: {}",
                config.base_url
            )));
        }

        let mut headers = header::HeaderMap::new();
        let token = config.token.filter(|t| !t.trim().is_empty());
        if let Some(token) = &token {
            let value = header::HeaderValue::from_str(&format!("Bearer {}", token.trim()))
                .map_err(|error| ClientError::Transport(format!("invalid token: {error}")))?;
            headers.insert(header::AUTHORIZATION, value);
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|error| {
                ClientError::Transport(format!("failed to build HTTP client: {error}"))
            })?;

        Ok(Self {
            base,
            has_token: token.is_some(),
            client,
        })
    }

    /// Join path segments onto the base url, escaping each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        url
    }

    async fn request_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = request
            .send()
            .await
            .map_err(|error| ClientError::Transport(error.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|error| ClientError::Transport(error.to_string()))?;

        if !status.is_success() {
            debug!(target: "client.http", status = status.as_u16(), "request rejected");
            return Err(ClientError::from_status(status.as_u16(), &body));
        }

        serde_json::from_str(&body).map_err(|error| ClientError::Decode(error.to_string()))
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn fetch_messages(
        &self,
        room: &str,
        before: Option<DateTime<Utc>>,
        limit: usize,
    ) -> ClientResult<Vec<RoomMessage>> {
        let mut query = vec![("limit", limit.max(1).to_string())];
        if let Some(before) = before {
            query.push(("before", before.to_rfc3339_opts(SecondsFormat::Nanos, true)));
        }
        let request = self
            .client
            .get(self.endpoint(&["api", "rooms", room, "messages"]))
            .query(&query);
        self.request_json(request).await
    }

    async fn fetch_presence(&self, room: &str) -> ClientResult<Presence> {
        let request = self
            .client
            .get(self.endpoint(&["api", "rooms", room, "presence"]));
        self.request_json(request).await
    }

    async fn send_message(&self, room: &str, body: &str) -> ClientResult<RoomMessage> {
        let request = self
            .client
            .post(self.endpoint(&["api", "rooms", room, "messages"]))
            .json(&serde_json::json!({ "body": body }));
        self.request_json(request).await
    }

    async fn fetch_reaction_counts(&self, room: &str, ids: &[String]) -> ClientResult<ReactionMap> {
        if ids.is_empty() {
            return Ok(ReactionMap::new());
        }
        let request = self
            .client
            .get(self.endpoint(&["api", "rooms", room, "messages", "reactions"]))
            .query(&[("ids", ids.join(","))]);
        // The server answers `null` when no message has reactions.
        let map: Option<ReactionMap> = self.request_json(request).await?;
        Ok(map.unwrap_or_default())
    }

    async fn list_known_logins(&self) -> ClientResult<Vec<String>> {
        let request = self
            .client
            .get(self.endpoint(&["api", "magicians"]))
            .query(&[("limit", KNOWN_LOGIN_PAGE.to_string()), ("offset", "0".into())]);
        let cards: Vec<MagicianCard> = self.request_json(request).await?;
        Ok(cards.into_iter().map(|c| c.github_login).collect())
    }

    async fn list_projects(&self) -> ClientResult<Vec<Project>> {
        let request = self.client.get(self.endpoint(&["api", "workshop"]));
        let projects: Option<Vec<Project>> = self.request_json(request).await?;
        Ok(projects.unwrap_or_default())
    }

    async fn fetch_identity(&self) -> ClientResult<Option<Identity>> {
        if !self.has_token {
            return Ok(None);
        }
        let request = self.client.get(self.endpoint(&["api", "me"]));
        match self.request_json::<Identity>(request).await {
            Ok(me) => Ok(Some(me)),
            Err(ClientError::Unauthorized) => Ok(None),
            Err(other) => Err(other),
        }
    }
}
