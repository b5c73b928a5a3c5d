//! Instagram Graph API client
//!
//! Wraps the two calls a scheduled post needs: creating a media container
//! and publishing it. Both are form-encoded POSTs with the access token
//! sent as a form field (not an Authorization header) - the transport the
//! Graph API expects. There is no retry, no backoff, and no rate-limit
//! handling; a non-2xx response is a typed error.
//!
//! The client never uploads local files. `create_media_container` requires
//! a publicly reachable URL; hosting the file is the caller's problem.

use reqwest::Client;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::errors::ApiError;

/// Versioned Graph API base URL.
pub const DEFAULT_API_BASE: &str = "https://graph.facebook.com/v19.0";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Client for one Instagram business account.
pub struct InstaClient {
    client: Client,
    base_url: String,
    ig_id: String,
    token: String,
}

impl InstaClient {
    pub fn new(base_url: &str, ig_id: &str, token: &str) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("insta-scheduler/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            ig_id: ig_id.to_string(),
            token: token.to_string(),
        }
    }

    /// Create a media container for a publicly hosted image or video.
    ///
    /// Returns the container id to pass to [`publish_media`].
    ///
    /// [`publish_media`]: InstaClient::publish_media
    pub async fn create_media_container(
        &self,
        url: &str,
        caption: Option<&str>,
        is_video: bool,
    ) -> Result<String, ApiError> {
        let endpoint = format!("{}/{}/media", self.base_url, self.ig_id);

        let mut form: Vec<(&str, String)> = vec![
            ("access_token", self.token.clone()),
            ("caption", caption.unwrap_or("").to_string()),
        ];
        if is_video {
            form.push(("media_type", "VIDEO".to_string()));
            form.push(("video_url", url.to_string()));
        } else {
            form.push(("image_url", url.to_string()));
        }

        debug!("POST {} (is_video: {})", endpoint, is_video);
        let response = self.client.post(&endpoint).form(&form).send().await?;
        let body = check_status(&endpoint, response).await?;

        body.get("id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::missing_field("id"))
    }

    /// Publish a previously created media container.
    ///
    /// Returns the decoded response body.
    pub async fn publish_media(&self, container_id: &str) -> Result<Value, ApiError> {
        let endpoint = format!("{}/{}/media_publish", self.base_url, self.ig_id);
        let form = [
            ("creation_id", container_id),
            ("access_token", self.token.as_str()),
        ];

        debug!("POST {}", endpoint);
        let response = self.client.post(&endpoint).form(&form).send().await?;
        check_status(&endpoint, response).await
    }
}

async fn check_status(endpoint: &str, response: reqwest::Response) -> Result<Value, ApiError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(ApiError::http(endpoint, status.as_u16(), body));
    }
    Ok(response.json().await?)
}
