use async_trait::async_trait;
use tracing::debug;

use crate::error::LookupError;

pub const IPIFY_URL: &str = "https://api.ipify.org";

/// Resolves the public IP address this function egresses from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PublicIpLookup: Send + Sync {
    async fn lookup(&self) -> Result<String, LookupError>;
}

/// Plain-text IP echo service client (ipify or anything answering the same way).
pub struct IpifyClient {
    client: reqwest::Client,
    url: String,
}

impl IpifyClient {
    pub fn new(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl PublicIpLookup for IpifyClient {
    async fn lookup(&self) -> Result<String, LookupError> {
        let response = self.client.get(&self.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LookupError::Status(status.as_u16()));
        }

        let text = response.text().await?;
        debug!(url = %self.url, body_len = text.len(), "lookup service answered");
        Ok(text)
    }
}
