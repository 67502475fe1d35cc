//! Customer support threads.

use boutique_core::{OrderId, SupportThreadId};
use serde::de::IgnoredAny;
use tracing::{info, instrument};

use crate::api::{ApiClient, NewMessage, NewThread, SupportMessage, SupportThread};
use crate::error::{Error, Result};

/// Client for `/support/threads`. Every call needs a session.
#[derive(Clone)]
pub struct SupportClient {
    api: ApiClient,
}

impl SupportClient {
    #[must_use]
    pub const fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// Open a thread, optionally about a specific order.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for a blank subject,
    /// `AuthError::Unauthenticated` without a token, or `Error::Api`.
    #[instrument(skip(self, subject))]
    pub async fn create_thread(
        &self,
        subject: &str,
        order_id: Option<&OrderId>,
    ) -> Result<SupportThread> {
        let subject = non_blank(subject, "subject")?;
        self.api.require_token()?;
        let thread: SupportThread = self
            .api
            .post("/support/threads", &NewThread { subject, order_id })
            .await?;
        info!(thread_id = %thread.id, "Support thread opened");
        Ok(thread)
    }

    /// The user's threads, without messages.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Unauthenticated` without a token, or `Error::Api`.
    #[instrument(skip(self))]
    pub async fn list_threads(&self) -> Result<Vec<SupportThread>> {
        self.api.require_token()?;
        Ok(self.api.get("/support/threads").await?)
    }

    /// One thread with its messages.
    ///
    /// # Errors
    ///
    /// As [`SupportClient::list_threads`].
    #[instrument(skip(self), fields(thread_id = %thread_id))]
    pub async fn get_thread(&self, thread_id: &SupportThreadId) -> Result<SupportThread> {
        self.api.require_token()?;
        Ok(self
            .api
            .get(&format!("/support/threads/{thread_id}"))
            .await?)
    }

    /// Post a message. Content is trimmed and must not be empty.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for blank content before any request,
    /// otherwise as [`SupportClient::list_threads`].
    #[instrument(skip(self, content), fields(thread_id = %thread_id))]
    pub async fn post_message(
        &self,
        thread_id: &SupportThreadId,
        content: &str,
    ) -> Result<SupportMessage> {
        let content = non_blank(content, "message")?;
        self.api.require_token()?;
        Ok(self
            .api
            .post(
                &format!("/support/threads/{thread_id}/messages"),
                &NewMessage { content },
            )
            .await?)
    }

    /// Mark every message of a thread as read.
    ///
    /// # Errors
    ///
    /// As [`SupportClient::list_threads`].
    #[instrument(skip(self), fields(thread_id = %thread_id))]
    pub async fn mark_read(&self, thread_id: &SupportThreadId) -> Result<()> {
        self.api.require_token()?;
        let _: IgnoredAny = self
            .api
            .post_empty(&format!("/support/threads/{thread_id}/mark-read"))
            .await?;
        Ok(())
    }
}

pub(crate) fn non_blank<'a>(value: &'a str, field: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::InvalidInput(format!("{field} cannot be empty")))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use url::Url;

    use super::*;
    use crate::auth::TokenStore;
    use crate::config::StorefrontConfig;
    use crate::storage::MemoryStore;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank("  Bonjour \n", "message").unwrap(), "Bonjour");
        assert!(matches!(
            non_blank(" \t ", "message"),
            Err(Error::InvalidInput(msg)) if msg == "message cannot be empty"
        ));
    }

    #[tokio::test]
    async fn test_blank_message_rejected_before_auth_check() {
        let config = StorefrontConfig::new(Url::parse("http://127.0.0.1:9").unwrap());
        let tokens = TokenStore::new(MemoryStore::shared());
        let support = SupportClient::new(ApiClient::new(&config, tokens).unwrap());
        let thread = SupportThreadId::new("t1");

        assert!(matches!(
            support.post_message(&thread, "   ").await,
            Err(Error::InvalidInput(_))
        ));
        assert!(support.list_threads().await.unwrap_err().is_unauthenticated());
    }
}
