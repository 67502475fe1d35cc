//! Support desk: every customer's threads.

use boutique_core::SupportThreadId;
use serde::de::IgnoredAny;
use tracing::{info, instrument};

use super::AdminClient;
use crate::api::{NewMessage, SupportMessage, SupportThread};
use crate::error::Result;
use crate::support::non_blank;

impl AdminClient {
    /// Threads of all customers, without messages.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Forbidden` or `AuthError::Unauthenticated` when
    /// the backend refuses the session, or `Error::Api`.
    #[instrument(skip(self))]
    pub async fn list_support_threads(&self) -> Result<Vec<SupportThread>> {
        Ok(self.api.get("/admin/support/threads").await?)
    }

    /// One thread with its messages.
    ///
    /// # Errors
    ///
    /// As [`AdminClient::list_support_threads`].
    #[instrument(skip(self), fields(thread_id = %thread_id))]
    pub async fn get_support_thread(&self, thread_id: &SupportThreadId) -> Result<SupportThread> {
        Ok(self
            .api
            .get(&format!("/admin/support/threads/{thread_id}"))
            .await?)
    }

    /// Close a thread.
    ///
    /// # Errors
    ///
    /// As [`AdminClient::list_support_threads`].
    #[instrument(skip(self), fields(thread_id = %thread_id))]
    pub async fn close_support_thread(&self, thread_id: &SupportThreadId) -> Result<()> {
        let _: IgnoredAny = self
            .api
            .post_empty(&format!("/admin/support/threads/{thread_id}/close"))
            .await?;
        info!("Support thread closed");
        Ok(())
    }

    /// Answer a customer as the support team. Content is trimmed and must
    /// not be empty.
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidInput` for blank content before any request,
    /// otherwise as [`AdminClient::list_support_threads`].
    #[instrument(skip(self, content), fields(thread_id = %thread_id))]
    pub async fn post_support_message(
        &self,
        thread_id: &SupportThreadId,
        content: &str,
    ) -> Result<SupportMessage> {
        let content = non_blank(content, "message")?;
        Ok(self
            .api
            .post(
                &format!("/admin/support/threads/{thread_id}/messages"),
                &NewMessage { content },
            )
            .await?)
    }
}
