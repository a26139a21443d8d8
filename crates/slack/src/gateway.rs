use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use thiserror::Error;

use crate::blocks::MessageTemplate;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("chat post failed: {0}")]
    Post(String),
    #[error("chat delete failed: {0}")]
    Delete(String),
    #[error("chat update failed: {0}")]
    Update(String),
    #[error("direct message failed: {0}")]
    DirectMessage(String),
}

/// Correlation handle returned by a successful post: enough to edit or
/// delete the message later.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel: String,
    pub ts: String,
}

/// The messaging collaborator. Implementations wrap the actual chat
/// platform; the scheduler only ever talks through this trait and treats
/// every failure as non-fatal.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    async fn post_message(
        &self,
        channel: &str,
        template: &MessageTemplate,
    ) -> Result<PostedMessage, GatewayError>;

    async fn delete_message(&self, channel: &str, ts: &str) -> Result<(), GatewayError>;

    async fn update_message(
        &self,
        channel: &str,
        ts: &str,
        template: &MessageTemplate,
    ) -> Result<(), GatewayError>;

    async fn post_direct_message(
        &self,
        user_id: &str,
        template: &MessageTemplate,
    ) -> Result<PostedMessage, GatewayError>;
}

/// Gateway that accepts everything and delivers nothing. Used for dry runs
/// and as the default wiring before a real transport is attached.
#[derive(Debug, Default)]
pub struct NoopChatGateway {
    counter: AtomicU64,
}

impl NoopChatGateway {
    fn synthetic_ts(&self) -> String {
        format!("0.{:06}", self.counter.fetch_add(1, Ordering::Relaxed))
    }
}

#[async_trait]
impl ChatGateway for NoopChatGateway {
    async fn post_message(
        &self,
        channel: &str,
        _template: &MessageTemplate,
    ) -> Result<PostedMessage, GatewayError> {
        Ok(PostedMessage { channel: channel.to_owned(), ts: self.synthetic_ts() })
    }

    async fn delete_message(&self, _channel: &str, _ts: &str) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn update_message(
        &self,
        _channel: &str,
        _ts: &str,
        _template: &MessageTemplate,
    ) -> Result<(), GatewayError> {
        Ok(())
    }

    async fn post_direct_message(
        &self,
        user_id: &str,
        _template: &MessageTemplate,
    ) -> Result<PostedMessage, GatewayError> {
        Ok(PostedMessage { channel: format!("D-{user_id}"), ts: self.synthetic_ts() })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserProfile {
    pub display_name: String,
    pub timezone: String,
}

impl UserProfile {
    /// Fallback profile when the platform has nothing for a user id: the id
    /// doubles as the display name and the timezone stays at UTC.
    pub fn fallback(user_id: &str) -> Self {
        Self { display_name: user_id.to_owned(), timezone: "+00:00".to_owned() }
    }
}

/// The user-lookup collaborator. Lookups never fail: a miss degrades to
/// [`UserProfile::fallback`] so rendering display names cannot take the
/// scheduler down.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_info(&self, user_id: &str) -> UserProfile;
}

#[derive(Debug, Default)]
pub struct NoopUserDirectory;

#[async_trait]
impl UserDirectory for NoopUserDirectory {
    async fn user_info(&self, user_id: &str) -> UserProfile {
        UserProfile::fallback(user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blocks::error_reply;

    #[tokio::test]
    async fn noop_gateway_hands_back_distinct_correlation_handles() {
        let gateway = NoopChatGateway::default();
        let template = error_reply("noop", "req-1");

        let first = gateway.post_message("C1", &template).await.expect("post");
        let second = gateway.post_message("C1", &template).await.expect("post");

        assert_eq!(first.channel, "C1");
        assert_ne!(first.ts, second.ts);
    }

    #[tokio::test]
    async fn noop_directory_degrades_to_the_raw_id() {
        let profile = NoopUserDirectory.user_info("U404").await;
        assert_eq!(profile.display_name, "U404");
        assert_eq!(profile.timezone, "+00:00");
    }
}
