use async_trait::async_trait;

use crate::{
    domain::{ChannelId, MessageId},
    messaging::types::{MessageSummary, OutgoingEmbed},
    Result,
};

/// Hexagonal port for the chat platform.
///
/// Discord is the first implementation; the shape stays narrow enough that
/// another platform with embeds + reactions could sit behind it.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_embed(&self, channel: ChannelId, embed: OutgoingEmbed) -> Result<MessageId>;
    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<MessageId>;

    /// Most recent messages in the channel, up to `limit`.
    async fn recent_messages(&self, channel: ChannelId, limit: u8) -> Result<Vec<MessageSummary>>;
    async fn delete_message(&self, channel: ChannelId, id: MessageId) -> Result<()>;

    /// Raw reaction count per marker on one message, index-aligned with
    /// `markers`. Markers nobody used count as zero.
    async fn reaction_counts(
        &self,
        channel: ChannelId,
        id: MessageId,
        markers: &[&str],
    ) -> Result<Vec<u64>>;

    async fn add_reaction(&self, channel: ChannelId, id: MessageId, marker: &str) -> Result<()>;
}
