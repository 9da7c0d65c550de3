//! Discord adapter (serenity).
//!
//! This crate implements the kwbot-core messaging port over the Discord
//! REST API and feeds gateway events into the orchestrator.

use std::sync::Arc;

use async_trait::async_trait;

use serenity::all::{Colour, CreateEmbed, CreateMessage, GetMessages, Http, ReactionType};

pub mod gateway;

use kwbot_core::{
    domain::{ChannelId, MessageId},
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{MessageSummary, OutgoingEmbed},
    },
    Result,
};

pub struct DiscordMessenger {
    http: Arc<Http>,
}

impl DiscordMessenger {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }

    fn ds_channel(channel: ChannelId) -> serenity::all::ChannelId {
        serenity::all::ChannelId::new(channel.0)
    }

    fn ds_msg(id: MessageId) -> serenity::all::MessageId {
        serenity::all::MessageId::new(id.0)
    }

    fn map_err(e: serenity::Error) -> Error {
        Error::External(format!("discord error: {e}"))
    }

    fn build_embed(embed: &OutgoingEmbed) -> CreateEmbed {
        let mut out = CreateEmbed::new()
            .title(&embed.title)
            .description(&embed.description)
            .colour(Colour::new(embed.colour));
        for f in &embed.fields {
            out = out.field(&f.name, &f.value, f.inline);
        }
        out
    }
}

#[async_trait]
impl MessagingPort for DiscordMessenger {
    async fn send_embed(&self, channel: ChannelId, embed: OutgoingEmbed) -> Result<MessageId> {
        let msg = Self::ds_channel(channel)
            .send_message(
                &self.http,
                CreateMessage::new().embed(Self::build_embed(&embed)),
            )
            .await
            .map_err(Self::map_err)?;
        Ok(MessageId(msg.id.get()))
    }

    async fn send_text(&self, channel: ChannelId, text: &str) -> Result<MessageId> {
        let msg = Self::ds_channel(channel)
            .say(&self.http, text)
            .await
            .map_err(Self::map_err)?;
        Ok(MessageId(msg.id.get()))
    }

    async fn recent_messages(&self, channel: ChannelId, limit: u8) -> Result<Vec<MessageSummary>> {
        let messages = Self::ds_channel(channel)
            .messages(&self.http, GetMessages::new().limit(limit))
            .await
            .map_err(Self::map_err)?;

        Ok(messages
            .into_iter()
            .map(|m| MessageSummary {
                id: MessageId(m.id.get()),
                embed_titles: m.embeds.into_iter().filter_map(|e| e.title).collect(),
            })
            .collect())
    }

    async fn delete_message(&self, channel: ChannelId, id: MessageId) -> Result<()> {
        Self::ds_channel(channel)
            .delete_message(&self.http, Self::ds_msg(id))
            .await
            .map_err(Self::map_err)
    }

    async fn reaction_counts(
        &self,
        channel: ChannelId,
        id: MessageId,
        markers: &[&str],
    ) -> Result<Vec<u64>> {
        let msg = Self::ds_channel(channel)
            .message(&self.http, Self::ds_msg(id))
            .await
            .map_err(Self::map_err)?;

        Ok(markers
            .iter()
            .map(|marker| {
                msg.reactions
                    .iter()
                    .find(|r| {
                        matches!(&r.reaction_type, ReactionType::Unicode(u) if u.as_str() == *marker)
                    })
                    .map(|r| r.count)
                    .unwrap_or(0)
            })
            .collect())
    }

    async fn add_reaction(&self, channel: ChannelId, id: MessageId, marker: &str) -> Result<()> {
        Self::ds_channel(channel)
            .create_reaction(
                &self.http,
                Self::ds_msg(id),
                ReactionType::Unicode(marker.to_string()),
            )
            .await
            .map_err(Self::map_err)
    }
}
