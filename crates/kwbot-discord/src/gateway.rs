//! Gateway wiring: client bootstrap and inbound event dispatch.

use std::sync::Arc;

use serenity::all::{Client, Context, EventHandler, GatewayIntents, Http, Message, Ready};
use serenity::async_trait;
use tracing::{error, info};

use kwbot_core::{config::Config, domain::UserId, survey::SurveyOrchestrator};

use crate::DiscordMessenger;

struct Handler {
    orchestrator: SurveyOrchestrator,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        info!("bot is online as {}", ready.user.name);
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        if msg.author.bot {
            return;
        }

        let author = UserId(msg.author.id.get());
        if let Err(e) = self.orchestrator.handle_message(author, &msg.content).await {
            error!("failed to handle inbound message: {e}");
        }
    }
}

/// REST-side messenger for the orchestrator.
pub fn messenger(cfg: &Config) -> DiscordMessenger {
    DiscordMessenger::new(Arc::new(Http::new(&cfg.discord_token)))
}

/// Connect to the gateway and block on the event loop.
pub async fn run(cfg: Arc<Config>, orchestrator: SurveyOrchestrator) -> anyhow::Result<()> {
    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MESSAGE_REACTIONS
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&cfg.discord_token, intents)
        .event_handler(Handler { orchestrator })
        .await?;

    client.start().await?;
    Ok(())
}
