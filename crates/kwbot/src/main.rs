use std::sync::Arc;

use kwbot_core::{
    config::Config, messaging::MessagingPort, scheduler::Scheduler, survey::SurveyOrchestrator,
};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    kwbot_core::logging::init("kwbot")?;

    let cfg = Arc::new(Config::load()?);
    info!("target channel: {}", cfg.channel_id.0);

    let messenger: Arc<dyn MessagingPort> = Arc::new(kwbot_discord::gateway::messenger(&cfg));
    let orchestrator = SurveyOrchestrator::new(cfg.clone(), messenger);

    let scheduler = Scheduler::new(cfg.clone(), orchestrator.clone());
    scheduler.start().await?;

    let res = kwbot_discord::gateway::run(cfg, orchestrator).await;
    scheduler.stop().await;
    res
}
