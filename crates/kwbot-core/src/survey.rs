//! Survey orchestration: the weekly post, the recurring result check and
//! the pause/continue commands, all running over the messaging port.

use std::sync::Arc;

use chrono::Local;
use tracing::{info, warn};

use crate::{
    config::Config,
    domain::{MessageId, UserId},
    messaging::MessagingPort,
    render,
    state::{ResultState, SurveyState},
    tally::{compute_result, VoteTally},
    week, Result,
};

/// Marker in an inbound message that pauses result posting.
pub const PAUSE_MARKER: &str = "!pause";
/// Marker that resumes result posting.
pub const CONTINUE_MARKER: &str = "!continue";

const PAUSE_ACK: &str = "Result updates paused. Send !continue to resume.";
const CONTINUE_ACK: &str = "Result updates resumed.";

/// Owns all mutable survey state. Constructed once at startup; the
/// scheduler and the gateway handler share it via clones.
#[derive(Clone)]
pub struct SurveyOrchestrator {
    inner: Arc<Inner>,
}

struct Inner {
    cfg: Arc<Config>,
    messenger: Arc<dyn MessagingPort>,
    state: tokio::sync::Mutex<OrchestratorState>,
}

#[derive(Default)]
struct OrchestratorState {
    survey: SurveyState,
    result: ResultState,
    paused: bool,
    // In-flight guards: a slow platform round-trip must not interleave
    // with a second invocation of the same handler.
    survey_in_flight: bool,
    check_in_flight: bool,
}

impl SurveyOrchestrator {
    pub fn new(cfg: Arc<Config>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self {
            inner: Arc::new(Inner {
                cfg,
                messenger,
                state: tokio::sync::Mutex::new(OrchestratorState::default()),
            }),
        }
    }

    /// Weekly trigger: replace the channel contents with a fresh survey.
    pub async fn post_availability_survey(&self) -> Result<()> {
        {
            let mut st = self.inner.state.lock().await;
            if st.survey_in_flight {
                warn!("survey post already in flight, skipping trigger");
                return Ok(());
            }
            st.survey_in_flight = true;
            // A new cycle always starts unpaused.
            st.paused = false;
        }

        let res = self.post_survey_inner().await;

        self.inner.state.lock().await.survey_in_flight = false;
        res
    }

    async fn post_survey_inner(&self) -> Result<()> {
        let cfg = &self.inner.cfg;
        let messenger = &self.inner.messenger;

        let week_number = week::target_week(cfg.reference_date);
        let days = week::days_of_week(week_number, Local::now().date_naive())?;

        // Clear the channel, keeping posted results as visible history.
        let messages = messenger
            .recent_messages(cfg.channel_id, cfg.cleanup_fetch_limit)
            .await?;
        for msg in messages {
            if msg
                .embed_titles
                .iter()
                .any(|t| t.contains(render::RESULT_TITLE_MARKER))
            {
                continue;
            }
            messenger.delete_message(cfg.channel_id, msg.id).await?;
        }

        let embed = render::survey_embed(week_number, &days);
        let survey_id = messenger.send_embed(cfg.channel_id, embed).await?;

        {
            let mut st = self.inner.state.lock().await;
            st.survey.save(survey_id, week_number);
            st.result.clear();
        }

        for marker in render::DAY_MARKERS {
            messenger
                .add_reaction(cfg.channel_id, survey_id, marker)
                .await?;
        }

        info!("posted availability survey for week {week_number}");
        Ok(())
    }

    /// Result-check trigger: tally the open survey's reactions and
    /// (re)post the summary. Silent no-op while paused or with no open
    /// survey.
    pub async fn check_results(&self) -> Result<()> {
        let (survey_id, week_number, previous) = {
            let mut st = self.inner.state.lock().await;
            if st.check_in_flight || st.paused || !st.survey.is_available() {
                return Ok(());
            }
            let (Some(id), Some(week_number)) = (st.survey.id(), st.survey.week()) else {
                return Ok(());
            };
            st.check_in_flight = true;
            (id, week_number, st.result.id())
        };

        let res = self
            .check_results_inner(survey_id, week_number, previous)
            .await;

        self.inner.state.lock().await.check_in_flight = false;
        res
    }

    async fn check_results_inner(
        &self,
        survey_id: MessageId,
        week_number: u32,
        previous: Option<MessageId>,
    ) -> Result<()> {
        let cfg = &self.inner.cfg;
        let messenger = &self.inner.messenger;

        let raw = messenger
            .reaction_counts(cfg.channel_id, survey_id, &render::DAY_MARKERS)
            .await?;
        let tally = VoteTally::from_reactions(&raw);

        let days = week::days_of_week(week_number, Local::now().date_naive())?;
        let payload = compute_result(&tally, &days, week_number);

        // Superseding the old result is best-effort.
        if let Some(prev) = previous {
            if let Err(e) = messenger.delete_message(cfg.channel_id, prev).await {
                warn!("could not delete previous result message: {e}");
            }
        }

        let result_id = messenger
            .send_embed(cfg.channel_id, render::result_embed(&payload))
            .await?;

        self.inner.state.lock().await.result.save(result_id);

        info!(
            "posted result for week {week_number} ({} candidate days)",
            payload.entries.len()
        );
        Ok(())
    }

    /// Inbound chat message: pause/continue commands from the privileged
    /// user. Everything else is ignored.
    pub async fn handle_message(&self, author: UserId, content: &str) -> Result<()> {
        if self.inner.cfg.privileged_user_id != Some(author) {
            return Ok(());
        }

        let ack = if content.contains(PAUSE_MARKER) {
            self.inner.state.lock().await.paused = true;
            info!("result updates paused by privileged user");
            PAUSE_ACK
        } else if content.contains(CONTINUE_MARKER) {
            self.inner.state.lock().await.paused = false;
            info!("result updates resumed by privileged user");
            CONTINUE_ACK
        } else {
            return Ok(());
        };

        self.inner
            .messenger
            .send_text(self.inner.cfg.channel_id, ack)
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use super::*;
    use crate::domain::ChannelId;
    use crate::messaging::types::{MessageSummary, OutgoingEmbed};

    #[derive(Default)]
    struct FakeMessenger {
        state: Mutex<FakeState>,
    }

    #[derive(Default)]
    struct FakeState {
        next_id: u64,
        channel: Vec<MessageSummary>,
        deleted: Vec<MessageId>,
        texts: Vec<String>,
        embeds: Vec<(MessageId, OutgoingEmbed)>,
        reactions: Vec<(MessageId, String)>,
        raw_counts: Vec<u64>,
    }

    impl FakeMessenger {
        fn with_counts(counts: [u64; 7]) -> Self {
            let fake = Self::default();
            fake.state.lock().unwrap().raw_counts = counts.to_vec();
            fake
        }

        fn seed_message(&self, title: &str) -> MessageId {
            let mut st = self.state.lock().unwrap();
            st.next_id += 1;
            let id = MessageId(st.next_id);
            st.channel.push(MessageSummary {
                id,
                embed_titles: vec![title.to_string()],
            });
            id
        }

        fn deleted(&self) -> Vec<MessageId> {
            self.state.lock().unwrap().deleted.clone()
        }

        fn sent_embed_titles(&self) -> Vec<String> {
            self.state
                .lock()
                .unwrap()
                .embeds
                .iter()
                .map(|(_, e)| e.title.clone())
                .collect()
        }
    }

    #[async_trait]
    impl MessagingPort for FakeMessenger {
        async fn send_embed(
            &self,
            _channel: ChannelId,
            embed: OutgoingEmbed,
        ) -> crate::Result<MessageId> {
            let mut st = self.state.lock().unwrap();
            st.next_id += 1;
            let id = MessageId(st.next_id);
            st.channel.push(MessageSummary {
                id,
                embed_titles: vec![embed.title.clone()],
            });
            st.embeds.push((id, embed));
            Ok(id)
        }

        async fn send_text(&self, _channel: ChannelId, text: &str) -> crate::Result<MessageId> {
            let mut st = self.state.lock().unwrap();
            st.next_id += 1;
            st.texts.push(text.to_string());
            Ok(MessageId(st.next_id))
        }

        async fn recent_messages(
            &self,
            _channel: ChannelId,
            _limit: u8,
        ) -> crate::Result<Vec<MessageSummary>> {
            Ok(self.state.lock().unwrap().channel.clone())
        }

        async fn delete_message(&self, _channel: ChannelId, id: MessageId) -> crate::Result<()> {
            let mut st = self.state.lock().unwrap();
            st.deleted.push(id);
            st.channel.retain(|m| m.id != id);
            Ok(())
        }

        async fn reaction_counts(
            &self,
            _channel: ChannelId,
            _id: MessageId,
            markers: &[&str],
        ) -> crate::Result<Vec<u64>> {
            let st = self.state.lock().unwrap();
            Ok((0..markers.len())
                .map(|i| st.raw_counts.get(i).copied().unwrap_or(0))
                .collect())
        }

        async fn add_reaction(
            &self,
            _channel: ChannelId,
            id: MessageId,
            marker: &str,
        ) -> crate::Result<()> {
            self.state
                .lock()
                .unwrap()
                .reactions
                .push((id, marker.to_string()));
            Ok(())
        }
    }

    fn test_config() -> Arc<Config> {
        Arc::new(Config {
            discord_token: "test-token".to_string(),
            channel_id: ChannelId(1),
            privileged_user_id: Some(UserId(42)),
            survey_cron: "0 0 * * 0".to_string(),
            results_cron: "0 18 * * *".to_string(),
            reference_date: NaiveDate::from_ymd_opt(2025, 3, 31).unwrap(),
            cleanup_fetch_limit: 100,
        })
    }

    fn orchestrator_with(fake: FakeMessenger) -> (SurveyOrchestrator, Arc<FakeMessenger>) {
        let fake = Arc::new(fake);
        let orch = SurveyOrchestrator::new(test_config(), fake.clone());
        (orch, fake)
    }

    #[tokio::test]
    async fn weekly_post_records_survey_and_seeds_markers() {
        let (orch, fake) = orchestrator_with(FakeMessenger::default());
        orch.post_availability_survey().await.unwrap();

        {
            let st = orch.inner.state.lock().await;
            assert!(st.survey.is_available());
            assert!(!st.result.is_available());
            assert!(!st.paused);
        }

        let titles = fake.sent_embed_titles();
        assert_eq!(titles.len(), 1);
        assert!(titles[0].starts_with("KW "));

        let reactions = fake.state.lock().unwrap().reactions.clone();
        assert_eq!(reactions.len(), 7);
        assert_eq!(reactions[0].1, "1️⃣");
    }

    #[tokio::test]
    async fn double_weekly_post_keeps_result_history() {
        let fake = FakeMessenger::default();
        let old_result = fake.seed_message("Ergebnis: KW 13");
        let stale = fake.seed_message("some leftover embed");
        let (orch, fake) = orchestrator_with(fake);

        orch.post_availability_survey().await.unwrap();
        let first_survey = orch.inner.state.lock().await.survey.id().unwrap();

        orch.post_availability_survey().await.unwrap();

        let deleted = fake.deleted();
        assert!(deleted.contains(&stale));
        assert!(deleted.contains(&first_survey));
        assert!(!deleted.contains(&old_result));

        let st = orch.inner.state.lock().await;
        assert!(st.survey.is_available());
        assert!(!st.result.is_available());
    }

    #[tokio::test]
    async fn result_check_is_a_noop_without_an_open_survey() {
        let (orch, fake) = orchestrator_with(FakeMessenger::with_counts([9; 7]));
        orch.check_results().await.unwrap();
        assert!(fake.sent_embed_titles().is_empty());
        assert!(fake.deleted().is_empty());
    }

    #[tokio::test]
    async fn new_result_supersedes_the_previous_one() {
        let (orch, fake) = orchestrator_with(FakeMessenger::with_counts([6, 2, 2, 1, 1, 1, 1]));
        orch.post_availability_survey().await.unwrap();

        orch.check_results().await.unwrap();
        let first = orch.inner.state.lock().await.result.id().unwrap();

        orch.check_results().await.unwrap();
        let second = orch.inner.state.lock().await.result.id().unwrap();

        assert_ne!(first, second);
        assert!(fake.deleted().contains(&first));
    }

    #[tokio::test]
    async fn below_quorum_posts_the_no_consensus_result() {
        // Raw counts include the bot's seed reaction, so the best day has
        // 2 actual votes here.
        let (orch, fake) = orchestrator_with(FakeMessenger::with_counts([3, 1, 1, 1, 1, 1, 1]));
        orch.post_availability_survey().await.unwrap();
        orch.check_results().await.unwrap();

        let embeds = fake.state.lock().unwrap().embeds.clone();
        assert_eq!(embeds.len(), 2);
        let result = &embeds[1].1;
        assert!(result.title.contains("Ergebnis"));
        assert!(result.fields.is_empty());
    }

    #[tokio::test]
    async fn pause_suppresses_result_checks_until_continue() {
        let (orch, fake) = orchestrator_with(FakeMessenger::with_counts([6; 7]));
        orch.post_availability_survey().await.unwrap();

        orch.handle_message(UserId(42), "bot !pause please").await.unwrap();
        orch.check_results().await.unwrap();
        // Only the survey embed so far; the pause ack went out as text.
        assert_eq!(fake.sent_embed_titles().len(), 1);
        assert!(fake.deleted().is_empty());

        orch.handle_message(UserId(42), "!continue").await.unwrap();
        orch.check_results().await.unwrap();
        assert_eq!(fake.sent_embed_titles().len(), 2);

        let texts = fake.state.lock().unwrap().texts.clone();
        assert_eq!(texts.len(), 2);
    }

    #[tokio::test]
    async fn commands_from_other_users_are_ignored() {
        let (orch, fake) = orchestrator_with(FakeMessenger::default());
        orch.handle_message(UserId(7), "!pause").await.unwrap();

        assert!(fake.state.lock().unwrap().texts.is_empty());
        assert!(!orch.inner.state.lock().await.paused);
    }

    #[tokio::test]
    async fn new_cycle_clears_the_pause_flag() {
        let (orch, _fake) = orchestrator_with(FakeMessenger::default());
        orch.handle_message(UserId(42), "!pause").await.unwrap();
        assert!(orch.inner.state.lock().await.paused);

        orch.post_availability_survey().await.unwrap();
        assert!(!orch.inner.state.lock().await.paused);
    }
}
