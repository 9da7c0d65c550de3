//! Recurring triggers: a small 5-field cron engine (min hour dom mon dow)
//! and a runner that drives the orchestrator's two handlers on their
//! configured schedules.

use std::future::Future;
use std::sync::Arc;

use chrono::{DateTime, Datelike, Local, Timelike};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{config::Config, survey::SurveyOrchestrator, Error, Result};

/// Runs the weekly survey job and the daily result check until stopped.
pub struct Scheduler {
    cfg: Arc<Config>,
    orchestrator: SurveyOrchestrator,
    jobs: tokio::sync::Mutex<Vec<JobEntry>>,
}

struct JobEntry {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl Scheduler {
    pub fn new(cfg: Arc<Config>, orchestrator: SurveyOrchestrator) -> Self {
        Self {
            cfg,
            orchestrator,
            jobs: tokio::sync::Mutex::new(Vec::new()),
        }
    }

    /// Parse both schedules and spawn one task per trigger.
    pub async fn start(&self) -> Result<()> {
        let survey_expr = CronExpr::parse(&self.cfg.survey_cron)
            .map_err(|e| Error::Config(format!("invalid SURVEY_CRON: {e}")))?;
        let results_expr = CronExpr::parse(&self.cfg.results_cron)
            .map_err(|e| Error::Config(format!("invalid RESULTS_CRON: {e}")))?;

        let mut jobs = self.jobs.lock().await;

        let orch = self.orchestrator.clone();
        jobs.push(spawn_job("survey", survey_expr, move || {
            let orch = orch.clone();
            async move { orch.post_availability_survey().await }
        }));

        let orch = self.orchestrator.clone();
        jobs.push(spawn_job("results", results_expr, move || {
            let orch = orch.clone();
            async move { orch.check_results().await }
        }));

        info!(
            "scheduler started (survey: {}, results: {})",
            self.cfg.survey_cron, self.cfg.results_cron
        );
        Ok(())
    }

    pub async fn stop(&self) {
        let mut jobs = self.jobs.lock().await;
        for job in jobs.drain(..) {
            job.cancel.cancel();
            job.handle.abort(); // best-effort
        }
    }
}

fn spawn_job<F, Fut>(name: &'static str, expr: CronExpr, run: F) -> JobEntry
where
    F: Fn() -> Fut + Send + 'static,
    Fut: Future<Output = Result<()>> + Send + 'static,
{
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let handle = tokio::spawn(async move {
        loop {
            let Some(next) = expr.next_after(Local::now()) else {
                error!("job {name} has no next run, stopping");
                break;
            };
            let wait = (next - Local::now()).to_std().unwrap_or_default();

            tokio::select! {
                _ = token.cancelled() => break,
                _ = sleep(wait) => {
                    info!("running scheduled job {name}");
                    if let Err(e) = run().await {
                        warn!("scheduled job {name} failed: {e}");
                    }
                }
            }
        }
    });
    JobEntry { cancel, handle }
}

// === Cron expression engine ===

/// One schedule in standard 5-field cron syntax.
#[derive(Clone, Debug)]
pub struct CronExpr {
    minute: FieldSet,
    hour: FieldSet,
    day_of_month: FieldSet,
    month: FieldSet,
    day_of_week: FieldSet,
}

/// Allowed values of one cron field, as a bitmask over 0..=63.
#[derive(Clone, Copy, Debug)]
struct FieldSet {
    mask: u64,
    unrestricted: bool,
}

impl CronExpr {
    pub fn parse(expr: &str) -> Result<Self> {
        let parts: Vec<&str> = expr.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(Error::Config(format!(
                "expected 5 cron fields, got {}",
                parts.len()
            )));
        }

        Ok(Self {
            minute: FieldSet::parse(parts[0], 0, 59, false)?,
            hour: FieldSet::parse(parts[1], 0, 23, false)?,
            day_of_month: FieldSet::parse(parts[2], 1, 31, false)?,
            month: FieldSet::parse(parts[3], 1, 12, false)?,
            day_of_week: FieldSet::parse(parts[4], 0, 6, true)?,
        })
    }

    pub fn matches(&self, dt: DateTime<Local>) -> bool {
        if !self.minute.contains(dt.minute())
            || !self.hour.contains(dt.hour())
            || !self.month.contains(dt.month())
        {
            return false;
        }

        // Standard cron: when both day fields are restricted, either may match.
        let dom = self.day_of_month.contains(dt.day());
        let dow = self
            .day_of_week
            .contains(dt.weekday().num_days_from_sunday());
        match (self.day_of_month.unrestricted, self.day_of_week.unrestricted) {
            (true, true) => true,
            (true, false) => dow,
            (false, true) => dom,
            (false, false) => dom || dow,
        }
    }

    /// Next matching minute boundary strictly after `now`.
    pub fn next_after(&self, now: DateTime<Local>) -> Option<DateTime<Local>> {
        let mut t = (now + chrono::Duration::minutes(1))
            .with_second(0)?
            .with_nanosecond(0)?;

        // Hard cap to avoid spinning forever on impossible expressions.
        for _ in 0..(366 * 24 * 60) {
            if self.matches(t) {
                return Some(t);
            }
            t += chrono::Duration::minutes(1);
        }
        None
    }
}

impl FieldSet {
    fn parse(raw: &str, lo: u32, hi: u32, seven_is_zero: bool) -> Result<Self> {
        let raw = raw.trim();
        let full = mask_range(lo, hi, 1);
        if raw == "*" {
            return Ok(Self {
                mask: full,
                unrestricted: true,
            });
        }

        let mut mask = 0u64;
        for part in raw.split(',') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }

            let (base, step) = match part.split_once('/') {
                Some((b, s)) => {
                    let step: u32 = s
                        .trim()
                        .parse()
                        .map_err(|_| Error::Config(format!("invalid cron step: {s}")))?;
                    if step == 0 {
                        return Err(Error::Config("cron step must be > 0".to_string()));
                    }
                    (b.trim(), step)
                }
                None => (part, 1),
            };

            let (start, end) = if base == "*" {
                (lo, hi)
            } else if let Some((a, b)) = base.split_once('-') {
                (
                    parse_value(a, seven_is_zero)?,
                    parse_value(b, seven_is_zero)?,
                )
            } else {
                let v = parse_value(base, seven_is_zero)?;
                // A bare value with a step ("10/5") ranges up to the max.
                if part.contains('/') {
                    (v, hi)
                } else {
                    (v, v)
                }
            };

            let start = start.max(lo);
            let end = end.min(hi);
            if start > end {
                return Err(Error::Config(format!("invalid cron range: {part}")));
            }
            mask |= mask_range(start, end, step);
        }

        Ok(Self {
            mask,
            unrestricted: mask == full,
        })
    }

    fn contains(self, v: u32) -> bool {
        v < 64 && self.mask & (1 << v) != 0
    }
}

fn mask_range(lo: u32, hi: u32, step: u32) -> u64 {
    let mut mask = 0u64;
    let mut v = lo;
    while v <= hi {
        mask |= 1 << v;
        v += step;
    }
    mask
}

fn parse_value(s: &str, seven_is_zero: bool) -> Result<u32> {
    let v: u32 = s
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("invalid cron value: {s}")))?;
    Ok(if seven_is_zero && v == 7 { 0 } else { v })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn sunday_midnight_schedule_matches_only_sundays() {
        let expr = CronExpr::parse("0 0 * * 0").unwrap();
        // 2025-03-30 was a Sunday.
        let sunday = Local.with_ymd_and_hms(2025, 3, 30, 0, 0, 0).unwrap();
        let monday = Local.with_ymd_and_hms(2025, 3, 31, 0, 0, 0).unwrap();
        let sunday_noon = Local.with_ymd_and_hms(2025, 3, 30, 12, 0, 0).unwrap();

        assert!(expr.matches(sunday));
        assert!(!expr.matches(monday));
        assert!(!expr.matches(sunday_noon));
    }

    #[test]
    fn dow_seven_is_treated_as_sunday() {
        let expr = CronExpr::parse("0 0 * * 7").unwrap();
        let sunday = Local.with_ymd_and_hms(2025, 3, 30, 0, 0, 0).unwrap();
        assert!(expr.matches(sunday));
    }

    #[test]
    fn daily_schedule_matches_every_day_at_the_hour() {
        let expr = CronExpr::parse("0 18 * * *").unwrap();
        let at_18 = Local.with_ymd_and_hms(2025, 4, 2, 18, 0, 0).unwrap();
        let at_17 = Local.with_ymd_and_hms(2025, 4, 2, 17, 0, 0).unwrap();
        assert!(expr.matches(at_18));
        assert!(!expr.matches(at_17));
    }

    #[test]
    fn next_after_lands_on_the_step_boundary() {
        let expr = CronExpr::parse("*/15 * * * *").unwrap();
        let now = Local.with_ymd_and_hms(2025, 4, 2, 10, 3, 20).unwrap();
        let next = expr.next_after(now).unwrap();
        assert_eq!(next.minute(), 15);
        assert_eq!(next.second(), 0);
    }

    #[test]
    fn rejects_wrong_field_count_and_bad_values() {
        assert!(CronExpr::parse("0 0 * *").is_err());
        assert!(CronExpr::parse("0 0 * * x").is_err());
        assert!(CronExpr::parse("*/0 * * * *").is_err());
    }
}
