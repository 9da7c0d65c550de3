use std::{env, fs, path::Path};

use chrono::NaiveDate;

use crate::{
    domain::{ChannelId, UserId},
    errors::Error,
    Result,
};

const DEFAULT_CHANNEL_ID: u64 = 1_308_827_165_101_522_975;

/// Weekly survey post, Sunday at midnight.
const DEFAULT_SURVEY_CRON: &str = "0 0 * * 0";
/// Daily result check, early evening.
const DEFAULT_RESULTS_CRON: &str = "0 18 * * *";

/// The target week is derived from this fixed date rather than from the
/// current date, so the week number only moves when this value (or the
/// `SURVEY_REFERENCE_DATE` override) is edited. See DESIGN.md.
const DEFAULT_REFERENCE_DATE: &str = "2025-03-31";

/// Typed configuration, loaded once at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub discord_token: String,
    pub channel_id: ChannelId,
    /// The only user allowed to pause/continue result posting. Commands
    /// are ignored entirely when unset.
    pub privileged_user_id: Option<UserId>,
    pub survey_cron: String,
    pub results_cron: String,
    pub reference_date: NaiveDate,
    pub cleanup_fetch_limit: u8,
}

impl Config {
    pub fn load() -> Result<Self> {
        load_dotenv_if_present(Path::new(".env"));

        let discord_token = env_str("DISCORD_TOKEN").unwrap_or_default();
        if discord_token.trim().is_empty() {
            return Err(Error::Config(
                "DISCORD_TOKEN environment variable is required".to_string(),
            ));
        }

        let channel_id = ChannelId(env_u64("DISCORD_CHANNEL_ID").unwrap_or(DEFAULT_CHANNEL_ID));
        let privileged_user_id = env_u64("PRIVILEGED_USER_ID").map(UserId);

        let survey_cron =
            env_str("SURVEY_CRON").unwrap_or_else(|| DEFAULT_SURVEY_CRON.to_string());
        let results_cron =
            env_str("RESULTS_CRON").unwrap_or_else(|| DEFAULT_RESULTS_CRON.to_string());

        let reference_date = match env_str("SURVEY_REFERENCE_DATE") {
            Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|e| {
                Error::Config(format!("invalid SURVEY_REFERENCE_DATE {raw:?}: {e}"))
            })?,
            None => default_reference_date(),
        };

        let cleanup_fetch_limit = env_u8("CLEANUP_FETCH_LIMIT").unwrap_or(100);

        Ok(Self {
            discord_token,
            channel_id,
            privileged_user_id,
            survey_cron,
            results_cron,
            reference_date,
            cleanup_fetch_limit,
        })
    }
}

fn default_reference_date() -> NaiveDate {
    NaiveDate::parse_from_str(DEFAULT_REFERENCE_DATE, "%Y-%m-%d").unwrap_or_default()
}

fn load_dotenv_if_present(path: &Path) {
    let Ok(contents) = fs::read_to_string(path) else {
        return;
    };

    for raw in contents.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((k, v)) = line.split_once('=') else {
            continue;
        };

        let key = k.trim();
        if key.is_empty() {
            continue;
        }
        if env::var_os(key).is_some() {
            continue; // do not override existing env
        }

        let mut val = v.trim().to_string();
        // Strip optional surrounding quotes.
        if val.len() >= 2
            && ((val.starts_with('"') && val.ends_with('"'))
                || (val.starts_with('\'') && val.ends_with('\'')))
        {
            val = val[1..val.len() - 1].to_string();
        }

        env::set_var(key, val);
    }
}

fn env_str(key: &str) -> Option<String> {
    env::var(key).ok()
}

fn env_u64(key: &str) -> Option<u64> {
    env_str(key).and_then(|s| s.trim().parse::<u64>().ok())
}

fn env_u8(key: &str) -> Option<u8> {
    env_str(key).and_then(|s| s.trim().parse::<u8>().ok())
}
