//! Vote tallying and result computation.

use crate::{render, week::DayInfo};

/// Minimum number of votes the best day needs before a result is declared.
pub const QUORUM: u64 = 3;

pub const DAY_COUNT: usize = 7;

/// Per-weekday vote counts, Monday = index 0. Derived fresh from reaction
/// data on every check, never stored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct VoteTally {
    counts: [u64; DAY_COUNT],
}

impl VoteTally {
    pub fn new(counts: [u64; DAY_COUNT]) -> Self {
        Self { counts }
    }

    /// Build a tally from raw reaction counts. The bot seeds one reaction
    /// per marker when the survey is posted, so one count per day is the
    /// bot's own and is subtracted here.
    pub fn from_reactions(raw: &[u64]) -> Self {
        let mut counts = [0u64; DAY_COUNT];
        for (slot, c) in counts.iter_mut().zip(raw) {
            *slot = c.saturating_sub(1);
        }
        Self { counts }
    }

    pub fn count(&self, day: usize) -> u64 {
        self.counts.get(day).copied().unwrap_or(0)
    }
}

/// Render-ready result summary.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultPayload {
    pub week: u32,
    pub title: String,
    /// Empty when the best day is below quorum ("no consensus yet").
    pub entries: Vec<ResultEntry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResultEntry {
    pub label: String,
    pub date: String,
}

/// Rank the seven days by vote count and pick the winning set.
///
/// Ties are preserved: every day at the maximum count is returned. The
/// sort is stable over weekday order, so tied days come out Monday-first.
pub fn compute_result(tally: &VoteTally, days: &[DayInfo], week: u32) -> ResultPayload {
    let mut ranked: Vec<usize> = (0..DAY_COUNT).collect();
    ranked.sort_by(|a, b| tally.count(*b).cmp(&tally.count(*a)));

    let max = tally.count(ranked[0]);
    let title = render::result_title(week);

    if max < QUORUM {
        return ResultPayload {
            week,
            title,
            entries: Vec::new(),
        };
    }

    let entries = ranked
        .into_iter()
        .take_while(|&i| tally.count(i) == max)
        .filter_map(|i| days.get(i))
        .map(|d| ResultEntry {
            label: d.label.to_string(),
            date: d.date_label(),
        })
        .collect();

    ResultPayload {
        week,
        title,
        entries,
    }
}
