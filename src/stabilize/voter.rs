//! Majority voting over recent plate readings.

use std::collections::VecDeque;

use serde::Serialize;

use crate::config::VoterConfig;
use crate::stabilize::store::KeyedStore;
use crate::text::count_alnum;
use crate::tracker::ObjectKey;

/// Shown while a plate is visible but nothing readable has been assembled.
pub const READING_PLACEHOLDER: &str = "READING...";

/// Bounded FIFO of non-empty readings; the oldest entry is dropped first.
#[derive(Debug, Clone)]
pub struct TextHistory {
    entries: VecDeque<String>,
    capacity: usize,
}

impl TextHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, text: &str) {
        if text.is_empty() || self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(text.to_owned());
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    /// Most frequent entry; ties go to the entry that appeared first.
    pub fn majority(&self) -> Option<&str> {
        let mut best: Option<(&str, usize)> = None;
        for (i, text) in self.entries.iter().enumerate() {
            if self.entries.iter().take(i).any(|seen| seen == text) {
                continue;
            }
            let count = self.entries.iter().filter(|other| *other == text).count();
            if best.is_none_or(|(_, top)| count > top) {
                best = Some((text.as_str(), count));
            }
        }
        best.map(|(text, _)| text)
    }
}

/// Per-key reading histories.
#[derive(Debug, Clone)]
pub struct TemporalVoter {
    histories: KeyedStore<TextHistory>,
    capacity: usize,
}

impl Default for TemporalVoter {
    fn default() -> Self {
        Self::new(&VoterConfig::default())
    }
}

impl TemporalVoter {
    pub fn new(config: &VoterConfig) -> Self {
        Self {
            histories: KeyedStore::new(),
            capacity: config.history_capacity,
        }
    }

    /// Record the reading of `key` at `frame`. Empty readings only refresh
    /// the key's last-seen frame.
    pub fn observe(&mut self, key: ObjectKey, text: &str, frame: u64) {
        let capacity = self.capacity;
        self.histories
            .touch_with(key, frame, || TextHistory::new(capacity))
            .push(text);
    }

    pub fn history(&self, key: &ObjectKey) -> Option<&TextHistory> {
        self.histories.get(key)
    }

    pub fn smoothed_text(&self, key: &ObjectKey) -> Option<&str> {
        self.histories.get(key).and_then(TextHistory::majority)
    }

    /// Text to show for `key`: the majority reading, else the current raw
    /// reading, else [`READING_PLACEHOLDER`].
    pub fn display_text(&self, key: &ObjectKey, raw: &str) -> String {
        match self.smoothed_text(key) {
            Some(text) => text.to_owned(),
            None if !raw.is_empty() => raw.to_owned(),
            None => READING_PLACEHOLDER.to_owned(),
        }
    }

    pub(crate) fn store_mut(&mut self) -> &mut KeyedStore<TextHistory> {
        &mut self.histories
    }

    pub fn len(&self) -> usize {
        self.histories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.histories.is_empty()
    }
}

/// One reading taken during a burst capture.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstReading {
    pub text: String,
    pub score: f32,
}

impl BurstReading {
    pub fn new<S: Into<String>>(text: S, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
        }
    }
}

/// Winner of a burst vote.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BurstVote {
    pub text: String,
    pub votes: usize,
    /// Best score among the winner's occurrences
    pub score: f32,
}

/// Majority over a whole burst.
///
/// Ties are broken by the best score among each candidate's occurrences,
/// then by alphanumeric length, then by earliest first occurrence. Empty
/// readings do not vote.
pub fn vote_burst(readings: &[BurstReading]) -> Option<BurstVote> {
    struct Tally<'a> {
        text: &'a str,
        votes: usize,
        score: f32,
        first: usize,
    }

    let mut tallies: Vec<Tally<'_>> = Vec::new();
    for (i, reading) in readings.iter().enumerate() {
        if reading.text.is_empty() {
            continue;
        }
        match tallies.iter_mut().find(|t| t.text == reading.text) {
            Some(tally) => {
                tally.votes += 1;
                tally.score = tally.score.max(reading.score);
            }
            None => tallies.push(Tally {
                text: &reading.text,
                votes: 1,
                score: reading.score,
                first: i,
            }),
        }
    }

    tallies
        .into_iter()
        .max_by(|a, b| {
            a.votes
                .cmp(&b.votes)
                .then(a.score.total_cmp(&b.score))
                .then(count_alnum(a.text).cmp(&count_alnum(b.text)))
                .then(b.first.cmp(&a.first))
        })
        .map(|t| BurstVote {
            text: t.text.to_owned(),
            votes: t.votes,
            score: t.score,
        })
}
