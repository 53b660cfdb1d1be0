//! Deterministic backend scoring.
//!
//! Keyword cues in the query add points to backends according to their
//! capability profile. The highest total wins; ties go to the backend that
//! was declared first.

use aria_core::BackendCapabilities;
use regex_lite::Regex;
use std::fmt;
use std::sync::LazyLock;

use crate::input::ReasoningInput;

static REASONING_CUES: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)analyze|compare|synthesize|deduce|infer|reasoning|logic|problem").ok()
});
static VISION_CUES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)image|photo|visual|see|look|camera").ok());
static REAL_TIME_CUES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)current|now|live|real.time|latest").ok());
static CODE_CUES: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?i)code|program|script|function|algorithm").ok());

fn has_cue(cues: &LazyLock<Option<Regex>>, text: &str) -> bool {
    LazyLock::force(cues)
        .as_ref()
        .is_some_and(|re| re.is_match(text))
}

/// Serialized inputs longer than this favor the largest context window.
pub const LARGE_INPUT_CHARS: usize = 50_000;

const PREFERRED_BONUS: i32 = 2;
const REAL_TIME_BONUS: i32 = 3;
const LARGE_INPUT_BONUS: i32 = 2;
const REASONING_LADDER: [i32; 3] = [3, 2, 1];
const VISION_LADDER: [i32; 3] = [2, 2, 1];
const CODE_LADDER: [i32; 3] = [3, 2, 1];

/// Which cues a query carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryTraits {
    pub reasoning: bool,
    pub vision: bool,
    pub real_time: bool,
    pub code: bool,
    pub large_input: bool,
}

impl QueryTraits {
    pub fn detect(input: &ReasoningInput) -> Self {
        let query = input.query.as_str();
        Self {
            reasoning: has_cue(&REASONING_CUES, query),
            vision: input.vision.is_some() || has_cue(&VISION_CUES, query),
            real_time: has_cue(&REAL_TIME_CUES, query),
            code: has_cue(&CODE_CUES, query),
            large_input: input.serialized_len() > LARGE_INPUT_CHARS,
        }
    }
}

/// Per-backend totals in declaration order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreTable {
    entries: Vec<(String, i32)>,
}

impl ScoreTable {
    pub fn entries(&self) -> &[(String, i32)] {
        &self.entries
    }

    pub fn score(&self, id: &str) -> Option<i32> {
        self.entries.iter().find(|(b, _)| b == id).map(|(_, s)| *s)
    }

    /// Highest score; the earliest declared backend wins a tie.
    pub fn winner(&self) -> Option<&str> {
        let mut best: Option<&(String, i32)> = None;
        for entry in &self.entries {
            if best.is_none_or(|b| entry.1 > b.1) {
                best = Some(entry);
            }
        }
        best.map(|(id, _)| id.as_str())
    }

    fn add(&mut self, index: usize, points: i32) {
        self.entries[index].1 += points;
    }
}

impl fmt::Display for ScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (id, score) in &self.entries {
            writeln!(f, "{id:<12} {score}")?;
        }
        Ok(())
    }
}

/// Score every backend for a query.
///
/// `backends` is in declaration order. Ladders award points by rank within
/// the relevant capability: the best gets the first rung, the next the
/// second, everyone after that the last.
pub fn score_backends(
    backends: &[(&str, BackendCapabilities)],
    traits: QueryTraits,
    preferred: &str,
) -> ScoreTable {
    let mut table = ScoreTable {
        entries: backends.iter().map(|(id, _)| (id.to_string(), 0)).collect(),
    };

    if let Some(i) = backends.iter().position(|(id, _)| *id == preferred) {
        table.add(i, PREFERRED_BONUS);
    }

    if traits.reasoning {
        let ranked = rank_by(backends, |c| Some(c.reasoning));
        apply_ladder(&mut table, &ranked, &REASONING_LADDER);
    }

    if traits.vision {
        let ranked = rank_by(backends, |c| c.vision.then_some(c.reasoning));
        apply_ladder(&mut table, &ranked, &VISION_LADDER);
    }

    if traits.real_time {
        for (i, (_, caps)) in backends.iter().enumerate() {
            if caps.real_time_data {
                table.add(i, REAL_TIME_BONUS);
            }
        }
    }

    if traits.code {
        let ranked = rank_by(backends, |c| Some(c.code_generation));
        apply_ladder(&mut table, &ranked, &CODE_LADDER);
    }

    if traits.large_input {
        let largest = backends
            .iter()
            .enumerate()
            .fold(None::<(usize, u32)>, |best, (i, (_, caps))| match best {
                Some((_, window)) if window >= caps.context_window => best,
                _ => Some((i, caps.context_window)),
            });
        if let Some((i, _)) = largest {
            table.add(i, LARGE_INPUT_BONUS);
        }
    }

    table
}

/// Indices of eligible backends, best first. Equal keys keep declaration order.
fn rank_by(
    backends: &[(&str, BackendCapabilities)],
    key: impl Fn(&BackendCapabilities) -> Option<u8>,
) -> Vec<usize> {
    let mut eligible: Vec<(usize, u8)> = backends
        .iter()
        .enumerate()
        .filter_map(|(i, (_, caps))| key(caps).map(|k| (i, k)))
        .collect();
    eligible.sort_by(|a, b| b.1.cmp(&a.1));
    eligible.into_iter().map(|(i, _)| i).collect()
}

fn apply_ladder(table: &mut ScoreTable, ranked: &[usize], ladder: &[i32]) {
    for (rank, &i) in ranked.iter().enumerate() {
        let points = ladder.get(rank).or(ladder.last()).copied().unwrap_or(0);
        table.add(i, points);
    }
}
