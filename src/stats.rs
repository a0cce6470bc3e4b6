use crate::prompt::Prompt;
use crate::util::round_to;
use std::time::SystemTime;

/// Characters per word when converting keystrokes to words-per-minute
pub const CHARS_PER_WORD: f64 = 5.0;

/// Live statistics for a session. Derived on demand, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Statistics {
    pub correct: usize,
    /// Mismatches inside the prompt plus every extra character
    pub incorrect: usize,
    /// Characters typed past the end of the prompt
    pub extra: usize,
    /// Total compared characters
    pub total: usize,
    pub accuracy: f64,
    pub elapsed_ms: u64,
    pub wpm: f64,
    /// Fraction of the prompt covered by the typed text, in [0, 1]
    pub progress: f64,
}

impl Statistics {
    pub fn compute(
        prompt: &Prompt,
        typed: &str,
        started_at: Option<SystemTime>,
        ended_at: Option<SystemTime>,
        now: SystemTime,
    ) -> Self {
        let expected = prompt.chars();

        let total = typed.chars().count();
        let mut correct = 0;
        let mut mismatched = 0;
        for (idx, c) in typed.chars().enumerate() {
            match expected.get(idx) {
                Some(e) if *e == c => correct += 1,
                Some(_) => mismatched += 1,
                None => {}
            }
        }
        let extra = total.saturating_sub(expected.len());
        let incorrect = mismatched + extra;

        let accuracy = if total == 0 {
            100.0
        } else {
            correct as f64 / total as f64 * 100.0
        };

        let elapsed_ms = match (started_at, ended_at) {
            (Some(start), Some(end)) => time_diff_ms(start, end),
            (Some(start), None) => time_diff_ms(start, now),
            (None, _) => 0,
        };

        let minutes = elapsed_ms as f64 / 60_000.0;
        let wpm = if minutes > 0.0 {
            (correct as f64 / CHARS_PER_WORD) / minutes
        } else {
            0.0
        };

        let progress = if expected.is_empty() {
            if total > 0 {
                1.0
            } else {
                0.0
            }
        } else {
            (total as f64 / expected.len() as f64).min(1.0)
        };

        Self {
            correct,
            incorrect,
            extra,
            total,
            accuracy,
            elapsed_ms,
            wpm,
            progress,
        }
    }

    /// Elapsed seconds rounded to one decimal
    pub fn elapsed_secs(&self) -> f64 {
        round_to(self.elapsed_ms as f64 / 1000.0, 1)
    }
}

/// Milliseconds from `start` to `end`, zero if `end` is earlier
pub fn time_diff_ms(start: SystemTime, end: SystemTime) -> u64 {
    end.duration_since(start).unwrap_or_default().as_millis() as u64
}
