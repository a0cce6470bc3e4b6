use crate::prompt::Prompt;
use crate::stats::Statistics;
use std::time::SystemTime;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Active,
    Finished,
}

/// One run of the typing test against a single prompt
#[derive(Debug, Clone)]
pub struct Session {
    prompt: Prompt,
    typed: String,
    typed_len: usize,
    started_at: Option<SystemTime>,
    ended_at: Option<SystemTime>,
    shake_nonce: u64,
}

impl Session {
    pub fn new(prompt: Prompt) -> Self {
        Self {
            prompt,
            typed: String::new(),
            typed_len: 0,
            started_at: None,
            ended_at: None,
            shake_nonce: 0,
        }
    }

    pub fn prompt(&self) -> &Prompt {
        &self.prompt
    }

    pub fn typed(&self) -> &str {
        &self.typed
    }

    /// Length of the typed text in chars
    pub fn typed_len(&self) -> usize {
        self.typed_len
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<SystemTime> {
        self.ended_at
    }

    pub fn shake_nonce(&self) -> u64 {
        self.shake_nonce
    }

    pub fn phase(&self) -> SessionPhase {
        match (self.started_at, self.ended_at) {
            (None, _) => SessionPhase::Idle,
            (Some(_), None) => SessionPhase::Active,
            (Some(_), Some(_)) => SessionPhase::Finished,
        }
    }

    pub fn has_started(&self) -> bool {
        self.started_at.is_some()
    }

    pub fn is_active(&self) -> bool {
        self.started_at.is_some() && self.ended_at.is_none()
    }

    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Whether the typed text covers the whole prompt
    pub fn reached_end(&self) -> bool {
        self.typed_len >= self.prompt.len()
    }

    pub fn statistics(&self, now: SystemTime) -> Statistics {
        Statistics::compute(
            &self.prompt,
            &self.typed,
            self.started_at,
            self.ended_at,
            now,
        )
    }

    pub(crate) fn set_typed(&mut self, typed: String) {
        self.typed_len = typed.chars().count();
        self.typed = typed;
    }

    pub(crate) fn bump_shake(&mut self) -> u64 {
        self.shake_nonce += 1;
        self.shake_nonce
    }

    /// Idle -> Active. Returns false if the session had already started.
    pub fn start(&mut self, now: SystemTime) -> bool {
        if self.started_at.is_some() {
            return false;
        }
        self.started_at = Some(now);
        debug!("session started");
        true
    }

    /// Active -> Finished, only once the typed text covers the prompt
    pub fn finish(&mut self, now: SystemTime) -> bool {
        if !self.is_active() || !self.reached_end() {
            return false;
        }
        self.ended_at = Some(now);
        debug!(typed = self.typed_len, "session finished");
        true
    }

    /// Finished -> Active, once text was deleted below the prompt length
    pub fn resume(&mut self) -> bool {
        if !self.is_finished() || self.reached_end() {
            return false;
        }
        self.ended_at = None;
        debug!(typed = self.typed_len, "session resumed");
        true
    }

    /// Any phase -> Idle with a fresh prompt
    pub fn restart(&mut self, prompt: Prompt) {
        *self = Session::new(prompt);
        debug!(prompt_len = self.prompt.len(), "session restarted");
    }
}
