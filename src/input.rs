use crate::prompt::{Prompt, PromptGenerator};
use crate::runtime::Timer;
use crate::session::Session;
use std::time::{Duration, Instant, SystemTime};
use tracing::debug;

/// Quiet period after the last keystroke before the caret starts blinking again
pub const TYPING_QUIET_MS: u64 = 450;

/// Session transitions and signals caused by one input event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputEffects {
    pub started: bool,
    pub finished: bool,
    pub resumed: bool,
    /// The last added character did not match the prompt
    pub shook: bool,
}

/// Why an input event was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum Rejected {
    Paste,
    Drop,
}

/// Sits between raw input events and the session
#[derive(Debug, Clone)]
pub struct InputGate {
    typing: bool,
    typing_timer: Timer,
    quiet: Duration,
}

impl Default for InputGate {
    fn default() -> Self {
        Self::new(Duration::from_millis(TYPING_QUIET_MS))
    }
}

impl InputGate {
    pub fn new(quiet: Duration) -> Self {
        Self {
            typing: false,
            typing_timer: Timer::default(),
            quiet,
        }
    }

    /// True while keystrokes are arriving faster than the quiet period
    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn typing_deadline(&self) -> Option<Instant> {
        self.typing_timer.deadline()
    }

    /// Accept `next` as the new typed text and drive the session from it
    pub fn on_input(
        &mut self,
        session: &mut Session,
        next: String,
        now: SystemTime,
        instant: Instant,
    ) -> InputEffects {
        self.typing = true;
        self.typing_timer.arm(instant, self.quiet);

        let previous_len = session.typed_len();
        let shook = added_mismatch(session.prompt(), previous_len, &next);
        session.set_typed(next);

        let mut effects = InputEffects::default();
        if session.typed_len() > 0 && !session.has_started() {
            effects.started = session.start(now);
        }
        if session.reached_end() {
            effects.finished = session.finish(now);
        } else if session.is_finished() {
            effects.resumed = session.resume();
        }
        if shook {
            let nonce = session.bump_shake();
            debug!(nonce, "mismatched keystroke");
        }
        effects.shook = shook;

        effects
    }

    pub fn on_paste(&self) -> Rejected {
        debug!("rejected paste");
        Rejected::Paste
    }

    pub fn on_drop(&self) -> Rejected {
        debug!("rejected drop");
        Rejected::Drop
    }

    /// Restart with a freshly generated prompt, whatever the current phase
    pub fn on_escape(
        &mut self,
        session: &mut Session,
        generator: &mut PromptGenerator,
        word_count: usize,
    ) {
        session.restart(generator.generate(word_count));
    }

    /// Clears the typing flag once the quiet period has elapsed
    pub fn on_timer(&mut self, instant: Instant) -> bool {
        if self.typing_timer.fire_if_due(instant) {
            self.typing = false;
            return true;
        }
        false
    }

    pub fn teardown(&mut self) {
        self.typing_timer.cancel();
        self.typing = false;
    }
}

/// Whether `next` grew past `previous_len` and its new last char misses the prompt
fn added_mismatch(prompt: &Prompt, previous_len: usize, next: &str) -> bool {
    let next_len = next.chars().count();
    if next_len <= previous_len {
        return false;
    }
    let last = next.chars().last();
    last != prompt.char_at(next_len - 1)
}
