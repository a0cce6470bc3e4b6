use crate::caret::{Caret, CaretLocator, CaretMetrics};
use crate::config::Config;
use crate::input::{InputEffects, InputGate, Rejected};
use crate::layout::TextLayout;
use crate::prompt::PromptGenerator;
use crate::runtime::{earliest, Clock, EntypeEvent, SystemClock, Timer};
use crate::session::Session;
use crate::stats::Statistics;
use crate::ui;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::layout::Rect;
use std::time::{Instant, SystemTime};
use tracing::{debug, info};

/// Everything one running typing test needs, driven one event at a time
#[derive(Debug)]
pub struct App<C: Clock = SystemClock> {
    config: Config,
    clock: C,
    generator: PromptGenerator,
    session: Session,
    gate: InputGate,
    frame_ticker: Timer,
    caret: CaretLocator,
    viewport: Option<Rect>,
    layout: Option<TextLayout>,
    stats: Statistics,
    now: SystemTime,
    should_quit: bool,
}

impl<C: Clock> App<C> {
    pub fn new(config: Config, mut generator: PromptGenerator, clock: C) -> Self {
        let session = Session::new(generator.generate(config.number_of_words));
        let now = clock.now();

        let mut app = Self {
            gate: InputGate::new(config.typing_quiet()),
            config,
            clock,
            generator,
            session,
            frame_ticker: Timer::default(),
            caret: CaretLocator::new(CaretMetrics::terminal()),
            viewport: None,
            layout: None,
            stats: Statistics::default(),
            now,
            should_quit: false,
        };
        app.refresh();
        app
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stats(&self) -> &Statistics {
        &self.stats
    }

    pub fn caret(&self) -> Caret {
        self.caret.caret()
    }

    pub fn layout(&self) -> Option<&TextLayout> {
        self.layout.as_ref()
    }

    pub fn generator(&self) -> &PromptGenerator {
        &self.generator
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn is_typing(&self) -> bool {
        self.gate.is_typing()
    }

    pub fn is_ticking(&self) -> bool {
        self.frame_ticker.is_armed()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn handle_event(&mut self, event: EntypeEvent) {
        match event {
            EntypeEvent::Key(key) => self.handle_key(key),
            EntypeEvent::Paste(text) => {
                self.handle_paste(&text);
            }
            EntypeEvent::Resize(width, height) => self.resize(width, height),
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let alt = key.modifiers.contains(KeyModifiers::ALT);

        match key.code {
            KeyCode::Esc => self.restart(),
            KeyCode::Char('c') if ctrl => {
                info!("quit requested");
                self.should_quit = true;
            }
            KeyCode::Char('w') | KeyCode::Char('h') if ctrl => {
                self.edit(without_last_word(self.session.typed()));
            }
            KeyCode::Backspace if ctrl || alt => {
                self.edit(without_last_word(self.session.typed()));
            }
            KeyCode::Backspace => {
                let mut next = self.session.typed().to_string();
                next.pop();
                self.edit(next);
            }
            KeyCode::Char(c) if !ctrl && !alt => {
                let mut next = self.session.typed().to_string();
                next.push(c);
                self.edit(next);
            }
            _ => {}
        }
    }

    /// Pasted text never reaches the session
    pub fn handle_paste(&mut self, text: &str) -> Rejected {
        debug!(len = text.len(), "paste ignored");
        self.gate.on_paste()
    }

    /// Replace the typed text. Unchanged text is not an input event.
    pub fn edit(&mut self, next: String) -> InputEffects {
        if next == self.session.typed() {
            return InputEffects::default();
        }

        self.now = self.clock.now();
        let instant = self.clock.instant();
        let effects = self.gate.on_input(&mut self.session, next, self.now, instant);
        if effects.finished {
            info!(
                wpm = self.session.statistics(self.now).wpm,
                "typing test finished"
            );
        }

        self.sync_frame_ticker(instant);
        self.refresh();
        effects
    }

    pub fn restart(&mut self) {
        self.gate.on_escape(
            &mut self.session,
            &mut self.generator,
            self.config.number_of_words,
        );
        self.now = self.clock.now();
        self.sync_frame_ticker(self.clock.instant());
        self.relayout();
        self.refresh();
    }

    /// Terminal resized: reflow the prompt and move the caret with it
    pub fn resize(&mut self, width: u16, height: u16) {
        self.relayout_in(Rect::new(0, 0, width, height));
        self.refresh();
    }

    /// Earliest pending timer, if any
    pub fn next_deadline(&self) -> Option<Instant> {
        earliest([self.frame_ticker.deadline(), self.gate.typing_deadline()])
    }

    /// Fire whatever timers are due
    pub fn on_timeout(&mut self) {
        let instant = self.clock.instant();
        self.gate.on_timer(instant);

        if self.frame_ticker.fire_if_due(instant) {
            self.now = self.clock.now();
            self.refresh();
            self.sync_frame_ticker(instant);
        }
    }

    pub fn shutdown(&mut self) {
        self.gate.teardown();
        self.frame_ticker.cancel();
    }

    fn sync_frame_ticker(&mut self, instant: Instant) {
        if !self.session.is_active() {
            self.frame_ticker.cancel();
        } else if !self.frame_ticker.is_armed() {
            self.frame_ticker.arm(instant, self.config.frame_interval());
        }
    }

    fn relayout(&mut self) {
        if let Some(viewport) = self.viewport {
            self.relayout_in(viewport);
        }
    }

    fn relayout_in(&mut self, viewport: Rect) {
        let container = ui::screen_areas(viewport).prompt;
        self.viewport = Some(viewport);
        self.layout = Some(TextLayout::wrap(self.session.prompt(), container));
    }

    fn refresh(&mut self) {
        self.stats = self.session.statistics(self.now);

        let prompt = self.session.prompt();
        let typed_len = self.session.typed_len();
        match &self.layout {
            Some(layout) => self.caret.locate(
                prompt,
                typed_len,
                &layout.glyph_boxes(),
                layout.end_marker_box(),
                layout.container_box(),
            ),
            None => self.caret.locate(prompt, typed_len, &[], None, None),
        };
    }
}

/// Drop trailing spaces and then the last word, keeping the space before it
fn without_last_word(text: &str) -> String {
    let trimmed = text.trim_end_matches(' ');
    match trimmed.rfind(' ') {
        Some(idx) => trimmed[..=idx].to_string(),
        None => String::new(),
    }
}
