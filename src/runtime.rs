use std::cell::Cell;
use std::sync::mpsc::{self, Receiver, RecvError, RecvTimeoutError};
use std::time::{Duration, Instant, SystemTime};

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Unified event type consumed by the app runner
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EntypeEvent {
    Key(KeyEvent),
    /// Bracketed paste; always rejected by the input gate
    Paste(String),
    Resize(u16, u16),
}

/// Source of terminal events (keyboard, paste, resize)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<EntypeEvent, RecvTimeoutError>;

    /// Block until an event arrives or the source is closed.
    fn recv(&self) -> Result<EntypeEvent, RecvError>;
}

/// Production event source using crossterm
pub struct CrosstermEventSource {
    rx: Receiver<EntypeEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || loop {
            let ev = match event::read() {
                Ok(CtEvent::Key(key)) if key.kind == KeyEventKind::Press => EntypeEvent::Key(key),
                Ok(CtEvent::Paste(text)) => EntypeEvent::Paste(text),
                Ok(CtEvent::Resize(w, h)) => EntypeEvent::Resize(w, h),
                Ok(_) => continue,
                Err(_) => break,
            };
            if tx.send(ev).is_err() {
                break;
            }
        });

        Self { rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<EntypeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn recv(&self) -> Result<EntypeEvent, RecvError> {
        self.rx.recv()
    }
}

/// Test event source for unit tests
pub struct TestEventSource {
    rx: Receiver<EntypeEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<EntypeEvent>) -> Self {
        Self { rx }
    }
}

impl EventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<EntypeEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn recv(&self) -> Result<EntypeEvent, RecvError> {
        self.rx.recv()
    }
}

/// Source of wall-clock timestamps and monotonic instants
pub trait Clock {
    fn now(&self) -> SystemTime;
    fn instant(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> SystemTime {
        SystemTime::now()
    }

    fn instant(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to
#[derive(Debug)]
pub struct ManualClock {
    wall: SystemTime,
    base: Instant,
    offset: Cell<Duration>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            wall: SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000),
            base: Instant::now(),
            offset: Cell::new(Duration::ZERO),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.offset.set(self.offset.get() + by);
    }

    pub fn elapsed(&self) -> Duration {
        self.offset.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> SystemTime {
        self.wall + self.offset.get()
    }

    fn instant(&self) -> Instant {
        self.base + self.offset.get()
    }
}

/// Cancellable one-shot deadline. Arming replaces any pending deadline.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Timer {
    deadline: Option<Instant>,
}

impl Timer {
    pub fn arm(&mut self, now: Instant, after: Duration) {
        self.deadline = Some(now + after);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Disarms and returns true once the deadline has passed
    pub fn fire_if_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }
}

/// Earliest of a set of optional deadlines
pub fn earliest<I: IntoIterator<Item = Option<Instant>>>(deadlines: I) -> Option<Instant> {
    deadlines.into_iter().flatten().min()
}

/// What woke the runner up
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Wakeup {
    Event(EntypeEvent),
    /// The requested timeout expired; a timer is due
    Timeout,
    /// The event source is gone
    Closed,
}

/// Runner that advances the application one event or timer at a time
pub struct Runner<E: EventSource> {
    event_source: E,
}

impl<E: EventSource> Runner<E> {
    pub fn new(event_source: E) -> Self {
        Self { event_source }
    }

    /// Blocks until the next event, or until `timeout` if one is given
    pub fn step(&self, timeout: Option<Duration>) -> Wakeup {
        match timeout {
            Some(timeout) => match self.event_source.recv_timeout(timeout) {
                Ok(ev) => Wakeup::Event(ev),
                Err(RecvTimeoutError::Timeout) => Wakeup::Timeout,
                Err(RecvTimeoutError::Disconnected) => Wakeup::Closed,
            },
            None => match self.event_source.recv() {
                Ok(ev) => Wakeup::Event(ev),
                Err(RecvError) => Wakeup::Closed,
            },
        }
    }

    /// Like `step`, but computes the timeout from an absolute deadline
    pub fn step_until(&self, deadline: Option<Instant>, now: Instant) -> Wakeup {
        self.step(deadline.map(|d| d.saturating_duration_since(now)))
    }
}
