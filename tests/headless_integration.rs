use std::sync::mpsc;
use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use entype::app::App;
use entype::config::Config;
use entype::prompt::{PromptGenerator, WordBank};
use entype::runtime::{Clock, EntypeEvent, ManualClock, Runner, TestEventSource, Wakeup};
use entype::session::SessionPhase;

fn headless_app(words: usize) -> App<ManualClock> {
    let generator = PromptGenerator::with_seed(WordBank::common().unwrap(), 42);
    let config = Config {
        number_of_words: words,
        ..Config::default()
    };
    let mut app = App::new(config, generator, ManualClock::new());
    app.resize(80, 24);
    app
}

fn key(c: char) -> EntypeEvent {
    EntypeEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
}

// Drives the app the way main does: wait for the earliest deadline, then
// dispatch whatever woke us up.
fn pump(app: &mut App<ManualClock>, runner: &Runner<TestEventSource>, max_steps: u32) {
    for _ in 0..max_steps {
        let deadline = app.next_deadline();
        match runner.step_until(deadline, app.clock().instant()) {
            Wakeup::Event(event) => {
                app.clock().advance(Duration::from_millis(100));
                app.handle_event(event);
            }
            Wakeup::Timeout => app.on_timeout(),
            Wakeup::Closed => break,
        }
        if app.should_quit() {
            break;
        }
    }
}

#[test]
fn headless_typing_flow_completes() {
    let mut app = headless_app(3);
    let prompt = app.session().prompt().as_str().to_string();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx));
    for c in prompt.chars() {
        tx.send(key(c)).unwrap();
    }
    drop(tx);

    pump(&mut app, &runner, 1_000);

    assert_eq!(app.session().phase(), SessionPhase::Finished);
    let stats = app.stats();
    assert_eq!(stats.correct, prompt.chars().count());
    assert_eq!(stats.accuracy, 100.0);
    assert_eq!(stats.progress, 1.0);
    // first keystroke starts the clock, every later one adds 100ms
    assert_eq!(stats.elapsed_ms, (prompt.chars().count() as u64 - 1) * 100);
    assert!(stats.wpm > 0.0);
    assert!(!app.is_ticking());
}

#[test]
fn headless_paste_and_quit() {
    let mut app = headless_app(3);

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx));
    tx.send(EntypeEvent::Paste(app.session().prompt().as_str().to_string()))
        .unwrap();
    tx.send(EntypeEvent::Key(KeyEvent::new(
        KeyCode::Char('c'),
        KeyModifiers::CONTROL,
    )))
    .unwrap();
    tx.send(key('x')).unwrap();

    pump(&mut app, &runner, 10);

    assert!(app.should_quit());
    assert_eq!(app.session().typed(), "");
    assert_eq!(app.session().phase(), SessionPhase::Idle);
}

#[test]
fn headless_typing_indicator_goes_quiet() {
    let mut app = headless_app(3);
    let first = app.session().prompt().char_at(0).unwrap();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx));
    tx.send(key(first)).unwrap();

    // one event, then timeouts until the typing quiet period is over
    pump(&mut app, &runner, 1);
    assert!(app.is_typing());

    let quiet_at = app.clock().instant() + Config::default().typing_quiet();
    while app.clock().instant() < quiet_at {
        app.clock().advance(Config::default().frame_interval());
        assert_eq!(
            runner.step_until(Some(app.clock().instant()), app.clock().instant()),
            Wakeup::Timeout
        );
        app.on_timeout();
    }

    assert!(!app.is_typing());
    assert_eq!(app.session().phase(), SessionPhase::Active);
    assert!(app.is_ticking());
}

#[test]
fn headless_resize_keeps_session() {
    let mut app = headless_app(8);
    let prompt = app.session().prompt().as_str().to_string();

    let (tx, rx) = mpsc::channel();
    let runner = Runner::new(TestEventSource::new(rx));
    for c in prompt.chars().take(5) {
        tx.send(key(c)).unwrap();
    }
    tx.send(EntypeEvent::Resize(30, 12)).unwrap();
    drop(tx);

    pump(&mut app, &runner, 100);

    assert_eq!(app.session().typed_len(), 5);
    let layout = app.layout().unwrap();
    assert_eq!(layout.container().width, 30 - 2 * entype::ui::HORIZONTAL_MARGIN);
    assert!(app.caret().visible);
}
