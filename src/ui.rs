use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, LineGauge, Paragraph, Widget},
    Frame,
};
use std::time::{Duration, Instant};

use crate::{
    app::App,
    runtime::{Clock, Timer},
    session::SessionPhase,
    util::{round_to, unit_ratio},
};

pub const HORIZONTAL_MARGIN: u16 = 4;
pub const VERTICAL_MARGIN: u16 = 2;

/// How long the border stays red after a mistyped key
pub const SHAKE_FLASH_MS: u64 = 180;

pub struct ScreenAreas {
    pub stats: Rect,
    pub progress: Rect,
    pub prompt: Rect,
    pub help: Rect,
}

/// Split the terminal into the typing screen's regions.
///
/// The app uses the same split to know where the prompt container sits.
pub fn screen_areas(area: Rect) -> ScreenAreas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // stats
            Constraint::Length(1), // progress
            Constraint::Length(1), // padding
            Constraint::Min(1),    // prompt
            Constraint::Length(1), // help
        ])
        .split(area);

    ScreenAreas {
        stats: chunks[0],
        progress: chunks[1],
        prompt: chunks[3],
        help: chunks[4],
    }
}

/// Turns shake nonce changes into a short-lived flash
#[derive(Debug, Default)]
pub struct ShakeFlash {
    seen: u64,
    timer: Timer,
}

impl ShakeFlash {
    pub fn observe(&mut self, nonce: u64, now: Instant) {
        if nonce == self.seen {
            return;
        }
        self.seen = nonce;
        if nonce > 0 {
            self.timer.arm(now, Duration::from_millis(SHAKE_FLASH_MS));
        } else {
            self.timer.cancel();
        }
    }

    pub fn on_timer(&mut self, now: Instant) {
        self.timer.fire_if_due(now);
    }

    pub fn is_on(&self) -> bool {
        self.timer.is_armed()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }
}

pub struct TypingView<'a, C: Clock> {
    pub app: &'a App<C>,
    pub flash: bool,
}

pub fn draw<C: Clock>(f: &mut Frame, app: &App<C>, flash: &ShakeFlash) {
    f.render_widget(
        TypingView {
            app,
            flash: flash.is_on(),
        },
        f.area(),
    );
}

impl<C: Clock> Widget for TypingView<'_, C> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let app = self.app;
        let session = app.session();
        let stats = app.stats();

        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);

        let border_style = if self.flash {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" entype ")
            .render(area, buf);

        let areas = screen_areas(area);

        let phase_style = match session.phase() {
            SessionPhase::Idle => dim_style,
            SessionPhase::Active => Style::default().fg(Color::Yellow),
            SessionPhase::Finished => Style::default().fg(Color::Green).patch(bold_style),
        };
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{} wpm", round_to(stats.wpm, 0)), bold_style),
            Span::raw("   "),
            Span::styled(format!("{}% acc", round_to(stats.accuracy, 0)), bold_style),
            Span::raw("   "),
            Span::styled(format!("{:.1}s", stats.elapsed_secs()), bold_style),
            Span::raw("   "),
            Span::styled(session.phase().to_string(), phase_style),
        ]))
        .alignment(Alignment::Center)
        .render(areas.stats, buf);

        LineGauge::default()
            .ratio(unit_ratio(stats.progress))
            .label(format!("{:>3}%", round_to(stats.progress * 100.0, 0)))
            .filled_style(Style::default().fg(Color::Magenta))
            .unfilled_style(dim_style)
            .render(areas.progress, buf);

        render_prompt(app, areas.prompt, buf);

        let help = if session.is_finished() {
            "finished!  (esc) new prompt  (ctrl+c) quit"
        } else {
            "(esc) restart  (ctrl+w) delete word  (ctrl+c) quit"
        };
        Paragraph::new(Span::styled(help, dim_style.add_modifier(Modifier::ITALIC)))
            .alignment(Alignment::Center)
            .render(areas.help, buf);
    }
}

fn render_prompt<C: Clock>(app: &App<C>, area: Rect, buf: &mut Buffer) {
    let Some(layout) = app.layout() else {
        return;
    };
    let container = layout.container();

    let green_bold_style = Style::default().fg(Color::Green).add_modifier(Modifier::BOLD);
    let red_bold_style = Style::default().fg(Color::Red).add_modifier(Modifier::BOLD);
    let dim_bold_style = Style::default().add_modifier(Modifier::BOLD | Modifier::DIM);

    let fits = |x: u16, y: u16| x < area.right() && y < area.bottom();

    // characters past the end of the prompt are never drawn
    let mut typed = app.session().typed().chars();
    for (idx, expected) in app.session().prompt().chars().iter().enumerate() {
        let typed_char = typed.next();
        let Some(cell) = layout.cell(idx) else {
            continue;
        };
        let (x, y) = (container.x + cell.col, container.y + cell.row);
        if !fits(x, y) {
            continue;
        }

        let (symbol, style) = match typed_char {
            Some(c) if c == *expected => (*expected, green_bold_style),
            Some(_) if *expected == ' ' => ('·', red_bold_style),
            Some(_) => (*expected, red_bold_style),
            None => (*expected, dim_bold_style),
        };
        if let Some(buf_cell) = buf.cell_mut((x, y)) {
            buf_cell.set_char(symbol).set_style(style);
        }
    }

    // a space hanging past the last column puts the caret in the margin
    let frame = buf.area;
    let caret = app.caret();
    if caret.visible {
        let x = container.x.saturating_add(caret.x.max(0.0) as u16);
        let y = container.y.saturating_add(caret.y.max(0.0) as u16);
        let modifier = if app.is_typing() {
            Modifier::REVERSED
        } else {
            Modifier::REVERSED | Modifier::SLOW_BLINK
        };
        if x < frame.right() && y < area.bottom() {
            if let Some(buf_cell) = buf.cell_mut((x, y)) {
                buf_cell.set_style(Style::default().add_modifier(modifier));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::prompt::{PromptGenerator, WordBank};
    use crate::runtime::ManualClock;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn app(width: u16, height: u16) -> App<ManualClock> {
        let generator = PromptGenerator::with_seed(WordBank::common().unwrap(), 3);
        let config = Config {
            number_of_words: 4,
            ..Config::default()
        };
        let mut app = App::new(config, generator, ManualClock::new());
        app.resize(width, height);
        app
    }

    fn render(app: &App<ManualClock>, flash: bool, area: Rect) -> Buffer {
        let mut buf = Buffer::empty(area);
        TypingView { app, flash }.render(area, &mut buf);
        buf
    }

    #[test]
    fn test_screen_areas_respect_margins() {
        let areas = screen_areas(Rect::new(0, 0, 80, 24));

        assert_eq!(areas.stats, Rect::new(4, 2, 72, 1));
        assert_eq!(areas.progress.y, 3);
        assert_eq!(areas.prompt.y, 5);
        assert_eq!(areas.prompt.width, 72);
        assert_eq!(areas.help.y, 21);
    }

    #[test]
    fn test_prompt_drawn_at_layout_cells() {
        let app = app(80, 24);
        let area = Rect::new(0, 0, 80, 24);
        let buf = render(&app, false, area);

        let prompt = app.session().prompt();
        let first = buf.cell((4, 5)).unwrap();
        assert_eq!(first.symbol(), prompt.char_at(0).unwrap().to_string());
        assert!(first.modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_mistyped_char_is_red() {
        let mut app = app(80, 24);
        let expected = app.session().prompt().char_at(0).unwrap();
        let wrong = if expected == 'z' { 'q' } else { 'z' };
        app.handle_key(KeyEvent::new(KeyCode::Char(wrong), KeyModifiers::NONE));

        let buf = render(&app, false, Rect::new(0, 0, 80, 24));

        let cell = buf.cell((4, 5)).unwrap();
        assert_eq!(cell.fg, Color::Red);
        assert_eq!(cell.symbol(), expected.to_string());
    }

    #[test]
    fn test_flash_colors_border() {
        let app = app(80, 24);
        let buf = render(&app, true, Rect::new(0, 0, 80, 24));
        assert_eq!(buf.cell((0, 0)).unwrap().fg, Color::Red);

        let buf = render(&app, false, Rect::new(0, 0, 80, 24));
        assert_eq!(buf.cell((0, 0)).unwrap().fg, Color::DarkGray);
    }

    #[test]
    fn test_shake_flash_lifecycle() {
        let clock = ManualClock::new();
        let mut flash = ShakeFlash::default();

        flash.observe(0, clock.instant());
        assert!(!flash.is_on());

        flash.observe(1, clock.instant());
        assert!(flash.is_on());
        flash.observe(1, clock.instant());

        clock.advance(Duration::from_millis(SHAKE_FLASH_MS));
        flash.on_timer(clock.instant());
        assert!(!flash.is_on());
        assert_eq!(flash.deadline(), None);

        flash.observe(2, clock.instant());
        flash.observe(0, clock.instant());
        assert!(!flash.is_on());
    }

    #[test]
    fn test_caret_after_word_filling_the_row() {
        let bank = WordBank::from_words("edge", vec!["abcd".to_string()]).unwrap();
        let config = Config {
            number_of_words: 2,
            ..Config::default()
        };
        let mut app = App::new(config, PromptGenerator::with_seed(bank, 1), ManualClock::new());
        app.resize(12, 12);
        assert_eq!(app.layout().unwrap().container().width, 4);

        for c in "abcd".chars() {
            app.handle_key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE));
        }
        assert_eq!((app.caret().x, app.caret().y), (4.0, 0.0));

        let buf = render(&app, false, Rect::new(0, 0, 12, 12));
        let reversed: Vec<(u16, u16)> = (0..12)
            .flat_map(|y| (0..12).map(move |x| (x, y)))
            .filter(|&(x, y)| buf.cell((x, y)).unwrap().modifier.contains(Modifier::REVERSED))
            .collect();

        assert_eq!(reversed, vec![(8, 5)]);
        assert_eq!(buf.cell((7, 5)).unwrap().symbol(), "d");
        assert_eq!(buf.cell((7, 5)).unwrap().fg, Color::Green);
    }

    #[test]
    fn test_tiny_area_does_not_panic() {
        let app = app(3, 3);
        render(&app, false, Rect::new(0, 0, 3, 3));
    }
}
