use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{DisableBracketedPaste, EnableBracketedPaste},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use entype::{
    app::App,
    app_dirs::AppDirs,
    config::{Config, ConfigStore, FileConfigStore},
    prompt::{PromptGenerator, WordBank},
    runtime::{earliest, Clock, CrosstermEventSource, Runner, SystemClock, Wakeup},
    store::{StoreError, User, UserStore},
    ui::{self, ShakeFlash},
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::File,
    io::{self, stdin, Write},
    path::PathBuf,
    sync::Arc,
    time::Instant,
};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "ENTYPE_LOG";

/// typing speed test tui with live wpm, accuracy and progress
#[derive(Parser, Debug)]
#[clap(
    version,
    about,
    long_about = "A typing speed test for the terminal. Type the prompt; wpm, accuracy, elapsed time and progress update live. Also manages a small sqlite users table."
)]
pub struct Cli {
    /// number of words to use in test (defaults to the config file, then 50)
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,

    /// path to a json config file
    #[clap(long)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// manage the users table
    Users {
        /// database file (defaults to the config file, then the state directory)
        #[clap(long)]
        db: Option<PathBuf>,

        /// print results as json
        #[clap(long)]
        json: bool,

        #[clap(subcommand)]
        action: UserAction,
    },
}

#[derive(Subcommand, Debug, PartialEq)]
enum UserAction {
    /// list all users, newest first
    List,
    /// add a user and print its id
    Add { name: String, email: String },
    /// show one user
    Get { id: i64 },
    /// change a user's name and email
    Update { id: i64, name: String, email: String },
    /// remove a user
    Delete { id: i64 },
}

impl Cli {
    fn load_config(&self) -> Config {
        let store = match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        };
        let mut config = store.load();
        if let Some(n) = self.number_of_words {
            config.number_of_words = n;
        }
        config
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.command.is_some() {
        init_logging(LogTarget::Stderr);
    } else {
        if !stdin().is_tty() {
            let mut cmd = Cli::command();
            cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
        }
        init_logging(LogTarget::File);
    }
    let config = cli.load_config();

    match cli.command {
        Some(Command::Users { db, json, action }) => {
            let path = db.unwrap_or_else(|| config.database_path());
            let mut out = io::stdout().lock();
            run_users(&path, json, action, &mut out)
        }
        None => run_tui(config),
    }
}

enum LogTarget {
    File,
    Stderr,
}

fn init_logging(target: LogTarget) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match target {
        LogTarget::Stderr => {
            let _ = builder.with_writer(io::stderr).try_init();
        }
        LogTarget::File => {
            // stdout belongs to the terminal UI; without a log file, stay quiet
            let Some(file) = AppDirs::log_path().and_then(|path| open_log(&path).ok()) else {
                return;
            };
            let _ = builder
                .with_ansi(false)
                .with_writer(Arc::new(file))
                .try_init();
        }
    }
}

fn open_log(path: &std::path::Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    File::options().create(true).append(true).open(path)
}

fn run_tui(config: Config) -> Result<(), Box<dyn Error>> {
    let generator = PromptGenerator::new(WordBank::common()?);
    let mut app = App::new(config, generator, SystemClock);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);
    app.shutdown();

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableBracketedPaste,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;

    if let Err(e) = &result {
        error!(error = %e, "typing session aborted");
    }
    result
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App<SystemClock>,
) -> Result<(), Box<dyn Error>> {
    let size = terminal.size()?;
    app.resize(size.width, size.height);

    let runner = Runner::new(CrosstermEventSource::new());
    let mut flash = ShakeFlash::default();
    info!(words = app.session().prompt().as_str().split(' ').count(), "typing session ready");

    loop {
        terminal.draw(|f| ui::draw(f, app, &flash))?;

        let deadline = earliest([app.next_deadline(), flash.deadline()]);
        match runner.step_until(deadline, Instant::now()) {
            Wakeup::Event(event) => app.handle_event(event),
            Wakeup::Timeout => {
                app.on_timeout();
                flash.on_timer(app.clock().instant());
            }
            Wakeup::Closed => break,
        }

        if app.should_quit() {
            break;
        }
        flash.observe(app.session().shake_nonce(), app.clock().instant());
    }

    Ok(())
}

fn run_users<W: Write>(
    path: &std::path::Path,
    json: bool,
    action: UserAction,
    out: &mut W,
) -> Result<(), Box<dyn Error>> {
    let store = UserStore::open(path)?;
    store.initialize()?;

    match action {
        UserAction::List => {
            let users = store.all_users()?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&users)?)?;
            } else {
                for user in &users {
                    writeln!(out, "{}", user_line(user))?;
                }
            }
        }
        UserAction::Add { name, email } => {
            let id = store
                .create_user(&name, &email)
                .map_err(|e| taken_email(e, &email))?;
            if json {
                writeln!(out, "{}", serde_json::json!({ "id": id }))?;
            } else {
                writeln!(out, "{id}")?;
            }
        }
        UserAction::Get { id } => {
            let user = store.user_by_id(id)?.ok_or(StoreError::NotFound(id))?;
            if json {
                writeln!(out, "{}", serde_json::to_string_pretty(&user)?)?;
            } else {
                writeln!(out, "{}", user_line(&user))?;
            }
        }
        UserAction::Update { id, name, email } => {
            store
                .update_user(id, &name, &email)
                .map_err(|e| taken_email(e, &email))?;
            info!(id, "user updated");
        }
        UserAction::Delete { id } => {
            store.delete_user(id)?;
            info!(id, "user deleted");
        }
    }

    store.close()?;
    Ok(())
}

fn user_line(user: &User) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        user.id,
        user.name,
        user.email,
        user.created_at.format("%Y-%m-%d %H:%M:%S")
    )
}

fn taken_email(e: StoreError, email: &str) -> Box<dyn Error> {
    if e.is_duplicate_email() {
        format!("email {email} is already taken").into()
    } else {
        e.into()
    }
}
