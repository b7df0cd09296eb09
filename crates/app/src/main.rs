use std::fmt;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use quiz_core::model::TopicFilter;
use services::sessions::parse_choice;
use services::{
    Clock, IntervalTicks, MAX_IMPORT_BYTES, QuizApp, QuizAppError, SessionPhase, SubmitResponse,
    TickResponse,
};
use storage::repository::Storage;

mod command;
mod render;

use command::{Command, HELP, Toggle};

/// Session-scoped storage: lives as long as the process keeps a connection.
const DEFAULT_DB_URL: &str = "sqlite::memory:";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- [--db <sqlite_url>] [--file <questions.json>] [--topic <name>]");
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --db {DEFAULT_DB_URL}  (forgotten on exit)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  QUIZ_DB_URL, QUIZ_FILE, QUIZ_LOG (falls back to RUST_LOG, default `warn`)");
}

struct Args {
    db_url: String,
    file: Option<String>,
    topic: Option<String>,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Option<Self>, ArgsError> {
        let mut db_url = std::env::var("QUIZ_DB_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.into(), normalize_sqlite_url);
        let mut file = std::env::var("QUIZ_FILE")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let mut topic = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--file" => file = Some(require_value(args, "--file")?),
                "--topic" => topic = Some(require_value(args, "--topic")?),
                "--help" | "-h" => return Ok(None),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Some(Self {
            db_url,
            file,
            topic,
        }))
    }
}

fn is_memory_url(raw: &str) -> bool {
    raw == "sqlite::memory:" || raw.contains("mode=memory")
}

fn normalize_sqlite_url(raw: String) -> String {
    if is_memory_url(&raw) || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = std::path::Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if is_memory_url(db_url) {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }

    Ok(())
}

fn init_tracing() {
    let filter = std::env::var("QUIZ_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "warn".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Read a question file and hand it to the app; problems are printed, not
/// propagated.
async fn import_file(app: &mut QuizApp, path: &str) {
    match tokio::fs::metadata(path).await {
        Ok(meta) if meta.len() > MAX_IMPORT_BYTES as u64 => {
            println!(
                "{path} is too large ({} bytes, max {MAX_IMPORT_BYTES})",
                meta.len()
            );
            return;
        }
        Ok(_) => {}
        Err(err) => {
            println!("cannot read {path}: {err}");
            return;
        }
    }

    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(err) => {
            println!("cannot read {path}: {err}");
            return;
        }
    };
    match app.load_questions(&raw) {
        Ok(summary) => {
            let topics: Vec<String> = summary.topics.iter().map(ToString::to_string).collect();
            println!(
                "Loaded {} questions. Topics: {}",
                summary.questions,
                topics.join(", ")
            );
        }
        Err(err) => println!("Import failed: {err}"),
    }
}

enum Flow {
    Continue,
    Quit,
}

async fn execute(app: &mut QuizApp, command: Command) -> Result<Flow, QuizAppError> {
    let output = match command {
        Command::Help => HELP.to_string(),
        Command::Quit => return Ok(Flow::Quit),
        Command::Show => render::screen(&app.screen()),
        Command::Load(path) => {
            import_file(app, &path).await;
            return Ok(Flow::Continue);
        }
        Command::Topics => {
            let topics: Vec<String> = app.topics().iter().map(ToString::to_string).collect();
            format!(
                "Topics: {} (selected: {})",
                topics.join(", "),
                app.settings().selected_topic()
            )
        }
        Command::Topic(name) => {
            let stats = app.select_topic(TopicFilter::parse(&name)).await;
            format!(
                "Topic `{}` selects {} of {} questions ({}%).",
                app.settings().selected_topic(),
                stats.selected,
                stats.total,
                stats.percent()
            )
        }
        Command::Start => render::screen(&app.start_session()?),
        Command::RetryWrong => render::screen(&app.retry_wrong()?),
        Command::RetryAll => render::screen(&app.retry_all()?),
        Command::Home => render::screen(&app.go_home()),
        Command::Choice(raw) => {
            let count = app
                .session()
                .working()
                .get(app.session().position())
                .map_or(0, |item| item.question().answer_count());
            if app.phase() != SessionPhase::Active {
                format!("unknown command: {raw} (try `help`)")
            } else if let Some(choice) = parse_choice(&raw, count) {
                render::screen(&app.select_answer(choice)?)
            } else {
                format!("`{raw}` is not one of the {count} answers")
            }
        }
        Command::Up => render::screen(&app.select_previous_answer()?),
        Command::Down => render::screen(&app.select_next_answer()?),
        Command::Next => render::screen(&app.next()?),
        Command::Prev => render::screen(&app.prev()?),
        Command::GoTo(position) => render::screen(&app.go_to(position)?),
        Command::Bookmark => render::screen(&app.toggle_bookmark()?),
        Command::Submit { force } => match app.submit(force).await? {
            SubmitResponse::ConfirmationRequired { unanswered } => format!(
                "{unanswered} question(s) unanswered. Type `submit!` to submit anyway."
            ),
            SubmitResponse::Submitted(_) => render::screen(&app.screen()),
        },
        Command::Review => render::screen(&app.enter_review()?),
        Command::Back => render::screen(&app.exit_review()?),
        Command::Settings => render::settings(app.settings()),
        Command::Toggle(toggle) => {
            let settings = match toggle {
                Toggle::DarkMode => app.toggle_dark_mode().await,
                Toggle::Timer => app.toggle_timer().await,
                Toggle::ShuffleQuestions => app.toggle_shuffle_questions().await,
                Toggle::ShuffleAnswers => app.toggle_shuffle_answers().await,
            };
            render::settings(settings)
        }
        Command::TimeLimit(minutes) => render::settings(app.set_time_limit_minutes(minutes).await?),
        Command::History(filter) => render::history(&app.filter_history(filter)),
        Command::ClearHistory => {
            app.clear_history().await;
            "History cleared.".to_string()
        }
        Command::Export { format, path } => {
            let document = app.export_history(format)?;
            match path {
                Some(path) => match tokio::fs::write(&path, &document.contents).await {
                    Ok(()) => format!("Wrote {} ({})", path, document.format.mime_type()),
                    Err(err) => format!("cannot write {path}: {err}"),
                },
                None => document.contents,
            }
        }
    };
    println!("{output}");
    Ok(Flow::Continue)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = match Args::parse(&mut argv) {
        Ok(Some(parsed)) => parsed,
        Ok(None) => {
            print_usage();
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return Err(err.into());
        }
    };

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let storage = Storage::sqlite(&parsed.db_url).await?;
    info!(db = %parsed.db_url, "storage ready");

    let (ticks, mut tick_rx) = IntervalTicks::channel();
    let mut app = QuizApp::open(&storage, Clock::default_clock(), Arc::new(ticks)).await;

    if let Some(topic) = parsed.topic.as_deref() {
        app.select_topic(TopicFilter::parse(topic)).await;
    }
    if let Some(path) = parsed.file.as_deref() {
        import_file(&mut app, path).await;
    }
    for warning in app.take_warnings() {
        eprintln!("warning: {warning}");
    }
    println!("{}", render::screen(&app.screen()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let flow = match Command::parse(line.trim()) {
                    Ok(command) => {
                        debug!(?command, "command");
                        match execute(&mut app, command).await {
                            Ok(flow) => flow,
                            Err(err) => {
                                println!("{err}");
                                Flow::Continue
                            }
                        }
                    }
                    Err(message) => {
                        println!("{message}");
                        Flow::Continue
                    }
                };
                for warning in app.take_warnings() {
                    eprintln!("warning: {warning}");
                }
                if matches!(flow, Flow::Quit) {
                    break;
                }
            }
            Some(tick) = tick_rx.recv() => {
                match app.handle_tick(tick).await? {
                    TickResponse::Ignored => {}
                    TickResponse::Running { remaining_secs } => {
                        if remaining_secs % 60 == 0 || remaining_secs <= 10 {
                            println!(
                                "({} left)",
                                quiz_core::time::format_duration_secs(remaining_secs)
                            );
                        }
                    }
                    TickResponse::Expired(_) => println!("{}", render::screen(&app.screen())),
                }
            }
        }
    }

    app.go_home();
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
