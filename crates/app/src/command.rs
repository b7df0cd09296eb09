use quiz_core::model::HistoryFilter;
use services::ExportFormat;

/// Setting flipped by `set <name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    DarkMode,
    Timer,
    ShuffleQuestions,
    ShuffleAnswers,
}

/// One line of user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Quit,
    Show,
    Load(String),
    Topics,
    Topic(String),
    Start,
    RetryWrong,
    RetryAll,
    Home,
    /// Anything else while answering is tried as an answer reference.
    Choice(String),
    Up,
    Down,
    Next,
    Prev,
    GoTo(usize),
    Bookmark,
    Submit { force: bool },
    Review,
    Back,
    Settings,
    Toggle(Toggle),
    TimeLimit(u32),
    History(HistoryFilter),
    ClearHistory,
    Export {
        format: ExportFormat,
        path: Option<String>,
    },
}

impl Command {
    /// Parse a trimmed input line. Unrecognised single words fall through to
    /// `Command::Choice`.
    pub fn parse(line: &str) -> Result<Self, String> {
        let mut words = line.split_whitespace();
        let Some(head) = words.next() else {
            return Ok(Self::Show);
        };
        let rest: Vec<&str> = words.collect();
        let arg = rest.join(" ");

        let command = match head.to_ascii_lowercase().as_str() {
            "help" | "?" => Self::Help,
            "quit" | "exit" | "q" => Self::Quit,
            "show" => Self::Show,
            "load" if !arg.is_empty() => Self::Load(arg),
            "load" => return Err("usage: load <path>".into()),
            "topics" => Self::Topics,
            "topic" if !arg.is_empty() => Self::Topic(arg),
            "topic" => return Err("usage: topic <name|all>".into()),
            "start" => Self::Start,
            "retry" => match arg.as_str() {
                "" | "wrong" => Self::RetryWrong,
                "all" => Self::RetryAll,
                _ => return Err("usage: retry [wrong|all]".into()),
            },
            "home" => Self::Home,
            "up" => Self::Up,
            "down" => Self::Down,
            "n" | "next" => Self::Next,
            "p" | "prev" => Self::Prev,
            "goto" | "go" => {
                let position = arg
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .ok_or("usage: goto <question number>")?;
                Self::GoTo(position)
            }
            "bm" | "bookmark" => Self::Bookmark,
            "submit" => Self::Submit {
                force: arg == "force",
            },
            "submit!" => Self::Submit { force: true },
            "review" => Self::Review,
            "back" => Self::Back,
            "settings" => Self::Settings,
            "set" => parse_set(&rest)?,
            "history" if arg.is_empty() => Self::History(HistoryFilter::All),
            "history" => Self::History(
                arg.parse::<HistoryFilter>()
                    .map_err(|e| format!("{e} (all, excellent, good, average)"))?,
            ),
            "clear-history" => Self::ClearHistory,
            "export" => {
                let format = rest
                    .first()
                    .ok_or("usage: export <csv|json> [path]")?
                    .parse::<ExportFormat>()?;
                Self::Export {
                    format,
                    path: rest.get(1).map(|p| (*p).to_string()),
                }
            }
            _ if rest.is_empty() => Self::Choice(head.to_string()),
            other => return Err(format!("unknown command: {other} (try `help`)")),
        };
        Ok(command)
    }
}

fn parse_set(rest: &[&str]) -> Result<Command, String> {
    let toggle = match rest {
        ["dark"] => Toggle::DarkMode,
        ["timer"] => Toggle::Timer,
        ["shuffle-questions"] => Toggle::ShuffleQuestions,
        ["shuffle-answers"] => Toggle::ShuffleAnswers,
        ["limit", minutes] => {
            let minutes = minutes
                .parse::<u32>()
                .map_err(|_| format!("invalid minutes: {minutes}"))?;
            return Ok(Command::TimeLimit(minutes));
        }
        _ => {
            return Err(
                "usage: set <dark|timer|shuffle-questions|shuffle-answers|limit <minutes>>".into(),
            );
        }
    };
    Ok(Command::Toggle(toggle))
}

pub const HELP: &str = "\
Commands:
  load <path>             import a question file (JSON)
  topics | topic <name>   list topics / choose one (`all` for every question)
  start                   begin a new attempt
  1..9 | a..z             answer the current question
  up | down               move the answer selection
  n | p | goto <k>        next / previous / jump to question k
  bm                      toggle a bookmark on the current question
  submit [force] | submit!
                          grade the attempt (force skips the unanswered check)
  review | back           walk graded questions / return to the result
  retry [wrong|all]       replay wrong answers or the whole set
  home                    abandon the attempt and go back to the start screen
  settings                show settings
  set dark|timer|shuffle-questions|shuffle-answers
  set limit <minutes>     timer length, 1-600
  history [band]          list attempts (all, excellent, good, average)
  clear-history
  export csv|json [path]  print or write the history export
  show | help | quit";
