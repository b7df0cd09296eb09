use quiz_core::model::{HistoryEntry, QuizSettings};
use quiz_core::time::format_duration_secs;
use services::sessions::{QuestionView, ResultView, ReviewStatus, ReviewView, choice_label};
use services::{HomeView, Screen};

pub fn screen(screen: &Screen) -> String {
    match screen {
        Screen::Home(view) => home(view),
        Screen::Question(view) => question(view),
        Screen::Result(view) => result(view),
        Screen::Review(view) => review(view),
    }
}

fn home(view: &HomeView) -> String {
    let mut out = String::from("== Quiz ==\n");
    if view.questions_loaded == 0 {
        out.push_str("No questions loaded. Use `load <path>`.\n");
    } else {
        out.push_str(&format!(
            "{} questions loaded; topic `{}` selects {} ({}%).\n",
            view.questions_loaded,
            view.selected_topic,
            view.topic_stats.selected,
            view.topic_stats.percent()
        ));
    }
    out.push_str(&settings(&view.settings));
    out.push_str(&format!("{} attempts in history.\n", view.history_entries));
    out.push_str("Type `start` to begin or `help` for commands.");
    out
}

pub fn settings(settings: &QuizSettings) -> String {
    let on = |flag: bool| if flag { "on" } else { "off" };
    format!(
        "timer: {} ({} min) | shuffle questions: {} | shuffle answers: {} | dark mode: {}\n",
        on(settings.timer_enabled()),
        settings.time_limit_minutes(),
        on(settings.shuffle_questions()),
        on(settings.shuffle_answers()),
        on(settings.dark_mode()),
    )
}

fn nav_strip(view: &QuestionView) -> String {
    view.nav
        .iter()
        .map(|item| {
            let mark = match (item.current, item.answered) {
                (true, _) => '>',
                (false, true) => '#',
                (false, false) => '.',
            };
            if item.bookmarked {
                format!("{mark}*")
            } else {
                mark.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn question(view: &QuestionView) -> String {
    let mut out = format!(
        "-- Question {} ({}%, {} answered)",
        view.progress.label(),
        view.progress.percent,
        view.progress.answered
    );
    if let Some(timer) = view.timer {
        out.push_str(&format!(
            " | {}{}",
            format_duration_secs(timer.remaining_secs),
            if timer.low_time { " left!" } else { " left" }
        ));
    }
    out.push('\n');
    if let Some(topic) = &view.topic {
        out.push_str(&format!("[{topic}]\n"));
    }
    out.push_str(&format!(
        "{}{}\n",
        view.text,
        if view.bookmarked { "  (bookmarked)" } else { "" }
    ));
    match &view.prior_answer {
        Some(Some(text)) => out.push_str(&format!("Your previous answer: {text}\n")),
        Some(None) => out.push_str("Previously unanswered.\n"),
        None => {}
    }
    for (idx, answer) in view.answers.iter().enumerate() {
        let marker = if view.selected == Some(idx) { "*" } else { " " };
        out.push_str(&format!(" {marker} {}) {answer}\n", choice_label(idx)));
    }
    out.push_str(&format!("[{}]", nav_strip(view)));
    if view.is_last {
        out.push_str("  (last question: `submit` when done)");
    }
    out
}

fn result(view: &ResultView) -> String {
    let mut out = String::new();
    if view.time_expired {
        out.push_str("Time is up!\n");
    }
    out.push_str(&format!(
        "== Score {}/10 - {} ==\n{} questions: {} correct, {} wrong\n",
        view.score, view.message, view.total, view.correct, view.wrong
    ));
    if let Some(secs) = view.time_spent_secs {
        out.push_str(&format!("Time spent: {}\n", format_duration_secs(secs)));
    }
    for detail in &view.wrong_answers {
        out.push_str(&format!(
            "  Q{}: {}\n     yours: {} | correct: {}\n",
            detail.position + 1,
            detail.question_text,
            detail.user_answer.as_deref().unwrap_or("(unanswered)"),
            detail.correct_answer
        ));
    }
    out.push_str("`review`, `retry all`");
    if view.can_retry_wrong {
        out.push_str(", `retry wrong`");
    }
    out.push_str(" or `home`.");
    out
}

fn status_word(status: ReviewStatus) -> &'static str {
    match status {
        ReviewStatus::Correct => "correct",
        ReviewStatus::Incorrect => "incorrect",
        ReviewStatus::Unanswered => "unanswered",
    }
}

fn review(view: &ReviewView) -> String {
    let mut out = format!(
        "-- Review {}/{} ({})\n{}\n",
        view.position + 1,
        view.total,
        status_word(view.status),
        view.text
    );
    for (idx, answer) in view.answers.iter().enumerate() {
        let marker = match (answer.is_correct, answer.is_user_choice) {
            (true, _) => "+",
            (false, true) => "x",
            (false, false) => " ",
        };
        out.push_str(&format!(" {marker} {}) {}\n", choice_label(idx), answer.text));
    }
    if let Some(explanation) = &view.explanation {
        out.push_str(&format!("Explanation: {explanation}\n"));
    }
    let strip = view
        .strip
        .iter()
        .map(|item| {
            let mark = match item.status {
                ReviewStatus::Correct => "+",
                ReviewStatus::Incorrect => "x",
                ReviewStatus::Unanswered => "-",
            };
            if item.current { format!("[{mark}]") } else { mark.to_string() }
        })
        .collect::<Vec<_>>()
        .join(" ");
    out.push_str(&format!("{strip}  (`back` for the result)"));
    out
}

pub fn history(entries: &[&HistoryEntry]) -> String {
    if entries.is_empty() {
        return "No attempts recorded.".into();
    }
    entries
        .iter()
        .map(|entry| {
            format!(
                "{}  {}  {}/{}  {}  {}",
                entry.timestamp().format("%Y-%m-%d %H:%M"),
                entry.score(),
                entry.correct_count(),
                entry.total_questions(),
                entry
                    .time_spent_secs()
                    .map_or_else(|| "N/A".to_string(), format_duration_secs),
                entry.topic()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}
