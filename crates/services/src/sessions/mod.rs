mod choice;
mod machine;
mod plan;
mod progress;
mod timer;
mod view;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use choice::{choice_label, cycle_down, cycle_up, parse_choice};
pub use machine::{
    QuizSession, SessionKind, SessionPhase, SessionPlan, Submission, SubmitOutcome, TickOutcome,
};
pub use plan::{PriorAnswer, SessionBuilder, WorkingQuestion, WorkingSet, fisher_yates};
pub use progress::SessionProgress;
pub use timer::{
    Countdown, IntervalTicks, LOW_TIME_SECS, ManualTicks, SessionTick, TickHandle, TickScheduler,
    TimerConfig,
};
pub use view::{
    NavItem, QuestionView, ResultView, ReviewAnswer, ReviewNavItem, ReviewStatus, ReviewView,
    TimerView, WrongAnswerDetail,
};
