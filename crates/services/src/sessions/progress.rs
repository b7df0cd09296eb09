/// Aggregated view of session progress, useful for UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionProgress {
    /// Zero-based current position.
    pub position: usize,
    pub total: usize,
    pub answered: usize,
    pub remaining: usize,
    /// Share of the set reached so far, counting the current question.
    pub percent: u32,
    pub is_complete: bool,
}

impl SessionProgress {
    #[must_use]
    pub fn new(position: usize, total: usize, answered: usize) -> Self {
        let percent = if total == 0 {
            0
        } else {
            u32::try_from((position + 1).min(total) * 100 / total).unwrap_or(100)
        };
        Self {
            position,
            total,
            answered,
            remaining: total.saturating_sub(answered),
            percent,
            is_complete: total > 0 && answered == total,
        }
    }

    /// `n/total` label with a 1-based `n`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}", self.position + 1, self.total)
    }
}
