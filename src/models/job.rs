use strum::Display;

/// Status reported by a collaborator for a long-running analysis job.
/// `Succeeded` and `Failed` are terminal; `InProgress` means keep polling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    InProgress,
    Succeeded,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::InProgress)
    }
}

/// Terminal outcome of driving one polling job under a bounded budget.
///
/// `TimedOut` means the poll budget ran out before the collaborator
/// reported a terminal status; `Cancelled` means the caller's cancellation
/// token fired mid-poll. Both are absorbed by the coordinator the same way
/// a provider-reported failure is.
#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome<T> {
    Succeeded(T),
    Failed(String),
    TimedOut,
    Cancelled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_statuses() {
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
    }
}
