//! Task types, statuses, actions and the transition table.
//!
//! Every status write in the system goes through [`next_status`]: the caller
//! looks up the task's current status, asks this module what the action
//! leads to, and only then writes (conditioned on the status it read).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

// ---------------------------------------------------------------------------
// Task type
// ---------------------------------------------------------------------------

/// Which field cluster a task row populates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    General,
    Ptw,
}

impl TaskType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Ptw => "ptw",
        }
    }

    /// Status a freshly created task of this type starts in.
    pub fn initial_status(self) -> TaskStatus {
        match self {
            Self::General => TaskStatus::Active,
            Self::Ptw => TaskStatus::PtwInitiated,
        }
    }
}

impl fmt::Display for TaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "general" => Ok(Self::General),
            "ptw" => Ok(Self::Ptw),
            other => Err(CoreError::Validation(format!(
                "Invalid task type '{other}'. Must be one of: general, ptw"
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// Task status
// ---------------------------------------------------------------------------

/// Lifecycle status of a task. Stored as snake_case text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Active,
    InProgress,
    Paused,
    Completed,
    PtwInitiated,
    PtwSubmitted,
    PtwAuthorized,
    PtwCancelled,
}

/// Statuses that make a worker unavailable for a new assignment.
pub const BUSY_STATUSES: [TaskStatus; 3] = [
    TaskStatus::Active,
    TaskStatus::InProgress,
    TaskStatus::PtwInitiated,
];

/// [`BUSY_STATUSES`] as the text stored in `tasks.status`, for SQL binds.
pub const BUSY_STATUS_NAMES: [&str; 3] = ["active", "in_progress", "ptw_initiated"];

impl TaskStatus {
    pub const ALL: [TaskStatus; 8] = [
        Self::Active,
        Self::InProgress,
        Self::Paused,
        Self::Completed,
        Self::PtwInitiated,
        Self::PtwSubmitted,
        Self::PtwAuthorized,
        Self::PtwCancelled,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::InProgress => "in_progress",
            Self::Paused => "paused",
            Self::Completed => "completed",
            Self::PtwInitiated => "ptw_initiated",
            Self::PtwSubmitted => "ptw_submitted",
            Self::PtwAuthorized => "ptw_authorized",
            Self::PtwCancelled => "ptw_cancelled",
        }
    }

    /// No action leads out of a terminal status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            Self::Completed | Self::PtwAuthorized | Self::PtwCancelled
        )
    }

    /// Whether a task in this status keeps its worker busy.
    pub fn occupies_worker(self) -> bool {
        BUSY_STATUSES.contains(&self)
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| CoreError::Validation(format!("Invalid task status '{s}'")))
    }
}

// ---------------------------------------------------------------------------
// Actions
// ---------------------------------------------------------------------------

/// Something a user does to a task. Recorded verbatim in the history log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskAction {
    Start,
    Pause,
    Resume,
    Complete,
    SubmitPtw,
    Authorize,
    CancelPtw,
}

impl TaskAction {
    /// Actions accepted by the generic status-update endpoint.
    pub const LIFECYCLE: [TaskAction; 4] = [Self::Start, Self::Pause, Self::Resume, Self::Complete];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Pause => "pause",
            Self::Resume => "resume",
            Self::Complete => "complete",
            Self::SubmitPtw => "submit_ptw",
            Self::Authorize => "authorize",
            Self::CancelPtw => "cancel_ptw",
        }
    }

    /// Parse an action submitted to the generic status endpoint.
    ///
    /// PTW actions have dedicated endpoints and are rejected here the same way
    /// as unknown strings.
    pub fn parse_lifecycle(s: &str) -> Result<Self, CoreError> {
        Self::LIFECYCLE
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or_else(|| CoreError::Validation("Invalid action".to_string()))
    }
}

impl fmt::Display for TaskAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Transition table
// ---------------------------------------------------------------------------

/// Resolve the status that `action` moves a task in `current` to.
///
/// | from            | action       | to               |
/// |-----------------|--------------|------------------|
/// | `active`        | `start`      | `in_progress`    |
/// | `in_progress`   | `pause`      | `paused`         |
/// | `paused`        | `resume`     | `in_progress`    |
/// | `in_progress`   | `complete`   | `completed`      |
/// | `ptw_initiated` | `submit_ptw` | `ptw_submitted`  |
/// | `ptw_submitted` | `authorize`  | `ptw_authorized` |
/// | `ptw_submitted` | `cancel_ptw` | `ptw_cancelled`  |
///
/// Every other pair is a [`CoreError::Conflict`].
pub fn next_status(current: TaskStatus, action: TaskAction) -> Result<TaskStatus, CoreError> {
    use TaskAction as A;
    use TaskStatus as S;

    let next = match (current, action) {
        (S::Active, A::Start) => S::InProgress,
        (S::InProgress, A::Pause) => S::Paused,
        (S::Paused, A::Resume) => S::InProgress,
        (S::InProgress, A::Complete) => S::Completed,
        (S::PtwInitiated, A::SubmitPtw) => S::PtwSubmitted,
        (S::PtwSubmitted, A::Authorize) => S::PtwAuthorized,
        (S::PtwSubmitted, A::CancelPtw) => S::PtwCancelled,
        _ if current.is_terminal() => {
            return Err(CoreError::Conflict(format!(
                "Task is already {current}; no further actions are allowed"
            )))
        }
        _ => {
            return Err(CoreError::Conflict(format!(
                "Cannot {action} a task in status '{current}'"
            )))
        }
    };
    Ok(next)
}

/// Resolve a transition for a status read back from storage.
///
/// Returns `(current, next)` so the caller can guard its write on `current`.
pub fn transition_from_stored(
    stored: &str,
    action: TaskAction,
) -> Result<(TaskStatus, TaskStatus), CoreError> {
    let current: TaskStatus = stored
        .parse()
        .map_err(|_| CoreError::Internal(format!("Unknown stored task status '{stored}'")))?;
    Ok((current, next_status(current, action)?))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn general_lifecycle_walks_to_completed() {
        let mut status = TaskType::General.initial_status();
        for action in [
            TaskAction::Start,
            TaskAction::Pause,
            TaskAction::Resume,
            TaskAction::Complete,
        ] {
            status = next_status(status, action).unwrap();
        }
        assert_eq!(status, TaskStatus::Completed);
        assert!(status.is_terminal());
    }

    #[test]
    fn ptw_lifecycle_reaches_both_terminal_outcomes() {
        let submitted =
            next_status(TaskType::Ptw.initial_status(), TaskAction::SubmitPtw).unwrap();
        assert_eq!(submitted, TaskStatus::PtwSubmitted);
        assert_eq!(
            next_status(submitted, TaskAction::Authorize).unwrap(),
            TaskStatus::PtwAuthorized
        );
        assert_eq!(
            next_status(submitted, TaskAction::CancelPtw).unwrap(),
            TaskStatus::PtwCancelled
        );
    }

    #[test]
    fn authorize_requires_submission() {
        let result = next_status(TaskStatus::PtwInitiated, TaskAction::Authorize);
        assert_matches!(result, Err(CoreError::Conflict(_)));
    }

    #[test]
    fn complete_on_active_task_is_rejected() {
        let err = next_status(TaskStatus::Active, TaskAction::Complete).unwrap_err();
        assert_matches!(&err, CoreError::Conflict(msg) if msg.contains("complete") && msg.contains("active"));
    }

    #[test]
    fn re_authorization_is_rejected() {
        assert_matches!(
            next_status(TaskStatus::PtwAuthorized, TaskAction::Authorize),
            Err(CoreError::Conflict(msg)) if msg == "Task is already ptw_authorized; no further actions are allowed"
        );
    }

    #[test]
    fn terminal_statuses_accept_no_action() {
        let actions = [
            TaskAction::Start,
            TaskAction::Pause,
            TaskAction::Resume,
            TaskAction::Complete,
            TaskAction::SubmitPtw,
            TaskAction::Authorize,
            TaskAction::CancelPtw,
        ];
        for status in TaskStatus::ALL.into_iter().filter(|s| s.is_terminal()) {
            for action in actions {
                assert!(
                    next_status(status, action).is_err(),
                    "{action} must not leave terminal status {status}"
                );
            }
        }
    }

    #[test]
    fn lifecycle_actions_never_touch_ptw_statuses() {
        for status in [
            TaskStatus::PtwInitiated,
            TaskStatus::PtwSubmitted,
            TaskStatus::PtwAuthorized,
            TaskStatus::PtwCancelled,
        ] {
            for action in TaskAction::LIFECYCLE {
                assert!(next_status(status, action).is_err());
            }
        }
    }

    #[test]
    fn parse_lifecycle_rejects_ptw_and_unknown_actions() {
        assert_eq!(TaskAction::parse_lifecycle("resume").unwrap(), TaskAction::Resume);
        assert_matches!(TaskAction::parse_lifecycle("authorize"), Err(CoreError::Validation(_)));
        assert_matches!(TaskAction::parse_lifecycle("explode"), Err(CoreError::Validation(_)));
        assert_matches!(TaskAction::parse_lifecycle(""), Err(CoreError::Validation(_)));
    }

    #[test]
    fn status_strings_round_trip() {
        for status in TaskStatus::ALL {
            assert_eq!(status.as_str().parse::<TaskStatus>().unwrap(), status);
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, status.as_str());
        }
        assert!("done".parse::<TaskStatus>().is_err());
    }

    #[test]
    fn busy_names_match_busy_statuses() {
        let names: Vec<&str> = BUSY_STATUSES.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, BUSY_STATUS_NAMES);
        assert!(!TaskStatus::Paused.occupies_worker());
        assert!(!TaskStatus::PtwSubmitted.occupies_worker());
    }

    #[test]
    fn stored_garbage_status_is_internal() {
        assert_matches!(
            transition_from_stored("weird", TaskAction::Start),
            Err(CoreError::Internal(_))
        );
        assert_eq!(
            transition_from_stored("paused", TaskAction::Resume).unwrap(),
            (TaskStatus::Paused, TaskStatus::InProgress)
        );
    }

    #[test]
    fn task_type_parsing() {
        assert_eq!("ptw".parse::<TaskType>().unwrap(), TaskType::Ptw);
        assert_matches!("PTW".parse::<TaskType>(), Err(CoreError::Validation(_)));
    }
}
