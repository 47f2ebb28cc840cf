//! Per-pass sync report.

use serde::Serialize;
use std::fmt;
use uuid::Uuid;

use super::SyncError;

/// Phases of one account pass, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum SyncPhase {
    Start,
    TokenEnsured,
    DefaultListFetched,
    DefaultListReconciled,
    OtherListsFetched,
    ListsReconciled,
    TasksFetched,
    TasksReconciled,
    Done,
}

impl fmt::Display for SyncPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SyncPhase::Start => "start",
            SyncPhase::TokenEnsured => "token ensured",
            SyncPhase::DefaultListFetched => "default list fetched",
            SyncPhase::DefaultListReconciled => "default list reconciled",
            SyncPhase::OtherListsFetched => "other lists fetched",
            SyncPhase::ListsReconciled => "lists reconciled",
            SyncPhase::TasksFetched => "tasks fetched",
            SyncPhase::TasksReconciled => "tasks reconciled",
            SyncPhase::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SyncOutcome {
    /// Every item was reconciled (warnings allowed).
    Completed,
    /// The pass ran to the end but some items failed.
    PartialFailure,
    /// No token could be obtained; nothing was touched.
    CredentialFailed,
}

/// An item-level failure recorded during a pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncIssue {
    /// What was being reconciled, e.g. `task-list "Maple St"`.
    pub scope: String,
    pub message: String,
    pub retryable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub account_id: Uuid,
    pub containers_processed: usize,
    pub tasks_processed: usize,
    pub errors: Vec<SyncIssue>,
    pub warnings: Vec<String>,
    pub phase: SyncPhase,
    pub outcome: SyncOutcome,
}

impl SyncReport {
    pub fn new(account_id: Uuid) -> Self {
        Self {
            account_id,
            containers_processed: 0,
            tasks_processed: 0,
            errors: Vec::new(),
            warnings: Vec::new(),
            phase: SyncPhase::Start,
            outcome: SyncOutcome::Completed,
        }
    }

    /// A report for a pass that stopped before touching any data.
    pub fn credential_failed(account_id: Uuid, error: &SyncError) -> Self {
        let mut report = Self::new(account_id);
        report.record_error("credentials", error);
        report.outcome = SyncOutcome::CredentialFailed;
        report
    }

    pub fn advance(&mut self, phase: SyncPhase) {
        self.phase = phase;
    }

    pub fn record_error(&mut self, scope: impl Into<String>, error: &SyncError) {
        self.errors.push(SyncIssue {
            scope: scope.into(),
            message: error.to_string(),
            retryable: error.is_retryable(),
        });
    }

    pub fn record_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    /// Close the report and derive its outcome.
    pub fn finish(mut self) -> Self {
        self.phase = SyncPhase::Done;
        if self.outcome != SyncOutcome::CredentialFailed {
            self.outcome = if self.errors.is_empty() {
                SyncOutcome::Completed
            } else {
                SyncOutcome::PartialFailure
            };
        }
        self
    }

    pub fn is_success(&self) -> bool {
        self.outcome == SyncOutcome::Completed
    }

    /// Whether scheduling the same job again may help.
    pub fn is_retryable(&self) -> bool {
        match self.outcome {
            SyncOutcome::Completed => false,
            SyncOutcome::PartialFailure | SyncOutcome::CredentialFailed => self.errors.iter().any(|e| e.retryable),
        }
    }

    pub fn summary(&self) -> String {
        match self.outcome {
            SyncOutcome::Completed => format!(
                "✅ Synced {} task-lists and {} tasks ({} warnings)",
                self.containers_processed,
                self.tasks_processed,
                self.warnings.len()
            ),
            SyncOutcome::PartialFailure => format!(
                "⚠️ Synced {} task-lists and {} tasks with {} errors ({} warnings)",
                self.containers_processed,
                self.tasks_processed,
                self.errors.len(),
                self.warnings.len()
            ),
            SyncOutcome::CredentialFailed => {
                let reason = self.errors.first().map(|e| e.message.as_str()).unwrap_or("unknown");
                format!("❌ Sync aborted: {}", reason)
            }
        }
    }
}
