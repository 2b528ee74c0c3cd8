use crate::domain_model::*;
use crate::domain_port::StoreError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Send,
    Cancel,
    Accept,
    Reject,
    Remove,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Send => "send",
            Operation::Cancel => "cancel",
            Operation::Accept => "accept",
            Operation::Reject => "reject",
            Operation::Remove => "remove",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which store call of an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRef {
    /// The read that checks an operation's precondition before any write.
    Guard,
    /// 1-based index into the write sequence.
    Write { index: usize, total: usize },
}

impl fmt::Display for StepRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StepRef::Guard => f.write_str("precondition read"),
            StepRef::Write { index, total } => write!(f, "step {index}/{total}"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    /// Nothing was written by this operation before the failing call.
    #[error("{operation} failed at {step}: {source}")]
    RemoteUnavailable {
        operation: Operation,
        step: StepRef,
        #[source]
        source: StoreError,
    },
    /// Earlier steps are applied and stay applied.
    #[error("{operation} partially applied, step {failed_step}/{total} failed: {source}")]
    PartialSequenceFailure {
        operation: Operation,
        failed_step: usize,
        total: usize,
        #[source]
        source: StoreError,
    },
    #[error("user {0} cannot relate to itself")]
    SelfRelation(UserId),
    #[error("no signed-in user")]
    NoSignedInUser,
    #[error("{operation} cancelled by the caller")]
    Cancelled { operation: Operation },
}

impl RelationError {
    pub fn operation(&self) -> Option<Operation> {
        match self {
            RelationError::RemoteUnavailable { operation, .. }
            | RelationError::PartialSequenceFailure { operation, .. }
            | RelationError::Cancelled { operation } => Some(*operation),
            RelationError::SelfRelation(_) | RelationError::NoSignedInUser => None,
        }
    }

    /// Steps of the failed operation that were applied and not rolled back.
    pub fn applied_steps(&self) -> usize {
        match self {
            RelationError::PartialSequenceFailure { failed_step, .. } => failed_step - 1,
            _ => 0,
        }
    }
}

/// Outcome of a mutating operation that did not fail.
///
/// `steps_applied` counts writes the store acknowledged. Deleting entries that
/// were already absent still counts, so a cancel on an unrelated pair reports
/// every step applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceReport {
    pub operation: Operation,
    pub steps_applied: usize,
    pub total_steps: usize,
}

impl SequenceReport {
    /// The accept guard found nothing pending and skipped the sequence; no
    /// write was issued.
    pub fn is_skipped(&self) -> bool {
        self.steps_applied == 0
    }
}

/// Both sides of a pair as currently stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairInspection {
    pub pair: UserPair,
    /// State of `pair.min()` toward `pair.max()`.
    pub min_view: RelationshipState,
    /// State of `pair.max()` toward `pair.min()`.
    pub max_view: RelationshipState,
    pub violations: Vec<InvariantViolation>,
}

impl PairInspection {
    pub fn is_consistent(&self) -> bool {
        self.violations.is_empty()
    }
}

/// Relationship protocols over per-user records.
///
/// Mutations are ordered sequences of single-record writes, stopping at the
/// first failure without rollback. Reads never fail: a failed read logs and
/// yields an empty result.
#[async_trait::async_trait]
pub trait RelationshipRepository: Send + Sync {
    /// `from` asks `to` for a link.
    async fn send(&self, from: UserId, to: UserId) -> Result<SequenceReport, RelationError>;
    /// `from` withdraws its request to `to`.
    async fn cancel(&self, from: UserId, to: UserId) -> Result<SequenceReport, RelationError>;
    /// `receiver` accepts the request sent by `sender`.
    async fn accept(
        &self,
        receiver: UserId,
        sender: UserId,
    ) -> Result<SequenceReport, RelationError>;
    /// `receiver` declines the request sent by `sender`.
    async fn reject(
        &self,
        receiver: UserId,
        sender: UserId,
    ) -> Result<SequenceReport, RelationError>;
    /// `user` unlinks `friend`.
    async fn remove(&self, user: UserId, friend: UserId) -> Result<SequenceReport, RelationError>;

    async fn get_own_requests(&self, user: UserId) -> Vec<UserId>;
    async fn get_incoming_requests(&self, user: UserId) -> Vec<UserId>;
    async fn get_all_links(&self, user: UserId) -> Vec<UserId>;
    /// State of `user` toward `other`, read from `user`'s record only.
    async fn relationship(&self, user: UserId, other: UserId) -> RelationshipState;

    /// Reads both records and reports invariant violations. Unlike the other
    /// reads, store failures are returned.
    async fn inspect_pair(&self, pair: UserPair) -> Result<PairInspection, StoreError>;
}
