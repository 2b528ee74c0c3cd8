use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::RelationshipStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Set(FieldValue),
    Delete,
}

/// One single-record field mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteStep {
    pub user: UserId,
    pub path: FieldPath,
    pub mutation: Mutation,
}

/// Ordered single-record writes making up one relationship operation.
///
/// Steps run one at a time, each only after the previous call returned
/// success. The first failure ends the run; applied steps are left in place.
#[derive(Debug, Clone)]
pub struct WriteSequence {
    operation: Operation,
    steps: Vec<WriteStep>,
}

impl WriteSequence {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            steps: Vec::new(),
        }
    }

    pub fn set(mut self, user: UserId, path: FieldPath, value: FieldValue) -> Self {
        self.steps.push(WriteStep {
            user,
            path,
            mutation: Mutation::Set(value),
        });
        self
    }

    pub fn delete(mut self, user: UserId, path: FieldPath) -> Self {
        self.steps.push(WriteStep {
            user,
            path,
            mutation: Mutation::Delete,
        });
        self
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn steps(&self) -> &[WriteStep] {
        &self.steps
    }

    /// Report for a run skipped because its precondition did not hold.
    pub fn skipped(&self) -> SequenceReport {
        SequenceReport {
            operation: self.operation,
            steps_applied: 0,
            total_steps: self.steps.len(),
        }
    }

    pub async fn run(&self, store: &dyn RelationshipStore) -> Result<SequenceReport, RelationError> {
        let operation = self.operation;
        let total = self.steps.len();

        for (i, step) in self.steps.iter().enumerate() {
            let index = i + 1;
            let result = match &step.mutation {
                Mutation::Set(value) => store.set_field(step.user, step.path, value.clone()).await,
                Mutation::Delete => store.delete_field(step.user, step.path).await,
            };

            if let Err(source) = result {
                tracing::warn!(
                    %operation,
                    step = index,
                    total,
                    user = %step.user,
                    path = %step.path,
                    "write failed: {source}"
                );
                return Err(if index == 1 {
                    RelationError::RemoteUnavailable {
                        operation,
                        step: StepRef::Write { index, total },
                        source,
                    }
                } else {
                    RelationError::PartialSequenceFailure {
                        operation,
                        failed_step: index,
                        total,
                        source,
                    }
                });
            }

            tracing::debug!(
                %operation,
                step = index,
                total,
                user = %step.user,
                path = %step.path,
                "step applied"
            );
        }

        Ok(SequenceReport {
            operation,
            steps_applied: total,
            total_steps: total,
        })
    }
}

pub fn send_sequence(from: UserId, to: UserId) -> WriteSequence {
    WriteSequence::new(Operation::Send)
        .set(from, FieldPath::own_request(to), FieldValue::Member)
        .set(to, FieldPath::incoming_request(from), FieldValue::Member)
}

pub fn cancel_sequence(from: UserId, to: UserId) -> WriteSequence {
    WriteSequence::new(Operation::Cancel)
        .delete(from, FieldPath::own_request(to))
        .delete(to, FieldPath::incoming_request(from))
}

pub fn accept_sequence(receiver: UserId, sender: UserId) -> WriteSequence {
    WriteSequence::new(Operation::Accept)
        .delete(receiver, FieldPath::incoming_request(sender))
        .delete(sender, FieldPath::own_request(receiver))
        .set(
            receiver,
            FieldPath::link(sender),
            FieldValue::Link(LinkMeta::linked()),
        )
        .set(
            sender,
            FieldPath::link(receiver),
            FieldValue::Link(LinkMeta::linked()),
        )
}

/// Clears the same fragments as `cancel_sequence`, driven from the receiving side.
pub fn reject_sequence(receiver: UserId, sender: UserId) -> WriteSequence {
    WriteSequence::new(Operation::Reject)
        .delete(receiver, FieldPath::incoming_request(sender))
        .delete(sender, FieldPath::own_request(receiver))
}

pub fn remove_sequence(user: UserId, friend: UserId) -> WriteSequence {
    WriteSequence::new(Operation::Remove)
        .delete(user, FieldPath::link(friend))
        .delete(friend, FieldPath::link(user))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> (UserId, UserId) {
        (UserId::from_username("ada"), UserId::from_username("bob"))
    }

    #[test]
    fn accept_orders_request_cleanup_before_links() {
        let (a, b) = ids();
        let seq = accept_sequence(b, a);
        let paths: Vec<(UserId, String)> = seq
            .steps()
            .iter()
            .map(|s| (s.user, s.path.to_string()))
            .collect();
        assert_eq!(
            paths,
            vec![
                (b, format!("incomingRequests.{a}")),
                (a, format!("ownRequests.{b}")),
                (b, format!("links.{a}")),
                (a, format!("links.{b}")),
            ]
        );
        assert!(matches!(seq.steps()[0].mutation, Mutation::Delete));
        assert!(matches!(seq.steps()[3].mutation, Mutation::Set(FieldValue::Link(_))));
    }

    #[test]
    fn reject_and_cancel_touch_the_same_fragments() {
        let (a, b) = ids();
        let cancel: Vec<_> = cancel_sequence(a, b)
            .steps()
            .iter()
            .map(|s| (s.user, s.path))
            .collect();
        let mut reject: Vec<_> = reject_sequence(b, a)
            .steps()
            .iter()
            .map(|s| (s.user, s.path))
            .collect();
        reject.reverse();
        assert_eq!(cancel, reject);
    }

    #[test]
    fn skipped_report_applies_nothing() {
        let (a, b) = ids();
        let report = accept_sequence(b, a).skipped();
        assert!(report.is_skipped());
        assert_eq!(report.total_steps, 4);
        assert_eq!(report.operation, Operation::Accept);
    }
}
