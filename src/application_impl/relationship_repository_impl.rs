use crate::application_impl::write_sequence::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::{RelationshipStore, StoreError};
use std::sync::Arc;

pub struct RealRelationshipRepository {
    store: Arc<dyn RelationshipStore>,
}

impl RealRelationshipRepository {
    pub fn new(store: Arc<dyn RelationshipStore>) -> Self {
        Self { store }
    }

    async fn execute(
        &self,
        sequence: WriteSequence,
    ) -> Result<SequenceReport, RelationError> {
        let report = sequence.run(self.store.as_ref()).await?;
        tracing::info!(
            operation = %report.operation,
            steps = report.steps_applied,
            "relationship operation applied"
        );
        Ok(report)
    }

    // lossy: a failed read is logged and treated as an empty record
    async fn read_record(&self, user: UserId, accessor: &'static str) -> UserRelationshipRecord {
        match self.store.get(user).await {
            Ok(record) => record.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(%user, accessor, "read failed, returning empty: {e}");
                UserRelationshipRecord::default()
            }
        }
    }
}

fn ensure_distinct(a: UserId, b: UserId) -> Result<(), RelationError> {
    if a == b {
        return Err(RelationError::SelfRelation(a));
    }
    Ok(())
}

#[async_trait::async_trait]
impl RelationshipRepository for RealRelationshipRepository {
    async fn send(&self, from: UserId, to: UserId) -> Result<SequenceReport, RelationError> {
        ensure_distinct(from, to)?;
        // A reverse request from `to` is left in place; the pair then holds two
        // crossed requests until one side accepts.
        self.execute(send_sequence(from, to)).await
    }

    async fn cancel(&self, from: UserId, to: UserId) -> Result<SequenceReport, RelationError> {
        ensure_distinct(from, to)?;
        self.execute(cancel_sequence(from, to)).await
    }

    async fn accept(
        &self,
        receiver: UserId,
        sender: UserId,
    ) -> Result<SequenceReport, RelationError> {
        ensure_distinct(receiver, sender)?;
        let sequence = accept_sequence(receiver, sender);

        let (receiver_record, sender_record) =
            futures_util::try_join!(self.store.get(receiver), self.store.get(sender)).map_err(
                |source| RelationError::RemoteUnavailable {
                    operation: Operation::Accept,
                    step: StepRef::Guard,
                    source,
                },
            )?;
        let receiver_record = receiver_record.unwrap_or_default();
        let sender_record = sender_record.unwrap_or_default();

        // Any fragment left by the request or by an interrupted accept lets the
        // sequence run (and converge); with none, accepting would only mint a link.
        // A receiver-side link alone cannot be told apart from a remove by the
        // sender whose second step failed, so accepting then relinks the pair.
        let pending = receiver_record.incoming_requests.contains(&sender)
            || sender_record.own_requests.contains(&receiver)
            || receiver_record.links.contains_key(&sender);
        if !pending {
            tracing::info!(%receiver, %sender, "no pending request, accept skipped");
            return Ok(sequence.skipped());
        }

        self.execute(sequence).await
    }

    async fn reject(
        &self,
        receiver: UserId,
        sender: UserId,
    ) -> Result<SequenceReport, RelationError> {
        ensure_distinct(receiver, sender)?;
        self.execute(reject_sequence(receiver, sender)).await
    }

    async fn remove(&self, user: UserId, friend: UserId) -> Result<SequenceReport, RelationError> {
        ensure_distinct(user, friend)?;
        self.execute(remove_sequence(user, friend)).await
    }

    async fn get_own_requests(&self, user: UserId) -> Vec<UserId> {
        self.read_record(user, "own_requests")
            .await
            .own_requests
            .into_iter()
            .collect()
    }

    async fn get_incoming_requests(&self, user: UserId) -> Vec<UserId> {
        self.read_record(user, "incoming_requests")
            .await
            .incoming_requests
            .into_iter()
            .collect()
    }

    async fn get_all_links(&self, user: UserId) -> Vec<UserId> {
        self.read_record(user, "links").await.link_ids()
    }

    async fn relationship(&self, user: UserId, other: UserId) -> RelationshipState {
        if user == other {
            return RelationshipState::None;
        }
        self.read_record(user, "relationship")
            .await
            .state_toward(other)
    }

    async fn inspect_pair(&self, pair: UserPair) -> Result<PairInspection, StoreError> {
        let (min, max) = (pair.min(), pair.max());
        let (min_record, max_record) =
            futures_util::try_join!(self.store.get(min), self.store.get(max))?;
        let min_record = min_record.unwrap_or_default();
        let max_record = max_record.unwrap_or_default();

        let violations = pair_violations(min, &min_record, max, &max_record);
        if !violations.is_empty() {
            tracing::warn!(%pair, count = violations.len(), "pair violates relationship invariants");
        }

        Ok(PairInspection {
            pair,
            min_view: min_record.state_toward(max),
            max_view: max_record.state_toward(min),
            violations,
        })
    }
}
