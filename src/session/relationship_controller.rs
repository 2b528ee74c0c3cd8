use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::IdentityProvider;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// The signed-in user's own relationship collections as last observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSnapshot {
    pub own_requests: BTreeSet<UserId>,
    pub incoming_requests: BTreeSet<UserId>,
    pub links: BTreeSet<UserId>,
}

impl LinkSnapshot {
    pub fn status_of(&self, other: UserId) -> RelationshipState {
        RelationshipState::derive(
            self.own_requests.contains(&other),
            self.incoming_requests.contains(&other),
            self.links.contains(&other),
        )
    }
}

/// Confirmed links of a profile being viewed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileLinks {
    pub user: UserId,
    pub links: Vec<UserId>,
}

/// Per-session coordinator between the UI and the repository.
///
/// Cached collections change only after a mutation succeeds, by applying the
/// same change locally instead of re-reading. Failed or cancelled mutations
/// leave the cache untouched. Signing out cancels the session token, which
/// stops in-flight sequences from issuing further steps.
pub struct RelationshipController {
    me: UserId,
    repository: Arc<dyn RelationshipRepository>,
    links: watch::Sender<LinkSnapshot>,
    profile: Arc<watch::Sender<Option<ProfileLinks>>>,
    profile_generation: Arc<AtomicU64>,
    profile_fetch: Mutex<Option<CancellationToken>>,
    cancel: CancellationToken,
}

impl RelationshipController {
    pub fn sign_in(
        identity: &dyn IdentityProvider,
        repository: Arc<dyn RelationshipRepository>,
    ) -> Result<Self, RelationError> {
        let me = identity
            .current_user()
            .ok_or(RelationError::NoSignedInUser)?;
        let (links, _) = watch::channel(LinkSnapshot::default());
        let (profile, _) = watch::channel(None);

        tracing::debug!(user = %me, "relationship session started");

        Ok(Self {
            me,
            repository,
            links,
            profile: Arc::new(profile),
            profile_generation: Arc::new(AtomicU64::new(0)),
            profile_fetch: Mutex::new(None),
            cancel: CancellationToken::new(),
        })
    }

    pub fn user_id(&self) -> UserId {
        self.me
    }

    pub fn is_signed_in(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Ends the session: stops in-flight work and clears cached state.
    pub fn sign_out(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.links.send_replace(LinkSnapshot::default());
        self.profile.send_replace(None);
        tracing::debug!(user = %self.me, "relationship session ended");
    }

    /// Reloads the three own collections from the store.
    pub async fn refresh(&self) {
        let (own_requests, incoming_requests, links) = futures_util::join!(
            self.repository.get_own_requests(self.me),
            self.repository.get_incoming_requests(self.me),
            self.repository.get_all_links(self.me),
        );
        if self.cancel.is_cancelled() {
            return;
        }
        self.links.send_replace(LinkSnapshot {
            own_requests: own_requests.into_iter().collect(),
            incoming_requests: incoming_requests.into_iter().collect(),
            links: links.into_iter().collect(),
        });
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        self.links.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<LinkSnapshot> {
        self.links.subscribe()
    }

    pub fn subscribe_profile(&self) -> watch::Receiver<Option<ProfileLinks>> {
        self.profile.subscribe()
    }

    /// Display status of `other` derived from the cached collections.
    pub fn status_of(&self, other: UserId) -> RelationshipState {
        self.links.borrow().status_of(other)
    }

    /// Reads the stored relationship between any two users; the cache is not consulted.
    pub async fn fetch_relationship(&self, user: UserId, other: UserId) -> RelationshipState {
        self.repository.relationship(user, other).await
    }

    pub async fn send_request(&self, other: UserId) -> Result<SequenceReport, RelationError> {
        let report = self
            .guarded(Operation::Send, self.repository.send(self.me, other))
            .await?;
        self.apply_local(|s| {
            s.own_requests.insert(other);
        });
        Ok(report)
    }

    pub async fn cancel_request(&self, other: UserId) -> Result<SequenceReport, RelationError> {
        let report = self
            .guarded(Operation::Cancel, self.repository.cancel(self.me, other))
            .await?;
        self.apply_local(|s| {
            s.own_requests.remove(&other);
        });
        Ok(report)
    }

    pub async fn accept_request(&self, other: UserId) -> Result<SequenceReport, RelationError> {
        let report = self
            .guarded(Operation::Accept, self.repository.accept(self.me, other))
            .await?;
        if report.is_skipped() {
            // nothing pending in the store; drop a stale incoming entry if we had one
            self.apply_local(|s| {
                s.incoming_requests.remove(&other);
            });
            return Ok(report);
        }
        self.apply_local(|s| {
            s.incoming_requests.remove(&other);
            s.links.insert(other);
        });
        Ok(report)
    }

    pub async fn reject_request(&self, other: UserId) -> Result<SequenceReport, RelationError> {
        let report = self
            .guarded(Operation::Reject, self.repository.reject(self.me, other))
            .await?;
        self.apply_local(|s| {
            s.incoming_requests.remove(&other);
        });
        Ok(report)
    }

    pub async fn remove_link(&self, other: UserId) -> Result<SequenceReport, RelationError> {
        let report = self
            .guarded(Operation::Remove, self.repository.remove(self.me, other))
            .await?;
        self.apply_local(|s| {
            s.links.remove(&other);
        });
        Ok(report)
    }

    /// Loads `other`'s links in the background, publishes them on the profile
    /// channel and hands them to `on_done`. Own collections are not touched.
    ///
    /// Only the latest fetch publishes: a fetch overtaken by a newer one is
    /// cancelled and its result, if it still arrives, is dropped without
    /// calling `on_done`.
    pub fn fetch_profile_links<F>(&self, other: UserId, on_done: F) -> JoinHandle<()>
    where
        F: FnOnce(Vec<UserId>) + Send + 'static,
    {
        let repository = self.repository.clone();
        let profile = self.profile.clone();
        let generation = self.profile_generation.clone();
        let cancel = self.cancel.child_token();

        let ticket = generation.fetch_add(1, Ordering::SeqCst) + 1;
        if let Ok(mut previous) = self.profile_fetch.lock() {
            if let Some(token) = previous.replace(cancel.clone()) {
                token.cancel();
            }
        }

        tokio::spawn(async move {
            let links = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                links = repository.get_all_links(other) => links,
            };
            // checked under the channel lock so a stale fetch cannot land after a newer one
            let published = profile.send_if_modified(|slot| {
                if generation.load(Ordering::SeqCst) != ticket {
                    return false;
                }
                *slot = Some(ProfileLinks {
                    user: other,
                    links: links.clone(),
                });
                true
            });
            if !published {
                tracing::debug!(user = %other, "stale profile fetch dropped");
                return;
            }
            on_done(links);
        })
    }

    // a session that signed out keeps its cleared state
    fn apply_local(&self, update: impl FnOnce(&mut LinkSnapshot)) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.links.send_modify(update);
    }

    async fn guarded<F>(&self, operation: Operation, call: F) -> Result<SequenceReport, RelationError>
    where
        F: Future<Output = Result<SequenceReport, RelationError>>,
    {
        let result = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(RelationError::Cancelled { operation }),
            result = call => result,
        };
        match &result {
            Ok(report) => tracing::debug!(%operation, steps = report.steps_applied, "relationship operation completed"),
            Err(e) => tracing::warn!(%operation, user = %self.me, "relationship operation failed: {e}"),
        }
        result
    }
}

impl Drop for RelationshipController {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
