#![allow(dead_code)]

use rapport::application_impl::RealRelationshipRepository;
use rapport::domain_model::*;
use rapport::domain_port::*;
use rapport::infra_memory::MemoryRelationshipStore;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(UserId),
    Set(UserId, FieldPath),
    Delete(UserId, FieldPath),
}

impl StoreCall {
    pub fn is_write(&self) -> bool {
        !matches!(self, StoreCall::Get(_))
    }
}

/// Memory store that records every call and fails or holds chosen calls.
#[derive(Default)]
pub struct ScriptedStore {
    inner: MemoryRelationshipStore,
    calls: Mutex<Vec<StoreCall>>,
    // 1-based write number (counted over all writes) that fails
    fail_write: Mutex<Option<usize>>,
    fail_reads: AtomicBool,
    // 1-based write number that blocks forever once reached
    hold_write: Mutex<Option<usize>>,
    held: Arc<Notify>,
    // reads of this user wait for `release_reads`
    hold_reads: Mutex<Option<UserId>>,
    read_held: Arc<Notify>,
    read_release: Arc<Notify>,
    // runs right after the given 1-based write is applied
    after_write: Mutex<Option<(usize, Box<dyn Fn() + Send + Sync>)>>,
}

impl ScriptedStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_write_number(&self, n: usize) {
        *self.fail_write.lock().unwrap() = Some(n);
    }

    /// Fails the `n`-th write issued from now on.
    pub fn fail_next_write(&self, n: usize) {
        let seen = self.writes().len();
        self.fail_write_number(seen + n);
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    /// Blocks the `n`-th write issued from now on; `held()` fires when it is reached.
    pub fn hold_next_write(&self, n: usize) {
        let seen = self.writes().len();
        *self.hold_write.lock().unwrap() = Some(seen + n);
    }

    pub fn held(&self) -> Arc<Notify> {
        self.held.clone()
    }

    /// Makes reads of `user` wait until `release_reads`; `read_held()` fires when one starts.
    pub fn hold_reads_of(&self, user: UserId) {
        *self.hold_reads.lock().unwrap() = Some(user);
    }

    pub fn read_held(&self) -> Arc<Notify> {
        self.read_held.clone()
    }

    pub fn release_reads(&self) {
        *self.hold_reads.lock().unwrap() = None;
        self.read_release.notify_waiters();
    }

    /// Runs `hook` once the `n`-th write issued from now on has been applied.
    pub fn after_next_write(&self, n: usize, hook: impl Fn() + Send + Sync + 'static) {
        let seen = self.writes().len();
        *self.after_write.lock().unwrap() = Some((seen + n, Box::new(hook)));
    }

    fn run_after_write(&self) {
        let number = self.writes().len();
        let guard = self.after_write.lock().unwrap();
        if let Some((at, hook)) = guard.as_ref() {
            if *at == number {
                hook();
            }
        }
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn writes(&self) -> Vec<StoreCall> {
        self.calls().into_iter().filter(StoreCall::is_write).collect()
    }

    pub fn clear_calls(&self) {
        self.calls.lock().unwrap().clear();
        *self.fail_write.lock().unwrap() = None;
        *self.hold_write.lock().unwrap() = None;
    }

    /// Record as stored, bypassing the call log and failure injection.
    pub async fn record(&self, user: UserId) -> UserRelationshipRecord {
        self.inner.get(user).await.unwrap().unwrap_or_default()
    }

    async fn before_write(&self, call: StoreCall) -> Result<(), StoreError> {
        let number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(call);
            calls.iter().filter(|c| c.is_write()).count()
        };
        if *self.fail_write.lock().unwrap() == Some(number) {
            return Err(StoreError::Unavailable(format!("injected failure on write {number}")));
        }
        let hold = *self.hold_write.lock().unwrap() == Some(number);
        if hold {
            self.held.notify_one();
            std::future::pending::<()>().await;
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl RelationshipStore for ScriptedStore {
    async fn get(&self, user_id: UserId) -> Result<Option<UserRelationshipRecord>, StoreError> {
        self.calls.lock().unwrap().push(StoreCall::Get(user_id));
        let hold = *self.hold_reads.lock().unwrap() == Some(user_id);
        if hold {
            let released = self.read_release.notified();
            self.read_held.notify_one();
            released.await;
        }
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("injected read failure".to_string()));
        }
        self.inner.get(user_id).await
    }

    async fn set_field(
        &self,
        user_id: UserId,
        path: FieldPath,
        value: FieldValue,
    ) -> Result<(), StoreError> {
        self.before_write(StoreCall::Set(user_id, path)).await?;
        self.inner.set_field(user_id, path, value).await?;
        self.run_after_write();
        Ok(())
    }

    async fn delete_field(&self, user_id: UserId, path: FieldPath) -> Result<(), StoreError> {
        self.before_write(StoreCall::Delete(user_id, path)).await?;
        self.inner.delete_field(user_id, path).await?;
        self.run_after_write();
        Ok(())
    }
}

pub fn user(name: &str) -> UserId {
    UserId::from_username(name)
}

pub fn repository(store: &Arc<ScriptedStore>) -> Arc<RealRelationshipRepository> {
    Arc::new(RealRelationshipRepository::new(store.clone()))
}
