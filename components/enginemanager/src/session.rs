//! Engine session management structures.
//!
//! We use newtypes in order to simplify changing the underlying lock in the future

use life_engine_core::api::{DynEngine, EngineApi};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

pub struct SessionOwnedGuard(OwnedMutexGuard<()>);

/// Serializes simulation sessions. The engine itself is thread-safe, but its
/// step counter is engine-global, so overlapping sessions would interleave
/// their step accounting.
#[derive(Clone)]
pub struct SessionLock(Arc<Mutex<()>>);

impl Default for SessionLock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLock {
    pub fn new() -> SessionLock {
        SessionLock(Arc::new(Mutex::new(())))
    }

    pub async fn acquire_owned(&self) -> SessionOwnedGuard {
        SessionOwnedGuard(self.0.clone().lock_owned().await)
    }
}

#[derive(Clone)]
pub struct EngineInstance {
    session_lock: SessionLock,
    engine: DynEngine,
}

impl EngineInstance {
    pub fn new(session_lock: SessionLock, engine: DynEngine) -> Self {
        Self { session_lock, engine }
    }

    pub async fn session_owned(&self) -> EngineSessionOwned {
        let g = self.session_lock.acquire_owned().await;
        EngineSessionOwned::new(g, self.engine.clone())
    }
}

pub struct EngineSessionOwned {
    _session_guard: SessionOwnedGuard,
    engine: DynEngine,
}

impl EngineSessionOwned {
    pub fn new(session_guard: SessionOwnedGuard, engine: DynEngine) -> Self {
        Self { _session_guard: session_guard, engine }
    }

    /// Runs the closure on the blocking thread pool with engine access,
    /// keeping the session held for the duration. Simulations can run for
    /// a long time and must not stall the caller's event loop.
    pub async fn spawn_blocking<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&dyn EngineApi) -> R + Send + 'static,
        R: Send + 'static,
    {
        let engine = self.engine.clone();
        tokio::task::spawn_blocking(move || f(engine.as_ref())).await.unwrap()
    }
}
