//! # Seatlease Runtime
//!
//! The [`Store`] owns one piece of state, runs its reducer under an exclusive
//! lock and executes the effects the reducer returns.
//!
//! ## Serialization
//!
//! Every action, whether it comes from a caller or from a timer the store
//! scheduled itself, goes through the same write lock. Synchronous effects
//! (`Run`, `Cancel`, registration of `Cancellable`) are executed before that
//! lock is released, so anything they publish is ordered exactly like the
//! actions that produced it.
//!
//! ## Example
//!
//! ```ignore
//! use seatlease_runtime::Store;
//!
//! let store = Store::new(initial_state, my_reducer, environment);
//!
//! // Fire and forget
//! store.send(Action::DoSomething).await?;
//!
//! // Request / response through a reply slot
//! let answer = store.ask(|reply| Action::Query { reply }).await?;
//!
//! // Read state
//! let value = store.state(|s| s.some_field).await;
//! ```

use seatlease_core::{
    Reply,
    effect::{Effect, EffectId},
    reducer::Reducer,
};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{RwLock, broadcast};
use tokio::task::AbortHandle;

/// Retry logic with exponential backoff
pub mod retry;

/// Prometheus metrics for observability
pub mod metrics;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug, Clone, PartialEq, Eq)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// The reducer consumed a request without answering it
        #[error("Reducer dropped the reply without answering")]
        NoReply,
    }
}

pub use error::StoreError;

/// Store configuration
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the action broadcast channel
    pub broadcast_capacity: usize,
    /// Default timeout used by [`Store::shutdown_default`]
    pub shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Decrements the global pending-effects counter on drop, including on abort.
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Live cancellable effects keyed by [`EffectId`].
///
/// Each registration gets a fresh generation so that a task finishing late
/// never removes a newer registration that reused its id.
#[derive(Default)]
struct CancellationRegistry {
    next_generation: AtomicU64,
    live: Mutex<HashMap<EffectId, (u64, AbortHandle)>>,
}

impl CancellationRegistry {
    fn next_generation(&self) -> u64 {
        self.next_generation.fetch_add(1, Ordering::Relaxed)
    }

    fn insert(&self, id: EffectId, generation: u64, handle: AbortHandle) {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, previous)) = live.insert(id, (generation, handle)) {
            previous.abort();
        }
    }

    fn cancel(&self, id: &EffectId) -> bool {
        let removed = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        removed.is_some_and(|(_, handle)| {
            handle.abort();
            true
        })
    }

    fn finish(&self, id: &EffectId, generation: u64) {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if live.get(id).is_some_and(|(current, _)| *current == generation) {
            live.remove(id);
        }
    }

    fn cancel_all(&self) -> usize {
        let drained: Vec<_> = self
            .live
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .collect();
        for (_, (_, handle)) in &drained {
            handle.abort();
        }
        drained.len()
    }

    fn len(&self) -> usize {
        self.live.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Store module - the runtime coordinator for a reducer
pub mod store {
    use super::{
        AbortHandle, Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, CancellationRegistry,
        Duration, Effect, EffectId, Future, Ordering, Pin, Reducer, Reply, RwLock, StoreConfig,
        StoreError, broadcast,
    };

    type BoxedFuture<A> = Pin<Box<dyn Future<Output = Option<A>> + Send>>;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock`; the reducer runs under the write lock)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    /// 5. Cancellable effects (timers that may be aborted by a later action)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        cancellations: Arc<CancellationRegistry>,
        shutdown_timeout: Duration,
        /// Actions produced by effects (timer fires, async results) are
        /// broadcast here before being fed back into the reducer.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Clone + Send + Sync + 'static,
    {
        /// Create a new store with default configuration
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                cancellations: Arc::new(CancellationRegistry::default()),
                shutdown_timeout: config.shutdown_timeout,
                action_broadcast,
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires the write lock on state
        /// 2. Calls the reducer with (state, action, environment)
        /// 3. Executes synchronous effects and schedules async ones
        /// 4. Releases the lock
        ///
        /// Concurrent `send()` calls are serialized by the lock; the tokio
        /// `RwLock` is fair, so callers are served in arrival order.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<(), StoreError> {
            self.send_internal(action).await
        }

        /// Send a request action and await the value the reducer replies with
        ///
        /// `build` receives the [`Reply`] slot to embed in the action. Replies
        /// are delivered by `Effect::Run`, i.e. before `send` returns.
        ///
        /// # Errors
        ///
        /// - [`StoreError::ShutdownInProgress`] if the store is shutting down
        /// - [`StoreError::NoReply`] if the reducer dropped the reply slot
        pub async fn ask<T, F>(&self, build: F) -> Result<T, StoreError>
        where
            T: Send,
            F: FnOnce(Reply<T>) -> A,
        {
            let (reply, rx) = Reply::channel();
            self.send(build(reply)).await?;
            rx.await.map_err(|_| StoreError::NoReply)
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Only actions fed back by `Delay` and `Future` effects are broadcast,
        /// not the actions callers pass to [`send`](Self::send).
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Read current state via a closure
        ///
        /// The closure runs under the read lock, so it observes a state that
        /// no reducer is halfway through.
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Number of cancellable effects currently registered
        #[must_use]
        pub fn live_cancellables(&self) -> usize {
            self.cancellations.len()
        }

        /// Number of spawned effects that have not completed yet
        #[must_use]
        pub fn pending_effects(&self) -> usize {
            self.pending_effects.load(Ordering::Acquire)
        }

        /// Initiate graceful shutdown of the store
        ///
        /// 1. Sets the shutdown flag (rejecting new actions)
        /// 2. Aborts every cancellable effect
        /// 3. Waits for the remaining effects to complete (with timeout)
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let aborted = self.cancellations.cancel_all();
            if aborted > 0 {
                tracing::debug!(aborted, "Aborted cancellable effects");
            }

            let start = tokio::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    metrics::counter!("store.shutdown.completed").increment(1);
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(pending_effects = pending, "Shutdown timeout");
                    metrics::counter!("store.shutdown.timeout").increment(1);
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Shutdown using the timeout from [`StoreConfig`]
        ///
        /// # Errors
        ///
        /// See [`shutdown`](Self::shutdown).
        pub async fn shutdown_default(&self) -> Result<(), StoreError> {
            self.shutdown(self.shutdown_timeout).await
        }

        async fn send_internal(&self, action: A) -> Result<(), StoreError> {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::debug!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);

            let mut state = self.state.write().await;
            tracing::trace!("Acquired write lock on state");

            let start = std::time::Instant::now();
            let effects = self.reducer.reduce(&mut *state, action, &self.environment);
            metrics::histogram!("store.reducer.duration_seconds")
                .record(start.elapsed().as_secs_f64());

            tracing::trace!("Reducer completed, returned {} effects", effects.len());

            for effect in effects {
                self.execute_effect(effect);
            }
            drop(state);

            Ok(())
        }

        fn execute_effect(&self, effect: Effect<A>) {
            metrics::counter!("store.effects.executed", "type" => effect.kind()).increment(1);

            match effect {
                Effect::None => {},
                Effect::Parallel(effects) => {
                    for effect in effects {
                        self.execute_effect(effect);
                    }
                },
                Effect::Run(f) => f(),
                Effect::Cancel(id) => {
                    if self.cancellations.cancel(&id) {
                        tracing::trace!(effect_id = %id, "Cancelled effect");
                    }
                },
                Effect::Cancellable { id, effect } => self.register_cancellable(id, *effect),
                Effect::Delay { duration, action } => {
                    self.spawn_delay(duration, *action, None);
                },
                Effect::Future(fut) => {
                    self.spawn_future(fut, None);
                },
            }
        }

        fn register_cancellable(&self, id: EffectId, effect: Effect<A>) {
            let generation = self.cancellations.next_generation();
            let key = Some((id.clone(), generation));

            let handle = match effect {
                Effect::Delay { duration, action } => self.spawn_delay(duration, *action, key),
                Effect::Future(fut) => self.spawn_future(fut, key),
                other => {
                    tracing::warn!(
                        effect_id = %id,
                        kind = other.kind(),
                        "Effect kind cannot be cancelled, executing directly"
                    );
                    self.execute_effect(other);
                    return;
                },
            };

            self.cancellations.insert(id, generation, handle);
        }

        fn spawn_delay(
            &self,
            duration: Duration,
            action: A,
            key: Option<(EffectId, u64)>,
        ) -> AbortHandle {
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
            let store = self.clone();

            let task = tokio::spawn(async move {
                let _pending_guard = pending_guard;

                tokio::time::sleep(duration).await;
                tracing::trace!("Effect::Delay elapsed, sending action");

                store.feed_back(action).await;
                if let Some((id, generation)) = key {
                    store.cancellations.finish(&id, generation);
                }
            });
            task.abort_handle()
        }

        fn spawn_future(&self, fut: BoxedFuture<A>, key: Option<(EffectId, u64)>) -> AbortHandle {
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
            let store = self.clone();

            let task = tokio::spawn(async move {
                let _pending_guard = pending_guard;

                if let Some(action) = fut.await {
                    store.feed_back(action).await;
                }
                if let Some((id, generation)) = key {
                    store.cancellations.finish(&id, generation);
                }
            });
            task.abort_handle()
        }

        async fn feed_back(&self, action: A) {
            let _ = self.action_broadcast.send(action.clone());
            if let Err(error) = self.send(action).await {
                tracing::debug!(%error, "Effect action dropped");
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                cancellations: Arc::clone(&self.cancellations),
                shutdown_timeout: self.shutdown_timeout,
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use seatlease_core::{SmallVec, smallvec};
    use std::sync::Mutex as StdMutex;

    #[derive(Clone, Debug)]
    enum TimerAction {
        Arm { id: &'static str, after: Duration },
        Disarm { id: &'static str },
        Fired { id: &'static str },
        Read { reply: Reply<Vec<&'static str>> },
        Forget { reply: Reply<u32> },
    }

    #[derive(Default)]
    struct TimerState {
        fired: Vec<&'static str>,
    }

    #[derive(Clone, Default)]
    struct TimerEnv {
        log: Arc<StdMutex<Vec<String>>>,
    }

    #[derive(Clone)]
    struct TimerReducer;

    impl Reducer for TimerReducer {
        type State = TimerState;
        type Action = TimerAction;
        type Environment = TimerEnv;

        fn reduce(
            &self,
            state: &mut TimerState,
            action: TimerAction,
            env: &TimerEnv,
        ) -> SmallVec<[Effect<TimerAction>; 4]> {
            match action {
                TimerAction::Arm { id, after } => smallvec![
                    Effect::Delay {
                        duration: after,
                        action: Box::new(TimerAction::Fired { id }),
                    }
                    .cancellable(EffectId::new(id))
                ],
                TimerAction::Disarm { id } => smallvec![Effect::Cancel(EffectId::new(id))],
                TimerAction::Fired { id } => {
                    state.fired.push(id);
                    let log = Arc::clone(&env.log);
                    smallvec![Effect::run(move || {
                        log.lock().unwrap().push(format!("fired:{id}"));
                    })]
                },
                TimerAction::Read { reply } => {
                    let fired = state.fired.clone();
                    smallvec![Effect::run(move || {
                        reply.send(fired);
                    })]
                },
                TimerAction::Forget { reply: _ } => SmallVec::new(),
            }
        }
    }

    fn store() -> Store<TimerState, TimerAction, TimerEnv, TimerReducer> {
        Store::new(TimerState::default(), TimerReducer, TimerEnv::default())
    }

    #[tokio::test(start_paused = true)]
    async fn delay_fires_once_and_unregisters() {
        let store = store();
        store
            .send(TimerAction::Arm { id: "a", after: Duration::from_secs(5) })
            .await
            .unwrap();
        assert_eq!(store.live_cancellables(), 1);

        tokio::time::sleep(Duration::from_secs(6)).await;
        tokio::task::yield_now().await;

        assert_eq!(store.state(|s| s.fired.clone()).await, vec!["a"]);
        assert_eq!(store.live_cancellables(), 0);
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_delay_never_fires() {
        let store = store();
        store
            .send(TimerAction::Arm { id: "a", after: Duration::from_secs(5) })
            .await
            .unwrap();
        store.send(TimerAction::Disarm { id: "a" }).await.unwrap();
        assert_eq!(store.live_cancellables(), 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        tokio::task::yield_now().await;

        assert!(store.state(|s| s.fired.is_empty()).await);
        assert_eq!(store.pending_effects(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn rearming_replaces_previous_timer() {
        let store = store();
        store
            .send(TimerAction::Arm { id: "a", after: Duration::from_secs(5) })
            .await
            .unwrap();
        store
            .send(TimerAction::Arm { id: "a", after: Duration::from_secs(10) })
            .await
            .unwrap();
        assert_eq!(store.live_cancellables(), 1);

        tokio::time::sleep(Duration::from_secs(7)).await;
        tokio::task::yield_now().await;
        assert!(store.state(|s| s.fired.is_empty()).await);

        tokio::time::sleep(Duration::from_secs(5)).await;
        tokio::task::yield_now().await;
        assert_eq!(store.state(|s| s.fired.clone()).await, vec!["a"]);
    }

    #[tokio::test(start_paused = true)]
    async fn fed_back_actions_are_broadcast() {
        let store = store();
        let mut rx = store.subscribe_actions();
        store
            .send(TimerAction::Arm { id: "b", after: Duration::from_millis(10) })
            .await
            .unwrap();

        let action = rx.recv().await.unwrap();
        assert!(matches!(action, TimerAction::Fired { id: "b" }));
    }

    #[tokio::test]
    async fn ask_returns_reply_from_reducer() {
        let store = store();
        let fired = store
            .ask(|reply| TimerAction::Read { reply })
            .await
            .unwrap();
        assert!(fired.is_empty());
    }

    #[tokio::test]
    async fn ask_reports_dropped_reply() {
        let store = store();
        let result = store.ask(|reply| TimerAction::Forget { reply }).await;
        assert_eq!(result, Err(StoreError::NoReply));
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_aborts_timers_and_rejects_actions() {
        let store = store();
        store
            .send(TimerAction::Arm { id: "a", after: Duration::from_secs(120) })
            .await
            .unwrap();

        store.shutdown(Duration::from_secs(1)).await.unwrap();

        assert_eq!(store.live_cancellables(), 0);
        assert_eq!(
            store.send(TimerAction::Disarm { id: "a" }).await,
            Err(StoreError::ShutdownInProgress)
        );
    }
}
