//! Lookup state machine.
//!
//! ```text
//! Idle -> Validating -> Loading -> Success | Failed
//!              \-----(invalid)----> Failed
//! ```
//!
//! Every `submit` restarts from `Validating` and clears the previous result
//! and error before anything else happens. Validation and the move to
//! `Loading` are synchronous; the pacing delay and the provider call run on
//! a spawned task.
//!
//! Each submission takes a new attempt number. A completion is written only
//! if its attempt is still the latest one, so an older, slower lookup can
//! never overwrite a newer result. An attempt that is already stale when its
//! delay elapses skips the provider call entirely.

use std::{sync::Arc, time::Duration};

use tokio::{
    sync::watch,
    task::JoinHandle,
    time::{Instant, sleep_until},
};

use crate::{
    error::{LookupError, ValidationError},
    favorites::FavoritesStore,
    model::WeatherSnapshot,
    provider::WeatherProvider,
    validation::{ValidationOutcome, validate},
    view::LookupView,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupPhase {
    #[default]
    Idle,
    Validating,
    Loading,
    Success,
    Failed,
}

/// Current or last-completed lookup.
///
/// `result` is meaningful only in `Success`; otherwise it is the empty
/// sentinel. `error` is set only in `Failed`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LookupState {
    pub phase: LookupPhase,
    pub result: WeatherSnapshot,
    pub error: Option<LookupError>,
    attempt: u64,
}

impl LookupState {
    pub fn is_loading(&self) -> bool {
        self.phase == LookupPhase::Loading
    }

    /// Number of the submission this state belongs to (0 before the first one).
    pub fn attempt(&self) -> u64 {
        self.attempt
    }
}

/// How a spawned lookup ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LookupOutcome {
    /// Result written to the shared state, leaving it in this phase.
    Applied(LookupPhase),
    /// A newer submission started first; nothing was written.
    Superseded,
}

/// Return value of [`LookupController::submit`].
#[derive(Debug)]
pub enum Submission {
    /// Validation failed; the state is already `Failed`.
    Rejected(ValidationError),
    /// The state is `Loading` and the lookup is running.
    Pending(LookupTask),
}

impl Submission {
    pub async fn finished(self) -> LookupOutcome {
        match self {
            Submission::Rejected(_) => LookupOutcome::Applied(LookupPhase::Failed),
            Submission::Pending(task) => task.finished().await,
        }
    }
}

#[derive(Debug)]
pub struct LookupTask {
    attempt: u64,
    handle: JoinHandle<LookupOutcome>,
}

impl LookupTask {
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Wait for the delay, the provider call and the state update.
    pub async fn finished(self) -> LookupOutcome {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(err) if err.is_panic() => std::panic::resume_unwind(err.into_panic()),
            Err(err) => {
                tracing::warn!(attempt = self.attempt, error = %err, "lookup task cancelled");
                LookupOutcome::Superseded
            }
        }
    }
}

/// Orchestrates lookups against one provider. Clones share the same state.
#[derive(Debug, Clone)]
pub struct LookupController {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    provider: Arc<dyn WeatherProvider>,
    delay: Duration,
    state: watch::Sender<LookupState>,
}

impl LookupController {
    pub fn new(provider: Arc<dyn WeatherProvider>, delay: Duration) -> Self {
        let (state, _rx) = watch::channel(LookupState::default());
        Self {
            inner: Arc::new(Inner {
                provider,
                delay,
                state,
            }),
        }
    }

    pub fn delay(&self) -> Duration {
        self.inner.delay
    }

    /// Start a new lookup for raw user input.
    ///
    /// Must be called from within a tokio runtime when the input is valid.
    pub fn submit(&self, raw_city_input: &str) -> Submission {
        let mut attempt = 0;
        self.inner.state.send_modify(|state| {
            state.attempt += 1;
            attempt = state.attempt;
            state.phase = LookupPhase::Validating;
            state.result = WeatherSnapshot::empty();
            state.error = None;
        });

        match validate(raw_city_input) {
            ValidationOutcome::Invalid(err) => {
                tracing::debug!(attempt, "rejected lookup input");
                self.inner.apply(attempt, |state| {
                    state.phase = LookupPhase::Failed;
                    state.error = Some(err.into());
                });
                Submission::Rejected(err)
            }
            ValidationOutcome::Valid(city) => {
                let deadline = Instant::now() + self.inner.delay;
                self.inner.apply(attempt, |state| state.phase = LookupPhase::Loading);

                let inner = Arc::clone(&self.inner);
                let handle = tokio::spawn(async move { inner.run(attempt, city, deadline).await });
                Submission::Pending(LookupTask { attempt, handle })
            }
        }
    }

    /// Submit and wait for the attempt to finish, returning the resulting state.
    pub async fn lookup(&self, raw_city_input: &str) -> LookupState {
        self.submit(raw_city_input).finished().await;
        self.state()
    }

    pub fn state(&self) -> LookupState {
        self.inner.state.borrow().clone()
    }

    pub fn view(&self, icon_base_url: &str) -> LookupView {
        LookupView::new(&self.inner.state.borrow(), icon_base_url)
    }

    pub fn subscribe(&self) -> watch::Receiver<LookupState> {
        self.inner.state.subscribe()
    }

    /// Add the current result to `favorites`. Does nothing unless the last lookup succeeded.
    pub fn save_current(&self, favorites: &FavoritesStore) -> bool {
        let snapshot = {
            let state = self.inner.state.borrow();
            if state.phase != LookupPhase::Success {
                return false;
            }
            state.result.clone()
        };
        favorites.add(snapshot);
        true
    }
}

impl Inner {
    async fn run(&self, attempt: u64, city: String, deadline: Instant) -> LookupOutcome {
        sleep_until(deadline).await;

        if !self.is_current(attempt) {
            tracing::debug!(attempt, city = %city, "lookup superseded before request");
            return LookupOutcome::Superseded;
        }

        let result = self.provider.lookup(&city).await;

        let mut phase = LookupPhase::Failed;
        let applied = self.apply(attempt, |state| match result {
            Ok(snapshot) => {
                tracing::info!(attempt, city = %snapshot.city_name, "lookup succeeded");
                state.phase = LookupPhase::Success;
                state.result = snapshot;
                state.error = None;
                phase = LookupPhase::Success;
            }
            Err(err) => {
                tracing::info!(attempt, city = %city, error = %err, "lookup failed");
                state.phase = LookupPhase::Failed;
                state.result = WeatherSnapshot::empty();
                state.error = Some(err.into());
            }
        });

        if applied {
            LookupOutcome::Applied(phase)
        } else {
            tracing::debug!(attempt, city = %city, "discarding superseded lookup result");
            LookupOutcome::Superseded
        }
    }

    fn is_current(&self, attempt: u64) -> bool {
        self.state.borrow().attempt == attempt
    }

    /// Run `update` only if `attempt` is still the latest submission.
    fn apply(&self, attempt: u64, update: impl FnOnce(&mut LookupState)) -> bool {
        self.state.send_if_modified(|state| {
            if state.attempt != attempt {
                return false;
            }
            update(state);
            true
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ErrorKind, TransportError};
    use crate::model::WeatherCondition;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Scripted = (Duration, Result<WeatherSnapshot, TransportError>);

    /// Provider answering from a script, recording when each call happened.
    #[derive(Debug, Default)]
    struct ScriptedProvider {
        responses: HashMap<String, Scripted>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl ScriptedProvider {
        fn with(
            mut self,
            city: &str,
            latency: Duration,
            result: Result<WeatherSnapshot, TransportError>,
        ) -> Self {
            self.responses.insert(city.to_string(), (latency, result));
            self
        }

        fn calls(&self) -> Vec<(String, Instant)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for ScriptedProvider {
        async fn lookup(&self, city: &str) -> Result<WeatherSnapshot, TransportError> {
            self.calls.lock().unwrap().push((city.to_string(), Instant::now()));
            let (latency, result) = self
                .responses
                .get(city)
                .cloned()
                .unwrap_or((Duration::ZERO, Err(TransportError::new("Not Found"))));
            tokio::time::sleep(latency).await;
            result
        }
    }

    fn snapshot(id: i64, city: &str, kelvin: f64, icon: &str) -> WeatherSnapshot {
        WeatherSnapshot {
            id,
            city_name: city.to_string(),
            temperature_kelvin: kelvin,
            icon_code: icon.to_string(),
            weather_conditions: vec![WeatherCondition {
                icon: icon.to_string(),
                ..WeatherCondition::default()
            }],
            observed_at: None,
        }
    }

    fn london() -> WeatherSnapshot {
        snapshot(2643743, "London", 280.32, "04n")
    }

    fn serving_london(latency: Duration) -> Arc<ScriptedProvider> {
        Arc::new(ScriptedProvider::default().with("London", latency, Ok(london())))
    }

    fn controller(provider: &Arc<ScriptedProvider>, delay: Duration) -> LookupController {
        let provider: Arc<dyn WeatherProvider> = provider.clone();
        LookupController::new(provider, delay)
    }

    #[tokio::test]
    async fn starts_idle() {
        let provider = Arc::new(ScriptedProvider::default());
        let ctrl = controller(&provider, Duration::ZERO);

        let state = ctrl.state();
        assert_eq!(state.phase, LookupPhase::Idle);
        assert!(state.result.is_empty());
        assert!(state.error.is_none());
        assert_eq!(state.attempt(), 0);
    }

    #[tokio::test]
    async fn empty_input_fails_without_network() {
        let provider = Arc::new(ScriptedProvider::default());
        let ctrl = controller(&provider, Duration::ZERO);

        for raw in ["", "   ", "\t\n"] {
            let submission = ctrl.submit(raw);
            assert!(matches!(
                submission,
                Submission::Rejected(ValidationError::EmptyCityName)
            ));

            let state = ctrl.state();
            assert_eq!(state.phase, LookupPhase::Failed);
            assert!(state.result.is_empty());
            let err = state.error.expect("validation error");
            assert_eq!(err.kind(), ErrorKind::Validation);
            assert_eq!(err.message(), "Enter a city name!");
        }

        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn london_lookup_succeeds() {
        let provider = serving_london(Duration::ZERO);
        let ctrl = controller(&provider, Duration::ZERO);

        let state = ctrl.lookup("London").await;
        assert_eq!(state.phase, LookupPhase::Success);
        assert!(state.error.is_none());

        let view = ctrl.view("http://openweathermap.org/img/w");
        assert_eq!(view.phase, LookupPhase::Success);
        assert_eq!(view.city_name, "London");
        assert_eq!(view.temperature_celsius, 7);
        assert!(view.icon_url.ends_with("/04n.png"));
        assert!(!view.is_loading);
        assert!(view.shows_card());
    }

    #[tokio::test]
    async fn input_is_trimmed_before_lookup() {
        let provider = serving_london(Duration::ZERO);
        let ctrl = controller(&provider, Duration::ZERO);

        let state = ctrl.lookup("  London  ").await;
        assert_eq!(state.phase, LookupPhase::Success);
        assert_eq!(provider.calls()[0].0, "London");
    }

    #[tokio::test]
    async fn transport_error_is_surfaced_unmodified() {
        let provider = Arc::new(ScriptedProvider::default());
        let ctrl = controller(&provider, Duration::ZERO);

        let state = ctrl.lookup("Atlantis").await;
        assert_eq!(state.phase, LookupPhase::Failed);
        assert!(state.result.is_empty());

        let err = state.error.expect("transport error");
        assert_eq!(err.kind(), ErrorKind::Api);
        assert_eq!(err.message(), "Not Found");
        assert_eq!(provider.calls().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_for_delay_before_calling_provider() {
        let provider = serving_london(Duration::ZERO);
        let ctrl = controller(&provider, Duration::from_secs(1));
        let submitted_at = Instant::now();

        let Submission::Pending(task) = ctrl.submit("London") else {
            panic!("valid input must start a lookup");
        };
        assert!(ctrl.state().is_loading());
        assert!(ctrl.view("http://icons.test").shows_card());

        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(999)).await;
        tokio::task::yield_now().await;
        assert!(provider.calls().is_empty());
        assert_eq!(ctrl.state().phase, LookupPhase::Loading);

        assert_eq!(task.finished().await, LookupOutcome::Applied(LookupPhase::Success));

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].1 - submitted_at >= Duration::from_secs(1));
    }

    #[tokio::test]
    async fn new_submission_clears_previous_result() {
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("London", Duration::ZERO, Ok(london()))
                .with(
                    "Paris",
                    Duration::from_millis(10),
                    Ok(snapshot(2988507, "Paris", 290.0, "01d")),
                ),
        );
        let ctrl = controller(&provider, Duration::ZERO);
        ctrl.lookup("London").await;

        let submission = ctrl.submit("Paris");
        let state = ctrl.state();
        assert_eq!(state.phase, LookupPhase::Loading);
        assert!(state.result.is_empty());
        assert!(state.error.is_none());

        submission.finished().await;
        assert_eq!(ctrl.state().result.city_name, "Paris");
    }

    #[tokio::test]
    async fn failed_then_valid_submission_clears_error() {
        let provider = serving_london(Duration::ZERO);
        let ctrl = controller(&provider, Duration::ZERO);

        ctrl.lookup("").await;
        assert_eq!(ctrl.state().phase, LookupPhase::Failed);

        let state = ctrl.lookup("London").await;
        assert_eq!(state.phase, LookupPhase::Success);
        assert!(state.error.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn slower_older_lookup_is_discarded() {
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("Slow", Duration::from_secs(5), Ok(snapshot(1, "Slow", 280.0, "01d")))
                .with("Fast", Duration::ZERO, Ok(snapshot(2, "Fast", 290.0, "02d"))),
        );
        let ctrl = controller(&provider, Duration::ZERO);

        let slow = ctrl.submit("Slow");
        tokio::task::yield_now().await;
        let fast = ctrl.submit("Fast");

        assert_eq!(fast.finished().await, LookupOutcome::Applied(LookupPhase::Success));
        assert_eq!(slow.finished().await, LookupOutcome::Superseded);

        let state = ctrl.state();
        assert_eq!(state.phase, LookupPhase::Success);
        assert_eq!(state.result.city_name, "Fast");
        assert_eq!(state.attempt(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn lookup_superseded_during_delay_skips_request() {
        let provider = Arc::new(
            ScriptedProvider::default()
                .with("Oslo", Duration::ZERO, Ok(snapshot(3, "Oslo", 270.0, "13d")))
                .with("Rome", Duration::ZERO, Ok(snapshot(4, "Rome", 295.0, "01d"))),
        );
        let ctrl = controller(&provider, Duration::from_secs(1));

        let first = ctrl.submit("Oslo");
        let second = ctrl.submit("Rome");

        assert_eq!(first.finished().await, LookupOutcome::Superseded);
        assert_eq!(second.finished().await, LookupOutcome::Applied(LookupPhase::Success));

        let calls = provider.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "Rome");
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_submission_supersedes_pending_lookup() {
        let provider = serving_london(Duration::from_secs(2));
        let ctrl = controller(&provider, Duration::ZERO);

        let pending = ctrl.submit("London");
        tokio::task::yield_now().await;
        ctrl.submit(" ");

        assert_eq!(pending.finished().await, LookupOutcome::Superseded);
        let state = ctrl.state();
        assert_eq!(state.phase, LookupPhase::Failed);
        assert_eq!(state.error.map(|e| e.kind()), Some(ErrorKind::Validation));
    }

    #[tokio::test]
    async fn save_current_only_after_success() {
        let provider = serving_london(Duration::ZERO);
        let ctrl = controller(&provider, Duration::ZERO);
        let favorites = FavoritesStore::new();

        assert!(!ctrl.save_current(&favorites));

        ctrl.lookup("Atlantis").await;
        assert!(!ctrl.save_current(&favorites));
        assert!(favorites.is_empty());

        ctrl.lookup("London").await;
        assert!(ctrl.save_current(&favorites));
        assert_eq!(favorites.list(), vec![london()]);
    }

    #[tokio::test]
    async fn subscribers_observe_transitions() {
        let provider = serving_london(Duration::ZERO);
        let ctrl = controller(&provider, Duration::ZERO);
        let mut rx = ctrl.subscribe();

        let submission = ctrl.submit("London");
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase, LookupPhase::Loading);

        submission.finished().await;
        assert!(rx.has_changed().unwrap());
        assert_eq!(rx.borrow_and_update().phase, LookupPhase::Success);
    }
}
