//! Fetch state machine behind the weather widget.
//!
//! Every trigger gets a fresh [`RequestId`] and supersedes whatever was in
//! flight: the older request is cancelled, and if its response still
//! arrives it is only applied while the state is `Loading` for that same id.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::{
    error::WeatherError,
    model::{LocationQuery, PlaceName, WeatherSnapshot},
    provider::WeatherProvider,
};

pub type RequestId = u64;

/// What the widget currently shows.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchState {
    Idle,
    Loading { request: RequestId },
    Success(WeatherSnapshot),
    Failure(WeatherError),
}

impl FetchState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    pub fn snapshot(&self) -> Option<&WeatherSnapshot> {
        match self {
            Self::Success(snapshot) => Some(snapshot),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&WeatherError> {
        match self {
            Self::Failure(err) => Some(err),
            _ => None,
        }
    }
}

/// Handle to a spawned fetch.
#[derive(Debug)]
pub struct PendingFetch {
    pub id: RequestId,
    handle: JoinHandle<()>,
}

impl PendingFetch {
    /// Wait until the request has either been applied, discarded or cancelled.
    pub async fn finished(self) {
        if let Err(e) = self.handle.await {
            tracing::warn!(request = self.id, "fetch task failed: {}", e);
        }
    }
}

#[derive(Debug, Default)]
struct Inner {
    latest: RequestId,
    in_flight: Option<CancellationToken>,
    search_input: String,
}

#[derive(Debug)]
pub struct WeatherController {
    provider: Arc<dyn WeatherProvider>,
    state: Arc<watch::Sender<FetchState>>,
    inner: Arc<Mutex<Inner>>,
}

fn lock(inner: &Mutex<Inner>) -> MutexGuard<'_, Inner> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl WeatherController {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        let (state, _) = watch::channel(FetchState::Idle);
        Self { provider, state: Arc::new(state), inner: Arc::default() }
    }

    pub fn state(&self) -> FetchState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FetchState> {
        self.state.subscribe()
    }

    /// Id of the most recent trigger, 0 before the first one.
    pub fn latest_request(&self) -> RequestId {
        lock(&self.inner).latest
    }

    pub fn search_input(&self) -> String {
        lock(&self.inner).search_input.clone()
    }

    pub fn set_search_input(&self, input: impl Into<String>) {
        lock(&self.inner).search_input = input.into();
    }

    /// Submit whatever is in the search input.
    pub fn submit_search(&self) -> Option<PendingFetch> {
        let input = self.search_input();
        self.search(&input)
    }

    /// Start a name-based lookup. Blank input fails validation right away
    /// and never reaches the network.
    pub fn search(&self, input: &str) -> Option<PendingFetch> {
        match PlaceName::new(input) {
            Ok(name) => Some(self.fetch(LocationQuery::Place(name))),
            Err(err) => {
                tracing::debug!("search rejected: {}", err);
                self.supersede(|_| FetchState::Failure(err));
                None
            }
        }
    }

    /// Enter `Loading` and issue exactly one provider call for `query`.
    ///
    /// Must be called from within a tokio runtime.
    pub fn fetch(&self, query: LocationQuery) -> PendingFetch {
        let (id, token) = self.supersede(|id| FetchState::Loading { request: id });
        tracing::debug!(request = id, %query, "fetch started");

        let provider = Arc::clone(&self.provider);
        let state = Arc::clone(&self.state);
        let inner = Arc::clone(&self.inner);

        let handle = tokio::spawn(async move {
            // The provider is polled first so the request is always issued,
            // even when it was superseded before the task got to run.
            let result = tokio::select! {
                biased;
                result = provider.current(&query) => result,
                _ = token.cancelled() => {
                    tracing::debug!(request = id, "fetch cancelled");
                    return;
                }
            };

            let next = match result {
                Ok(snapshot) => {
                    tracing::info!(request = id, place = %snapshot.place, "weather fetched");
                    FetchState::Success(snapshot)
                }
                Err(err) => {
                    tracing::warn!(request = id, %query, detail = err.detail(), "weather fetch failed: {}", err);
                    FetchState::Failure(err)
                }
            };
            let succeeded = matches!(next, FetchState::Success(_));

            let applied = state.send_if_modified(|current| {
                let still_current = matches!(current, FetchState::Loading { request } if *request == id);
                if still_current {
                    *current = next;
                }
                still_current
            });

            if !applied {
                tracing::debug!(request = id, "stale response discarded");
                return;
            }

            let mut inner = lock(&inner);
            if inner.latest == id {
                inner.in_flight = None;
            }
            if succeeded {
                inner.search_input.clear();
            }
        });

        PendingFetch { id, handle }
    }

    /// Back to `Idle` with an empty search input.
    pub fn reset(&self) {
        self.supersede(|_| FetchState::Idle);
        lock(&self.inner).search_input.clear();
    }

    /// Cancel the in-flight request, take the next id and publish the state
    /// for it. The state is sent while `inner` is held so the published
    /// state always belongs to the latest id.
    fn supersede(&self, next: impl FnOnce(RequestId) -> FetchState) -> (RequestId, CancellationToken) {
        let mut inner = lock(&self.inner);
        if let Some(previous) = inner.in_flight.take() {
            previous.cancel();
        }

        inner.latest += 1;
        let id = inner.latest;
        let token = CancellationToken::new();
        inner.in_flight = Some(token.clone());
        self.state.send_replace(next(id));
        (id, token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Condition, Coordinates};
    use async_trait::async_trait;
    use chrono::Utc;
    use std::{
        collections::HashMap,
        sync::atomic::{AtomicUsize, Ordering},
        time::Duration,
    };

    fn snapshot(place: &str, temperature_c: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            place: place.to_string(),
            country: "XX".to_string(),
            temperature_c,
            feels_like_c: temperature_c,
            humidity_pct: 50,
            pressure_hpa: 1013.0,
            wind_speed_mps: 1.0,
            condition: Condition::Clear,
            description: "clear sky".to_string(),
            observed_at: Utc::now(),
        }
    }

    /// Answers by place name after an optional delay and counts calls.
    #[derive(Debug, Default)]
    struct Scripted {
        answers: HashMap<String, (Duration, Result<WeatherSnapshot, WeatherError>)>,
        calls: AtomicUsize,
        queries: Mutex<Vec<LocationQuery>>,
    }

    impl Scripted {
        fn answer(
            mut self,
            place: &str,
            delay_ms: u64,
            result: Result<WeatherSnapshot, WeatherError>,
        ) -> Self {
            self.answers.insert(place.to_string(), (Duration::from_millis(delay_ms), result));
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl WeatherProvider for Scripted {
        async fn current(&self, query: &LocationQuery) -> Result<WeatherSnapshot, WeatherError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.queries.lock().unwrap().push(query.clone());

            let key = match query {
                LocationQuery::Place(name) => name.as_str().to_string(),
                LocationQuery::Coordinates(_) => "coords".to_string(),
            };
            let (delay, result) = self
                .answers
                .get(&key)
                .cloned()
                .unwrap_or((Duration::ZERO, Err(WeatherError::NotFound)));
            tokio::time::sleep(delay).await;
            result
        }
    }

    #[tokio::test]
    async fn starts_idle() {
        let controller = WeatherController::new(Arc::new(Scripted::default()));
        assert_eq!(controller.state(), FetchState::Idle);
        assert_eq!(controller.latest_request(), 0);
    }

    #[tokio::test]
    async fn successful_search_clears_input() {
        let provider = Arc::new(Scripted::default().answer("Tokyo", 0, Ok(snapshot("Tokyo", 22.5))));
        let controller = WeatherController::new(provider.clone());

        controller.set_search_input("Tokyo");
        let pending = controller.submit_search().expect("request issued");
        assert_eq!(controller.state(), FetchState::Loading { request: pending.id });

        pending.finished().await;

        assert_eq!(controller.state().snapshot().map(|s| s.place.as_str()), Some("Tokyo"));
        assert_eq!(controller.search_input(), "");
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn blank_search_never_calls_provider() {
        let provider = Arc::new(Scripted::default());
        let controller = WeatherController::new(provider.clone());

        for input in ["", "   ", "\t\n"] {
            assert!(controller.search(input).is_none());
            assert_eq!(controller.state(), FetchState::Failure(WeatherError::Validation));
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn failure_keeps_search_input() {
        let provider = Arc::new(Scripted::default());
        let controller = WeatherController::new(provider);

        controller.set_search_input("Atlantis");
        controller.submit_search().expect("request issued").finished().await;

        assert_eq!(controller.state(), FetchState::Failure(WeatherError::NotFound));
        assert_eq!(controller.search_input(), "Atlantis");
    }

    #[tokio::test]
    async fn retry_after_failure_goes_through_loading() {
        let provider = Arc::new(Scripted::default().answer("Oslo", 0, Ok(snapshot("Oslo", -3.0))));
        let controller = WeatherController::new(provider);
        let mut rx = controller.subscribe();

        controller.search("Atlantis").expect("request").finished().await;
        assert!(controller.state().error().is_some());

        let pending = controller.search("Oslo").expect("request");
        assert!(rx.borrow_and_update().is_loading());
        pending.finished().await;

        assert!(controller.state().snapshot().is_some());
        assert!(controller.state().error().is_none());
    }

    #[tokio::test]
    async fn superseded_response_is_discarded() {
        let provider = Arc::new(
            Scripted::default()
                .answer("Slowtown", 200, Ok(snapshot("Slowtown", 1.0)))
                .answer("Fastville", 0, Ok(snapshot("Fastville", 2.0))),
        );
        let controller = WeatherController::new(provider.clone());

        let slow = controller.search("Slowtown").expect("request");
        let fast = controller.search("Fastville").expect("request");
        assert!(fast.id > slow.id);

        fast.finished().await;
        slow.finished().await;

        assert_eq!(controller.state().snapshot().map(|s| s.place.as_str()), Some("Fastville"));
        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test]
    async fn superseded_request_is_issued_before_being_dropped() {
        let provider = Arc::new(
            Scripted::default()
                .answer("Slowtown", 200, Ok(snapshot("Slowtown", 1.0)))
                .answer("Fastville", 200, Ok(snapshot("Fastville", 2.0))),
        );
        let controller = WeatherController::new(provider.clone());

        // Neither task has been polled yet on the current-thread runtime.
        let first = controller.search("Slowtown").expect("request");
        let second = controller.search("Fastville").expect("request");
        second.finished().await;
        first.finished().await;

        assert_eq!(provider.calls(), 2);
        assert_eq!(controller.state().snapshot().map(|s| s.place.as_str()), Some("Fastville"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_triggers_never_leave_loading() {
        let runtime = tokio::runtime::Handle::current();

        for _ in 0..200 {
            let provider = Arc::new(
                Scripted::default()
                    .answer("Lisbon", 0, Ok(snapshot("Lisbon", 18.0)))
                    .answer("Porto", 0, Ok(snapshot("Porto", 16.0))),
            );
            let controller = Arc::new(WeatherController::new(provider));
            let barrier = Arc::new(std::sync::Barrier::new(2));

            let threads: Vec<_> = ["Lisbon", "Porto"]
                .into_iter()
                .map(|city| {
                    let controller = Arc::clone(&controller);
                    let barrier = Arc::clone(&barrier);
                    let runtime = runtime.clone();
                    std::thread::spawn(move || {
                        let _guard = runtime.enter();
                        barrier.wait();
                        controller.search(city)
                    })
                })
                .collect();

            for thread in threads {
                thread.join().unwrap().expect("request").finished().await;
            }

            let state = controller.state();
            assert!(!state.is_loading(), "stuck in {state:?}");
            assert!(state.snapshot().is_some(), "unexpected {state:?}");
        }
    }

    #[tokio::test]
    async fn validation_failure_supersedes_in_flight_request() {
        let provider =
            Arc::new(Scripted::default().answer("Slowtown", 100, Ok(snapshot("Slowtown", 1.0))));
        let controller = WeatherController::new(provider);

        let slow = controller.search("Slowtown").expect("request");
        assert!(controller.search(" ").is_none());
        slow.finished().await;

        assert_eq!(controller.state(), FetchState::Failure(WeatherError::Validation));
    }

    #[tokio::test]
    async fn coordinates_query_reaches_provider() {
        let provider = Arc::new(Scripted::default().answer("coords", 0, Ok(snapshot("Here", 10.0))));
        let controller = WeatherController::new(provider.clone());

        let coords = Coordinates::new(50.06, 19.94);
        controller.fetch(LocationQuery::Coordinates(coords)).finished().await;

        assert_eq!(
            provider.queries.lock().unwrap().as_slice(),
            &[LocationQuery::Coordinates(coords)]
        );
        assert!(controller.state().snapshot().is_some());
    }

    #[tokio::test]
    async fn reset_returns_to_idle_and_drops_late_response() {
        let provider =
            Arc::new(Scripted::default().answer("Slowtown", 100, Ok(snapshot("Slowtown", 1.0))));
        let controller = WeatherController::new(provider);

        controller.set_search_input("Slowtown");
        let slow = controller.submit_search().expect("request");
        controller.reset();
        slow.finished().await;

        assert_eq!(controller.state(), FetchState::Idle);
        assert_eq!(controller.search_input(), "");
    }
}
