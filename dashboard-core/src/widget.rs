//! The weather view: couples the location resolver with the fetch
//! controller and tracks whether the view is active.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use crate::{
    Config,
    controller::{FetchState, PendingFetch, WeatherController},
    error::WeatherError,
    location::LocationResolver,
    provider::{WeatherProvider, provider_from_config},
};

#[derive(Debug)]
pub struct WeatherWidget {
    controller: WeatherController,
    resolver: LocationResolver,
    active: AtomicBool,
}

impl WeatherWidget {
    pub fn new(provider: Arc<dyn WeatherProvider>, resolver: LocationResolver) -> Self {
        Self { controller: WeatherController::new(provider), resolver, active: AtomicBool::new(false) }
    }

    pub fn from_config(config: &Config) -> Result<Self, WeatherError> {
        let provider = provider_from_config(config)?;
        Ok(Self::new(provider, LocationResolver::from_config(config)))
    }

    pub fn controller(&self) -> &WeatherController {
        &self.controller
    }

    pub fn state(&self) -> FetchState {
        self.controller.state()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Resolve the location and start the initial fetch. Only the first call
    /// after construction or [`deactivate`](Self::deactivate) does anything.
    ///
    /// If the user searched while the location was being resolved, that
    /// search wins and no initial fetch is issued.
    pub async fn activate(&self) -> Option<PendingFetch> {
        if self.active.swap(true, Ordering::SeqCst) {
            tracing::debug!("widget already active, skipping location resolution");
            return None;
        }

        let before = self.controller.latest_request();
        let query = self.resolver.resolve().await;

        if self.controller.latest_request() != before || !self.is_active() {
            tracing::debug!(%query, "initial fetch skipped, view changed during resolution");
            return None;
        }

        Some(self.controller.fetch(query))
    }

    /// Navigation away: drop in-flight work and all view state.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
        self.controller.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::LocationError,
        location::LocationService,
        model::{Coordinates, LocationQuery, PlaceName, WeatherSnapshot},
    };
    use async_trait::async_trait;
    use std::sync::{Mutex, atomic::AtomicUsize};

    #[derive(Debug, Default)]
    struct Recording {
        queries: Mutex<Vec<LocationQuery>>,
    }

    #[async_trait]
    impl WeatherProvider for Recording {
        async fn current(&self, query: &LocationQuery) -> Result<WeatherSnapshot, WeatherError> {
            self.queries.lock().unwrap().push(query.clone());
            Err(WeatherError::Transport("offline".into()))
        }
    }

    #[derive(Debug, Default)]
    struct CountingLocation {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LocationService for CountingLocation {
        async fn current_position(&self) -> Result<Coordinates, LocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Coordinates::new(52.0, 21.0))
        }
    }

    #[tokio::test]
    async fn unavailable_geolocation_queries_default_city() {
        let provider = Arc::new(Recording::default());
        let widget = WeatherWidget::new(provider.clone(), LocationResolver::new(None));

        widget.activate().await.expect("initial fetch").finished().await;

        let queries = provider.queries.lock().unwrap();
        assert_eq!(
            queries.as_slice(),
            &[LocationQuery::Place(PlaceName::new("Warsaw").expect("name"))]
        );
        assert_eq!(
            widget.state(),
            FetchState::Failure(WeatherError::Transport("offline".into()))
        );
    }

    #[tokio::test]
    async fn resolver_runs_once_per_activation() {
        let location = Arc::new(CountingLocation::default());
        let widget = WeatherWidget::new(
            Arc::new(Recording::default()),
            LocationResolver::new(Some(location.clone() as Arc<dyn LocationService>)),
        );

        widget.activate().await.expect("initial fetch").finished().await;
        assert!(widget.activate().await.is_none());
        assert_eq!(location.calls.load(Ordering::SeqCst), 1);

        widget.deactivate();
        assert!(!widget.is_active());
        assert_eq!(widget.state(), FetchState::Idle);

        widget.activate().await.expect("fetch after re-activation").finished().await;
        assert_eq!(location.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn search_bypasses_resolver() {
        let location = Arc::new(CountingLocation::default());
        let provider = Arc::new(Recording::default());
        let widget =
            WeatherWidget::new(provider.clone(), LocationResolver::new(Some(location.clone() as Arc<dyn LocationService>)));

        widget.controller().search("Lima").expect("request").finished().await;

        assert_eq!(location.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            provider.queries.lock().unwrap().as_slice(),
            &[LocationQuery::Place(PlaceName::new("Lima").expect("name"))]
        );
    }
}
