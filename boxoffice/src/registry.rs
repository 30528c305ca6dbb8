//! Event registry: event name → coordinator.
//!
//! The registry only routes. It holds its lock while looking a coordinator up
//! or inserting one, never while an operation runs, so events never wait on
//! each other.

use seatlease_runtime::StoreConfig;
use seatlease_runtime::metrics::StoreMetrics;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::catalog::{Catalog, CatalogError};
use crate::coordinator::{EventCoordinator, EventEnvironment};
use crate::error::BoxOfficeError;
use crate::types::{EventDefinition, EventName, EventSummary, MAX_SEATS};

/// All open events of the process.
pub struct Registry {
    events: RwLock<HashMap<EventName, Arc<EventCoordinator>>>,
    env: EventEnvironment,
    store_config: StoreConfig,
    catalog: Option<Arc<dyn Catalog>>,
    max_seats: u64,
}

impl Registry {
    /// An empty registry whose events share `env`
    #[must_use]
    pub fn new(env: EventEnvironment) -> Self {
        Self {
            events: RwLock::new(HashMap::new()),
            env,
            store_config: StoreConfig::default(),
            catalog: None,
            max_seats: MAX_SEATS,
        }
    }

    /// Store configuration for coordinators created from now on
    #[must_use]
    pub fn with_store_config(mut self, config: StoreConfig) -> Self {
        self.store_config = config;
        self
    }

    /// Refuse events with more than `max_seats` seats
    #[must_use]
    pub fn with_max_seats(mut self, max_seats: u64) -> Self {
        self.max_seats = max_seats;
        self
    }

    /// Consult `catalog` when `get` misses
    #[must_use]
    pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Open a new event.
    ///
    /// # Errors
    ///
    /// - [`BoxOfficeError::AlreadyExists`] if the name is taken
    /// - [`BoxOfficeError::InvalidDefinition`] if the definition is invalid
    pub async fn create(&self, definition: EventDefinition) -> Result<Arc<EventCoordinator>, BoxOfficeError> {
        definition.validate_within(self.max_seats)?;

        let mut events = self.events.write().await;
        if events.contains_key(&definition.name) {
            return Err(BoxOfficeError::AlreadyExists(definition.name));
        }

        let name = definition.name.clone();
        let coordinator = Arc::new(EventCoordinator::new(
            definition,
            self.env.clone(),
            self.store_config.clone(),
        )?);
        events.insert(name, Arc::clone(&coordinator));

        StoreMetrics::record_store_count(events.len());
        crate::metrics::record_event_created();
        Ok(coordinator)
    }

    /// Coordinator of `name`, opening it from the catalog on first use.
    ///
    /// # Errors
    ///
    /// - [`BoxOfficeError::NotFound`] if neither the registry nor the catalog
    ///   knows the event
    /// - [`BoxOfficeError::Catalog`] if the catalog failed
    pub async fn get(&self, name: &EventName) -> Result<Arc<EventCoordinator>, BoxOfficeError> {
        if let Some(coordinator) = self.events.read().await.get(name) {
            return Ok(Arc::clone(coordinator));
        }

        let Some(catalog) = &self.catalog else {
            return Err(BoxOfficeError::NotFound(name.clone()));
        };

        let definition = match catalog.get_event_definition(name).await {
            Ok(definition) => definition,
            Err(CatalogError::NotFound(_)) => return Err(BoxOfficeError::NotFound(name.clone())),
            Err(error) => return Err(BoxOfficeError::Catalog(error.to_string())),
        };
        tracing::debug!(event = %name, "Opening event from catalog");

        match self.create(definition).await {
            Ok(coordinator) => Ok(coordinator),
            // Opened concurrently by another request
            Err(BoxOfficeError::AlreadyExists(_)) => self
                .events
                .read()
                .await
                .get(name)
                .cloned()
                .ok_or_else(|| BoxOfficeError::NotFound(name.clone())),
            Err(error) => Err(error),
        }
    }

    /// Summaries of every open event, by start time then name.
    /// Events without a start time sort last.
    pub async fn list(&self) -> Vec<EventSummary> {
        let coordinators: Vec<_> = self.events.read().await.values().cloned().collect();

        let mut summaries = Vec::with_capacity(coordinators.len());
        for coordinator in coordinators {
            summaries.push(coordinator.summary().await);
        }

        summaries.sort_by(|a, b| {
            (a.starts_at.is_none(), a.starts_at, &a.name).cmp(&(b.starts_at.is_none(), b.starts_at, &b.name))
        });
        summaries
    }

    /// Open every event the catalog lists. Returns how many were opened.
    ///
    /// # Errors
    ///
    /// Returns [`BoxOfficeError::Catalog`] if the catalog cannot be listed.
    /// Definitions that are invalid or already open are skipped.
    pub async fn bootstrap(&self) -> Result<usize, BoxOfficeError> {
        let Some(catalog) = &self.catalog else {
            return Ok(0);
        };

        let definitions = catalog
            .list_definitions()
            .await
            .map_err(|error| BoxOfficeError::Catalog(error.to_string()))?;

        let mut opened = 0;
        for definition in definitions {
            let name = definition.name.clone();
            match self.create(definition).await {
                Ok(_) => opened += 1,
                Err(error) => tracing::warn!(event = %name, %error, "Skipped catalog event"),
            }
        }

        tracing::info!(opened, "Catalog events opened");
        Ok(opened)
    }

    /// Number of open events
    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    /// Whether no event is open
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Shut every coordinator down. Returns how many timed out.
    pub async fn shutdown(&self) -> usize {
        let coordinators: Vec<_> = self.events.read().await.values().cloned().collect();

        let mut timed_out = 0;
        for coordinator in coordinators {
            if let Err(error) = coordinator.shutdown().await {
                tracing::warn!(event = %coordinator.name(), %error, "Event did not close cleanly");
                timed_out += 1;
            }
        }
        timed_out
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::catalog::InMemoryCatalog;
    use crate::ledger::InMemoryLedger;
    use crate::mocks::RecordingFanout;
    use seatlease_testing::test_epoch;

    fn registry() -> Registry {
        Registry::new(EventEnvironment::new(
            Arc::new(RecordingFanout::new()),
            Arc::new(InMemoryLedger::new()),
        ))
    }

    #[tokio::test]
    async fn names_are_unique() {
        let registry = registry();
        registry.create(EventDefinition::new("Starfall", 2, 2)).await.unwrap();

        let err = registry
            .create(EventDefinition::new("Starfall", 4, 4))
            .await
            .err()
            .unwrap();
        assert_eq!(err, BoxOfficeError::AlreadyExists("Starfall".into()));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn invalid_definitions_are_not_registered() {
        let registry = registry();
        let err = registry.create(EventDefinition::new("x", 0, 2)).await.err().unwrap();
        assert!(matches!(err, BoxOfficeError::InvalidDefinition(_)));
        assert!(registry.is_empty().await);
    }

    #[tokio::test]
    async fn oversized_grids_are_rejected() {
        let registry = registry();
        let err = registry
            .create(EventDefinition::new("huge", u32::MAX, u32::MAX))
            .await
            .err()
            .unwrap();
        assert!(matches!(err, BoxOfficeError::InvalidDefinition(_)));

        let registry = registry.with_max_seats(100);
        let err = registry.create(EventDefinition::new("wide", 10, 11)).await.err().unwrap();
        assert!(matches!(err, BoxOfficeError::InvalidDefinition(_)));
        registry.create(EventDefinition::new("fits", 10, 10)).await.unwrap();
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn unknown_event_is_not_found() {
        let err = registry().get(&"nope".into()).await.err().unwrap();
        assert_eq!(err, BoxOfficeError::NotFound("nope".into()));
    }

    #[tokio::test]
    async fn catalog_events_open_on_first_use() {
        let catalog = InMemoryCatalog::with_definitions([EventDefinition::new("ComicVerse", 3, 3)]);
        let registry = registry().with_catalog(Arc::new(catalog));

        let first = registry.get(&"ComicVerse".into()).await.unwrap();
        let second = registry.get(&"ComicVerse".into()).await.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn bootstrap_opens_every_catalog_event() {
        let catalog = InMemoryCatalog::with_definitions([
            EventDefinition::new("a", 1, 1),
            EventDefinition::new("b", 1, 1),
            EventDefinition::new("broken", 0, 1),
        ]);
        let registry = registry().with_catalog(Arc::new(catalog));

        assert_eq!(registry.bootstrap().await.unwrap(), 2);
        assert_eq!(registry.len().await, 2);
    }

    #[tokio::test]
    async fn list_is_ordered_by_start_then_name() {
        let registry = registry();
        let early = test_epoch();
        let late = early + chrono::Duration::days(1);

        registry.create(EventDefinition::new("zeta", 1, 1).starting_at(early)).await.unwrap();
        registry.create(EventDefinition::new("alpha", 1, 1).starting_at(late)).await.unwrap();
        registry.create(EventDefinition::new("beta", 1, 1).starting_at(late)).await.unwrap();
        registry.create(EventDefinition::new("undated", 1, 1)).await.unwrap();

        let names: Vec<_> = registry.list().await.into_iter().map(|s| s.name.to_string()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "beta", "undated"]);
    }
}
