//! Event catalog: where event definitions come from.

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{PoisonError, RwLock};
use thiserror::Error;

use crate::types::{EventDefinition, EventName};

/// Catalog lookup failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The catalog has no such event
    #[error("Event {0} is not in the catalog")]
    NotFound(EventName),

    /// The catalog could not be reached
    #[error("Catalog unavailable: {0}")]
    Unavailable(String),
}

type CatalogFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CatalogError>> + Send + 'a>>;

/// Source of event definitions.
pub trait Catalog: Send + Sync {
    /// Definition of one event
    fn get_event_definition<'a>(&'a self, name: &'a EventName) -> CatalogFuture<'a, EventDefinition>;

    /// Every known definition
    fn list_definitions(&self) -> CatalogFuture<'_, Vec<EventDefinition>>;
}

/// Catalog held in memory, ordered by name.
#[derive(Default)]
pub struct InMemoryCatalog {
    definitions: RwLock<BTreeMap<EventName, EventDefinition>>,
}

impl InMemoryCatalog {
    /// An empty catalog
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalog holding `definitions`; later duplicates replace earlier ones
    #[must_use]
    pub fn with_definitions(definitions: impl IntoIterator<Item = EventDefinition>) -> Self {
        let catalog = Self::new();
        for definition in definitions {
            catalog.insert(definition);
        }
        catalog
    }

    /// Add or replace a definition
    pub fn insert(&self, definition: EventDefinition) {
        self.definitions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(definition.name.clone(), definition);
    }

    /// Number of definitions
    #[must_use]
    pub fn len(&self) -> usize {
        self.definitions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Whether the catalog is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Catalog for InMemoryCatalog {
    fn get_event_definition<'a>(&'a self, name: &'a EventName) -> CatalogFuture<'a, EventDefinition> {
        let found = self
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned();
        Box::pin(async move { found.ok_or_else(|| CatalogError::NotFound(name.clone())) })
    }

    fn list_definitions(&self) -> CatalogFuture<'_, Vec<EventDefinition>> {
        let all = self
            .definitions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        Box::pin(async move { Ok(all) })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lookups_by_name() {
        let catalog = InMemoryCatalog::with_definitions([
            EventDefinition::new("b", 1, 1),
            EventDefinition::new("a", 2, 2).gated(true),
        ]);

        let found = catalog.get_event_definition(&"a".into()).await.unwrap();
        assert!(found.gated);
        assert_eq!(
            catalog.get_event_definition(&"zz".into()).await,
            Err(CatalogError::NotFound("zz".into()))
        );

        let names: Vec<_> = catalog
            .list_definitions()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(names, vec![EventName::new("a"), EventName::new("b")]);
    }
}
