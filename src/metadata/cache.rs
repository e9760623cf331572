//! Entity metadata cache.
//!
//! Each type gets one `OnceCell`; concurrent first lookups block on the
//! cell so the entity is built exactly once.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::{Lazy, OnceCell};

use super::entity::{Entity, EntityObject, EntityType};
use crate::error::ForgeResult;

static GLOBAL: Lazy<EntityCache> = Lazy::new(EntityCache::new);

/// Thread-safe, write-once-per-type metadata cache.
#[derive(Default)]
pub struct EntityCache {
    entries: DashMap<TypeId, Arc<OnceCell<Arc<EntityObject>>>>,
}

impl EntityCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide cache used by the resolvers.
    pub fn global() -> &'static EntityCache {
        &GLOBAL
    }

    /// Metadata for `ty`, building it on first access.
    pub fn query(&self, ty: &EntityType) -> ForgeResult<Arc<EntityObject>> {
        // Clone the cell out so the shard lock is released before building.
        let cell = self
            .entries
            .entry(ty.id())
            .or_insert_with(|| Arc::new(OnceCell::new()))
            .clone();

        let entity = cell.get_or_try_init(|| {
            tracing::trace!(entity = ty.name(), "building entity metadata");
            EntityObject::build(ty).map(Arc::new)
        })?;
        Ok(Arc::clone(entity))
    }

    pub fn query_of<T: Entity>(&self) -> ForgeResult<Arc<EntityObject>> {
        self.query(&EntityType::of::<T>())
    }

    /// Number of types with built metadata.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| e.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shorthand for a global cache lookup.
pub fn query_entity(ty: &EntityType) -> ForgeResult<Arc<EntityObject>> {
    EntityCache::global().query(ty)
}
