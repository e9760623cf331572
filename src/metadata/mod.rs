//! Entity metadata: mapping descriptors and the per-type cache.

pub mod cache;
pub mod entity;
pub mod record;

pub use self::cache::{EntityCache, query_entity};
pub use self::entity::{
    Entity, EntityDescriptor, EntityObject, EntityType, FieldPair, JoinKind, Navigation,
};
pub use self::record::EntityRecord;
