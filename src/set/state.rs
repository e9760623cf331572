use crate::ast::{Expr, OrderItem};
use crate::metadata::{Entity, EntityType, Navigation};

/// Expression state accumulated by a `QuerySet` / `CommandSet`.
///
/// Providers only read it; each statement build gets its own provider.
#[derive(Debug, Clone, PartialEq)]
pub struct SetState {
    pub table: EntityType,
    pub filters: Vec<Expr>,
    pub select: Option<Expr>,
    pub order_by: Vec<OrderItem>,
    pub group_by: Vec<Expr>,
    pub having: Vec<Expr>,
    pub joins: Vec<Navigation>,
    pub top: Option<u32>,
    pub distinct: bool,
    pub no_lock: bool,
}

impl SetState {
    pub fn new(table: EntityType) -> Self {
        Self {
            table,
            filters: Vec::new(),
            select: None,
            order_by: Vec::new(),
            group_by: Vec::new(),
            having: Vec::new(),
            joins: Vec::new(),
            top: None,
            distinct: false,
            no_lock: false,
        }
    }

    pub fn of<T: Entity>() -> Self {
        Self::new(EntityType::of::<T>())
    }

    pub fn has_filters(&self) -> bool {
        !self.filters.is_empty()
    }
}
