use std::any::TypeId;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::ast::Expr;
use crate::error::{ForgeError, ForgeResult};

/// A Rust type mapped to a table.
///
/// Property names are the serialized field names of the type; the entity
/// is read through `serde_json` when inserting or updating.
///
/// ```ignore
/// impl Entity for User {
///     fn describe() -> EntityDescriptor {
///         EntityDescriptor::table("users")
///             .field("id")
///             .column("name", "user_name")
///             .field("dept_id")
///             .key("id")
///             .identity("id")
///             .navigation(Navigation::left::<Dept>(
///                 "dept",
///                 col::<User>("dept_id").eq(col::<Dept>("id")),
///             ))
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Send + Sync + 'static {
    fn describe() -> EntityDescriptor;
}

/// Type token for a mapped entity.
#[derive(Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
    describe: fn() -> EntityDescriptor,
}

impl EntityType {
    pub fn of<T: Entity>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            describe: T::describe,
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn descriptor(&self) -> EntityDescriptor {
        (self.describe)()
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.name)
    }
}

/// Join kind for navigations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER JOIN",
            JoinKind::Left => "LEFT JOIN",
            JoinKind::Right => "RIGHT JOIN",
        }
    }
}

/// A declared join to another entity.
///
/// Cloned into each statement's join list; never shared mutably.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    /// Property name the joined row materializes into
    pub name: String,
    pub target: EntityType,
    pub kind: JoinKind,
    pub on: Expr,
    /// Project the target's columns into the select list
    pub with_fields: bool,
}

impl Navigation {
    pub fn new<T: Entity>(name: &str, kind: JoinKind, on: Expr) -> Self {
        Self {
            name: name.to_string(),
            target: EntityType::of::<T>(),
            kind,
            on,
            with_fields: true,
        }
    }

    pub fn inner<T: Entity>(name: &str, on: Expr) -> Self {
        Self::new::<T>(name, JoinKind::Inner, on)
    }

    pub fn left<T: Entity>(name: &str, on: Expr) -> Self {
        Self::new::<T>(name, JoinKind::Left, on)
    }

    /// Join only for filtering; no columns are projected.
    pub fn without_fields(mut self) -> Self {
        self.with_fields = false;
        self
    }
}

/// One mapped property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPair {
    pub property: String,
    pub column: String,
}

/// Raw mapping returned by [`Entity::describe`].
#[derive(Debug, Clone, Default)]
pub struct EntityDescriptor {
    table: String,
    as_name: Option<String>,
    fields: Vec<FieldPair>,
    keys: Vec<String>,
    identity: Option<String>,
    navigations: Vec<Navigation>,
}

impl EntityDescriptor {
    pub fn table(name: &str) -> Self {
        Self {
            table: name.to_string(),
            ..Default::default()
        }
    }

    /// Alias used to qualify columns; defaults to the table name.
    pub fn as_name(mut self, alias: &str) -> Self {
        self.as_name = Some(alias.to_string());
        self
    }

    /// Property stored in a column of the same name.
    pub fn field(self, property: &str) -> Self {
        self.column(property, property)
    }

    /// Property stored in a differently named column.
    pub fn column(mut self, property: &str, column: &str) -> Self {
        self.fields.push(FieldPair {
            property: property.to_string(),
            column: column.to_string(),
        });
        self
    }

    pub fn key(mut self, property: &str) -> Self {
        self.keys.push(property.to_string());
        self
    }

    /// Database-generated property; skipped on insert.
    pub fn identity(mut self, property: &str) -> Self {
        self.identity = Some(property.to_string());
        self
    }

    pub fn navigation(mut self, navigation: Navigation) -> Self {
        self.navigations.push(navigation);
        self
    }
}

/// Resolved, immutable metadata for one entity type.
#[derive(Debug)]
pub struct EntityObject {
    pub type_id: TypeId,
    pub name: &'static str,
    pub table: String,
    pub as_name: String,
    pub fields: Vec<FieldPair>,
    pub keys: Vec<String>,
    pub identity: Option<String>,
    pub navigations: Vec<Navigation>,
    index: HashMap<String, usize>,
}

impl EntityObject {
    /// Validate a descriptor into entity metadata.
    pub fn build(ty: &EntityType) -> ForgeResult<Self> {
        let desc = ty.descriptor();
        if desc.table.trim().is_empty() {
            return Err(ForgeError::metadata(ty.name(), "no table name"));
        }
        if desc.fields.is_empty() {
            return Err(ForgeError::metadata(ty.name(), "no mapped fields"));
        }

        let mut index = HashMap::with_capacity(desc.fields.len());
        for (i, f) in desc.fields.iter().enumerate() {
            if index.insert(f.property.clone(), i).is_some() {
                return Err(ForgeError::metadata(
                    ty.name(),
                    format!("field '{}' mapped twice", f.property),
                ));
            }
        }
        for key in desc.keys.iter().chain(desc.identity.iter()) {
            if !index.contains_key(key) {
                return Err(ForgeError::metadata(
                    ty.name(),
                    format!("key '{}' is not a mapped field", key),
                ));
            }
        }

        let as_name = match desc.as_name {
            Some(alias) if is_plain_identifier(&alias) => alias,
            Some(alias) => {
                return Err(ForgeError::metadata(
                    ty.name(),
                    format!("alias '{}' is not a plain identifier", alias),
                ));
            }
            None => alias_for_table(&desc.table),
        };
        for nav in &desc.navigations {
            if !is_plain_identifier(&nav.name) {
                return Err(ForgeError::metadata(
                    ty.name(),
                    format!("navigation '{}' is not a plain identifier", nav.name),
                ));
            }
        }

        Ok(Self {
            type_id: ty.id(),
            name: ty.name(),
            table: desc.table,
            as_name,
            fields: desc.fields,
            keys: desc.keys,
            identity: desc.identity,
            navigations: desc.navigations,
            index,
        })
    }

    /// Column mapped to a property.
    pub fn column(&self, property: &str) -> ForgeResult<&str> {
        self.index
            .get(property)
            .map(|&i| self.fields[i].column.as_str())
            .ok_or_else(|| ForgeError::unknown_member(&self.table, property))
    }

    pub fn has_field(&self, property: &str) -> bool {
        self.index.contains_key(property)
    }

    pub fn is_key(&self, property: &str) -> bool {
        self.keys.iter().any(|k| k == property)
    }

    pub fn is_identity(&self, property: &str) -> bool {
        self.identity.as_deref() == Some(property)
    }

    /// Property whose generated value an identity insert returns.
    pub fn identity_or_key(&self) -> Option<&str> {
        self.identity
            .as_deref()
            .or_else(|| self.keys.first().map(String::as_str))
    }
}

/// `[A-Za-z_][A-Za-z0-9_]*`; aliases are emitted unquoted.
pub(crate) fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Default alias: the table name with anything outside `[A-Za-z0-9_]`
/// replaced by `_`.
fn alias_for_table(table: &str) -> String {
    let mut alias: String = table
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    if alias.starts_with(|c: char| c.is_ascii_digit()) {
        alias.insert(0, '_');
    }
    alias
}
