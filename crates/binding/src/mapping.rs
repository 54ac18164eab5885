//! Mapping port: converting a JSON node into a typed domain object.
//!
//! A [`Mapping`] knows how to turn one node into one object. A [`Binding`]
//! pairs a mapping with the [`KeyPath`] where it applies in the response and,
//! for collections, the [`CollectionUpdatePolicy`] used when building the
//! sequence.
//!
//! Mappings are always evaluated on the background mapping thread and are
//! acquired fresh for every evaluation, so they may own per-call state such as
//! a store connection.

use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::MappingError;

// ---------------------------------------------------------------------------
// Mapped objects
// ---------------------------------------------------------------------------

/// A type that a [`Mapping`] may produce.
///
/// Every mapped value physically moves from the mapping thread to the
/// caller, hence `Send + 'static`. Types that are *logically* bound to the
/// context that produced them (e.g. they hold a handle into a per-thread
/// store session) set [`Mappable::THREAD_CONFINED`]; requests for such types
/// must supply a [`crate::ThreadAdapter`].
pub trait Mappable: Send + 'static {
    /// `true` when values must pass through a thread adapter before being
    /// used outside the mapping context.
    const THREAD_CONFINED: bool = false;
}

macro_rules! impl_mappable {
    ($($ty:ty),* $(,)?) => {
        $(impl Mappable for $ty {})*
    };
}

impl_mappable!(
    bool, char, String, Value, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize,
    f32, f64,
);

/// A nullable field maps to `None`. Confinement follows the inner type.
impl<T: Mappable> Mappable for Option<T> {
    const THREAD_CONFINED: bool = T::THREAD_CONFINED;
}

/// Converts a raw payload node into a value of type [`Mapping::MappedObject`].
pub trait Mapping: Send + 'static {
    /// The domain type produced by this mapping.
    type MappedObject: Mappable;

    /// Maps a single node.
    fn map(&mut self, node: &Value) -> Result<Self::MappedObject, MappingError>;
}

/// A [`Mapping`] that deserialises the node with `serde`.
#[derive(Debug)]
pub struct DeserializeMapping<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T> DeserializeMapping<T> {
    /// Creates the mapping.
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<T> Default for DeserializeMapping<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Mapping for DeserializeMapping<T>
where
    T: DeserializeOwned + Mappable,
{
    type MappedObject = T;

    fn map(&mut self, node: &Value) -> Result<T, MappingError> {
        Ok(T::deserialize(node)?)
    }
}

/// Placeholder mapping occupying the collection slot of a single-object
/// [`crate::ObjectBinding`]. Produces the sentinel `0`.
#[derive(Debug, Default, Clone, Copy)]
pub struct VoidMapping;

impl Mapping for VoidMapping {
    type MappedObject = i64;

    fn map(&mut self, _node: &Value) -> Result<i64, MappingError> {
        Ok(0)
    }
}

// ---------------------------------------------------------------------------
// Key paths
// ---------------------------------------------------------------------------

/// Dotted path to the node a binding applies to, e.g. `"data.allPeople"`.
///
/// The empty path addresses the payload root. Numeric segments index into
/// arrays.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyPath(String);

impl KeyPath {
    /// Creates a key path. Leading and trailing dots are ignored.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        Self(path.trim_matches('.').to_owned())
    }

    /// The payload root.
    pub fn root() -> Self {
        Self(String::new())
    }

    /// Returns the path as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterates the path's segments.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.').filter(|s| !s.is_empty())
    }

    /// Resolves the path inside `json`, returning `None` if any segment is missing.
    pub fn resolve<'a>(&self, json: &'a Value) -> Option<&'a Value> {
        self.segments().try_fold(json, |node, segment| match node {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
        })
    }
}

impl From<&str> for KeyPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl From<String> for KeyPath {
    fn from(path: String) -> Self {
        Self::new(path)
    }
}

impl std::fmt::Display for KeyPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.0.is_empty() {
            write!(f, "<root>")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

// ---------------------------------------------------------------------------
// Bindings
// ---------------------------------------------------------------------------

/// How a collection is assembled from a JSON array.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CollectionUpdatePolicy {
    /// Drop later elements equal to an earlier one. Order is preserved.
    pub unique: bool,
    /// Treat `null` or a missing node as an empty collection.
    pub nullable: bool,
}

impl Default for CollectionUpdatePolicy {
    fn default() -> Self {
        Self {
            unique: true,
            nullable: false,
        }
    }
}

/// A [`Mapping`] together with where and how it applies to a response.
#[derive(Debug, Clone)]
pub struct Binding<M> {
    key_path: KeyPath,
    mapping: M,
    policy: CollectionUpdatePolicy,
}

impl<M: Mapping> Binding<M> {
    /// Binds `mapping` to the node at `key_path`.
    pub fn mapping(key_path: impl Into<KeyPath>, mapping: M) -> Self {
        Self {
            key_path: key_path.into(),
            mapping,
            policy: CollectionUpdatePolicy::default(),
        }
    }

    /// Binds `mapping` to every element of the array at `key_path`.
    pub fn collection_mapping(
        key_path: impl Into<KeyPath>,
        mapping: M,
        policy: CollectionUpdatePolicy,
    ) -> Self {
        Self {
            key_path: key_path.into(),
            mapping,
            policy,
        }
    }

    /// Returns the key path.
    pub fn key_path(&self) -> &KeyPath {
        &self.key_path
    }

    /// Returns the collection policy.
    pub fn policy(&self) -> CollectionUpdatePolicy {
        self.policy
    }

    /// Splits the binding into its parts.
    pub fn into_parts(self) -> (KeyPath, M, CollectionUpdatePolicy) {
        (self.key_path, self.mapping, self.policy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Film {
        title: String,
    }

    impl Mappable for Film {}

    #[test]
    fn test_key_path_resolves_objects_and_indices() {
        let json = json!({ "data": { "films": [{ "title": "A" }, { "title": "B" }] } });

        assert_eq!(
            KeyPath::new("data.films.1.title").resolve(&json),
            Some(&json!("B"))
        );
        assert_eq!(KeyPath::root().resolve(&json), Some(&json));
        assert_eq!(KeyPath::new("data.missing").resolve(&json), None);
        assert_eq!(KeyPath::new("data.films.x").resolve(&json), None);
    }

    #[test]
    fn test_key_path_trims_dots() {
        assert_eq!(KeyPath::new(".data.film.").as_str(), "data.film");
        assert_eq!(KeyPath::root().to_string(), "<root>");
    }

    #[test]
    fn test_deserialize_mapping() {
        let mut mapping = DeserializeMapping::<Film>::new();
        let film = mapping.map(&json!({ "title": "A New Hope" })).unwrap();
        assert_eq!(film.title, "A New Hope");

        assert!(matches!(
            mapping.map(&json!({ "name": 1 })),
            Err(MappingError::Deserialize(_))
        ));
    }

    #[test]
    fn test_scalar_and_optional_mappings() {
        assert_eq!(DeserializeMapping::<u64>::new().map(&json!(42)).unwrap(), 42);
        assert_eq!(DeserializeMapping::<f64>::new().map(&json!(1.5)).unwrap(), 1.5);
        assert_eq!(
            DeserializeMapping::<Option<i32>>::new().map(&json!(null)).unwrap(),
            None
        );
        assert!(DeserializeMapping::<u8>::new().map(&json!(300)).is_err());
    }

    #[test]
    fn test_option_inherits_confinement() {
        struct Handle;
        impl Mappable for Handle {
            const THREAD_CONFINED: bool = true;
        }

        assert!(<Option<Handle> as Mappable>::THREAD_CONFINED);
        assert!(!<Option<Film> as Mappable>::THREAD_CONFINED);
    }

    #[test]
    fn test_void_mapping_yields_sentinel() {
        assert_eq!(VoidMapping.map(&json!({ "anything": true })).unwrap(), 0);
    }

    #[test]
    fn test_default_collection_policy() {
        let binding = Binding::mapping("data", DeserializeMapping::<Film>::new());
        assert_eq!(
            binding.policy(),
            CollectionUpdatePolicy {
                unique: true,
                nullable: false
            }
        );
    }
}
