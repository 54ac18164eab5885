//! Object bindings: how a request's result is produced and delivered.
//!
//! An [`ObjectBinding`] has exactly one populated arm:
//!
//! - [`ObjectBinding::Object`]: the response maps to one object;
//! - [`ObjectBinding::Collection`]: the response maps to a `Vec` of objects.
//!
//! Which arm a request produces is decided by its `Shape` associated type,
//! one of the marker types [`SingleObject`] or [`ObjectCollection`]. The
//! choice is made by the type checker when the request type is defined; no
//! value is ever inspected to pick an arm.
//!
//! ## Placeholder slots
//!
//! Both arms live in one enum, so the type always names a collection mapping
//! and a collection adapter even for single-object bindings. Those slots are
//! filled with [`VoidMapping`] and `NoThreadAdapter<i64>`, which are never
//! invoked.

use std::any::type_name;

use crate::{
    Binding, Mappable, Mapping, NoThreadAdapter, RequestError, ThreadAdapter, VoidMapping,
};

/// Outcome of a request: the mapped value or the stage that failed.
pub type MappingResult<T> = Result<T, RequestError>;

/// Zero-argument factory for a request's mapping.
///
/// Invoked on the mapping thread, once per evaluation, so every in-flight
/// request gets its own mapping state.
pub type MappingProvider<M> = Box<dyn Fn() -> Binding<M> + Send + Sync>;

/// Callback receiving a request's final result. Invoked exactly once.
pub type RequestCompletion<T> = Box<dyn FnOnce(MappingResult<T>) + Send>;

/// Which arm of an [`ObjectBinding`] is populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BindingKind {
    /// Single mapped object.
    Object,
    /// Sequence of mapped objects.
    Collection,
}

impl std::fmt::Display for BindingKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingKind::Object => write!(f, "object"),
            BindingKind::Collection => write!(f, "collection"),
        }
    }
}

/// The result shape of a request, bound to its completion callback.
///
/// - `M` / `A`: mapping and thread adapter of the object arm.
/// - `CM` / `CA`: mapping and thread adapter of the collection arm.
pub enum ObjectBinding<M, CM, A, CA>
where
    M: Mapping,
    CM: Mapping,
    CM::MappedObject: PartialEq,
{
    /// The response maps to a single object.
    Object {
        /// Fresh mapping per evaluation.
        mapping_binding: MappingProvider<M>,
        /// Required when `M::MappedObject` is thread confined.
        thread_adapter: Option<A>,
        /// Receives the mapped object.
        completion: RequestCompletion<M::MappedObject>,
    },

    /// The response maps to a collection of objects.
    Collection {
        /// Fresh mapping per evaluation, applied to every element.
        mapping_binding: MappingProvider<CM>,
        /// Required when `CM::MappedObject` is thread confined.
        thread_adapter: Option<CA>,
        /// Receives the mapped objects in payload order.
        completion: RequestCompletion<Vec<CM::MappedObject>>,
    },
}

impl<M, A> ObjectBinding<M, VoidMapping, A, NoThreadAdapter<i64>>
where
    M: Mapping,
    A: ThreadAdapter<BaseType = M::MappedObject>,
{
    /// Creates a single-object binding.
    pub fn single(
        mapping_binding: MappingProvider<M>,
        thread_adapter: Option<A>,
        completion: RequestCompletion<M::MappedObject>,
    ) -> Self {
        ObjectBinding::Object {
            mapping_binding,
            thread_adapter,
            completion,
        }
    }
}

impl<M, A> ObjectBinding<M, M, A, A>
where
    M: Mapping,
    M::MappedObject: PartialEq,
    A: ThreadAdapter<BaseType = M::MappedObject>,
{
    /// Creates a collection binding.
    pub fn collection(
        mapping_binding: MappingProvider<M>,
        thread_adapter: Option<A>,
        completion: RequestCompletion<Vec<M::MappedObject>>,
    ) -> Self {
        ObjectBinding::Collection {
            mapping_binding,
            thread_adapter,
            completion,
        }
    }
}

impl<M, CM, A, CA> ObjectBinding<M, CM, A, CA>
where
    M: Mapping,
    CM: Mapping,
    CM::MappedObject: PartialEq,
    A: ThreadAdapter<BaseType = M::MappedObject>,
    CA: ThreadAdapter<BaseType = CM::MappedObject>,
{
    /// Returns which arm is populated.
    pub fn kind(&self) -> BindingKind {
        match self {
            ObjectBinding::Object { .. } => BindingKind::Object,
            ObjectBinding::Collection { .. } => BindingKind::Collection,
        }
    }

    /// Returns `true` if a thread adapter was supplied.
    pub fn has_thread_adapter(&self) -> bool {
        match self {
            ObjectBinding::Object { thread_adapter, .. } => thread_adapter.is_some(),
            ObjectBinding::Collection { thread_adapter, .. } => thread_adapter.is_some(),
        }
    }

    /// Checks the binding can be executed.
    ///
    /// A thread-confined object type without a converting thread adapter is
    /// a [`RequestError::Configuration`]. An identity adapter such as
    /// [`NoThreadAdapter`] does not count. Must be called before anything is
    /// sent.
    pub fn validate(&self) -> Result<(), RequestError> {
        match self {
            ObjectBinding::Object { thread_adapter, .. }
                if <M::MappedObject as Mappable>::THREAD_CONFINED
                    && !converts(thread_adapter) =>
            {
                Err(missing_adapter::<M::MappedObject>())
            }
            ObjectBinding::Collection { thread_adapter, .. }
                if <CM::MappedObject as Mappable>::THREAD_CONFINED
                    && !converts(thread_adapter) =>
            {
                Err(missing_adapter::<CM::MappedObject>())
            }
            _ => Ok(()),
        }
    }

    /// Delivers `error` to the completion callback, consuming the binding.
    ///
    /// Used when the request fails before mapping; no mapping is evaluated.
    pub fn fail(self, error: RequestError) {
        match self {
            ObjectBinding::Object { completion, .. } => completion(Err(error)),
            ObjectBinding::Collection { completion, .. } => completion(Err(error)),
        }
    }
}

impl<M, CM, A, CA> std::fmt::Debug for ObjectBinding<M, CM, A, CA>
where
    M: Mapping,
    CM: Mapping,
    CM::MappedObject: PartialEq,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ObjectBinding::Object { thread_adapter, .. } => f
                .debug_struct("Object")
                .field("mapped_object", &type_name::<M::MappedObject>())
                .field("thread_adapter", &thread_adapter.is_some())
                .finish_non_exhaustive(),
            ObjectBinding::Collection { thread_adapter, .. } => f
                .debug_struct("Collection")
                .field("mapped_object", &type_name::<CM::MappedObject>())
                .field("thread_adapter", &thread_adapter.is_some())
                .finish_non_exhaustive(),
        }
    }
}

fn converts<A: ThreadAdapter>(adapter: &Option<A>) -> bool {
    adapter.is_some() && !A::IS_IDENTITY
}

fn missing_adapter<T>() -> RequestError {
    RequestError::Configuration {
        message: format!(
            "'{}' is thread confined but the request supplies no converting thread adapter",
            type_name::<T>()
        ),
    }
}

// ---------------------------------------------------------------------------
// Shape resolution
// ---------------------------------------------------------------------------

/// Selects the [`ObjectBinding`] arm for a mapping `M` and adapter `A`.
///
/// Implemented only by [`SingleObject`] and [`ObjectCollection`]; a request
/// whose `Shape` is anything else does not compile.
pub trait ResponseShape<M, A>: 'static
where
    M: Mapping,
    A: ThreadAdapter<BaseType = M::MappedObject>,
{
    /// The value a request of this shape delivers.
    type Serialized: Send + 'static;

    /// Mapping slot of the collection arm.
    type CollectionMapping: Mapping<MappedObject: PartialEq>;

    /// Adapter slot of the collection arm.
    type CollectionAdapter: ThreadAdapter<
        BaseType = <Self::CollectionMapping as Mapping>::MappedObject,
    >;

    /// The arm this shape produces.
    const KIND: BindingKind;

    /// Builds the binding for this shape.
    fn bind(
        mapping_binding: MappingProvider<M>,
        thread_adapter: Option<A>,
        completion: RequestCompletion<Self::Serialized>,
    ) -> ObjectBinding<M, Self::CollectionMapping, A, Self::CollectionAdapter>;
}

/// Shape of a request whose response is exactly one mapped object.
#[derive(Debug)]
pub enum SingleObject {}

/// Shape of a request whose response is a sequence of mapped objects.
///
/// Requires the mapped type to implement [`PartialEq`] so collections can be
/// de-duplicated.
#[derive(Debug)]
pub enum ObjectCollection {}

impl<M, A> ResponseShape<M, A> for SingleObject
where
    M: Mapping,
    A: ThreadAdapter<BaseType = M::MappedObject>,
{
    type Serialized = M::MappedObject;
    type CollectionMapping = VoidMapping;
    type CollectionAdapter = NoThreadAdapter<i64>;

    const KIND: BindingKind = BindingKind::Object;

    fn bind(
        mapping_binding: MappingProvider<M>,
        thread_adapter: Option<A>,
        completion: RequestCompletion<M::MappedObject>,
    ) -> ObjectBinding<M, VoidMapping, A, NoThreadAdapter<i64>> {
        ObjectBinding::single(mapping_binding, thread_adapter, completion)
    }
}

impl<M, A> ResponseShape<M, A> for ObjectCollection
where
    M: Mapping,
    M::MappedObject: PartialEq,
    A: ThreadAdapter<BaseType = M::MappedObject>,
{
    type Serialized = Vec<M::MappedObject>;
    type CollectionMapping = M;
    type CollectionAdapter = A;

    const KIND: BindingKind = BindingKind::Collection;

    fn bind(
        mapping_binding: MappingProvider<M>,
        thread_adapter: Option<A>,
        completion: RequestCompletion<Vec<M::MappedObject>>,
    ) -> ObjectBinding<M, M, A, A> {
        ObjectBinding::collection(mapping_binding, thread_adapter, completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DeserializeMapping, MappingError};
    use std::sync::{Arc, Mutex};

    #[derive(Debug, PartialEq, serde::Deserialize)]
    struct Session {
        token: String,
    }

    impl Mappable for Session {
        const THREAD_CONFINED: bool = true;
    }

    fn provider<T>() -> MappingProvider<DeserializeMapping<T>>
    where
        T: serde::de::DeserializeOwned + Mappable,
    {
        Box::new(|| Binding::mapping("", DeserializeMapping::new()))
    }

    #[test]
    fn test_shape_kinds() {
        assert_eq!(
            <SingleObject as ResponseShape<DeserializeMapping<i64>, NoThreadAdapter<i64>>>::KIND,
            BindingKind::Object
        );
        assert_eq!(
            <ObjectCollection as ResponseShape<DeserializeMapping<i64>, NoThreadAdapter<i64>>>::KIND,
            BindingKind::Collection
        );
    }

    #[test]
    fn test_confined_type_without_adapter_is_configuration_error() {
        let binding = ObjectBinding::single(
            provider::<Session>(),
            None::<NoThreadAdapter<Session>>,
            Box::new(|_| {}),
        );
        assert!(matches!(
            binding.validate(),
            Err(RequestError::Configuration { .. })
        ));
    }

    /// Moves sessions across by token.
    struct SessionAdapter;

    impl ThreadAdapter for SessionAdapter {
        type BaseType = Session;
        type Representation = String;

        fn thread_safe_representations(
            &self,
            objects: Vec<Session>,
        ) -> Result<Vec<String>, crate::ThreadAdapterError> {
            Ok(objects.into_iter().map(|s| s.token).collect())
        }

        fn retrieve_objects(
            &self,
            tokens: Vec<String>,
        ) -> Result<Vec<Session>, crate::ThreadAdapterError> {
            Ok(tokens.into_iter().map(|token| Session { token }).collect())
        }
    }

    #[test]
    fn test_confined_type_with_adapter_is_valid() {
        let binding = ObjectBinding::collection(
            provider::<Session>(),
            Some(SessionAdapter),
            Box::new(|_| {}),
        );
        assert!(binding.validate().is_ok());
        assert!(binding.has_thread_adapter());
        assert_eq!(binding.kind(), BindingKind::Collection);
    }

    #[test]
    fn test_identity_adapter_does_not_satisfy_confined_type() {
        let binding = ObjectBinding::collection(
            provider::<Session>(),
            Some(NoThreadAdapter::<Session>::default()),
            Box::new(|_| {}),
        );
        assert!(matches!(
            binding.validate(),
            Err(RequestError::Configuration { .. })
        ));
    }

    #[test]
    fn test_identity_adapter_is_fine_for_unconfined_type() {
        let binding = ObjectBinding::single(
            provider::<i64>(),
            Some(NoThreadAdapter::<i64>::default()),
            Box::new(|_| {}),
        );
        assert!(binding.validate().is_ok());
    }

    #[test]
    fn test_fail_delivers_error_once() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let binding = ObjectBinding::collection(
            provider::<i64>(),
            None::<NoThreadAdapter<i64>>,
            Box::new(move |result: MappingResult<Vec<i64>>| {
                sink.lock().unwrap().push(result.is_err());
            }),
        );

        binding.fail(RequestError::Mapping(MappingError::Invalid {
            message: "nope".into(),
        }));
        assert_eq!(*seen.lock().unwrap(), vec![true]);
    }

    #[test]
    fn test_debug_names_arm() {
        let binding = ObjectBinding::single(
            provider::<i64>(),
            None::<NoThreadAdapter<i64>>,
            Box::new(|_| {}),
        );
        assert!(format!("{binding:?}").starts_with("Object"));
    }
}
