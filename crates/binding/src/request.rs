//! The request contract.
//!
//! A [`Request`] declares what to send ([`Request::query`]), how to map the
//! response ([`Request::mapping`]), its result shape ([`Request::Shape`]),
//! how mapped objects leave the mapping thread ([`Request::thread_adapter`]),
//! and three lifecycle hooks. The client invokes them in this order:
//!
//! ```text
//! will_send → (transport) → did_finish_request → (mapping) → (thread adaptation) → did_finish → completion
//! ```
//!
//! Mapping and everything after it is skipped when `will_send` or
//! `did_finish_request` fails; `did_finish` is skipped only when `will_send`
//! fails or the binding is misconfigured.
//!
//! A request value is created per logical call and consumed by it.

use std::sync::Arc;

use serde_json::Value;

use crate::{
    Binding, GraphQlQuery, Mapping, MappingResult, ObjectBinding, RequestCompletion,
    ResponseMetadata, ResponseShape, ThreadAdapter,
};

/// The value a request delivers: the mapped type, or a `Vec` of it.
pub type SerializedObject<R> =
    <<R as Request>::Shape as ResponseShape<<R as Request>::Mapping, <R as Request>::Adapter>>::Serialized;

/// The [`ObjectBinding`] type a request derives.
pub type RequestBinding<R> = ObjectBinding<
    <R as Request>::Mapping,
    <<R as Request>::Shape as ResponseShape<<R as Request>::Mapping, <R as Request>::Adapter>>::CollectionMapping,
    <R as Request>::Adapter,
    <<R as Request>::Shape as ResponseShape<<R as Request>::Mapping, <R as Request>::Adapter>>::CollectionAdapter,
>;

/// A typed GraphQL request.
///
/// ## Example
///
/// ```
/// use binding::{
///     Binding, DeserializeMapping, Mappable, NoThreadAdapter, ObjectCollection, RawQuery,
///     Request,
/// };
///
/// #[derive(Debug, PartialEq, serde::Deserialize)]
/// struct Person {
///     id: u64,
/// }
///
/// impl Mappable for Person {}
///
/// struct AllPeople {
///     query: RawQuery,
/// }
///
/// impl Request for AllPeople {
///     type Mapping = DeserializeMapping<Person>;
///     type Shape = ObjectCollection;
///     type Query = RawQuery;
///     type Adapter = NoThreadAdapter<Person>;
///
///     fn query(&self) -> &RawQuery {
///         &self.query
///     }
///
///     fn mapping(&self) -> Binding<Self::Mapping> {
///         Binding::mapping("data.allPeople", DeserializeMapping::new())
///     }
///
///     fn thread_adapter(&self) -> Option<Self::Adapter> {
///         None
///     }
/// }
/// ```
pub trait Request: Send + Sync + 'static {
    /// Maps one response node to the domain type.
    type Mapping: Mapping;

    /// [`crate::SingleObject`] or [`crate::ObjectCollection`].
    type Shape: ResponseShape<Self::Mapping, Self::Adapter>;

    /// The query sent to the server.
    type Query: GraphQlQuery;

    /// Moves mapped objects off the mapping thread. Use
    /// [`crate::NoThreadAdapter`] when the request never supplies one.
    type Adapter: ThreadAdapter<BaseType = <Self::Mapping as Mapping>::MappedObject>;

    /// The query to send. Must return the same query for the request's lifetime.
    fn query(&self) -> &Self::Query;

    /// The mapping to apply to the response.
    ///
    /// **Runs on the background mapping thread, never on the caller's.** Any
    /// stateful resource the mapping needs (e.g. a store connection) must be
    /// acquired here, fresh, on every call: this accessor may run
    /// concurrently for different in-flight requests.
    fn mapping(&self) -> Binding<Self::Mapping>;

    /// Adapter for moving mapped objects to the caller's context.
    ///
    /// Required when the mapped type is
    /// [`THREAD_CONFINED`](crate::Mappable::THREAD_CONFINED); sending such a
    /// request without one fails with a configuration error before anything
    /// is sent.
    fn thread_adapter(&self) -> Option<Self::Adapter>;

    /// Called immediately before the query is sent. An error aborts the request.
    fn will_send(&self) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once the transport returns a response, before mapping. An
    /// error aborts mapping.
    fn did_finish_request(&self, _response: &ResponseMetadata, _json: &Value) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called with the final result right before the completion callback.
    ///
    /// An error is reported separately; it does not change the result the
    /// completion callback receives.
    fn did_finish(&self, _result: &MappingResult<SerializedObject<Self>>) -> anyhow::Result<()> {
        Ok(())
    }

    /// Derives this request's [`ObjectBinding`].
    ///
    /// The arm is fixed by [`Request::Shape`]. The mapping is not evaluated
    /// here; the binding holds a provider that calls [`Request::mapping`]
    /// each time it is invoked.
    fn generate_binding(
        self: &Arc<Self>,
        completion: RequestCompletion<SerializedObject<Self>>,
    ) -> RequestBinding<Self>
    where
        Self: Sized,
    {
        let request = Arc::clone(self);
        <Self::Shape as ResponseShape<Self::Mapping, Self::Adapter>>::bind(
            Box::new(move || request.mapping()),
            self.thread_adapter(),
            completion,
        )
    }
}
