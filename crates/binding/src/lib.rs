//! Typed request binding core for AutoGraph.
//!
//! This crate contains the request contract, the object-binding mechanism
//! that decides whether a request yields one object or a collection, and the
//! port traits (query, mapping, thread adapter, transport) that
//! infrastructure crates implement. The [`client`] crate drives requests
//! through these types; it never adds binding rules.
//!
//! ## Architectural Layer
//!
//! **Domain + port definitions.** This crate has no I/O dependencies.
//! It defines *what* a request needs; infrastructure crates define *how* to
//! send it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`request`] | The [`Request`] contract and its derived type aliases |
//! | [`object_binding`] | [`ObjectBinding`], response shapes, completion types |
//! | [`mapping`] | [`Mapping`], [`Mappable`], [`Binding`], [`KeyPath`] |
//! | [`mapper`] | Applying a [`Binding`] to a payload |
//! | [`thread_adapter`] | [`ThreadAdapter`], [`Handoff`], and the identity [`NoThreadAdapter`] |
//! | [`query`] | [`GraphQlQuery`], [`QueryPayload`], [`RawQuery`] |
//! | [`transport`] | [`Transport`] and response metadata |
//! | [`identifiers`] | Newtype identifiers (`RequestId`, `OperationName`) |
//! | [`types`] | Shared value types (`StatusCode`, `GraphQlError`, `Timestamp`) |
//! | [`errors`] | Error and retry-policy types |
//!
//! [`client`]: https://docs.rs/client

pub mod errors;
pub mod identifiers;
pub mod mapper;
pub mod mapping;
pub mod object_binding;
pub mod query;
pub mod request;
pub mod thread_adapter;
pub mod transport;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{
    MappingError, QueryError, RequestError, RetryPolicy, ThreadAdapterError, TransportError,
};
pub use identifiers::{OperationName, RequestId};
pub use mapper::{map_collection, map_object};
pub use mapping::{
    Binding, CollectionUpdatePolicy, DeserializeMapping, KeyPath, Mappable, Mapping, VoidMapping,
};
pub use object_binding::{
    BindingKind, MappingProvider, MappingResult, ObjectBinding, ObjectCollection,
    RequestCompletion, ResponseShape, SingleObject,
};
pub use query::{GraphQlQuery, QueryPayload, RawQuery};
pub use request::{Request, RequestBinding, SerializedObject};
pub use thread_adapter::{Handoff, NoThreadAdapter, ThreadAdapter};
pub use transport::{ResponseMetadata, Transport, TransportResponse};
pub use types::{ErrorLocation, GraphQlError, StatusCode, Timestamp};
