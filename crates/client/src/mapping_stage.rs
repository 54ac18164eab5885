//! The mapping stage: runs a binding's mapping on a blocking worker thread
//! and hands the result back to the calling task.
//!
//! The mapping provider is invoked on the worker, so a fresh mapping (and
//! whatever per-call resources it holds) exists for every evaluation. When a
//! thread adapter is supplied, objects leave the worker as adapter
//! representations and are resolved again on the calling task. The worker
//! runs inside the caller's request span.

use std::sync::Arc;

use binding::{
    map_collection, map_object, Binding, Handoff, Mapping, MappingError, MappingProvider,
    ObjectBinding, RequestError, ThreadAdapter,
};
use serde_json::Value;
use tracing::{debug, Span};

/// Maps `json` according to `binding` and invokes its completion callback.
///
/// Exactly one completion invocation happens, with either the mapped value
/// or a [`RequestError::Mapping`].
pub(crate) async fn execute<M, CM, A, CA>(binding: ObjectBinding<M, CM, A, CA>, json: Value)
where
    M: Mapping,
    CM: Mapping,
    CM::MappedObject: PartialEq,
    A: ThreadAdapter<BaseType = M::MappedObject>,
    CA: ThreadAdapter<BaseType = CM::MappedObject>,
{
    match binding {
        ObjectBinding::Object {
            mapping_binding,
            thread_adapter,
            completion,
        } => {
            let result = map_and_hand_off(mapping_binding, thread_adapter, json, |binding, json| {
                Ok(vec![map_object(binding, json)?])
            })
            .await
            .and_then(single)
            .map_err(RequestError::from);

            completion(result);
        }
        ObjectBinding::Collection {
            mapping_binding,
            thread_adapter,
            completion,
        } => {
            let result =
                map_and_hand_off(mapping_binding, thread_adapter, json, map_collection::<CM>)
                    .await
                    .map_err(RequestError::from);

            completion(result);
        }
    }
}

async fn map_and_hand_off<M, A, F>(
    provider: MappingProvider<M>,
    thread_adapter: Option<A>,
    json: Value,
    map: F,
) -> Result<Vec<M::MappedObject>, MappingError>
where
    M: Mapping,
    A: ThreadAdapter<BaseType = M::MappedObject>,
    F: FnOnce(Binding<M>, &Value) -> Result<Vec<M::MappedObject>, MappingError> + Send + 'static,
{
    let adapter = thread_adapter.map(Arc::new);
    let worker_adapter = adapter.clone();
    let span = Span::current();

    let handoff = tokio::task::spawn_blocking(move || {
        span.in_scope(|| {
            let objects = map(provider(), &json)?;
            debug!(count = objects.len(), "Mapped response");
            Ok::<_, MappingError>(Handoff::prepare(worker_adapter.as_deref(), objects)?)
        })
    })
    .await
    .map_err(|e| MappingError::Aborted {
        message: e.to_string(),
    })??;

    Ok(handoff.receive(adapter.as_deref())?)
}

fn single<T>(objects: Vec<T>) -> Result<T, MappingError> {
    let count = objects.len();
    let mut objects = objects.into_iter();
    match (objects.next(), objects.next()) {
        (Some(object), None) => Ok(object),
        _ => Err(MappingError::Invalid {
            message: format!("expected one mapped object, found {count}"),
        }),
    }
}
