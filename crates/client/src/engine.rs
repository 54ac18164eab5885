//! The request engine.
//!
//! [`Client::send`] drives one [`Request`] through its lifecycle:
//!
//! 1. derive and validate the [`binding::ObjectBinding`];
//! 2. `will_send`;
//! 3. render the query and hand it to the [`Transport`];
//! 4. `did_finish_request`, then the GraphQL `errors` check;
//! 5. map on a blocking worker, adapt back onto the calling task;
//! 6. `did_finish`, then the completion callback.
//!
//! A failure in steps 1–4 skips mapping entirely. Steps 1 and 2 also skip
//! `did_finish`. The completion callback runs exactly once in every case.

use std::sync::{Arc, OnceLock};

use binding::{
    BindingKind, GraphQlError, GraphQlQuery, MappingError, MappingResult, QueryPayload, Request,
    RequestCompletion, RequestError, RequestId, ResponseShape, SerializedObject, Transport,
};
use tokio::sync::oneshot;
use tracing::{debug, error, info_span, warn, Instrument};

/// Outcome of one [`Client::send`] call, beyond what the completion callback saw.
#[derive(Debug)]
pub struct DeliveryReport {
    /// Identifier used in this request's tracing span.
    pub request_id: RequestId,

    /// Which binding arm the request used.
    pub kind: BindingKind,

    /// The `did_finish` failure, if the hook failed. The completion callback
    /// received the original result regardless.
    pub hook_failure: Option<RequestError>,
}

/// Sends [`Request`]s over a [`Transport`] and delivers typed results.
///
/// Cloning is cheap; clones share the transport.
pub struct Client<T> {
    transport: Arc<T>,
}

impl<T> Clone for Client<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
        }
    }
}

impl<T: Transport + 'static> Client<T> {
    /// Creates a client owning `transport`.
    pub fn new(transport: T) -> Self {
        Self::from_shared(Arc::new(transport))
    }

    /// Creates a client over a transport shared with other clients.
    pub fn from_shared(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Returns the underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Sends `request` and invokes `completion` exactly once with its result.
    ///
    /// The completion callback runs on the task awaiting this future; mapping
    /// runs on a blocking worker thread.
    pub async fn send<R, F>(&self, request: R, completion: F) -> DeliveryReport
    where
        R: Request,
        F: FnOnce(MappingResult<SerializedObject<R>>) + Send + 'static,
    {
        let request_id = RequestId::new_random();
        let kind = <R::Shape as ResponseShape<R::Mapping, R::Adapter>>::KIND;
        let operation = request
            .query()
            .operation_name()
            .map(|name| name.to_string())
            .unwrap_or_default();
        let span = info_span!("graphql_request", %request_id, %kind, operation = %operation);

        let hook_failure = self
            .run(request, Box::new(completion))
            .instrument(span)
            .await;

        DeliveryReport {
            request_id,
            kind,
            hook_failure,
        }
    }

    /// Sends `request` and returns its result.
    ///
    /// A `did_finish` failure is logged and otherwise ignored; use
    /// [`Client::send`] to observe it.
    pub async fn send_async<R: Request>(&self, request: R) -> MappingResult<SerializedObject<R>> {
        let (tx, rx) = oneshot::channel();
        self.send(request, move |result| {
            // The receiver is awaited right below; it cannot have been dropped.
            let _ = tx.send(result);
        })
        .await;

        rx.await.unwrap_or_else(|_| {
            Err(RequestError::Mapping(MappingError::Aborted {
                message: "completion was never invoked".to_owned(),
            }))
        })
    }

    async fn run<R: Request>(
        &self,
        request: R,
        completion: RequestCompletion<SerializedObject<R>>,
    ) -> Option<RequestError> {
        let request = Arc::new(request);
        let hook_failure: Arc<OnceLock<RequestError>> = Arc::new(OnceLock::new());

        let finishing = Arc::clone(&request);
        let failure_slot = Arc::clone(&hook_failure);
        let binding = request.generate_binding(Box::new(move |result| {
            if runs_did_finish(&result) {
                if let Err(source) = finishing.did_finish(&result) {
                    error!(error = %source, "did_finish hook failed; result delivered unchanged");
                    let _ = failure_slot.set(RequestError::PostMappingHook { source });
                }
            }
            completion(result);
        }));

        if let Err(err) = binding.validate() {
            error!(error = %err, "Request binding is misconfigured; nothing was sent");
            binding.fail(err);
            return take_failure(hook_failure);
        }
        debug!(thread_adapter = binding.has_thread_adapter(), "Binding validated");

        if let Err(source) = request.will_send() {
            warn!(error = %source, "will_send rejected the request");
            binding.fail(RequestError::PreSend { source });
            return take_failure(hook_failure);
        }

        let payload = match QueryPayload::from_query(request.query()) {
            Ok(payload) => payload,
            Err(err) => {
                warn!(error = %err, "Query could not be rendered");
                binding.fail(err.into());
                return take_failure(hook_failure);
            }
        };

        debug!("Sending query");
        let response = match self.transport.send(&payload).await {
            Ok(response) => response,
            Err(err) => {
                warn!(error = %err, retry = ?err.retry_policy(), "Transport failed");
                binding.fail(err.into());
                return take_failure(hook_failure);
            }
        };
        debug!(status = %response.metadata.status, "Response received");

        if let Err(source) = request.did_finish_request(&response.metadata, &response.json) {
            warn!(error = %source, "did_finish_request rejected the response");
            binding.fail(RequestError::PostTransport { source });
            return take_failure(hook_failure);
        }

        let errors = GraphQlError::from_response(&response.json);
        if !errors.is_empty() {
            warn!(count = errors.len(), first = %errors[0], "Server returned GraphQL errors");
            binding.fail(RequestError::GraphQl { errors });
            return take_failure(hook_failure);
        }

        crate::mapping_stage::execute(binding, response.json).await;
        take_failure(hook_failure)
    }
}

/// `did_finish` observes every outcome except those where the request never
/// got past validation or `will_send`.
fn runs_did_finish<T>(result: &MappingResult<T>) -> bool {
    !matches!(
        result,
        Err(RequestError::Configuration { .. } | RequestError::PreSend { .. })
    )
}

fn take_failure(slot: Arc<OnceLock<RequestError>>) -> Option<RequestError> {
    Arc::into_inner(slot).and_then(OnceLock::into_inner)
}
