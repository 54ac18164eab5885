//! AutoGraph request engine.
//!
//! [`Client`] takes a [`binding::Request`], sends its query over a
//! [`binding::Transport`], maps the response on a blocking worker thread, hands
//! the mapped objects back through the request's thread adapter, and invokes
//! the lifecycle hooks and completion callback in order.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** The engine sequences calls between the request
//! contract and the transport. It contains no binding rules of its own; shape
//! resolution and validation live in the [`binding`] crate.
//!
//! ## Execution contexts
//!
//! | Work | Runs on |
//! |------|---------|
//! | `will_send`, `did_finish_request`, transport send | the task awaiting [`Client::send`] |
//! | `Request::mapping`, mapping, `thread_safe_representations` | a `tokio` blocking worker |
//! | `retrieve_objects`, `did_finish`, completion | the task awaiting [`Client::send`] |

mod engine;
mod mapping_stage;

pub use engine::{Client, DeliveryReport};
