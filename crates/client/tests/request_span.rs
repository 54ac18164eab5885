//! Mapping-stage work runs inside the request's tracing span.
//!
//! Kept in its own test binary because it installs a global subscriber.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use binding::{
    Binding, DeserializeMapping, Mappable, Mapping, MappingError, QueryPayload, RawQuery, Request,
    ResponseMetadata, SingleObject, StatusCode, ThreadAdapter, ThreadAdapterError, Transport,
    TransportError, TransportResponse,
};
use client::Client;
use serde_json::{json, Value};
use tracing::Span;
use tracing_subscriber::util::SubscriberInitExt;

type Seen = Arc<Mutex<Vec<(&'static str, Option<&'static str>)>>>;

fn record(seen: &Seen, stage: &'static str) {
    let span = Span::current().metadata().map(|meta| meta.name());
    seen.lock().unwrap().push((stage, span));
}

#[derive(Debug, PartialEq, serde::Deserialize)]
struct Ship {
    id: u64,
}

impl Mappable for Ship {}

struct FixedTransport;

#[async_trait]
impl Transport for FixedTransport {
    async fn send(&self, _payload: &QueryPayload) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse {
            metadata: ResponseMetadata::new(StatusCode::new(200).unwrap()),
            json: json!({ "data": { "ship": { "id": 9 } } }),
        })
    }
}

struct RecordingMapping {
    seen: Seen,
}

impl Mapping for RecordingMapping {
    type MappedObject = Ship;

    fn map(&mut self, node: &Value) -> Result<Ship, MappingError> {
        record(&self.seen, "map");
        DeserializeMapping::<Ship>::new().map(node)
    }
}

struct RecordingAdapter {
    seen: Seen,
}

impl ThreadAdapter for RecordingAdapter {
    type BaseType = Ship;
    type Representation = u64;

    fn thread_safe_representations(&self, ships: Vec<Ship>) -> Result<Vec<u64>, ThreadAdapterError> {
        record(&self.seen, "export");
        Ok(ships.into_iter().map(|s| s.id).collect())
    }

    fn retrieve_objects(&self, ids: Vec<u64>) -> Result<Vec<Ship>, ThreadAdapterError> {
        record(&self.seen, "retrieve");
        Ok(ids.into_iter().map(|id| Ship { id }).collect())
    }
}

struct ShipRequest {
    query: RawQuery,
    seen: Seen,
}

impl Request for ShipRequest {
    type Mapping = RecordingMapping;
    type Shape = SingleObject;
    type Query = RawQuery;
    type Adapter = RecordingAdapter;

    fn query(&self) -> &RawQuery {
        &self.query
    }

    fn mapping(&self) -> Binding<RecordingMapping> {
        record(&self.seen, "mapping");
        Binding::mapping(
            "data.ship",
            RecordingMapping {
                seen: Arc::clone(&self.seen),
            },
        )
    }

    fn thread_adapter(&self) -> Option<RecordingAdapter> {
        Some(RecordingAdapter {
            seen: Arc::clone(&self.seen),
        })
    }

    fn will_send(&self) -> anyhow::Result<()> {
        record(&self.seen, "will_send");
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_mapping_worker_runs_in_request_span() {
    let _ = tracing_subscriber::registry().try_init();
    let seen = Seen::default();
    let client = Client::new(FixedTransport);

    let ship = client
        .send_async(ShipRequest {
            query: RawQuery::new("{ ship { id } }"),
            seen: Arc::clone(&seen),
        })
        .await
        .unwrap();

    assert_eq!(ship, Ship { id: 9 });
    assert_eq!(
        *seen.lock().unwrap(),
        vec![
            ("will_send", Some("graphql_request")),
            ("mapping", Some("graphql_request")),
            ("map", Some("graphql_request")),
            ("export", Some("graphql_request")),
            ("retrieve", Some("graphql_request")),
        ]
    );
}
