//! The ad-hoc request the CLI sends: any query, mapped to raw JSON.

use std::marker::PhantomData;

use binding::{
    Binding, CollectionUpdatePolicy, DeserializeMapping, KeyPath, MappingResult, NoThreadAdapter,
    RawQuery, Request, ResponseMetadata, ResponseShape, SerializedObject,
};
use serde_json::Value;
use tracing::debug;

/// Maps the node at `key_path` to JSON, as one object or as a collection
/// depending on `S`.
pub struct JsonRequest<S> {
    query: RawQuery,
    key_path: KeyPath,
    policy: CollectionUpdatePolicy,
    _shape: PhantomData<fn() -> S>,
}

impl<S> JsonRequest<S> {
    pub fn new(query: RawQuery, key_path: KeyPath, policy: CollectionUpdatePolicy) -> Self {
        Self {
            query,
            key_path,
            policy,
            _shape: PhantomData,
        }
    }
}

impl<S> Request for JsonRequest<S>
where
    S: ResponseShape<DeserializeMapping<Value>, NoThreadAdapter<Value>>,
{
    type Mapping = DeserializeMapping<Value>;
    type Shape = S;
    type Query = RawQuery;
    type Adapter = NoThreadAdapter<Value>;

    fn query(&self) -> &RawQuery {
        &self.query
    }

    fn mapping(&self) -> Binding<DeserializeMapping<Value>> {
        Binding::collection_mapping(self.key_path.clone(), DeserializeMapping::new(), self.policy)
    }

    fn thread_adapter(&self) -> Option<NoThreadAdapter<Value>> {
        None
    }

    fn did_finish_request(&self, response: &ResponseMetadata, _json: &Value) -> anyhow::Result<()> {
        debug!(
            status = %response.status,
            headers = response.headers.len(),
            received_at = %response.received_at,
            "Response accepted"
        );
        Ok(())
    }

    fn did_finish(&self, result: &MappingResult<SerializedObject<Self>>) -> anyhow::Result<()> {
        if let Err(err) = result {
            debug!(key_path = %self.key_path, error = %err, "Request finished with an error");
        }
        Ok(())
    }
}
