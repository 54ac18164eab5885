//! Applies a [`Binding`] to a response payload.
//!
//! Both functions run on the background mapping thread. They are the only
//! place a [`Mapping`] is invoked.

use serde_json::Value;
use tracing::trace;

use crate::{Binding, Mapping, MappingError};

/// Maps the node at the binding's key path into a single object.
pub fn map_object<M: Mapping>(
    binding: Binding<M>,
    json: &Value,
) -> Result<M::MappedObject, MappingError> {
    let (key_path, mut mapping, _) = binding.into_parts();
    let node = key_path
        .resolve(json)
        .ok_or_else(|| MappingError::MissingKeyPath {
            key_path: key_path.to_string(),
        })?;

    trace!(key_path = %key_path, "Mapping single object");
    mapping.map(node)
}

/// Maps every element of the array at the binding's key path, in payload order.
///
/// An empty array yields an empty collection. With `unique` set, elements
/// equal to an earlier element are dropped.
pub fn map_collection<M>(
    binding: Binding<M>,
    json: &Value,
) -> Result<Vec<M::MappedObject>, MappingError>
where
    M: Mapping,
    M::MappedObject: PartialEq,
{
    let (key_path, mut mapping, policy) = binding.into_parts();

    let items = match key_path.resolve(json) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None if policy.nullable => return Ok(Vec::new()),
        None => {
            return Err(MappingError::MissingKeyPath {
                key_path: key_path.to_string(),
            })
        }
        Some(other) => {
            return Err(MappingError::NotACollection {
                key_path: key_path.to_string(),
                found: json_kind(other),
            })
        }
    };

    trace!(key_path = %key_path, count = items.len(), "Mapping collection");

    let mut objects: Vec<M::MappedObject> = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let object = mapping.map(item).map_err(|source| MappingError::Element {
            index,
            source: Box::new(source),
        })?;

        if policy.unique && objects.contains(&object) {
            continue;
        }
        objects.push(object);
    }

    Ok(objects)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CollectionUpdatePolicy, DeserializeMapping, Mappable};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, PartialEq, Deserialize)]
    struct Person {
        id: u32,
    }

    impl Mappable for Person {}

    fn people(path: &str, policy: CollectionUpdatePolicy) -> Binding<DeserializeMapping<Person>> {
        Binding::collection_mapping(path, DeserializeMapping::new(), policy)
    }

    #[test]
    fn test_collection_preserves_payload_order() {
        let json = json!([{ "id": 1 }, { "id": 2 }]);
        let mapped = map_collection(people("", CollectionUpdatePolicy::default()), &json).unwrap();
        assert_eq!(mapped, vec![Person { id: 1 }, Person { id: 2 }]);
    }

    #[test]
    fn test_empty_collection_is_success() {
        let json = json!({ "data": { "people": [] } });
        let mapped =
            map_collection(people("data.people", CollectionUpdatePolicy::default()), &json)
                .unwrap();
        assert!(mapped.is_empty());
    }

    #[test]
    fn test_unique_policy_drops_duplicates() {
        let json = json!([{ "id": 1 }, { "id": 2 }, { "id": 1 }]);

        let unique = map_collection(people("", CollectionUpdatePolicy::default()), &json).unwrap();
        assert_eq!(unique, vec![Person { id: 1 }, Person { id: 2 }]);

        let all = map_collection(
            people(
                "",
                CollectionUpdatePolicy {
                    unique: false,
                    nullable: false,
                },
            ),
            &json,
        )
        .unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_nullable_policy() {
        let json = json!({ "data": { "people": null } });
        let nullable = CollectionUpdatePolicy {
            unique: true,
            nullable: true,
        };

        assert!(map_collection(people("data.people", nullable), &json)
            .unwrap()
            .is_empty());
        assert!(map_collection(people("data.missing", nullable), &json)
            .unwrap()
            .is_empty());
        assert!(matches!(
            map_collection(people("data.people", CollectionUpdatePolicy::default()), &json),
            Err(MappingError::NotACollection { found: "null", .. })
        ));
    }

    #[test]
    fn test_failing_element_reports_index() {
        let json = json!([{ "id": 1 }, { "id": "two" }]);
        let err = map_collection(people("", CollectionUpdatePolicy::default()), &json).unwrap_err();
        assert!(matches!(err, MappingError::Element { index: 1, .. }));
    }

    #[test]
    fn test_object_missing_key_path() {
        let binding = Binding::mapping("data.person", DeserializeMapping::<Person>::new());
        let err = map_object(binding, &json!({ "data": {} })).unwrap_err();
        assert_eq!(err.to_string(), "Key path 'data.person' not found in response");
    }

    #[test]
    fn test_object_mapping() {
        let binding = Binding::mapping("data.person", DeserializeMapping::<Person>::new());
        let person = map_object(binding, &json!({ "data": { "person": { "id": 7 } } })).unwrap();
        assert_eq!(person, Person { id: 7 });
    }
}
