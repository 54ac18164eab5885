//! Query port: what a request sends.
//!
//! Building GraphQL documents is outside this crate. A [`GraphQlQuery`] only
//! has to render its document, name its operation, and supply variables;
//! [`QueryPayload`] turns that into the standard JSON request body.

use serde::Serialize;
use serde_json::Value;

use crate::{OperationName, QueryError};

/// A GraphQL operation that can be sent to the server.
pub trait GraphQlQuery: Send + Sync + 'static {
    /// Renders the GraphQL document text.
    fn graphql_string(&self) -> Result<String, QueryError>;

    /// The operation to execute when the document defines several.
    fn operation_name(&self) -> Option<&OperationName> {
        None
    }

    /// Variables for the operation, as a JSON object.
    fn variables(&self) -> Option<Value> {
        None
    }
}

/// The JSON body of a GraphQL-over-HTTP request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPayload {
    /// Document text.
    pub query: String,

    /// Operation to execute.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<OperationName>,

    /// Operation variables.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl QueryPayload {
    /// Renders `query` into a wire payload.
    pub fn from_query<Q: GraphQlQuery + ?Sized>(query: &Q) -> Result<Self, QueryError> {
        let document = query.graphql_string()?;
        if document.trim().is_empty() {
            return Err(QueryError::EmptyDocument);
        }

        Ok(Self {
            query: document,
            operation_name: query.operation_name().cloned(),
            variables: query.variables(),
        })
    }
}

/// A query given as literal document text.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuery {
    document: String,
    operation_name: Option<OperationName>,
    variables: Option<Value>,
}

impl RawQuery {
    /// Creates a query from document text.
    pub fn new(document: impl Into<String>) -> Self {
        Self {
            document: document.into(),
            operation_name: None,
            variables: None,
        }
    }

    /// Sets the operation name.
    pub fn with_operation_name(mut self, name: OperationName) -> Self {
        self.operation_name = Some(name);
        self
    }

    /// Sets the variables. Must be a JSON object.
    pub fn with_variables(mut self, variables: Value) -> Result<Self, QueryError> {
        if !variables.is_object() {
            return Err(QueryError::Serialization {
                message: "variables must be a JSON object".to_owned(),
            });
        }
        self.variables = Some(variables);
        Ok(self)
    }
}

impl GraphQlQuery for RawQuery {
    fn graphql_string(&self) -> Result<String, QueryError> {
        Ok(self.document.clone())
    }

    fn operation_name(&self) -> Option<&OperationName> {
        self.operation_name.as_ref()
    }

    fn variables(&self) -> Option<Value> {
        self.variables.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_payload_omits_absent_fields() {
        let payload = QueryPayload::from_query(&RawQuery::new("{ hero { name } }")).unwrap();
        assert_eq!(
            serde_json::to_value(&payload).unwrap(),
            json!({ "query": "{ hero { name } }" })
        );
    }

    #[test]
    fn test_payload_includes_operation_and_variables() {
        let query = RawQuery::new("query Hero($id: ID!) { hero(id: $id) { name } }")
            .with_operation_name(OperationName::new("Hero").unwrap())
            .with_variables(json!({ "id": "1000" }))
            .unwrap();

        let payload = serde_json::to_value(QueryPayload::from_query(&query).unwrap()).unwrap();
        assert_eq!(payload["operationName"], json!("Hero"));
        assert_eq!(payload["variables"], json!({ "id": "1000" }));
    }

    #[test]
    fn test_empty_document_rejected() {
        assert!(matches!(
            QueryPayload::from_query(&RawQuery::new("   ")),
            Err(QueryError::EmptyDocument)
        ));
    }

    #[test]
    fn test_variables_must_be_object() {
        assert!(RawQuery::new("{ a }").with_variables(json!([1])).is_err());
    }
}
