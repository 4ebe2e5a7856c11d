//! GraphQL-style operations against the undocumented web API.
//!
//! Each remote operation is bound to a fixed, service-assigned opaque query
//! id that forms the request path, and to a feature-flag map that must be
//! sent in full. The modules here build per-operation variables, invoke the
//! shared executor, and hand responses to the normalizer.

pub(crate) mod features;
pub(crate) mod following;
pub(crate) mod polls;
pub(crate) mod profiles;
pub(crate) mod search;
pub(crate) mod tweets;

use serde_json::Value;

use crate::http::Endpoints;

/// A GraphQL operation: opaque query id plus operation name.
pub(crate) type Operation = (&'static str, &'static str);

/// Builds the request path `{base}/{queryId}/{OperationName}`.
pub(crate) fn operation_url(endpoints: &Endpoints, op: Operation) -> String {
    format!("{}/{}/{}", endpoints.graphql_base, op.0, op.1)
}

/// Builds a GET url with `variables` (and optionally `features`) encoded
/// into the query string; the service rejects bodies on GET.
pub(crate) fn query_url(
    endpoints: &Endpoints,
    op: Operation,
    variables: &Value,
    features: Option<&Value>,
) -> String {
    let mut url = format!(
        "{}?variables={}",
        operation_url(endpoints, op),
        urlencoding::encode(&variables.to_string())
    );
    if let Some(features) = features {
        url.push_str(&format!(
            "&features={}",
            urlencoding::encode(&features.to_string())
        ));
    }
    url
}
