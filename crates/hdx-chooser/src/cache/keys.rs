//! Cache key definitions
//!
//! Request signatures for catalog queries.

use std::fmt;

use hdx_client::CatalogQuery;

/// Normalized signature of a catalog request
///
/// Built from the operation name and its parameters in a fixed (sorted)
/// order, so two logically identical requests always produce the same key no
/// matter how they were constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestSignature {
    /// Operation name (e.g. "get_dataset")
    pub operation: String,
    /// Parameters sorted by name
    pub params: Vec<(String, String)>,
}

impl RequestSignature {
    /// Create a signature from an operation and parameters in any order
    pub fn new<K, V>(operation: &str, params: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut params: Vec<(String, String)> = params
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        params.sort();

        Self {
            operation: operation.to_string(),
            params,
        }
    }

    /// Signature of a catalog query
    pub fn from_query(query: &CatalogQuery) -> Self {
        Self::new(query.operation(), query.params())
    }

    /// Convert to storage key string
    /// Format: operation?name=value&name=value (values percent-encoded)
    pub fn to_storage_key(&self) -> String {
        if self.params.is_empty() {
            return self.operation.clone();
        }
        let params: Vec<String> = self
            .params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect();
        format!("{}?{}", self.operation, params.join("&"))
    }
}

impl From<&CatalogQuery> for RequestSignature {
    fn from(query: &CatalogQuery) -> Self {
        Self::from_query(query)
    }
}

impl fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage_key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_from_query() {
        let sig = RequestSignature::from_query(&CatalogQuery::get_dataset("guinea_3w_data"));
        assert_eq!(sig.operation, "get_dataset");
        assert_eq!(sig.to_storage_key(), "get_dataset?id=guinea_3w_data");
    }

    #[test]
    fn test_parameter_order_is_canonical() {
        let a = RequestSignature::new("location_tag_datasets", [("tag", "3w"), ("location", "hti")]);
        let b = RequestSignature::new("location_tag_datasets", [("location", "hti"), ("tag", "3w")]);
        assert_eq!(a, b);
        assert_eq!(a.to_storage_key(), b.to_storage_key());
        assert_eq!(
            a,
            RequestSignature::from_query(&CatalogQuery::location_tag_datasets("hti", "3w"))
        );
    }

    #[test]
    fn test_independently_built_queries_collide() {
        let a = RequestSignature::from(&CatalogQuery::search("cholera"));
        let b = RequestSignature::from(&CatalogQuery::SearchDatasets {
            query: String::from("chol") + "era",
        });
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_params_different_keys() {
        let a = RequestSignature::from_query(&CatalogQuery::get_tag("3w"));
        let b = RequestSignature::from_query(&CatalogQuery::get_tag("4w"));
        assert_ne!(a.to_storage_key(), b.to_storage_key());
    }

    #[test]
    fn test_values_cannot_forge_separators() {
        let a = RequestSignature::from_query(&CatalogQuery::search("a&query=b"));
        assert_eq!(a.to_storage_key(), "search_datasets?query=a%26query%3Db");
        assert_eq!(
            RequestSignature::from_query(&CatalogQuery::ListLocations).to_string(),
            "list_locations"
        );
    }
}
