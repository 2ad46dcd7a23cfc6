//! Resource dereferencing.
//!
//! Tools may answer with a resource reference instead of inline bytes; the
//! caller then issues `resources/read` with that URI, which lands here.

use std::future::Future;
use std::pin::Pin;

use crate::model::{ErrorData, ReadResourceResult, ResourceTemplate};

/// Type alias for async resource reads.
pub type ResourceFuture = Pin<Box<dyn Future<Output = Result<ReadResourceResult, ErrorData>> + Send>>;

/// Resolves resource URIs to their contents.
pub trait ResourceRegistry: Send + Sync {
    /// URI templates advertised by `resources/templates/list`.
    fn templates(&self) -> Vec<ResourceTemplate>;

    /// Start reading `uri`.
    ///
    /// Returns `None` if the URI does not belong to this registry.
    fn read(&self, uri: &str) -> Option<ResourceFuture>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{blob_contents, contents_bytes};

    struct StaticResources;

    impl ResourceRegistry for StaticResources {
        fn templates(&self) -> Vec<ResourceTemplate> {
            Vec::new()
        }

        fn read(&self, uri: &str) -> Option<ResourceFuture> {
            let uri = uri.strip_prefix("test:")?.to_string();
            Some(Box::pin(async move {
                Ok(ReadResourceResult::new(vec![blob_contents(
                    format!("test:{uri}"),
                    "text/plain",
                    uri.as_bytes(),
                )]))
            }))
        }
    }

    #[tokio::test]
    async fn test_read_known_scheme() {
        let result = StaticResources.read("test:abc").unwrap().await.unwrap();
        assert_eq!(contents_bytes(&result.contents[0]).unwrap(), b"abc");
    }

    #[test]
    fn test_unknown_scheme_is_none() {
        assert!(StaticResources.read("other:abc").is_none());
    }
}
