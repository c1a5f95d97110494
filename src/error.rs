//! Error taxonomy for the search engine.
//!
//! Saturation at a narrow precision is not an error: it is routed to the next
//! tier inside the cascade and never reaches this type. Everything here is a
//! discrete failure that propagates to the caller.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SearchError {
    /// Invalid configuration or input rejected before any kernel runs.
    #[error("configuration error: {0}")]
    Config(String),

    /// The 64-bit kernel cannot guarantee an exact score for this pair.
    #[error("score range exceeded at 64-bit precision for query {query_id} vs database sequence {db_id}")]
    FatalOverflow { query_id: usize, db_id: usize },

    /// Per-run buffer allocation failed.
    #[error("failed to allocate {what} ({elements} elements)")]
    Resource {
        what: &'static str,
        elements: usize,
        #[source]
        source: std::collections::TryReserveError,
    },

    /// The worker pool could not be started.
    #[error("failed to start worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// The database source failed to produce the next chunk.
    #[error("database source error: {0}")]
    Source(#[from] std::io::Error),
}

impl SearchError {
    pub fn config(msg: impl Into<String>) -> Self {
        SearchError::Config(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, SearchError>;

/// Grow `buf` to exactly `len` elements filled with `fill`, reporting
/// allocation failure instead of aborting.
pub(crate) fn try_resize<T: Clone>(
    buf: &mut Vec<T>,
    len: usize,
    fill: T,
    what: &'static str,
) -> Result<()> {
    if len > buf.len() {
        buf.try_reserve(len - buf.len())
            .map_err(|source| SearchError::Resource {
                what,
                elements: len,
                source,
            })?;
    }
    buf.clear();
    buf.resize(len, fill);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_pair() {
        let err = SearchError::FatalOverflow {
            query_id: 3,
            db_id: 17,
        };
        let msg = err.to_string();
        assert!(msg.contains("query 3"));
        assert!(msg.contains("17"));
    }

    #[test]
    fn test_try_resize_fills() {
        let mut buf = vec![1i16; 4];
        try_resize(&mut buf, 10, -3, "test").unwrap();
        assert_eq!(buf.len(), 10);
        assert!(buf.iter().all(|&v| v == -3));
        try_resize(&mut buf, 2, 7, "test").unwrap();
        assert_eq!(buf, vec![7, 7]);
    }
}
