//! Batch execution results.

use std::collections::BTreeMap;

use super::response::Response;
use crate::error::ClientError;

/// Outcome of a batch `gather` call.
///
/// `responses[i]` corresponds to the i-th input request regardless of
/// completion order. A slot is `None` when that request failed (its error
/// is in `errors`) or was skipped after a stop-on-error trip.
#[derive(Debug, Default)]
pub struct BatchResult {
    /// Per-index responses, input order preserved.
    pub responses: Vec<Option<Response>>,
    /// Errors keyed by input index.
    pub errors: BTreeMap<usize, ClientError>,
}

impl BatchResult {
    /// Number of successful responses.
    #[must_use]
    pub fn success_count(&self) -> usize {
        self.responses.iter().filter(|slot| slot.is_some()).count()
    }

    /// Number of failed requests.
    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.errors.len()
    }

    /// Whether every request succeeded.
    #[must_use]
    pub fn all_succeeded(&self) -> bool {
        self.errors.is_empty()
    }

    /// Surface the first error (lowest input index), or yield the
    /// responses when there is none.
    pub fn raise_on_error(mut self) -> Result<Vec<Option<Response>>, ClientError> {
        // BTreeMap iteration is index-ordered, so this is the first failure.
        let first_index = self.errors.keys().next().copied();
        match first_index.and_then(|index| self.errors.remove(&index)) {
            Some(error) => Err(error),
            None => Ok(self.responses),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TransportError, TransportErrorKind};

    #[test]
    fn counts_and_first_error() {
        let mut result = BatchResult {
            responses: vec![None, None, None],
            errors: BTreeMap::new(),
        };
        result.errors.insert(
            2,
            ClientError::Transport(TransportError::new(
                TransportErrorKind::Connect,
                "https://b.example",
                "refused",
            )),
        );
        result.errors.insert(
            1,
            ClientError::Http {
                status: 500,
                url: "https://a.example".into(),
            },
        );

        assert_eq!(result.success_count(), 0);
        assert_eq!(result.failure_count(), 2);
        assert!(!result.all_succeeded());

        // Lowest index wins.
        match result.raise_on_error() {
            Err(ClientError::Http { status, .. }) => assert_eq!(status, 500),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn raise_on_error_passes_through_success() {
        let result = BatchResult {
            responses: vec![],
            errors: BTreeMap::new(),
        };
        assert!(result.raise_on_error().is_ok());
    }
}
