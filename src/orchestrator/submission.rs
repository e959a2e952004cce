//! Form submission processing.
//!
//! Validates the raw form input, appends the marker and turns the outcome into
//! a notice for whichever surface submitted it.

use crate::model::{Marker, Notice, Submission};
use crate::storage::LocalStorage;
use crate::store::{format_chain, MarkerStore, StoreError};
use crate::validate::{validate_submission, CoordinatePolicy};

/// Result of processing one submission, ready for presentation layers.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ProcessedSubmission {
    /// Marker that was appended, if the input was valid.
    pub added: Option<Marker>,
    /// False when the marker only lives in memory for this session.
    pub persisted: bool,
    pub notice: Notice,
}

impl ProcessedSubmission {
    pub fn accepted(&self) -> bool {
        self.added.is_some()
    }
}

/// Validate `submission` and append it to `store`.
///
/// Invalid input leaves the store untouched. A failed write still appends in
/// memory and is reported as an error notice.
pub(crate) fn process_submission<S: LocalStorage>(
    store: &mut MarkerStore<S>,
    policy: CoordinatePolicy,
    submission: &Submission,
) -> ProcessedSubmission {
    let rejected = |reason: &dyn std::fmt::Display| {
        tracing::info!(error = %reason, "submission rejected");
        ProcessedSubmission {
            added: None,
            persisted: false,
            notice: Notice::Error(format!(
                "Invalid input: {reason}. Latitude and longitude must be numbers."
            )),
        }
    };
    let marker = match validate_submission(submission, policy) {
        Ok(m) => m,
        Err(e) => return rejected(&e),
    };

    match store.append(marker.clone()) {
        Ok(()) => {
            tracing::info!(name = %marker.name, at = %marker.coordinates, "marker added");
            ProcessedSubmission {
                notice: Notice::Info(format!(
                    "Added \"{}\" at {}",
                    marker.name, marker.coordinates
                )),
                added: Some(marker),
                persisted: true,
            }
        }
        Err(StoreError::InvalidMarker(e)) => rejected(&e),
        Err(e) => ProcessedSubmission {
            notice: Notice::Error(format!(
                "Added \"{}\" for this session only: {}",
                marker.name,
                format_chain(&e)
            )),
            added: Some(marker),
            persisted: false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;
    use crate::store::{default_markers, DEFAULT_STORAGE_KEY};

    fn store(storage: MemoryStorage) -> MarkerStore<MemoryStorage> {
        MarkerStore::open(storage, DEFAULT_STORAGE_KEY, default_markers())
    }

    fn submission(name: &str, lat: &str, lon: &str) -> Submission {
        Submission {
            name: name.into(),
            latitude: lat.into(),
            longitude: lon.into(),
        }
    }

    #[test]
    fn invalid_coordinates_add_nothing() {
        let mut s = store(MemoryStorage::default());
        let out = process_submission(
            &mut s,
            CoordinatePolicy::Strict,
            &submission("Bad", "abc", "39.72"),
        );
        assert!(!out.accepted());
        assert!(out.notice.is_error());
        assert_eq!(s.collection().len(), 5);
        assert_eq!(s.storage().writes, 0);
    }

    #[test]
    fn valid_submission_is_appended_and_saved() {
        let mut s = store(MemoryStorage::default());
        let out = process_submission(
            &mut s,
            CoordinatePolicy::Strict,
            &submission("Test Point", "47.0", "39.0"),
        );
        assert_eq!(out.added, Some(Marker::new("Test Point", 47.0, 39.0)));
        assert!(out.persisted);
        assert!(!out.notice.is_error());
        assert_eq!(s.load().len(), 6);
    }

    #[test]
    fn write_failure_is_reported_but_kept() {
        let mut s = store(MemoryStorage {
            fail_writes: true,
            ..Default::default()
        });
        let out = process_submission(
            &mut s,
            CoordinatePolicy::Strict,
            &submission("Test Point", "47.0", "39.0"),
        );
        assert!(out.accepted());
        assert!(!out.persisted);
        assert!(out.notice.is_error());
        assert!(out.notice.text().contains("session only"));
        assert_eq!(s.collection().len(), 6);
    }
}
