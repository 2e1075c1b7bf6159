//! Scheduling engine error types.

use fleetlens_state::StateError;
use thiserror::Error;

/// Errors that abort a scheduling query.
///
/// Partial member-cluster failures never surface here; they are reported
/// inside the result instead.
#[derive(Debug, Error)]
pub enum SchedulingError {
    #[error("{store} store unreachable: {source}")]
    UpstreamUnavailable {
        store: &'static str,
        #[source]
        source: StateError,
    },
}

impl SchedulingError {
    /// Closure factory for `map_err` on store calls.
    pub(crate) fn upstream(store: &'static str) -> impl FnOnce(StateError) -> Self {
        move |source| Self::UpstreamUnavailable { store, source }
    }
}

pub type SchedulingResult<T> = Result<T, SchedulingError>;
