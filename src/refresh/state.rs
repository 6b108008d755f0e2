//! Refresh bookkeeping with stale-while-error semantics.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;

/// What [`RefreshState::apply`] did with a fetch result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Applied {
    /// New data replaced the old.
    Updated,
    /// The fetch failed; old data was kept and the error recorded.
    Failed,
    /// A newer result was already applied; this one was discarded.
    Stale,
}

/// The displayed dataset for one polled view.
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use marketpulse::error::ProviderError;
/// use marketpulse::refresh::RefreshState;
///
/// let mut state = RefreshState::new();
/// state.apply(1, Ok(42), Utc::now());
/// state.apply(2, Err(ProviderError::Status { status: 503 }.into()), Utc::now());
///
/// assert_eq!(state.data(), Some(&42));
/// assert!(state.error().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefreshState<T> {
    data: Option<T>,
    last_updated: Option<DateTime<Utc>>,
    error: Option<String>,
    #[serde(skip)]
    latest_applied: u64,
}

impl<T> Default for RefreshState<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RefreshState<T> {
    /// Creates an empty state: no data, never updated.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: None,
            last_updated: None,
            error: None,
            latest_applied: 0,
        }
    }

    /// Applies the result of fetch number `seq`, resolved at `now`.
    ///
    /// Results tagged at or below the highest sequence already applied are
    /// discarded. A failure keeps the previous data and timestamp.
    pub fn apply(&mut self, seq: u64, outcome: Result<T>, now: DateTime<Utc>) -> Applied {
        if seq <= self.latest_applied {
            return Applied::Stale;
        }
        self.latest_applied = seq;

        match outcome {
            Ok(data) => {
                self.data = Some(data);
                self.last_updated = Some(now);
                self.error = None;
                Applied::Updated
            }
            Err(e) => {
                self.error = Some(e.to_string());
                Applied::Failed
            }
        }
    }

    /// Returns the last successfully fetched data.
    #[must_use]
    pub const fn data(&self) -> Option<&T> {
        self.data.as_ref()
    }

    /// Returns when data was last replaced.
    #[must_use]
    pub const fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    /// Returns the most recent error, cleared by the next success.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Returns the highest sequence number applied so far.
    #[must_use]
    pub const fn latest_applied(&self) -> u64 {
        self.latest_applied
    }
}
