//! View-data aggregators.
//!
//! Each view fetches one or more backend resources for a tenant context and
//! keeps the latest result in a shared [`ViewState`]. Fetch failures never
//! escape a view: they are logged and turned into the `error` string, and the
//! data falls back to a renderable value.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

mod accounts;
mod compliance;
mod navigation;

pub use accounts::AccountsView;
pub use compliance::ComplianceView;
pub use navigation::NavigationView;

#[derive(Debug, Clone, Serialize)]
pub struct ViewState<T> {
    pub data: T,
    pub loading: bool,
    pub error: Option<String>,
}

impl<T> ViewState<T> {
    fn pending(data: T) -> Self {
        Self {
            data,
            loading: true,
            error: None,
        }
    }
}

/// Monotonic ticket counter. A response may only be written back if its
/// ticket is still the latest one handed out for that resource.
#[derive(Debug, Default)]
struct Generation(AtomicU64);

impl Generation {
    fn next(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.0.load(Ordering::SeqCst) == ticket
    }
}
