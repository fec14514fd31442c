use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{debug, error};

use super::{Generation, ViewState};
use crate::{
    client::{BackendClient, FetchError},
    models::NavigationData,
    normalize,
};

/// Sidebar badge counts for one tenant account (or the tenant as a whole when
/// no account is selected). Cloning yields another handle on the same view.
#[derive(Clone)]
pub struct NavigationView {
    inner: Arc<Inner>,
}

struct Inner {
    client: BackendClient,
    account: RwLock<Option<String>>,
    state: RwLock<ViewState<Option<NavigationData>>>,
    generation: Generation,
}

impl NavigationView {
    pub fn new(client: BackendClient, account_identifier: Option<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                account: RwLock::new(account_identifier),
                state: RwLock::new(ViewState::pending(None)),
                generation: Generation::default(),
            }),
        }
    }

    /// Creates the view and runs its first fetch.
    pub async fn mount(client: BackendClient, account_identifier: Option<String>) -> Self {
        let view = Self::new(client, account_identifier);
        view.refetch().await;
        view
    }

    pub async fn snapshot(&self) -> ViewState<Option<NavigationData>> {
        self.inner.state.read().await.clone()
    }

    pub async fn account(&self) -> Option<String> {
        self.inner.account.read().await.clone()
    }

    /// Switches account and refetches, unless the account is unchanged.
    pub async fn set_account(&self, account_identifier: Option<String>) {
        let changed = {
            let mut account = self.inner.account.write().await;
            if *account == account_identifier {
                false
            } else {
                *account = account_identifier;
                true
            }
        };
        if changed {
            self.refetch().await;
        }
    }

    pub async fn refetch(&self) {
        let ticket = self.inner.generation.next();
        {
            let mut state = self.inner.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let account = self.account().await;
        let result = self.load(account.as_deref()).await;

        let mut state = self.inner.state.write().await;
        if !self.inner.generation.is_current(ticket) {
            debug!(?account, "discarding stale navigation response");
            return;
        }
        match result {
            Ok(nav) => state.data = Some(nav),
            Err(e) => {
                error!(error = %e, ?account, "error fetching navigation data");
                state.error = Some(failure_message(&e));
                state.data = Some(NavigationData::default());
            }
        }
        state.loading = false;
    }

    async fn load(&self, account: Option<&str>) -> Result<NavigationData, FetchError> {
        let query: Vec<(&str, &str)> = account
            .filter(|a| !a.is_empty())
            .map(|a| vec![("account_identifier", a)])
            .unwrap_or_default();
        let value = self
            .inner
            .client
            .get_value("/tenant/navigation/data", &query)
            .await?;
        normalize::navigation_envelope(value)
    }
}

fn failure_message(err: &FetchError) -> String {
    match err {
        FetchError::Status { reason, .. } => format!("Failed to fetch navigation data: {reason}"),
        FetchError::Rejected => "Failed to fetch navigation data".to_string(),
        other => other.to_string(),
    }
}
