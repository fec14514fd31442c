use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error};

use super::{Generation, ViewState};
use crate::{
    client::BackendClient,
    models::{Account, AccountDetail},
    normalize,
};

#[derive(Debug, Clone, Default, Serialize)]
pub struct AccountsData {
    pub accounts: Vec<Account>,
    pub selected: Option<AccountDetail>,
}

/// Connected cloud accounts plus the one currently opened for detail.
#[derive(Clone)]
pub struct AccountsView {
    inner: Arc<Inner>,
}

struct Inner {
    client: BackendClient,
    state: RwLock<ViewState<AccountsData>>,
    list: Generation,
    detail: Generation,
}

impl AccountsView {
    pub fn new(client: BackendClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                state: RwLock::new(ViewState::pending(AccountsData::default())),
                list: Generation::default(),
                detail: Generation::default(),
            }),
        }
    }

    pub async fn mount(client: BackendClient) -> Self {
        let view = Self::new(client);
        view.refetch().await;
        view
    }

    pub async fn snapshot(&self) -> ViewState<AccountsData> {
        self.inner.state.read().await.clone()
    }

    pub async fn refetch(&self) {
        let ticket = self.inner.list.next();
        {
            let mut state = self.inner.state.write().await;
            state.loading = true;
            state.error = None;
        }

        let result = self
            .inner
            .client
            .get_value("/accounts", &[])
            .await
            .and_then(normalize::array_or_empty::<Account>);

        let mut state = self.inner.state.write().await;
        if !self.inner.list.is_current(ticket) {
            debug!("discarding stale accounts response");
            return;
        }
        match result {
            Ok(accounts) => state.data.accounts = accounts,
            Err(e) => {
                error!(error = %e, "error fetching accounts");
                state.error = Some("Failed to fetch accounts".to_string());
            }
        }
        state.loading = false;
    }

    /// Loads the detail record for `id` into `selected`. A failed lookup
    /// clears the selection.
    pub async fn select(&self, id: &str) {
        let ticket = self.inner.detail.next();
        let result = self
            .inner
            .client
            .get_entry::<AccountDetail>("/accounts", id)
            .await;

        let mut state = self.inner.state.write().await;
        if !self.inner.detail.is_current(ticket) {
            return;
        }
        match result {
            Ok(detail) => state.data.selected = Some(detail),
            Err(e) => {
                error!(error = %e, account_id = id, "error fetching account detail");
                state.error = Some(format!("Failed to fetch account {id}"));
                state.data.selected = None;
            }
        }
    }
}
