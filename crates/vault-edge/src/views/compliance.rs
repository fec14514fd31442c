use std::{future::Future, sync::Arc};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use super::{Generation, ViewState};
use crate::{
    client::{BackendClient, FetchError},
    models::{
        ComplianceDashboard, ComplianceFramework, ComplianceRule, ComplianceScore,
        EvaluationRequest, EvaluationResponse,
    },
};

#[derive(Debug, Clone, Default, Serialize)]
pub struct ComplianceData {
    pub frameworks: Vec<ComplianceFramework>,
    pub rules: Vec<ComplianceRule>,
    pub scores: Vec<ComplianceScore>,
    pub dashboard: Option<ComplianceDashboard>,
}

#[derive(Debug, Clone, Copy)]
enum Resource {
    Frameworks,
    Rules,
    Scores,
    Dashboard,
}

impl Resource {
    const fn index(self) -> usize {
        self as usize
    }

    const fn failure(self) -> &'static str {
        match self {
            Self::Frameworks => "Failed to fetch compliance frameworks",
            Self::Rules => "Failed to fetch compliance rules",
            Self::Scores => "Failed to fetch compliance scores",
            Self::Dashboard => "Failed to fetch compliance dashboard",
        }
    }
}

/// Frameworks, rules, scores and dashboard for one account.
#[derive(Clone)]
pub struct ComplianceView {
    inner: Arc<Inner>,
}

struct Inner {
    client: BackendClient,
    account_id: String,
    state: RwLock<ViewState<ComplianceData>>,
    resources: [Generation; 4],
    refresh: Generation,
}

impl ComplianceView {
    pub fn new(client: BackendClient, account_id: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                account_id: account_id.into(),
                state: RwLock::new(ViewState::pending(ComplianceData::default())),
                resources: Default::default(),
                refresh: Generation::default(),
            }),
        }
    }

    /// Creates the view and runs the first refresh when an account is set.
    pub async fn mount(client: BackendClient, account_id: impl Into<String>) -> Self {
        let view = Self::new(client, account_id);
        view.refresh_data().await;
        view
    }

    pub async fn snapshot(&self) -> ViewState<ComplianceData> {
        self.inner.state.read().await.clone()
    }

    /// Fetches all four resources concurrently. Each one lands or fails on
    /// its own; `loading` clears once the latest refresh has settled.
    pub async fn refresh_data(&self) {
        if self.inner.account_id.is_empty() {
            return;
        }

        let ticket = self.inner.refresh.next();
        {
            let mut state = self.inner.state.write().await;
            state.loading = true;
            state.error = None;
        }

        tokio::join!(
            self.fetch_frameworks(),
            self.fetch_rules(None),
            self.fetch_scores(),
            self.fetch_dashboard(),
        );

        if self.inner.refresh.is_current(ticket) {
            self.inner.state.write().await.loading = false;
        }
    }

    pub async fn fetch_frameworks(&self) {
        let fetch = self.inner.client.get("/compliance/frameworks", &[]);
        self.load(Resource::Frameworks, fetch, |d, v| d.frameworks = v)
            .await;
    }

    pub async fn fetch_rules(&self, framework_id: Option<&str>) {
        let query: Vec<(&str, &str)> = framework_id
            .map(|id| vec![("framework_id", id)])
            .unwrap_or_default();
        let fetch = self.inner.client.get("/compliance/rules", &query);
        self.load(Resource::Rules, fetch, |d, v| d.rules = v).await;
    }

    pub async fn fetch_scores(&self) {
        let fetch = self
            .inner
            .client
            .get_entry("/compliance/scores", &self.inner.account_id);
        self.load(Resource::Scores, fetch, |d, v| d.scores = v).await;
    }

    pub async fn fetch_dashboard(&self) {
        let fetch = self
            .inner
            .client
            .get_entry("/compliance/dashboard", &self.inner.account_id);
        self.load(Resource::Dashboard, fetch, |d, v| d.dashboard = Some(v))
            .await;
    }

    /// Asks the backend to evaluate the account now. On success the scores
    /// and dashboard are refetched before returning.
    pub async fn evaluate(
        &self,
        framework_id: Option<String>,
        force: bool,
    ) -> Result<EvaluationResponse, FetchError> {
        let request = EvaluationRequest {
            account_id: self.inner.account_id.clone(),
            framework_id,
            force_evaluation: force,
        };

        let response: EvaluationResponse = match self
            .inner
            .client
            .post("/compliance/evaluate", &request)
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!(error = %e, account_id = %self.inner.account_id, "error evaluating compliance");
                self.inner.state.write().await.error =
                    Some("Failed to evaluate compliance".to_string());
                return Err(e);
            }
        };

        if response.success {
            info!(
                account_id = %self.inner.account_id,
                score = response.compliance_score,
                "compliance evaluated"
            );
            tokio::join!(self.fetch_scores(), self.fetch_dashboard());
        }
        Ok(response)
    }

    /// Runs `fetch` under a fresh ticket for `resource` and applies the
    /// result only if no newer fetch of the same resource was started.
    async fn load<T, Fut, F>(&self, resource: Resource, fetch: Fut, apply: F)
    where
        Fut: Future<Output = Result<T, FetchError>>,
        F: FnOnce(&mut ComplianceData, T),
    {
        let generation = &self.inner.resources[resource.index()];
        let ticket = generation.next();
        let result = fetch.await;

        let mut state = self.inner.state.write().await;
        if !generation.is_current(ticket) {
            debug!(?resource, "discarding stale compliance response");
            return;
        }
        match result {
            Ok(value) => apply(&mut state.data, value),
            Err(e) => {
                error!(error = %e, ?resource, account_id = %self.inner.account_id, "error fetching compliance data");
                state.error = Some(resource.failure().to_string());
            }
        }
    }
}
