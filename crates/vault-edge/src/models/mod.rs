use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

mod timestamp;

/// Sidebar counters for every navigation domain. `Default` is the zero-valued
/// fallback shown when the backend cannot be reached.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationData {
    pub inventory: InventoryNav,
    pub recovery_posture: RecoveryPostureNav,
    pub discovery: DiscoveryNav,
    pub compliance: ComplianceNav,
    pub drift: DriftNav,
    pub recovery_testing: RecoveryTestingNav,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryNav {
    pub total_assets: u64,
    pub protected_assets: u64,
    pub unprotected_assets: u64,
    pub coverage_percentage: f64,
    #[serde(default)]
    pub service_counts: HashMap<String, u64>,
    pub badge: String,
}

impl Default for InventoryNav {
    fn default() -> Self {
        Self {
            total_assets: 0,
            protected_assets: 0,
            unprotected_assets: 0,
            coverage_percentage: 0.0,
            service_counts: HashMap::new(),
            badge: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryPostureNav {
    pub recovery_score: f64,
    pub backup_coverage: f64,
    pub total_scans: u64,
    pub completed_scans: u64,
    pub success_rate: f64,
    pub avg_recent_score: f64,
    pub badge: String,
}

impl Default for RecoveryPostureNav {
    fn default() -> Self {
        Self {
            recovery_score: 0.0,
            backup_coverage: 0.0,
            total_scans: 0,
            completed_scans: 0,
            success_rate: 0.0,
            avg_recent_score: 0.0,
            badge: "0%".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryNav {
    pub total_accounts: u64,
    pub active_accounts: u64,
    pub badge: String,
}

impl Default for DiscoveryNav {
    fn default() -> Self {
        Self {
            total_accounts: 0,
            active_accounts: 0,
            badge: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceNav {
    pub compliance_score: f64,
    pub audit_reports: u64,
    pub policies: u64,
    pub badge: String,
}

impl Default for ComplianceNav {
    fn default() -> Self {
        Self {
            compliance_score: 0.0,
            audit_reports: 0,
            policies: 0,
            badge: "N/A".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriftNav {
    pub drift_issues: u64,
    pub critical_drift: u64,
    pub warning_drift: u64,
    pub badge: String,
}

impl Default for DriftNav {
    fn default() -> Self {
        Self {
            drift_issues: 0,
            critical_drift: 0,
            warning_drift: 0,
            badge: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecoveryTestingNav {
    pub total_tests: u64,
    pub passed_tests: u64,
    pub failed_tests: u64,
    pub success_rate: f64,
    pub badge: String,
}

impl Default for RecoveryTestingNav {
    fn default() -> Self {
        Self {
            total_tests: 0,
            passed_tests: 0,
            failed_tests: 0,
            success_rate: 0.0,
            badge: "0".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceFramework {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub enabled: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceRule {
    pub id: String,
    pub rule_id: String,
    pub framework_id: String,
    pub category: String,
    pub description: String,
    pub resource_type: String,
    pub field_path: String,
    pub operator: String,
    #[serde(default)]
    pub expected_value: serde_json::Value,
    pub severity: String,
    #[serde(default)]
    pub remediation: Option<String>,
    pub enabled: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryScore {
    pub score: f64,
    pub total: u64,
    pub passed: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceScore {
    pub framework_id: String,
    pub framework_name: String,
    pub compliance_score: f64,
    pub total_rules: u64,
    pub passed_rules: u64,
    pub failed_rules: u64,
    #[serde(with = "timestamp")]
    pub evaluation_date: DateTime<Utc>,
    #[serde(default)]
    pub categories: HashMap<String, CategoryScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameworkSummary {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    pub total_rules: u64,
    pub enabled_rules: u64,
    #[serde(default, with = "timestamp::option")]
    pub last_evaluation: Option<DateTime<Utc>>,
    #[serde(default)]
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceEvaluation {
    pub id: String,
    pub account_id: String,
    pub framework_id: String,
    #[serde(with = "timestamp")]
    pub evaluation_date: DateTime<Utc>,
    pub total_rules: u64,
    pub passed_rules: u64,
    pub failed_rules: u64,
    pub compliance_score: f64,
    #[serde(default)]
    pub evaluation_data: serde_json::Value,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComplianceDashboard {
    pub frameworks: Vec<FrameworkSummary>,
    pub recent_evaluations: Vec<ComplianceEvaluation>,
    pub overall_score: f64,
    pub critical_issues: u64,
    pub total_resources_evaluated: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub account_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub framework_id: Option<String>,
    pub force_evaluation: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResponse {
    pub success: bool,
    #[serde(default)]
    pub evaluation_id: Option<String>,
    #[serde(default)]
    pub compliance_score: f64,
    #[serde(default)]
    pub total_rules: u64,
    #[serde(default)]
    pub passed_rules: u64,
    #[serde(default)]
    pub failed_rules: u64,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: String,
    pub provider: String,
    pub account_identifier: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub primary_region: Option<String>,
    pub connection_status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountDetail {
    #[serde(flatten)]
    pub account: Account,
    #[serde(default)]
    pub aws_role_arn: Option<String>,
    #[serde(default)]
    pub aws_external_id: Option<String>,
    #[serde(default)]
    pub gcp_project_number: Option<String>,
    #[serde(default)]
    pub gcp_sa_email: Option<String>,
    #[serde(default)]
    pub discovery_enabled: Option<bool>,
    #[serde(default)]
    pub discovery_options: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub discovery_frequency: Option<String>,
    #[serde(default)]
    pub preferred_time_utc: Option<String>,
}
