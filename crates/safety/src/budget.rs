//! Spend ledger with hard per-call and cumulative caps.
//!
//! `check_call` is the pure gate consulted before submission; `record_call`
//! is the mutation applied once cost was actually incurred. Keeping the two
//! separate means a rejected or failed call never inflates the ledger.

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use stampede_types::epoch_ms;
use tracing::{debug, warn};

/// Hard spend caps, in native cost units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetLimits {
    /// No single call may cost more than this.
    pub max_per_call: f64,
    /// The whole run may not spend more than this.
    pub max_total: f64,
}

impl Default for BudgetLimits {
    fn default() -> Self {
        Self {
            max_per_call: 1.0,
            max_total: 10.0,
        }
    }
}

/// Errors from budget validation and checks.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum BudgetError {
    #[error("invalid budget limits: {0}")]
    InvalidLimits(String),
    #[error("invalid call cost {0}")]
    InvalidCost(f64),
    #[error("call cost {cost} exceeds per-call limit {limit}")]
    PerCallExceeded { cost: f64, limit: f64 },
    #[error("call cost {cost} would push total spend {spent} over budget {limit}")]
    TotalExceeded { cost: f64, spent: f64, limit: f64 },
}

/// One ledger entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedCall {
    pub cost: f64,
    pub label: String,
    pub at_ms: u64,
}

/// Remaining-budget view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub limits: BudgetLimits,
    pub total_spent: f64,
    pub remaining: f64,
    pub call_count: u64,
    pub utilization_pct: f64,
}

/// Qualitative utilization bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UtilizationTier {
    Low,
    Moderate,
    High,
    Critical,
}

impl UtilizationTier {
    fn from_pct(pct: f64) -> Self {
        if pct < 50.0 {
            UtilizationTier::Low
        } else if pct < 75.0 {
            UtilizationTier::Moderate
        } else if pct < 90.0 {
            UtilizationTier::High
        } else {
            UtilizationTier::Critical
        }
    }
}

/// Utilization summary for dashboards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UtilizationSummary {
    pub tier: UtilizationTier,
    pub utilization_pct: f64,
    pub total_spent: f64,
    pub remaining: f64,
}

/// Alert severity for [`BudgetEnforcer::check_alerts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

/// A threshold crossing worth surfacing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetAlert {
    pub severity: AlertSeverity,
    pub utilization_pct: f64,
    pub message: String,
}

/// Preview of a prospective call against the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitPreview {
    pub fits: bool,
    pub cost: f64,
    pub projected_spent: f64,
    pub projected_utilization_pct: f64,
}

struct Ledger {
    limits: BudgetLimits,
    total_spent: f64,
    call_count: u64,
    history: Vec<RecordedCall>,
}

/// Mutex-guarded spend ledger shared by every call in a run.
pub struct BudgetEnforcer {
    inner: Mutex<Ledger>,
}

impl BudgetEnforcer {
    pub fn new(limits: BudgetLimits) -> Result<Self, BudgetError> {
        Self::validate_limits(&limits)?;
        Ok(Self {
            inner: Mutex::new(Ledger {
                limits,
                total_spent: 0.0,
                call_count: 0,
                history: Vec::new(),
            }),
        })
    }

    fn validate_limits(limits: &BudgetLimits) -> Result<(), BudgetError> {
        if !limits.max_per_call.is_finite() || limits.max_per_call <= 0.0 {
            return Err(BudgetError::InvalidLimits(format!(
                "max_per_call {} must be a positive number",
                limits.max_per_call
            )));
        }
        if !limits.max_total.is_finite() || limits.max_total <= 0.0 {
            return Err(BudgetError::InvalidLimits(format!(
                "max_total {} must be a positive number",
                limits.max_total
            )));
        }
        Ok(())
    }

    fn cost_of(cost_units: f64, unit_price: f64) -> Result<f64, BudgetError> {
        let cost = cost_units * unit_price;
        if !cost.is_finite() || cost < 0.0 {
            return Err(BudgetError::InvalidCost(cost));
        }
        Ok(cost)
    }

    /// Pure gate: would this call breach either cap? No mutation.
    pub fn check_call(&self, cost_units: f64, unit_price: f64) -> Result<(), BudgetError> {
        let cost = Self::cost_of(cost_units, unit_price)?;
        let ledger = self.inner.lock();
        if cost > ledger.limits.max_per_call {
            return Err(BudgetError::PerCallExceeded {
                cost,
                limit: ledger.limits.max_per_call,
            });
        }
        if ledger.total_spent + cost > ledger.limits.max_total {
            return Err(BudgetError::TotalExceeded {
                cost,
                spent: ledger.total_spent,
                limit: ledger.limits.max_total,
            });
        }
        Ok(())
    }

    /// Record cost that was actually incurred. Never rejects; the spend
    /// already happened. Warns if actuals overshoot the cap the checks
    /// enforced on estimates.
    pub fn record_call(
        &self,
        cost_units: f64,
        unit_price: f64,
        label: impl Into<String>,
    ) -> Result<(), BudgetError> {
        let cost = Self::cost_of(cost_units, unit_price)?;
        let mut ledger = self.inner.lock();
        ledger.total_spent += cost;
        ledger.call_count += 1;
        ledger.history.push(RecordedCall {
            cost,
            label: label.into(),
            at_ms: epoch_ms(),
        });
        if ledger.total_spent > ledger.limits.max_total {
            warn!(
                spent = ledger.total_spent,
                limit = ledger.limits.max_total,
                "Recorded spend exceeds the total budget"
            );
        } else {
            debug!(cost, spent = ledger.total_spent, "Recorded call cost");
        }
        Ok(())
    }

    pub fn status(&self) -> BudgetStatus {
        let ledger = self.inner.lock();
        BudgetStatus {
            limits: ledger.limits,
            total_spent: ledger.total_spent,
            remaining: (ledger.limits.max_total - ledger.total_spent).max(0.0),
            call_count: ledger.call_count,
            utilization_pct: Self::pct(ledger.total_spent, ledger.limits.max_total),
        }
    }

    pub fn utilization_summary(&self) -> UtilizationSummary {
        let ledger = self.inner.lock();
        let pct = Self::pct(ledger.total_spent, ledger.limits.max_total);
        UtilizationSummary {
            tier: UtilizationTier::from_pct(pct),
            utilization_pct: pct,
            total_spent: ledger.total_spent,
            remaining: (ledger.limits.max_total - ledger.total_spent).max(0.0),
        }
    }

    /// Structured alert when utilization crosses the given thresholds.
    pub fn check_alerts(&self, warn_pct: f64, crit_pct: f64) -> Option<BudgetAlert> {
        let pct = self.status().utilization_pct;
        if pct >= crit_pct {
            Some(BudgetAlert {
                severity: AlertSeverity::Critical,
                utilization_pct: pct,
                message: format!("budget utilization {pct:.1}% at or above critical {crit_pct:.1}%"),
            })
        } else if pct >= warn_pct {
            Some(BudgetAlert {
                severity: AlertSeverity::Warning,
                utilization_pct: pct,
                message: format!("budget utilization {pct:.1}% at or above warning {warn_pct:.1}%"),
            })
        } else {
            None
        }
    }

    /// Preview how a prospective call would land, without mutating.
    pub fn estimate_fit(&self, cost_units: f64, unit_price: f64) -> Result<FitPreview, BudgetError> {
        let cost = Self::cost_of(cost_units, unit_price)?;
        let ledger = self.inner.lock();
        let projected = ledger.total_spent + cost;
        Ok(FitPreview {
            fits: cost <= ledger.limits.max_per_call && projected <= ledger.limits.max_total,
            cost,
            projected_spent: projected,
            projected_utilization_pct: Self::pct(projected, ledger.limits.max_total),
        })
    }

    /// Clear the ledger, optionally replacing the limits.
    pub fn reset(&self, new_limits: Option<BudgetLimits>) -> Result<(), BudgetError> {
        if let Some(limits) = &new_limits {
            Self::validate_limits(limits)?;
        }
        let mut ledger = self.inner.lock();
        if let Some(limits) = new_limits {
            ledger.limits = limits;
        }
        ledger.total_spent = 0.0;
        ledger.call_count = 0;
        ledger.history.clear();
        debug!("Budget ledger reset");
        Ok(())
    }

    /// Copy of the append-only history.
    pub fn history(&self) -> Vec<RecordedCall> {
        self.inner.lock().history.clone()
    }

    fn pct(spent: f64, max_total: f64) -> f64 {
        spent / max_total * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn enforcer(max_per_call: f64, max_total: f64) -> BudgetEnforcer {
        BudgetEnforcer::new(BudgetLimits {
            max_per_call,
            max_total,
        })
        .unwrap()
    }

    #[test]
    fn invalid_limits_are_rejected() {
        assert!(BudgetEnforcer::new(BudgetLimits {
            max_per_call: 0.0,
            max_total: 1.0
        })
        .is_err());
        assert!(BudgetEnforcer::new(BudgetLimits {
            max_per_call: 1.0,
            max_total: -1.0
        })
        .is_err());
        assert!(BudgetEnforcer::new(BudgetLimits {
            max_per_call: f64::NAN,
            max_total: 1.0
        })
        .is_err());
    }

    #[test]
    fn exhausting_the_total_budget_rejects_any_positive_cost() {
        let budget = enforcer(0.01, 0.1);

        // record_call never gates; the spend already happened.
        budget.record_call(0.05, 1.0, "first").unwrap();
        budget.record_call(0.05, 1.0, "second").unwrap();
        let status = budget.status();
        assert!((status.total_spent - 0.1).abs() < 1e-12);
        assert_eq!(status.call_count, 2);

        let err = budget.check_call(0.0001, 1.0).unwrap_err();
        assert!(matches!(err, BudgetError::TotalExceeded { .. }), "{err}");
    }

    #[test]
    fn per_call_cap_applies_even_with_full_budget() {
        let budget = enforcer(0.01, 0.1);
        let err = budget.check_call(0.02, 1.0).unwrap_err();
        assert!(matches!(err, BudgetError::PerCallExceeded { .. }), "{err}");

        // The unit price participates in the cap.
        assert!(budget.check_call(100.0, 0.00005).is_ok());
        let err = budget.check_call(100.0, 0.0002).unwrap_err();
        assert!(matches!(err, BudgetError::PerCallExceeded { .. }));
    }

    #[test]
    fn check_call_never_mutates() {
        let budget = enforcer(1.0, 10.0);
        for _ in 0..100 {
            budget.check_call(0.5, 1.0).unwrap();
        }
        let status = budget.status();
        assert_eq!(status.total_spent, 0.0);
        assert_eq!(status.call_count, 0);
        assert!(budget.history().is_empty());
    }

    #[test]
    fn utilization_tiers() {
        let budget = enforcer(10.0, 10.0);
        assert_eq!(budget.utilization_summary().tier, UtilizationTier::Low);

        budget.record_call(5.0, 1.0, "half").unwrap();
        assert_eq!(budget.utilization_summary().tier, UtilizationTier::Moderate);

        budget.record_call(2.5, 1.0, "three quarters").unwrap();
        assert_eq!(budget.utilization_summary().tier, UtilizationTier::High);

        budget.record_call(1.5, 1.0, "ninety").unwrap();
        assert_eq!(budget.utilization_summary().tier, UtilizationTier::Critical);
    }

    #[test]
    fn alerts_escalate_with_utilization() {
        let budget = enforcer(10.0, 10.0);
        assert_eq!(budget.check_alerts(70.0, 90.0), None);

        budget.record_call(7.5, 1.0, "w").unwrap();
        let alert = budget.check_alerts(70.0, 90.0).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Warning);

        budget.record_call(2.0, 1.0, "c").unwrap();
        let alert = budget.check_alerts(70.0, 90.0).unwrap();
        assert_eq!(alert.severity, AlertSeverity::Critical);
    }

    #[test]
    fn estimate_fit_previews_without_spending() {
        let budget = enforcer(1.0, 10.0);
        budget.record_call(9.5, 1.0, "most of it").unwrap();

        let fit = budget.estimate_fit(0.4, 1.0).unwrap();
        assert!(fit.fits);
        assert!((fit.projected_spent - 9.9).abs() < 1e-12);

        let no_fit = budget.estimate_fit(0.6, 1.0).unwrap();
        assert!(!no_fit.fits);

        // Still only the recorded call in the ledger.
        assert_eq!(budget.status().call_count, 1);
    }

    #[test]
    fn reset_clears_and_optionally_replaces_limits() {
        let budget = enforcer(1.0, 10.0);
        budget.record_call(4.0, 1.0, "spend").unwrap();
        budget.reset(None).unwrap();
        assert_eq!(budget.status().total_spent, 0.0);
        assert_eq!(budget.status().limits.max_total, 10.0);

        budget
            .reset(Some(BudgetLimits {
                max_per_call: 0.5,
                max_total: 2.0,
            }))
            .unwrap();
        assert_eq!(budget.status().limits.max_per_call, 0.5);
        assert!(budget.check_call(0.6, 1.0).is_err());

        assert!(budget
            .reset(Some(BudgetLimits {
                max_per_call: -1.0,
                max_total: 2.0,
            }))
            .is_err());
    }

    #[test]
    fn negative_and_non_finite_costs_are_invalid() {
        let budget = enforcer(1.0, 10.0);
        assert!(matches!(
            budget.check_call(-0.5, 1.0),
            Err(BudgetError::InvalidCost(_))
        ));
        assert!(matches!(
            budget.check_call(f64::INFINITY, 1.0),
            Err(BudgetError::InvalidCost(_))
        ));
    }

    #[test]
    fn history_keeps_labels_in_order() {
        let budget = enforcer(1.0, 10.0);
        budget.record_call(0.1, 1.0, "a").unwrap();
        budget.record_call(0.2, 1.0, "b").unwrap();
        let history = budget.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].label, "a");
        assert_eq!(history[1].label, "b");
        assert!(history[0].cost < history[1].cost);
    }
}
