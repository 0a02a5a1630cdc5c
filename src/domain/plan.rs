use serde::{Deserialize, Serialize};

use super::Cents;

/// Subscription tiers, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionPlan {
    Free,
    Pro,
    Business,
}

/// Sections of the application that a plan may unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Journal, chart of accounts, trial balance and financial statements
    Accounting,
    /// Period reports and inventory valuation
    Reports,
    /// CSV exports
    Export,
    /// Tax-authority CSV layouts
    BirForms,
}

impl Feature {
    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Accounting => "accounting",
            Feature::Reports => "reports",
            Feature::Export => "export",
            Feature::BirForms => "bir_forms",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Free => "free",
            SubscriptionPlan::Pro => "pro",
            SubscriptionPlan::Business => "business",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "free" => Some(SubscriptionPlan::Free),
            "pro" => Some(SubscriptionPlan::Pro),
            "business" => Some(SubscriptionPlan::Business),
            _ => None,
        }
    }

    /// Monthly price in centavos.
    pub fn monthly_price(&self) -> Cents {
        match self {
            SubscriptionPlan::Free => 0,
            SubscriptionPlan::Pro => 19_900,
            SubscriptionPlan::Business => 39_900,
        }
    }

    /// Maximum number of products in the catalogue, `None` for unlimited.
    pub fn max_products(&self) -> Option<usize> {
        match self {
            SubscriptionPlan::Free => Some(50),
            SubscriptionPlan::Pro | SubscriptionPlan::Business => None,
        }
    }

    /// Maximum number of user accounts including the owner, `None` for unlimited.
    pub fn max_users(&self) -> Option<usize> {
        match self {
            SubscriptionPlan::Free => Some(2),
            SubscriptionPlan::Pro => Some(4),
            SubscriptionPlan::Business => None,
        }
    }

    /// Plans only move upwards.
    pub fn can_upgrade_to(&self, target: SubscriptionPlan) -> bool {
        target > *self
    }
}

impl std::fmt::Display for SubscriptionPlan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub fn has_capability(plan: SubscriptionPlan, feature: Feature) -> bool {
    match feature {
        Feature::Accounting => plan == SubscriptionPlan::Business,
        Feature::Reports | Feature::Export | Feature::BirForms => plan >= SubscriptionPlan::Pro,
    }
}

/// True when `current` items leave room for one more under `limit`.
pub fn within_limit(limit: Option<usize>, current: usize) -> bool {
    limit.is_none_or(|max| current < max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capability_table() {
        use Feature::*;
        use SubscriptionPlan::*;

        let table = [
            (Free, Accounting, false),
            (Free, Reports, false),
            (Free, Export, false),
            (Free, BirForms, false),
            (Pro, Accounting, false),
            (Pro, Reports, true),
            (Pro, Export, true),
            (Pro, BirForms, true),
            (Business, Accounting, true),
            (Business, Reports, true),
            (Business, Export, true),
            (Business, BirForms, true),
        ];

        for (plan, feature, expected) in table {
            assert_eq!(has_capability(plan, feature), expected, "{plan} / {feature}");
        }
    }

    #[test]
    fn test_limits() {
        assert_eq!(SubscriptionPlan::Free.max_products(), Some(50));
        assert_eq!(SubscriptionPlan::Pro.max_products(), None);
        assert_eq!(SubscriptionPlan::Free.max_users(), Some(2));
        assert_eq!(SubscriptionPlan::Pro.max_users(), Some(4));
        assert_eq!(SubscriptionPlan::Business.max_users(), None);

        assert!(within_limit(Some(2), 1));
        assert!(!within_limit(Some(2), 2));
        assert!(within_limit(None, 10_000));
    }

    #[test]
    fn test_upgrades_only_go_up() {
        assert!(SubscriptionPlan::Free.can_upgrade_to(SubscriptionPlan::Pro));
        assert!(SubscriptionPlan::Free.can_upgrade_to(SubscriptionPlan::Business));
        assert!(SubscriptionPlan::Pro.can_upgrade_to(SubscriptionPlan::Business));
        assert!(!SubscriptionPlan::Pro.can_upgrade_to(SubscriptionPlan::Pro));
        assert!(!SubscriptionPlan::Business.can_upgrade_to(SubscriptionPlan::Free));
    }

    #[test]
    fn test_plan_roundtrip() {
        for plan in [SubscriptionPlan::Free, SubscriptionPlan::Pro, SubscriptionPlan::Business] {
            assert_eq!(SubscriptionPlan::from_str(plan.as_str()), Some(plan));
        }
        assert_eq!(SubscriptionPlan::from_str("BUSINESS"), Some(SubscriptionPlan::Business));
        assert_eq!(SubscriptionPlan::from_str("enterprise"), None);
    }
}
