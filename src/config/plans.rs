//! Internet plan catalog.
//!
//! Plans are the named service tiers subscriptions are sold under and the revenue
//! calculator multiplies by. The catalog can be overridden with `[[plans]]`
//! entries in `config.toml`; otherwise the five standard plans are used.

use crate::errors::{Error, Result};
use serde::{Deserialize, Serialize};

/// Commercial tier a plan is reported under
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    /// Entry-level residential plans
    Basic,
    /// Faster residential plans
    Premium,
    /// Business plans
    Enterprise,
}

impl PlanTier {
    /// Localized tier name
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Basic => "Básico",
            Self::Premium => "Premium",
            Self::Enterprise => "Enterprise",
        }
    }
}

/// A named plan with a fixed monthly price
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    /// Stable code used by the calculator (e.g. `plan2Mbps`)
    pub code: String,
    /// Display name, also stored on subscriptions (e.g. "Básico 2Mbps")
    pub name: String,
    /// Reporting tier
    pub tier: PlanTier,
    /// Monthly price in kwanza
    pub price: f64,
}

impl Plan {
    fn new(code: &str, name: &str, tier: PlanTier, price: f64) -> Self {
        Self {
            code: code.to_string(),
            name: name.to_string(),
            tier,
            price,
        }
    }
}

/// The set of plans on sale
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlanCatalog {
    plans: Vec<Plan>,
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            plans: vec![
                Plan::new("plan2Mbps", "Básico 2Mbps", PlanTier::Basic, 15_650.00),
                Plan::new("plan4Mbps", "Básico 4Mbps", PlanTier::Basic, 28_952.05),
                Plan::new("plan6Mbps", "Premium 6Mbps", PlanTier::Premium, 39_907.05),
                Plan::new("plan8Mbps", "Premium 8Mbps", PlanTier::Premium, 53_210.00),
                Plan::new(
                    "plan10Mbps",
                    "Enterprise 10Mbps",
                    PlanTier::Enterprise,
                    66_512.05,
                ),
            ],
        }
    }
}

impl PlanCatalog {
    /// Builds a catalog, rejecting empty lists, duplicate codes or names and
    /// negative prices.
    pub fn new(plans: Vec<Plan>) -> Result<Self> {
        if plans.is_empty() {
            return Err(Error::Config {
                message: "Plan catalog cannot be empty".to_string(),
            });
        }
        for (index, plan) in plans.iter().enumerate() {
            if !plan.price.is_finite() || plan.price < 0.0 {
                return Err(Error::Config {
                    message: format!("Plan {} has an invalid price", plan.code),
                });
            }
            let duplicate = plans[..index]
                .iter()
                .any(|other| other.code == plan.code || other.name == plan.name);
            if duplicate {
                return Err(Error::Config {
                    message: format!("Plan {} is defined twice", plan.code),
                });
            }
        }
        Ok(Self { plans })
    }

    /// Plans in catalog order.
    #[must_use]
    pub fn plans(&self) -> &[Plan] {
        &self.plans
    }

    /// Plan with the given display name.
    #[must_use]
    pub fn find_by_name(&self, name: &str) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.name == name)
    }

    /// Plan with the given code.
    #[must_use]
    pub fn find_by_code(&self, code: &str) -> Option<&Plan> {
        self.plans.iter().find(|plan| plan.code == code)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_default_catalog_prices() {
        let catalog = PlanCatalog::default();
        assert_eq!(catalog.plans().len(), 5);
        assert_eq!(catalog.find_by_code("plan2Mbps").unwrap().price, 15_650.00);
        assert_eq!(
            catalog.find_by_name("Enterprise 10Mbps").unwrap().tier,
            PlanTier::Enterprise
        );
        assert!(catalog.find_by_name("Ultra 1Gbps").is_none());
    }

    #[test]
    fn test_parse_plans_from_toml() {
        #[derive(Deserialize)]
        struct File {
            plans: Vec<Plan>,
        }

        let toml_str = r#"
            [[plans]]
            code = "fibra50"
            name = "Fibra 50Mbps"
            tier = "premium"
            price = 75000.0
        "#;

        let file: File = toml::from_str(toml_str).unwrap();
        let catalog = PlanCatalog::new(file.plans).unwrap();
        assert_eq!(catalog.plans()[0].tier, PlanTier::Premium);
    }

    #[test]
    fn test_catalog_rejects_duplicates_and_negative_prices() {
        let duplicate = vec![
            Plan::new("a", "A", PlanTier::Basic, 1.0),
            Plan::new("a", "B", PlanTier::Basic, 1.0),
        ];
        assert!(matches!(
            PlanCatalog::new(duplicate),
            Err(Error::Config { .. })
        ));

        let negative = vec![Plan::new("a", "A", PlanTier::Basic, -1.0)];
        assert!(PlanCatalog::new(negative).is_err());
        assert!(PlanCatalog::new(Vec::new()).is_err());
    }
}
