//! Plan types and the plan catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Purchasable plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Monthly,
    Yearly,
}

impl PlanType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Monthly => "monthly",
            PlanType::Yearly => "yearly",
        }
    }

    /// Parses a client-supplied plan id. Case-insensitive.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "monthly" => Some(PlanType::Monthly),
            "yearly" => Some(PlanType::Yearly),
            _ => None,
        }
    }
}

impl fmt::Display for PlanType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price and billing period of one plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTerms {
    /// Price in minor currency units (paise, cents).
    pub amount: i64,

    /// Length of one billing period in calendar months.
    pub period_months: u32,
}

/// Plan id -> terms. Loaded once from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanCatalog {
    #[serde(default = "default_monthly")]
    pub monthly: PlanTerms,

    #[serde(default = "default_yearly")]
    pub yearly: PlanTerms,
}

impl PlanCatalog {
    pub fn terms(&self, plan: PlanType) -> PlanTerms {
        match plan {
            PlanType::Monthly => self.monthly,
            PlanType::Yearly => self.yearly,
        }
    }
}

impl Default for PlanCatalog {
    fn default() -> Self {
        Self {
            monthly: default_monthly(),
            yearly: default_yearly(),
        }
    }
}

fn default_monthly() -> PlanTerms {
    PlanTerms {
        amount: 49_900,
        period_months: 1,
    }
}

fn default_yearly() -> PlanTerms {
    PlanTerms {
        amount: 499_900,
        period_months: 12,
    }
}
