use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LoanError, Result};
use crate::interest::{CompoundingFrequency, DayCountConvention};

/// seconds in 200 years of 365 days
pub const DEFAULT_MAX_DURATION_SECS: u64 = 200 * 31_536_000;

/// loan configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LoanConfig {
    #[serde(default)]
    pub interest: InterestConfig,
    #[serde(default)]
    pub payments: PaymentPolicy,
    #[serde(default)]
    pub limits: TermLimits,
}

/// interest configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct InterestConfig {
    pub method: InterestMethod,
    pub day_count: DayCountConvention,
}

/// interest accrual method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum InterestMethod {
    /// interest on outstanding principal only
    #[default]
    Simple,
    /// interest compounds at the end of each whole period
    Compound(CompoundingFrequency),
}

/// who may pay into a loan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum PayerPolicy {
    #[default]
    BorrowerOnly,
    AnyParty,
}

/// payment configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaymentPolicy {
    pub payer: PayerPolicy,
}

/// upper bounds enforced when terms are set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermLimits {
    /// applies to principal, collateral and every fee amount
    pub max_principal: Money,
    pub max_apr: Rate,
    pub max_duration_secs: u64,
}

impl Default for TermLimits {
    fn default() -> Self {
        Self {
            max_principal: Money::new(1_000_000_000_000_000_000_000_000_000),
            max_apr: Rate::from_percentage(1_000_000),
            max_duration_secs: DEFAULT_MAX_DURATION_SECS,
        }
    }
}

impl LoanConfig {
    /// simple interest, actual/365, borrower-only payments
    pub fn standard() -> Self {
        Self::default()
    }

    /// compound interest at the given frequency
    pub fn compounding(frequency: CompoundingFrequency) -> Self {
        Self {
            interest: InterestConfig {
                method: InterestMethod::Compound(frequency),
                day_count: DayCountConvention::Actual365,
            },
            ..Self::default()
        }
    }

    /// parse and validate a json configuration
    pub fn from_json(json: &str) -> Result<Self> {
        let config: LoanConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.limits.max_principal.is_zero() {
            return Err(LoanError::InvalidConfiguration {
                message: "max_principal must be positive".to_string(),
            });
        }

        // every bounded value has to convert exactly into a decimal
        if self.limits.max_principal.to_decimal().is_none() {
            return Err(LoanError::InvalidConfiguration {
                message: format!("max_principal {} exceeds decimal range", self.limits.max_principal),
            });
        }
        if self.limits.max_apr.as_percentage().is_none() {
            return Err(LoanError::InvalidConfiguration {
                message: format!("max_apr {} exceeds decimal range", self.limits.max_apr.as_scaled()),
            });
        }

        if self.limits.max_duration_secs == 0 || self.limits.max_duration_secs > i64::MAX as u64 / 4 {
            return Err(LoanError::InvalidConfiguration {
                message: format!("max_duration_secs {} out of range", self.limits.max_duration_secs),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = LoanConfig::standard();
        assert!(config.validate().is_ok());
        assert_eq!(config.interest.method, InterestMethod::Simple);
        assert_eq!(config.interest.day_count, DayCountConvention::Actual365);
        assert_eq!(config.payments.payer, PayerPolicy::BorrowerOnly);
    }

    #[test]
    fn test_json_round_trip() {
        let config = LoanConfig::compounding(CompoundingFrequency::Monthly);
        let json = config.to_json_pretty().unwrap();
        let parsed = LoanConfig::from_json(&json).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let json = r#"{ "payments": { "payer": "AnyParty" } }"#;
        let config = LoanConfig::from_json(json).unwrap();
        assert_eq!(config.payments.payer, PayerPolicy::AnyParty);
        assert_eq!(config.limits, TermLimits::default());
    }

    #[test]
    fn test_invalid_limits_rejected() {
        let mut config = LoanConfig::standard();
        config.limits.max_duration_secs = 0;
        assert!(matches!(config.validate(), Err(LoanError::InvalidConfiguration { .. })));

        let mut config = LoanConfig::standard();
        config.limits.max_principal = Money::MAX;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_malformed_json() {
        assert!(matches!(LoanConfig::from_json("{ not json"), Err(LoanError::Serialization(_))));
    }
}
