use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{PlanError, Result};

/// plan configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanConfig {
    pub terms: PlanTerms,
    #[serde(default)]
    pub reconciliation: ReconciliationConfig,
}

/// financial terms agreed at the counter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTerms {
    /// price of the goods before down payment
    pub base_amount: Money,
    pub down_payment: Money,
    /// annual rate, written in json as a percentage (`"12.5"` is 12.5%)
    #[serde(rename = "interest_rate_percent", with = "rate_percent")]
    pub interest_rate: Rate,
    pub tenure_months: u32,
    /// installment n falls due n months after this date
    pub start_date: NaiveDate,
}

/// `Rate` as an annual percentage in serialized configs
mod rate_percent {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::decimal::Rate;

    pub fn serialize<S: Serializer>(rate: &Rate, serializer: S) -> Result<S::Ok, S::Error> {
        Serialize::serialize(&rate.as_percentage(), serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Rate, D::Error> {
        <Decimal as Deserialize>::deserialize(deserializer).map(Rate::from_percentage_decimal)
    }
}

/// how payments are reconciled against installments
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciliationConfig {
    /// an entry short by no more than this counts as paid
    pub settle_tolerance: Money,
    /// credit overpayments to the customer's misc balance
    pub credit_overpayment: bool,
    /// top up a partially paid installment from misc balance after cash
    pub auto_apply_misc_balance: bool,
}

impl Default for ReconciliationConfig {
    fn default() -> Self {
        Self {
            settle_tolerance: Money::CENT,
            credit_overpayment: true,
            auto_apply_misc_balance: false,
        }
    }
}

impl ReconciliationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.settle_tolerance.is_negative() || self.settle_tolerance >= Money::ONE {
            return Err(PlanError::InvalidConfiguration {
                message: format!(
                    "settle tolerance must be between 0 and 1, got {}",
                    self.settle_tolerance
                ),
            });
        }
        Ok(())
    }
}

impl PlanTerms {
    /// amount actually spread over the installments
    pub fn financed_amount(&self) -> Money {
        self.base_amount - self.down_payment
    }

    pub fn validate(&self) -> Result<()> {
        if self.down_payment.is_negative() {
            return Err(PlanError::invalid_params(format!(
                "down payment cannot be negative: {}",
                self.down_payment
            )));
        }
        if !self.financed_amount().is_positive() {
            return Err(PlanError::invalid_params(format!(
                "financed amount must be positive: base {} down payment {}",
                self.base_amount, self.down_payment
            )));
        }
        if self.tenure_months == 0 {
            return Err(PlanError::invalid_params("tenure must be at least one month"));
        }
        if self.interest_rate.is_negative() {
            return Err(PlanError::invalid_params(format!(
                "interest rate cannot be negative: {}",
                self.interest_rate
            )));
        }
        Ok(())
    }
}

impl PlanConfig {
    /// interest-bearing plan with default reconciliation rules
    pub fn standard(
        base_amount: Money,
        down_payment: Money,
        annual_rate_percent: Decimal,
        tenure_months: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            terms: PlanTerms {
                base_amount,
                down_payment,
                interest_rate: Rate::from_percentage_decimal(annual_rate_percent),
                tenure_months,
                start_date,
            },
            reconciliation: ReconciliationConfig::default(),
        }
    }

    /// zero-interest plan, the price is simply split over the tenure
    pub fn interest_free(
        base_amount: Money,
        down_payment: Money,
        tenure_months: u32,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            terms: PlanTerms {
                base_amount,
                down_payment,
                interest_rate: Rate::ZERO,
                tenure_months,
                start_date,
            },
            reconciliation: ReconciliationConfig::default(),
        }
    }

    /// load a plan template from json
    pub fn from_json(json: &str) -> Result<Self> {
        let config: PlanConfig =
            serde_json::from_str(json).map_err(|e| PlanError::InvalidConfiguration {
                message: e.to_string(),
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.terms.validate()?;
        self.reconciliation.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn start() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_standard_config() {
        let config = PlanConfig::standard(
            Money::from_major(120_000),
            Money::from_major(20_000),
            dec!(12.5),
            12,
            start(),
        );

        assert_eq!(config.terms.financed_amount(), Money::from_major(100_000));
        assert_eq!(config.terms.interest_rate.as_percentage(), dec!(12.5));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_terms() {
        let no_financing = PlanConfig::interest_free(
            Money::from_major(500),
            Money::from_major(500),
            6,
            start(),
        );
        assert!(matches!(
            no_financing.validate(),
            Err(PlanError::InvalidPlanParameters { .. })
        ));

        let no_tenure = PlanConfig::interest_free(Money::from_major(500), Money::ZERO, 0, start());
        assert!(matches!(
            no_tenure.validate(),
            Err(PlanError::InvalidPlanParameters { .. })
        ));

        let negative_rate =
            PlanConfig::standard(Money::from_major(500), Money::ZERO, dec!(-1), 6, start());
        assert!(matches!(
            negative_rate.validate(),
            Err(PlanError::InvalidPlanParameters { .. })
        ));
    }

    #[test]
    fn test_rejects_bad_tolerance() {
        let mut config = PlanConfig::interest_free(Money::from_major(500), Money::ZERO, 5, start());
        config.reconciliation.settle_tolerance = Money::from_major(2);
        assert!(matches!(
            config.validate(),
            Err(PlanError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "terms": {
                "base_amount": "60000",
                "down_payment": "0",
                "interest_rate_percent": "0",
                "tenure_months": 6,
                "start_date": "2025-01-15"
            }
        }"#;

        let config = PlanConfig::from_json(json).unwrap();
        assert_eq!(config.terms.tenure_months, 6);
        assert!(config.reconciliation.credit_overpayment);
        assert_eq!(config.reconciliation.settle_tolerance, Money::CENT);

        let round_trip = serde_json::to_string(&config).unwrap();
        assert_eq!(PlanConfig::from_json(&round_trip).unwrap(), config);
    }

    #[test]
    fn test_config_from_malformed_json() {
        assert!(matches!(
            PlanConfig::from_json("{\"terms\": 5}"),
            Err(PlanError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn test_json_rate_is_a_percentage() {
        let json = r#"{
            "terms": {
                "base_amount": "45000",
                "down_payment": "5000",
                "interest_rate_percent": "18",
                "tenure_months": 9,
                "start_date": "2025-03-31"
            }
        }"#;

        let config = PlanConfig::from_json(json).unwrap();
        assert_eq!(config.terms.interest_rate, Rate::from_percentage(18));
        assert_eq!(config.terms.interest_rate.as_decimal(), dec!(0.18));

        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["terms"]["interest_rate_percent"], "18");
    }

    #[test]
    fn test_json_amounts_rounded_to_cents() {
        let json = r#"{
            "terms": {
                "base_amount": "1000.005",
                "down_payment": "0.004",
                "interest_rate_percent": "0",
                "tenure_months": 3,
                "start_date": "2025-01-15"
            },
            "reconciliation": {
                "settle_tolerance": "0.0149",
                "credit_overpayment": true,
                "auto_apply_misc_balance": false
            }
        }"#;

        let config = PlanConfig::from_json(json).unwrap();
        assert_eq!(config.terms.base_amount, Money::from_str_exact("1000.01").unwrap());
        assert_eq!(config.terms.down_payment, Money::ZERO);
        assert_eq!(config.reconciliation.settle_tolerance, Money::CENT);
        assert!(config.terms.base_amount.as_decimal().scale() <= 2);
    }
}
