//! Inbound requests
//!
//! `*Input` types are the raw transport shape. Converting them into a
//! `*Request` validates everything up front, so a request that reaches the
//! pipeline can no longer fail validation.

use efrn_core::{Amount, Currency, EmployeeId, ValidationError};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

/// Outcome hint used by demo and test callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, EnumString, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Scenario {
    #[default]
    Positive,
    /// Forces the low risk band
    Negative,
}

/// A validated submission
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRequest {
    pub employee: EmployeeId,
    pub amount: Amount,
    pub currency: Currency,
    pub scenario: Option<Scenario>,
}

impl TransactionRequest {
    pub fn new(employee: EmployeeId, amount: Amount, currency: Currency) -> Self {
        Self {
            employee,
            amount,
            currency,
            scenario: None,
        }
    }

    pub fn with_scenario(mut self, scenario: Scenario) -> Self {
        self.scenario = Some(scenario);
        self
    }

    pub fn is_adverse(&self) -> bool {
        self.scenario == Some(Scenario::Negative)
    }
}

/// Raw submission as received from a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionInput {
    pub employee: String,
    pub amount: Decimal,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub scenario: Option<Scenario>,
}

impl TransactionInput {
    /// Validate, filling a missing currency with `default_currency`
    pub fn validate(self, default_currency: &Currency) -> Result<TransactionRequest, ValidationError> {
        let employee = EmployeeId::new(&self.employee)?;
        let amount = Amount::new(self.amount)?;
        let currency = match self.currency {
            Some(code) => code.parse()?,
            None => default_currency.clone(),
        };

        Ok(TransactionRequest {
            employee,
            amount,
            currency,
            scenario: self.scenario,
        })
    }
}

/// A validated administrative override
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverrideRequest {
    pub employee: EmployeeId,
    pub approver: String,
    pub justification: String,
    /// Resolved from the last rejected entry when absent
    pub amount: Option<Amount>,
    pub currency: Option<Currency>,
}

impl OverrideRequest {
    pub fn new(
        employee: EmployeeId,
        approver: impl Into<String>,
        justification: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let approver = approver.into().trim().to_string();
        if approver.is_empty() {
            return Err(ValidationError::EmptyApprover);
        }
        let justification = justification.into().trim().to_string();
        if justification.is_empty() {
            return Err(ValidationError::EmptyJustification);
        }

        Ok(Self {
            employee,
            approver,
            justification,
            amount: None,
            currency: None,
        })
    }

    pub fn with_amount(mut self, amount: Amount) -> Self {
        self.amount = Some(amount);
        self
    }

    pub fn with_currency(mut self, currency: Currency) -> Self {
        self.currency = Some(currency);
        self
    }
}

/// Raw override as received from a caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideInput {
    pub employee: String,
    pub approver: String,
    pub justification: String,
    #[serde(default)]
    pub amount: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
}

impl OverrideInput {
    pub fn validate(self) -> Result<OverrideRequest, ValidationError> {
        let mut request = OverrideRequest::new(
            EmployeeId::new(&self.employee)?,
            self.approver,
            self.justification,
        )?;
        if let Some(amount) = self.amount {
            request = request.with_amount(Amount::new(amount)?);
        }
        if let Some(code) = self.currency {
            request = request.with_currency(code.parse()?);
        }
        Ok(request)
    }
}
