//! Risk scoring
//!
//! The orchestrator only depends on `RiskScorer`; the threshold decision
//! and the reasons attached to a score live in `RiskAssessment`.

use crate::config::OrchestratorConfig;
use crate::request::TransactionRequest;
use rand::Rng;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;

/// Produces a 0-100 risk score for a request (higher is safer)
pub trait RiskScorer: Send + Sync {
    fn score(&self, request: &TransactionRequest) -> u8;
}

/// Scored request, as recorded in Risk step metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub score: u8,
    pub reasons: Vec<String>,
    pub model_version: String,
}

impl RiskAssessment {
    /// Attach reasons for `score` relative to `threshold`
    pub fn new(score: u8, threshold: u8, model_version: impl Into<String>) -> Self {
        let reasons = if score < threshold {
            vec!["High amount".to_string(), "unusual pattern".to_string()]
        } else {
            vec!["Normal pattern".to_string()]
        };
        Self {
            score,
            reasons,
            model_version: model_version.into(),
        }
    }

    pub fn is_rejected(&self, threshold: u8) -> bool {
        self.score < threshold
    }
}

/// Random scorer with two bands.
///
/// Adverse or high-value requests draw from the low band, everything else
/// from the high band.
#[derive(Debug, Clone)]
pub struct BandScorer {
    high_value_threshold: Decimal,
    low_band: RangeInclusive<u8>,
    high_band: RangeInclusive<u8>,
}

impl BandScorer {
    pub fn new(high_value_threshold: Decimal) -> Self {
        Self {
            high_value_threshold,
            low_band: 20..=45,
            high_band: 60..=95,
        }
    }

    pub fn from_config(config: &OrchestratorConfig) -> Self {
        Self::new(config.high_value_threshold)
    }

    pub fn with_bands(mut self, low: RangeInclusive<u8>, high: RangeInclusive<u8>) -> Self {
        self.low_band = low;
        self.high_band = high;
        self
    }

    fn band_for(&self, request: &TransactionRequest) -> RangeInclusive<u8> {
        if request.is_adverse() || request.amount.value() > self.high_value_threshold {
            self.low_band.clone()
        } else {
            self.high_band.clone()
        }
    }
}

impl RiskScorer for BandScorer {
    fn score(&self, request: &TransactionRequest) -> u8 {
        let band = self.band_for(request);
        if band.is_empty() {
            return *band.start();
        }
        rand::thread_rng().gen_range(band).min(100)
    }
}

/// Always returns the same score
#[derive(Debug, Clone, Copy)]
pub struct FixedScorer(pub u8);

impl RiskScorer for FixedScorer {
    fn score(&self, _request: &TransactionRequest) -> u8 {
        self.0.min(100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Scenario;
    use efrn_core::{Amount, Currency, EmployeeId};
    use rust_decimal_macros::dec;

    fn request(amount: Decimal) -> TransactionRequest {
        TransactionRequest::new(
            EmployeeId::new("EMP001").unwrap(),
            Amount::new(amount).unwrap(),
            Currency::Usd,
        )
    }

    #[test]
    fn test_band_selection() {
        let scorer = BandScorer::new(dec!(10000));

        for _ in 0..50 {
            let normal = scorer.score(&request(dec!(1200)));
            assert!((60..=95).contains(&normal));

            let high_value = scorer.score(&request(dec!(15000)));
            assert!((20..=45).contains(&high_value));

            let adverse = scorer.score(&request(dec!(100)).with_scenario(Scenario::Negative));
            assert!((20..=45).contains(&adverse));
        }
    }

    #[test]
    fn test_threshold_amount_is_not_high_value() {
        let scorer = BandScorer::new(dec!(10000)).with_bands(10..=10, 90..=90);
        assert_eq!(scorer.score(&request(dec!(10000))), 90);
        assert_eq!(scorer.score(&request(dec!(10000.01))), 10);
    }

    #[test]
    fn test_assessment_reasons() {
        let low = RiskAssessment::new(31, 50, "risk-v2.1");
        assert!(low.is_rejected(50));
        assert_eq!(low.reasons, vec!["High amount", "unusual pattern"]);

        let pass = RiskAssessment::new(50, 50, "risk-v2.1");
        assert!(!pass.is_rejected(50));
        assert_eq!(pass.reasons, vec!["Normal pattern"]);
    }

    #[test]
    fn test_fixed_scorer_caps_at_100() {
        assert_eq!(FixedScorer(250).score(&request(dec!(1))), 100);
    }
}
