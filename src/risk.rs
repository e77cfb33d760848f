//! Risk tier classification and highlight flags.
//!
//! Tiers and reason strings are computed server-side; this module only
//! carries them through with safe defaulting. `safety` is the default for
//! every missing or malformed input, and that rule lives in
//! [`RiskTier::from_payload`] alone.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

use crate::models::NormalizedRecord;

/// Discrete injury-risk status
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    #[default]
    Safety,
    Caution,
    Risky,
}

impl RiskTier {
    /// Tier from an upstream payload value.
    ///
    /// Strings are trimmed and case-folded; anything that is not one of the
    /// three tiers (including non-strings) is `Safety`.
    pub fn from_payload(value: Option<&Value>) -> Self {
        match value {
            None | Some(Value::Null) => RiskTier::Safety,
            Some(Value::String(s)) => s.parse().unwrap_or_else(|_| {
                debug!(risk_level = %s, "Unrecognized risk tier, defaulting to safety");
                RiskTier::Safety
            }),
            Some(other) => {
                debug!(risk_level = %other, "Non-string risk tier, defaulting to safety");
                RiskTier::Safety
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskTier::Safety => "safety",
            RiskTier::Caution => "caution",
            RiskTier::Risky => "risky",
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            RiskTier::Safety => "Safety",
            RiskTier::Caution => "Caution",
            RiskTier::Risky => "Risky",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            RiskTier::Safety => "Recent load is stable. Keep the current rhythm.",
            RiskTier::Caution => "Load is trending up. Watch recovery and adjust intensity.",
            RiskTier::Risky => "Risk is high. Prioritise recovery and reduce load.",
        }
    }
}

impl fmt::Display for RiskTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RiskTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "safety" => Ok(RiskTier::Safety),
            "caution" => Ok(RiskTier::Caution),
            "risky" => Ok(RiskTier::Risky),
            _ => Err(format!("Invalid risk tier: {}", s)),
        }
    }
}

/// Classification result for the latest record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    pub reasons: Vec<String>,
}

impl RiskAssessment {
    /// Highlight flags derived from the reasons
    pub fn flags(&self) -> RiskFlags {
        RiskFlags::from_reasons(&self.reasons)
    }
}

/// Classify the latest record of a window.
///
/// The tier comes from `workload.risk_level` and the reasons from
/// `workload.risk_reasons`, used only when every entry is a string. Any
/// other shape, mixed arrays included, means no reasons.
pub fn classify(latest: Option<&NormalizedRecord>) -> RiskAssessment {
    let Some(record) = latest else {
        return RiskAssessment::default();
    };

    RiskAssessment {
        tier: RiskTier::from_payload(record.workload.get("risk_level")),
        reasons: reasons_from_payload(record.workload.get("risk_reasons")),
    }
}

/// Classify with an athlete-level tier to fall back on.
///
/// The athlete summary's tier is used only when the record carries no
/// usable `risk_level`: missing, null, `false`, `0` or an empty string.
/// Reasons always come from the record.
pub fn classify_with_fallback(
    latest: Option<&NormalizedRecord>,
    athlete_level: Option<&str>,
) -> RiskAssessment {
    let mut assessment = classify(latest);

    let record_has_level = latest
        .and_then(|r| r.workload.get("risk_level"))
        .is_some_and(is_set);

    if !record_has_level {
        assessment.tier = athlete_level
            .and_then(|level| level.parse().ok())
            .unwrap_or_default();
    }

    assessment
}

/// Whether a payload value counts as present for the fallback
fn is_set(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|x| x != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

fn reasons_from_payload(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .unwrap_or_default(),
        _ => Vec::new(),
    }
}

/// Known reason vocabulary; each factor highlights one displayed metric
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskFactor {
    HsrAcwr,
    DistanceAcwr,
    HighMonotony,
    LowEfficiency,
    RecoveryTime,
    DiveAcwr,
    HighAsymmetry,
}

impl RiskFactor {
    pub const ALL: [RiskFactor; 7] = [
        RiskFactor::HsrAcwr,
        RiskFactor::DistanceAcwr,
        RiskFactor::HighMonotony,
        RiskFactor::LowEfficiency,
        RiskFactor::RecoveryTime,
        RiskFactor::DiveAcwr,
        RiskFactor::HighAsymmetry,
    ];

    /// Substring that marks this factor in a reason string (case-sensitive)
    pub fn needle(&self) -> &'static str {
        match self {
            RiskFactor::HsrAcwr => "HSR ACWR",
            RiskFactor::DistanceAcwr => "Distance ACWR",
            RiskFactor::HighMonotony => "High Monotony",
            RiskFactor::LowEfficiency => "Low Efficiency",
            RiskFactor::RecoveryTime => "Recovery Time",
            RiskFactor::DiveAcwr => "Dive ACWR",
            RiskFactor::HighAsymmetry => "High Asymmetry",
        }
    }

    pub fn matches(&self, reason: &str) -> bool {
        reason.contains(self.needle())
    }
}

/// Which metrics a set of reasons highlights
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskFlags {
    pub factors: BTreeSet<RiskFactor>,
    /// Reasons outside the vocabulary: shown, but highlight nothing
    pub unmatched: Vec<String>,
}

impl RiskFlags {
    pub fn from_reasons<S: AsRef<str>>(reasons: &[S]) -> Self {
        let mut flags = RiskFlags::default();

        for reason in reasons {
            let reason = reason.as_ref();
            let mut matched = false;
            for factor in RiskFactor::ALL {
                if factor.matches(reason) {
                    flags.factors.insert(factor);
                    matched = true;
                }
            }
            if !matched {
                flags.unmatched.push(reason.to_string());
            }
        }

        flags
    }

    pub fn is_flagged(&self, factor: RiskFactor) -> bool {
        self.factors.contains(&factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecord;
    use serde_json::json;

    fn record(workload: Value) -> NormalizedRecord {
        NormalizedRecord::from_raw(&RawRecord::from(json!({
            "date": "2024-01-01",
            "workload": workload,
        })))
        .unwrap()
    }

    #[test]
    fn test_classify_defaults_to_safety() {
        assert_eq!(classify(None).tier, RiskTier::Safety);
        assert!(classify(None).reasons.is_empty());

        let empty = record(json!({}));
        assert_eq!(classify(Some(&empty)), RiskAssessment::default());
    }

    #[test]
    fn test_classify_unknown_tier() {
        let r = record(json!({"risk_level": "unknown_value", "risk_reasons": "oops"}));
        assert_eq!(
            classify(Some(&r)),
            RiskAssessment {
                tier: RiskTier::Safety,
                reasons: vec![],
            }
        );

        let r = record(json!({"risk_level": 3}));
        assert_eq!(classify(Some(&r)).tier, RiskTier::Safety);
    }

    #[test]
    fn test_classify_carries_tier_and_reasons() {
        let r = record(json!({
            "risk_level": "risky",
            "risk_reasons": ["HSR ACWR 1.62 >= 1.5", "High Monotony 2.8"]
        }));

        let assessment = classify(Some(&r));
        assert_eq!(assessment.tier, RiskTier::Risky);
        assert_eq!(assessment.reasons.len(), 2);
    }

    #[test]
    fn test_tier_parsing_is_lenient_on_case() {
        let r = record(json!({"risk_level": " Caution "}));
        assert_eq!(classify(Some(&r)).tier, RiskTier::Caution);
    }

    #[test]
    fn test_mixed_reason_array_has_no_reasons() {
        let r = record(json!({"risk_level": "caution", "risk_reasons": ["Dive ACWR", 4, null]}));
        let assessment = classify(Some(&r));
        assert_eq!(assessment.tier, RiskTier::Caution);
        assert!(assessment.reasons.is_empty());

        let r = record(json!({"risk_reasons": ["HSR ACWR high", {"text": "x"}]}));
        assert!(classify(Some(&r)).reasons.is_empty());
        assert!(RiskFlags::from_reasons(&classify(Some(&r)).reasons).factors.is_empty());

        let r = record(json!({"risk_reasons": []}));
        assert!(classify(Some(&r)).reasons.is_empty());
    }

    #[test]
    fn test_classify_with_fallback() {
        let bare = record(json!({}));
        assert_eq!(
            classify_with_fallback(Some(&bare), Some("risky")).tier,
            RiskTier::Risky
        );
        assert_eq!(classify_with_fallback(None, Some("caution")).tier, RiskTier::Caution);
        assert_eq!(classify_with_fallback(None, Some("bogus")).tier, RiskTier::Safety);

        // a record-level tier wins, even an unrecognized one
        let own = record(json!({"risk_level": "whatever"}));
        assert_eq!(
            classify_with_fallback(Some(&own), Some("risky")).tier,
            RiskTier::Safety
        );

        // falsy record levels defer to the athlete tier
        for level in [json!(0), json!(false), json!(null), json!("")] {
            let r = record(json!({"risk_level": level}));
            assert_eq!(
                classify_with_fallback(Some(&r), Some("caution")).tier,
                RiskTier::Caution
            );
        }

        // truthy non-string levels are the record's own and classify as safety
        for level in [json!(3), json!(true), json!(["risky"])] {
            let r = record(json!({"risk_level": level}));
            assert_eq!(
                classify_with_fallback(Some(&r), Some("risky")).tier,
                RiskTier::Safety
            );
        }
    }

    #[test]
    fn test_flags_from_reasons() {
        let flags = RiskFlags::from_reasons(&[
            "HSR ACWR spike",
            "High Monotony (3.1)",
            "Sleep debt",
            "high asymmetry",
        ]);

        assert!(flags.is_flagged(RiskFactor::HsrAcwr));
        assert!(flags.is_flagged(RiskFactor::HighMonotony));
        assert!(!flags.is_flagged(RiskFactor::HighAsymmetry));
        assert!(!flags.is_flagged(RiskFactor::DistanceAcwr));
        assert_eq!(flags.unmatched, vec!["Sleep debt", "high asymmetry"]);
    }

    #[test]
    fn test_tier_ordering_and_labels() {
        assert!(RiskTier::Risky > RiskTier::Caution);
        assert!(RiskTier::Caution > RiskTier::Safety);
        assert_eq!(RiskTier::Caution.label(), "Caution");
        assert_eq!(serde_json::to_value(RiskTier::Risky).unwrap(), json!("risky"));
    }
}
