//! Athlete summary payloads: normalization, lookup and tier grouping

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

use crate::models::Position;
use crate::risk::RiskTier;

/// One athlete as listed by the backend roster endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AthleteSummary {
    pub athlete_id: String,
    pub athlete_name: String,
    /// Jersey number as text; empty when unknown
    pub jersey_number: String,
    pub uniform_name: Option<String>,
    pub position: Position,
    /// Latest tier reported for the athlete
    pub risk_level: RiskTier,
    pub is_active: bool,
}

impl AthleteSummary {
    /// Normalize one roster entry; `None` for non-objects or entries without an id
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;

        let athlete_id = match obj.get("athlete_id")? {
            Value::String(s) if !s.is_empty() => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return None,
        };

        let text = |key: &str| obj.get(key).and_then(Value::as_str).map(str::to_string);

        let jersey_number = match obj.get("jersey_number") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Number(n)) => n.to_string(),
            _ => String::new(),
        };

        Some(AthleteSummary {
            athlete_id,
            athlete_name: text("athlete_name").unwrap_or_default(),
            jersey_number,
            uniform_name: text("uniform_name").filter(|s| !s.is_empty()),
            position: Position::from_payload(obj.get("position").and_then(Value::as_str)),
            risk_level: RiskTier::from_payload(obj.get("risk_level")),
            is_active: obj.get("is_active").and_then(Value::as_bool).unwrap_or(true),
        })
    }

    /// Name printed on the card: uniform name, then athlete name
    pub fn display_name(&self) -> &str {
        self.uniform_name
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(&self.athlete_name)
    }
}

/// Normalize a roster payload; a non-array payload is an empty roster
pub fn normalize_athletes(payload: &Value) -> Vec<AthleteSummary> {
    payload
        .as_array()
        .map(|items| items.iter().filter_map(AthleteSummary::from_value).collect())
        .unwrap_or_default()
}

/// Find an athlete by jersey number (both sides trimmed, exact match)
pub fn find_by_jersey<'a>(athletes: &'a [AthleteSummary], jersey: &str) -> Option<&'a AthleteSummary> {
    let wanted = jersey.trim();
    athletes.iter().find(|a| a.jersey_number.trim() == wanted)
}

/// Roster order: goalkeepers first, then numeric jerseys ascending, then
/// non-numeric jerseys by text.
pub fn compare_athletes(a: &AthleteSummary, b: &AthleteSummary) -> Ordering {
    let rank = |p: Position| if p == Position::Goalkeeper { 0 } else { 1 };

    rank(a.position)
        .cmp(&rank(b.position))
        .then_with(|| match (leading_int(&a.jersey_number), leading_int(&b.jersey_number)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        })
        .then_with(|| a.jersey_number.cmp(&b.jersey_number))
}

/// Integer prefix of a jersey string ("10", " 7b" -> 7)
fn leading_int(s: &str) -> Option<i64> {
    let s = s.trim_start();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, s.strip_prefix('+').unwrap_or(s)),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    digits[..end].parse::<i64>().ok().map(|n| sign * n)
}

/// Athletes split by tier, each group in roster order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierGroups {
    pub risky: Vec<AthleteSummary>,
    pub caution: Vec<AthleteSummary>,
    pub safety: Vec<AthleteSummary>,
}

impl TierGroups {
    /// Groups in display order, most at risk first
    pub fn sections(&self) -> [(RiskTier, &[AthleteSummary]); 3] {
        [
            (RiskTier::Risky, self.risky.as_slice()),
            (RiskTier::Caution, self.caution.as_slice()),
            (RiskTier::Safety, self.safety.as_slice()),
        ]
    }
}

pub fn group_by_tier(athletes: &[AthleteSummary]) -> TierGroups {
    let mut sorted = athletes.to_vec();
    sorted.sort_by(compare_athletes);

    let mut groups = TierGroups::default();
    for athlete in sorted {
        match athlete.risk_level {
            RiskTier::Risky => groups.risky.push(athlete),
            RiskTier::Caution => groups.caution.push(athlete),
            RiskTier::Safety => groups.safety.push(athlete),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn roster() -> Vec<AthleteSummary> {
        normalize_athletes(&json!([
            {"athlete_id": "a10", "athlete_name": "Sato", "jersey_number": 10, "risk_level": "risky"},
            {"athlete_id": "a1", "athlete_name": "Kato", "jersey_number": "1", "position": "GK"},
            {"athlete_id": "a7", "athlete_name": "Ito", "jersey_number": "7", "risk_level": "Caution",
             "uniform_name": "I. ITO"},
            {"athlete_id": "ax", "athlete_name": "Trial", "jersey_number": "TR", "risk_level": "risky"},
            {"athlete_id": "a3", "athlete_name": "Mori", "jersey_number": "3", "risk_level": "risky"},
            null,
            {"athlete_name": "No id"}
        ]))
    }

    #[test]
    fn test_normalize_athletes_defaults() {
        let athletes = roster();
        assert_eq!(athletes.len(), 5);

        let sato = &athletes[0];
        assert_eq!(sato.jersey_number, "10");
        assert_eq!(sato.position, Position::FieldPlayer);
        assert!(sato.is_active);

        let kato = &athletes[1];
        assert_eq!(kato.position, Position::Goalkeeper);
        assert_eq!(kato.risk_level, RiskTier::Safety);

        assert_eq!(athletes[2].risk_level, RiskTier::Caution);
        assert_eq!(athletes[2].display_name(), "I. ITO");
        assert_eq!(athletes[0].display_name(), "Sato");
    }

    #[test]
    fn test_non_array_roster() {
        assert!(normalize_athletes(&json!({"detail": "error"})).is_empty());
    }

    #[test]
    fn test_find_by_jersey() {
        let athletes = roster();
        assert_eq!(find_by_jersey(&athletes, " 7 ").unwrap().athlete_id, "a7");
        assert!(find_by_jersey(&athletes, "99").is_none());
    }

    #[test]
    fn test_group_by_tier_orders_roster() {
        let groups = group_by_tier(&roster());

        let ids = |list: &[AthleteSummary]| list.iter().map(|a| a.athlete_id.clone()).collect::<Vec<_>>();
        assert_eq!(ids(&groups.risky), vec!["a3", "a10", "ax"]);
        assert_eq!(ids(&groups.caution), vec!["a7"]);
        assert_eq!(ids(&groups.safety), vec!["a1"]);
        assert_eq!(groups.sections()[0].0, RiskTier::Risky);
    }

    #[test]
    fn test_leading_int() {
        assert_eq!(leading_int("10"), Some(10));
        assert_eq!(leading_int(" 7b"), Some(7));
        assert_eq!(leading_int("TR"), None);
        assert_eq!(leading_int(""), None);
    }
}
