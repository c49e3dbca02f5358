//! Investor records

use serde::{Deserialize, Serialize};

/// One investor row from the catalog. Immutable once loaded.
///
/// Text fields that were blank in the source are `None`; a `None` field
/// never satisfies a containment filter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvestorRecord {
    pub name: String,
    /// e.g. "VC" or "Angel"
    pub investor_type: String,
    /// Free text with the domains the investor backs
    pub investment_thesis: Option<String>,
    pub stage_of_investment: Option<String>,
    /// May list several countries or regions
    pub countries_of_investment: Option<String>,
    pub cheque_min: Option<f64>,
    pub cheque_max: Option<f64>,
}

impl InvestorRecord {
    /// Human-readable cheque range, `$min to $max`
    pub fn cheque_range(&self) -> String {
        fn fmt(v: Option<f64>) -> String {
            match v {
                Some(v) if v.fract() == 0.0 => format!("${}", v as i64),
                Some(v) => format!("${}", v),
                None => "$?".to_string(),
            }
        }
        format!("{} to {}", fmt(self.cheque_min), fmt(self.cheque_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cheque_range() {
        let record = InvestorRecord {
            name: "Acme Ventures".to_string(),
            investor_type: "VC".to_string(),
            investment_thesis: None,
            stage_of_investment: None,
            countries_of_investment: None,
            cheque_min: Some(50000.0),
            cheque_max: None,
        };
        assert_eq!(record.cheque_range(), "$50000 to $?");
    }
}
