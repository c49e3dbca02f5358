//! Tag filtering over the catalog
//!
//! A record matches when, case-insensitively,
//! - `investment_thesis` contains the first domain tag,
//! - `stage_of_investment` contains the stage tag, and
//! - `countries_of_investment` contains the region tag.
//!
//! Only the first domain tag is used even when several were extracted.
//! Results keep catalog order and are not ranked by similarity.

use foundermatch_core::{
    contains_ignore_case, ExtractedTags, InvestorRecord, MatchEntry, MatchResult, Result,
    DEFAULT_TOP_K,
};
use foundermatch_storage_catalog::InvestorCatalog;
use tracing::debug;

/// Containment predicate built from one set of tags
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagPredicate {
    domain: String,
    stage: String,
    region: String,
}

impl TagPredicate {
    /// Build the predicate; fails if `tags.domain` is empty
    pub fn from_tags(tags: &ExtractedTags) -> Result<Self> {
        Ok(Self {
            domain: tags.primary_domain()?.to_string(),
            stage: tags.stage.clone(),
            region: tags.region.clone(),
        })
    }

    /// Whether all three fields contain their tag. Missing fields never match.
    pub fn matches(&self, record: &InvestorRecord) -> bool {
        fn contains(field: &Option<String>, needle: &str) -> bool {
            field
                .as_deref()
                .is_some_and(|value| contains_ignore_case(value, needle))
        }

        contains(&record.investment_thesis, &self.domain)
            && contains(&record.stage_of_investment, &self.stage)
            && contains(&record.countries_of_investment, &self.region)
    }
}

/// Applies tag predicates to a catalog
#[derive(Debug, Clone)]
pub struct FilterMatcher {
    limit: usize,
}

impl FilterMatcher {
    /// `limit` caps the result length
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// First `limit` matching records in catalog order.
    ///
    /// An empty result is a normal outcome. The only failure is an empty
    /// domain list, which is reported as an extraction error.
    pub fn filter(
        &self,
        catalog: &InvestorCatalog,
        tags: &ExtractedTags,
    ) -> Result<MatchResult> {
        let predicate = TagPredicate::from_tags(tags)?;

        let entries: Vec<MatchEntry> = catalog
            .filter(|record| predicate.matches(record), self.limit)
            .into_iter()
            .map(|(row_index, record)| MatchEntry {
                row_index,
                investor: record.clone(),
                distance: None,
            })
            .collect();

        debug!(
            "Tag filter matched {} of {} investors (limit {})",
            entries.len(),
            catalog.len(),
            self.limit
        );
        Ok(MatchResult::new(entries))
    }
}

impl Default for FilterMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_TOP_K)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundermatch_core::MatchError;

    fn record(
        name: &str,
        thesis: Option<&str>,
        stage: Option<&str>,
        countries: Option<&str>,
    ) -> InvestorRecord {
        InvestorRecord {
            name: name.to_string(),
            investor_type: "VC".to_string(),
            investment_thesis: thesis.map(str::to_string),
            stage_of_investment: stage.map(str::to_string),
            countries_of_investment: countries.map(str::to_string),
            cheque_min: Some(10_000.0),
            cheque_max: Some(100_000.0),
        }
    }

    fn tags(domain: &[&str], stage: &str, region: &str) -> ExtractedTags {
        ExtractedTags {
            domain: domain.iter().map(|d| d.to_string()).collect(),
            stage: stage.to_string(),
            region: region.to_string(),
        }
    }

    #[test]
    fn test_fintech_seed_india() {
        let catalog = InvestorCatalog::from_records(vec![
            record("Match", Some("Fintech and payments"), Some("Seed"), Some("India, USA")),
            record("WrongStage", Some("Fintech"), Some("Series A"), Some("India")),
            record("WrongRegion", Some("fintech"), Some("seed"), Some("Europe")),
        ]);
        let result = FilterMatcher::default()
            .filter(&catalog, &tags(&["Fintech"], "Seed", "India"))
            .unwrap();

        assert_eq!(result.row_indices(), vec![0]);
        assert!(result.iter().all(|e| e.distance.is_none()));
    }

    #[test]
    fn test_case_insensitive() {
        let catalog = InvestorCatalog::from_records(vec![record(
            "A",
            Some("HEALTHTECH platforms"),
            Some("pre-seed, SEED"),
            Some("global"),
        )]);
        let result = FilterMatcher::default()
            .filter(&catalog, &tags(&["healthtech"], "Seed", "Global"))
            .unwrap();
        assert_eq!(result.len(), 1);
    }

    #[test]
    fn test_only_first_domain_is_used() {
        let catalog = InvestorCatalog::from_records(vec![
            record("AIOnly", Some("AI infrastructure"), Some("Seed"), Some("USA")),
            record("SaaS", Some("SaaS tools"), Some("Seed"), Some("USA")),
        ]);
        let result = FilterMatcher::default()
            .filter(&catalog, &tags(&["SaaS", "AI"], "Seed", "USA"))
            .unwrap();
        assert_eq!(result.row_indices(), vec![1]);
    }

    #[test]
    fn test_missing_fields_never_match() {
        let catalog = InvestorCatalog::from_records(vec![
            record("NoThesis", None, Some("Seed"), Some("USA")),
            record("NoStage", Some("AI"), None, Some("USA")),
            record("NoCountries", Some("AI"), Some("Seed"), None),
        ]);
        let result = FilterMatcher::default()
            .filter(&catalog, &tags(&["AI"], "Seed", "USA"))
            .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_capped_and_order_preserving() {
        let records: Vec<InvestorRecord> = (0..8)
            .map(|i| record(&format!("Fund {}", i), Some("AI"), Some("Seed"), Some("USA")))
            .collect();
        let catalog = InvestorCatalog::from_records(records);
        let matcher = FilterMatcher::default();
        let query = tags(&["ai"], "seed", "usa");

        let first = matcher.filter(&catalog, &query).unwrap();
        let second = matcher.filter(&catalog, &query).unwrap();
        assert_eq!(first.row_indices(), vec![0, 1, 2, 3, 4]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_domain_is_extraction_error() {
        let catalog = InvestorCatalog::from_records(vec![]);
        let err = FilterMatcher::default()
            .filter(&catalog, &tags(&[], "Seed", "USA"))
            .unwrap_err();
        assert!(matches!(err, MatchError::Extraction(_)));
    }

    #[test]
    fn test_every_match_contains_its_tags() {
        let catalog = InvestorCatalog::from_records(vec![
            record("A", Some("Climate and energy"), Some("Series A"), Some("Europe, UK")),
            record("B", Some("Climate"), Some("Series B"), Some("Europe")),
            record("C", Some("climate tech"), Some("series a"), Some("Western Europe")),
            record("D", Some("Agritech"), Some("Series A"), Some("Europe")),
        ]);
        let query = tags(&["Climate"], "Series A", "Europe");
        let result = FilterMatcher::default().filter(&catalog, &query).unwrap();

        assert_eq!(result.row_indices(), vec![0, 2]);
        for entry in result.iter() {
            let r = &entry.investor;
            assert!(r.investment_thesis.as_deref().unwrap().to_lowercase().contains("climate"));
            assert!(r.stage_of_investment.as_deref().unwrap().to_lowercase().contains("series a"));
            assert!(r.countries_of_investment.as_deref().unwrap().to_lowercase().contains("europe"));
        }
    }
}
