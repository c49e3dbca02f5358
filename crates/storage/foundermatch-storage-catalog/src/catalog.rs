//! CSV-backed investor catalog

use csv::{ReaderBuilder, StringRecord};
use foundermatch_core::{InvestorRecord, MatchError, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

/// Column headers the catalog file must carry, in record-field order
pub const CATALOG_COLUMNS: [&str; 7] = [
    "Investor name",
    "Investor type",
    "Investment thesis",
    "Stage of investment",
    "Countries of investment",
    "First cheque minimum",
    "First cheque maximum",
];

/// Read-only investor table
#[derive(Debug, Clone, Default)]
pub struct InvestorCatalog {
    records: Vec<InvestorRecord>,
}

impl InvestorCatalog {
    /// Load a catalog CSV file. Any problem is a configuration error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading investor catalog from {:?}", path);

        let file = File::open(path).map_err(|e| {
            MatchError::configuration(format!(
                "Failed to open catalog {}: {}",
                path.display(),
                e
            ))
        })?;

        let catalog = Self::from_reader(file)?;
        info!("Investor catalog loaded ({} rows)", catalog.len());
        Ok(catalog)
    }

    /// Parse a catalog from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ReaderBuilder::new().flexible(true).from_reader(reader);

        let headers = reader
            .headers()
            .map_err(|e| MatchError::configuration(format!("Failed to read catalog header: {}", e)))?
            .clone();
        let columns = ColumnMap::resolve(&headers)?;

        let mut records = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|e| {
                MatchError::configuration(format!("Malformed catalog row {}: {}", row + 1, e))
            })?;
            records.push(columns.to_investor(&record, row));
        }

        Ok(Self { records })
    }

    /// Build a catalog from records already in memory, keeping their order
    pub fn from_records(records: Vec<InvestorRecord>) -> Self {
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Record at a row index
    pub fn get(&self, row_index: usize) -> Option<&InvestorRecord> {
        self.records.get(row_index)
    }

    /// All records in row order
    pub fn records(&self) -> &[InvestorRecord] {
        &self.records
    }

    /// `(row_index, record)` pairs in row order
    pub fn iter(&self) -> impl Iterator<Item = (usize, &InvestorRecord)> {
        self.records.iter().enumerate()
    }

    /// First `limit` rows satisfying `predicate`, in row order
    pub fn filter<F>(&self, predicate: F, limit: usize) -> Vec<(usize, &InvestorRecord)>
    where
        F: Fn(&InvestorRecord) -> bool,
    {
        self.iter()
            .filter(|(_, record)| predicate(record))
            .take(limit)
            .collect()
    }
}

/// Position of each required column in the file's header
struct ColumnMap {
    positions: [usize; 7],
}

impl ColumnMap {
    fn resolve(headers: &StringRecord) -> Result<Self> {
        let names: Vec<&str> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim())
            .collect();

        let mut positions = [0usize; 7];
        let mut missing = Vec::new();
        for (slot, column) in CATALOG_COLUMNS.iter().enumerate() {
            match names.iter().position(|name| name == column) {
                Some(pos) => positions[slot] = pos,
                None => missing.push(*column),
            }
        }

        if !missing.is_empty() {
            return Err(MatchError::configuration(format!(
                "Catalog is missing required column(s): {}",
                missing.join(", ")
            )));
        }

        let extra: Vec<&str> = names
            .iter()
            .filter(|name| !CATALOG_COLUMNS.contains(name))
            .copied()
            .collect();
        if !extra.is_empty() {
            warn!("Ignoring unknown catalog column(s): {}", extra.join(", "));
        }

        Ok(Self { positions })
    }

    fn text(&self, record: &StringRecord, slot: usize) -> Option<String> {
        record
            .get(self.positions[slot])
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    fn to_investor(&self, record: &StringRecord, row: usize) -> InvestorRecord {
        InvestorRecord {
            name: self.text(record, 0).unwrap_or_default(),
            investor_type: self.text(record, 1).unwrap_or_default(),
            investment_thesis: self.text(record, 2),
            stage_of_investment: self.text(record, 3),
            countries_of_investment: self.text(record, 4),
            cheque_min: self.amount(record, 5, row),
            cheque_max: self.amount(record, 6, row),
        }
    }

    fn amount(&self, record: &StringRecord, slot: usize, row: usize) -> Option<f64> {
        let raw = self.text(record, slot)?;
        let parsed = parse_amount(&raw);
        if parsed.is_none() {
            debug!(
                "Row {}: unreadable '{}' value {:?}",
                row, CATALOG_COLUMNS[slot], raw
            );
        }
        parsed
    }
}

/// Parse a cheque amount such as `$50,000` or `100000.5`
fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' ' | '\u{a0}'))
        .collect();
    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "Investor name,Investor type,Investment thesis,Stage of investment,Countries of investment,First cheque minimum,First cheque maximum";

    fn catalog(rows: &[&str]) -> InvestorCatalog {
        let data = format!("{}\n{}\n", HEADER, rows.join("\n"));
        InvestorCatalog::from_reader(data.as_bytes()).unwrap()
    }

    #[test]
    fn test_rows_keep_file_order() {
        let catalog = catalog(&[
            "Alpha,VC,Fintech and payments,Seed,\"India, USA\",50000,250000",
            "Beta,Angel,HealthTech,Series A,Europe,10000,20000",
        ]);
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.get(0).unwrap().name, "Alpha");
        assert_eq!(
            catalog.get(0).unwrap().countries_of_investment.as_deref(),
            Some("India, USA")
        );
        assert_eq!(catalog.get(1).unwrap().cheque_max, Some(20000.0));
        assert!(catalog.get(2).is_none());
    }

    #[test]
    fn test_blank_cells_become_none() {
        let catalog = catalog(&["Gamma,VC,,  ,Global,,n/a"]);
        let record = catalog.get(0).unwrap();
        assert!(record.investment_thesis.is_none());
        assert!(record.stage_of_investment.is_none());
        assert_eq!(record.countries_of_investment.as_deref(), Some("Global"));
        assert!(record.cheque_min.is_none());
        assert!(record.cheque_max.is_none());
    }

    #[test]
    fn test_short_rows_are_tolerated() {
        let catalog = catalog(&["Delta,Angel,AI"]);
        let record = catalog.get(0).unwrap();
        assert_eq!(record.investment_thesis.as_deref(), Some("AI"));
        assert!(record.stage_of_investment.is_none());
    }

    #[test]
    fn test_missing_column_is_configuration_error() {
        let data = "Investor name,Investor type\nAlpha,VC\n";
        let err = InvestorCatalog::from_reader(data.as_bytes()).unwrap_err();
        assert!(matches!(err, MatchError::Configuration(_)));
        assert!(err.to_string().contains("Investment thesis"));
    }

    #[test]
    fn test_columns_matched_by_name_not_position() {
        let data = "Website,First cheque maximum,First cheque minimum,Countries of investment,Stage of investment,Investment thesis,Investor type,Investor name\n\
                    x.com,100,\"$1,000\",USA,Seed,SaaS,VC,Omega\n";
        let catalog = InvestorCatalog::from_reader(data.as_bytes()).unwrap();
        let record = catalog.get(0).unwrap();
        assert_eq!(record.name, "Omega");
        assert_eq!(record.cheque_min, Some(1000.0));
        assert_eq!(record.cheque_max, Some(100.0));
    }

    #[test]
    fn test_filter_respects_order_and_limit() {
        let catalog = catalog(&[
            "A,VC,AI,Seed,USA,1,2",
            "B,VC,Biotech,Seed,USA,1,2",
            "C,VC,AI tooling,Seed,USA,1,2",
            "D,VC,Applied AI,Seed,USA,1,2",
        ]);
        let hits = catalog.filter(
            |r| r.investment_thesis.as_deref().unwrap_or("").contains("AI"),
            2,
        );
        let rows: Vec<usize> = hits.iter().map(|(row, _)| *row).collect();
        assert_eq!(rows, vec![0, 2]);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "{}", HEADER).unwrap();
        writeln!(file, "Alpha,VC,Fintech,Seed,India,100,200").unwrap();
        let catalog = InvestorCatalog::load(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);

        let err = InvestorCatalog::load("/definitely/not/here.csv").unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("$50,000"), Some(50000.0));
        assert_eq!(parse_amount("1e3"), Some(1000.0));
        assert_eq!(parse_amount("ten"), None);
    }
}
