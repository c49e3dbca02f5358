//! Investor Catalog
//!
//! Loads the investor spreadsheet once at startup and serves read-only
//! lookups by row index or by predicate. Row order is file order and is the
//! identity the vector index refers to.

mod catalog;

pub use catalog::{InvestorCatalog, CATALOG_COLUMNS};
