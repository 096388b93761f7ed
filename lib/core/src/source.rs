//! CSV catalog source
//!
//! Reads the tabular menu file into [`RawRecord`]s. Columns other than the
//! four named in [`CatalogSchema`] are treated as boolean attribute columns
//! when every non-empty cell in them reads as Yes/No.

use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

use crate::catalog::{Catalog, TriState};
use crate::normalize::{normalize, RawRecord};
use crate::{Error, Result};

/// Column names of the catalog file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogSchema {
    pub menu_column: String,
    pub category_column: String,
    pub base_type_column: String,
    pub flavor_tags_column: String,
}

impl Default for CatalogSchema {
    fn default() -> Self {
        Self {
            menu_column: "Menu".to_string(),
            category_column: "Category".to_string(),
            base_type_column: "Base Type".to_string(),
            flavor_tags_column: "Flavor Tags".to_string(),
        }
    }
}

impl CatalogSchema {
    fn is_text_column(&self, name: &str) -> bool {
        name == self.menu_column
            || name == self.category_column
            || name == self.base_type_column
            || name == self.flavor_tags_column
    }
}

/// Read raw rows from CSV data
pub fn read_csv<R: Read>(reader: R, schema: &CatalogSchema) -> Result<Vec<RawRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let menu_idx = column(&schema.menu_column)
        .ok_or_else(|| Error::MissingColumn(schema.menu_column.clone()))?;
    let category_idx = column(&schema.category_column);
    let base_type_idx = column(&schema.base_type_column);
    let flavor_tags_idx = column(&schema.flavor_tags_column);

    let rows = reader.records().collect::<std::result::Result<Vec<_>, _>>()?;

    let attribute_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(_, name)| !name.is_empty() && !schema.is_text_column(name))
        .filter(|(idx, _)| is_boolean_column(&rows, *idx))
        .collect();
    debug!(
        "Detected {} boolean attribute columns: {:?}",
        attribute_columns.len(),
        attribute_columns.iter().map(|(_, name)| name).collect::<Vec<_>>()
    );

    let cell = |row: &csv::StringRecord, idx: Option<usize>| {
        idx.map(|i| row.get(i).unwrap_or_default().to_string())
    };

    let records = rows
        .iter()
        .map(|row| RawRecord {
            menu_name: cell(row, Some(menu_idx)),
            category: cell(row, category_idx),
            base_type: cell(row, base_type_idx),
            flavor_tags: cell(row, flavor_tags_idx),
            attributes: attribute_columns
                .iter()
                .map(|(idx, name)| (name.to_string(), row.get(*idx).unwrap_or_default().to_string()))
                .collect(),
        })
        .collect();

    Ok(records)
}

/// Every cell spells yes, no or unknown, and at least one is non-empty
fn is_boolean_column(rows: &[csv::StringRecord], idx: usize) -> bool {
    let mut seen = false;
    for value in rows.iter().filter_map(|row| row.get(idx)) {
        if TriState::recognize(value).is_none() {
            return false;
        }
        seen |= !value.is_empty();
    }
    seen
}

/// Read raw rows from a CSV file
pub fn load_csv<P: AsRef<Path>>(path: P, schema: &CatalogSchema) -> Result<Vec<RawRecord>> {
    let file = File::open(path.as_ref())?;
    read_csv(file, schema)
}

/// Read and normalize a catalog from CSV data
pub fn read_catalog<R: Read>(reader: R, schema: &CatalogSchema) -> Result<Catalog> {
    Ok(normalize(read_csv(reader, schema)?))
}

/// Load and normalize a catalog file
pub fn load_catalog<P: AsRef<Path>>(path: P, schema: &CatalogSchema) -> Result<Catalog> {
    let catalog = normalize(load_csv(path.as_ref(), schema)?);
    info!(
        "Loaded {} catalog items from {:?} ({} skipped)",
        catalog.len(),
        path.as_ref(),
        catalog.skipped()
    );
    Ok(catalog)
}
