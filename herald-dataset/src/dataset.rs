//! In-memory tabular dataset with named columns.
//!
//! The dataset is loaded once per run from a CSV file, annotated with a
//! status column when one is missing, and mutated only through the ledger's
//! terminal status writes. Column lookup is case-insensitive throughout.

use std::{io::Read, path::Path};

use herald_common::internal;
use tracing::warn;

use crate::error::{DatasetError, Result, ValidationError};

/// Header the contact column is matched against, case-insensitively.
pub const CONTACT_HEADER: &str = "phone";

/// Header the status column is matched against, case-insensitively.
pub const STATUS_HEADER: &str = "status";

/// Header used when the status column has to be created.
const CREATED_STATUS_HEADER: &str = "Status";

/// Terminal marker excluding a row from the queue, compared case-insensitively.
pub const SENT_MARKER: &str = "sent";

/// A loaded recipient dataset.
///
/// Rows keep their original order for the whole lifetime of the dataset;
/// only status cells are ever rewritten.
#[derive(Debug, Clone)]
pub struct Dataset {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    contact_col: usize,
    status_col: usize,
}

impl Dataset {
    /// Build a dataset from already-parsed records.
    ///
    /// Locates the contact column, locates or creates the status column
    /// (inserted immediately after the contact column, empty on every row),
    /// and normalizes every row to one cell per header: short rows are
    /// padded, overlong rows are trimmed with a warning.
    ///
    /// # Errors
    /// - [`ValidationError::EmptyDataset`] if there are no headers or rows
    /// - [`ValidationError::MissingContactColumn`] if no header matches
    ///   [`CONTACT_HEADER`]
    pub fn from_records(headers: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        if headers.is_empty() || rows.is_empty() {
            return Err(ValidationError::EmptyDataset.into());
        }

        let mut headers = headers;
        let mut rows = rows;

        let contact_col = find_column(&headers, CONTACT_HEADER).ok_or_else(|| {
            ValidationError::MissingContactColumn(CONTACT_HEADER.to_uppercase())
        })?;

        let overlong = rows.iter().filter(|row| row.len() > headers.len()).count();
        if overlong > 0 {
            warn!(
                rows = overlong,
                columns = headers.len(),
                "Rows carry more cells than there are headers; extra cells dropped"
            );
        }

        for row in &mut rows {
            row.resize(headers.len(), String::new());
        }

        let status_col = match find_column(&headers, STATUS_HEADER) {
            Some(col) => col,
            None => {
                let col = contact_col + 1;
                headers.insert(col, CREATED_STATUS_HEADER.to_string());
                for row in &mut rows {
                    row.insert(col, String::new());
                }
                internal!(
                    level = INFO,
                    "Status column created after {} column",
                    CONTACT_HEADER.to_uppercase()
                );
                col
            }
        };

        Ok(Self {
            headers,
            rows,
            contact_col,
            status_col,
        })
    }

    /// Parse a dataset from any CSV source.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .flexible(true)
            .from_reader(reader);

        let headers = reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect::<Vec<_>>();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::from_records(headers, rows)
    }

    /// Load a dataset from a CSV file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)?;
        let dataset = Self::from_csv_reader(file)?;

        internal!(
            level = INFO,
            "Dataset loaded from {}: {} rows",
            path.display(),
            dataset.len()
        );

        Ok(dataset)
    }

    /// Column headers, in their current order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// All rows, in original order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the contact column.
    pub const fn contact_column(&self) -> usize {
        self.contact_col
    }

    /// Index of the status column.
    pub const fn status_column(&self) -> usize {
        self.status_col
    }

    /// Raw contact cell of a row.
    pub fn contact_of(&self, row_index: usize) -> Option<&str> {
        self.rows
            .get(row_index)
            .map(|row| row[self.contact_col].as_str())
    }

    /// Status cell of a row.
    pub fn status_of(&self, row_index: usize) -> Option<&str> {
        self.rows
            .get(row_index)
            .map(|row| row[self.status_col].as_str())
    }

    /// Overwrite the status cell of a row.
    ///
    /// Returns `false` when the row index is out of range. Append-only
    /// discipline within a run is enforced by the [`crate::Ledger`], not here.
    pub fn set_status(&mut self, row_index: usize, status: &str) -> bool {
        match self.rows.get_mut(row_index) {
            Some(row) => {
                row[self.status_col] = status.to_string();
                true
            }
            None => false,
        }
    }
}

/// Case-insensitive header lookup, first match wins.
fn find_column(headers: &[String], name: &str) -> Option<usize> {
    headers.iter().position(|h| h.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn contact_column_lookup_is_case_insensitive() {
        let dataset = Dataset::from_records(
            headers(&["Name", "PHONE", "Status"]),
            vec![row(&["Ada", "123", ""])],
        )
        .unwrap();

        assert_eq!(dataset.contact_column(), 1);
        assert_eq!(dataset.status_column(), 2);
    }

    #[test]
    fn missing_contact_column_is_rejected() {
        let result = Dataset::from_records(headers(&["Name"]), vec![row(&["Ada"])]);

        assert!(matches!(
            result,
            Err(DatasetError::Validation(
                ValidationError::MissingContactColumn(_)
            ))
        ));
    }

    #[test]
    fn empty_dataset_is_rejected() {
        let result = Dataset::from_records(headers(&["Phone"]), vec![]);

        assert!(matches!(
            result,
            Err(DatasetError::Validation(ValidationError::EmptyDataset))
        ));
    }

    #[test]
    fn status_column_is_created_after_contact() {
        let dataset = Dataset::from_records(
            headers(&["Name", "Phone", "City"]),
            vec![row(&["Ada", "123", "London"])],
        )
        .unwrap();

        assert_eq!(
            dataset.headers(),
            &["Name", "Phone", "Status", "City"],
            "created status column should sit right after the contact column"
        );
        assert_eq!(dataset.status_of(0), Some(""));
        assert_eq!(dataset.rows()[0], row(&["Ada", "123", "", "London"]));
    }

    #[test]
    fn existing_status_column_is_reused_regardless_of_position() {
        let dataset = Dataset::from_records(
            headers(&["STATUS", "Phone"]),
            vec![row(&["Sent", "123"])],
        )
        .unwrap();

        assert_eq!(dataset.status_column(), 0);
        assert_eq!(dataset.status_of(0), Some("Sent"));
    }

    #[test]
    fn overlong_rows_are_trimmed_to_the_headers() {
        let dataset = Dataset::from_records(
            headers(&["Phone", "Status"]),
            vec![row(&["123", "Sent", "stray cell"])],
        )
        .unwrap();

        assert_eq!(dataset.rows()[0], row(&["123", "Sent"]));
        assert_eq!(dataset.status_of(0), Some("Sent"));
    }

    #[test]
    fn short_rows_are_padded() {
        let dataset = Dataset::from_records(
            headers(&["Phone", "Status", "Note"]),
            vec![row(&["123"])],
        )
        .unwrap();

        assert_eq!(dataset.rows()[0].len(), 3);
        assert_eq!(dataset.status_of(0), Some(""));
    }

    #[test]
    fn csv_parsing_preserves_row_order() {
        let csv = "name,phone\nAda,123\nGrace,456\n";
        let dataset = Dataset::from_csv_reader(csv.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 2);
        assert_eq!(dataset.contact_of(0), Some("123"));
        assert_eq!(dataset.contact_of(1), Some("456"));
    }
}
