//! Export rendering for the annotated dataset.
//!
//! An export is a pure function of a dataset snapshot: the status column is
//! relocated to sit immediately after the contact column regardless of its
//! original position, and column widths follow a deterministic heuristic
//! from header length. Repeated exports of an unchanged dataset produce
//! byte-identical CSV.

use std::{
    fmt::{Display, Formatter},
    time::{SystemTime, UNIX_EPOCH},
};

use crate::{dataset::Dataset, error::DatasetError};

/// Narrowest rendered column, in characters.
pub const MIN_COLUMN_WIDTH: usize = 15;

/// Deterministic column width: header length plus padding, floored.
fn column_width(header: &str) -> usize {
    (header.chars().count() + 2).max(MIN_COLUMN_WIDTH)
}

/// A reordered, render-ready view of the dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    widths: Vec<usize>,
}

impl Export {
    /// Build an export from a dataset snapshot.
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let order = column_order(dataset);

        let headers: Vec<String> = order
            .iter()
            .map(|&col| dataset.headers()[col].clone())
            .collect();
        let rows = dataset
            .rows()
            .iter()
            .map(|row| order.iter().map(|&col| row[col].clone()).collect())
            .collect();
        let widths = headers.iter().map(|h| column_width(h)).collect();

        Self {
            headers,
            rows,
            widths,
        }
    }

    /// Headers in export order (status immediately after contact).
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Rows in original dataset order, cells in export column order.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Rendered width of each column.
    pub fn widths(&self) -> &[usize] {
        &self.widths
    }

    /// Serialize to CSV. Byte-identical for identical snapshots.
    pub fn to_csv(&self) -> Result<String, DatasetError> {
        let mut writer = csv::Writer::from_writer(Vec::new());

        writer.write_record(&self.headers)?;
        for row in &self.rows {
            writer.write_record(row)?;
        }

        let bytes = writer
            .into_inner()
            .map_err(|e| DatasetError::Internal(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DatasetError::Internal(e.to_string()))
    }

    /// Output file name for an export taken now: `updated_<epoch-millis>.<ext>`.
    pub fn file_name(extension: &str) -> String {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis();
        Self::file_name_at(millis, extension)
    }

    /// Output file name for an export taken at a known timestamp.
    pub fn file_name_at(epoch_millis: u128, extension: &str) -> String {
        format!("updated_{epoch_millis}.{extension}")
    }
}

/// Column indices in export order: status pulled out and re-inserted right
/// after the contact column.
fn column_order(dataset: &Dataset) -> Vec<usize> {
    let status = dataset.status_column();
    let contact = dataset.contact_column();

    let mut order: Vec<usize> = (0..dataset.headers().len())
        .filter(|&col| col != status)
        .collect();

    let contact_pos = order
        .iter()
        .position(|&col| col == contact)
        .unwrap_or(order.len().saturating_sub(1));
    order.insert(contact_pos + 1, status);

    order
}

impl Display for Export {
    /// Aligned text rendering using the column-width heuristic.
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for (header, width) in self.headers.iter().zip(self.widths.iter().copied()) {
            write!(f, "{header:<width$}")?;
        }
        writeln!(f)?;

        for row in &self.rows {
            for (cell, width) in row.iter().zip(self.widths.iter().copied()) {
                write!(f, "{cell:<width$}")?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn dataset(headers: &[&str], rows: &[&[&str]]) -> Dataset {
        Dataset::from_records(
            headers.iter().map(ToString::to_string).collect(),
            rows.iter()
                .map(|row| row.iter().map(ToString::to_string).collect())
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn status_is_relocated_after_contact() {
        let dataset = dataset(
            &["Name", "Status", "Phone"],
            &[&["Ada", "Sent", "123"]],
        );
        let export = Export::from_dataset(&dataset);

        assert_eq!(export.headers(), &["Name", "Phone", "Status"]);
        assert_eq!(export.rows()[0], vec!["Ada", "123", "Sent"]);
    }

    #[test]
    fn already_adjacent_status_keeps_its_place() {
        let dataset = dataset(&["Phone", "Status", "Name"], &[&["123", "", "Ada"]]);
        let export = Export::from_dataset(&dataset);

        assert_eq!(export.headers(), &["Phone", "Status", "Name"]);
    }

    #[test]
    fn widths_follow_the_header_heuristic() {
        let dataset = dataset(
            &["An Extra Long Header", "Phone"],
            &[&["x", "123"]],
        );
        let export = Export::from_dataset(&dataset);

        // header length + 2, floored at the minimum width
        assert_eq!(export.widths()[0], 22);
        assert_eq!(export.widths()[1], MIN_COLUMN_WIDTH);
        assert_eq!(export.widths()[2], MIN_COLUMN_WIDTH);
    }

    #[test]
    fn export_is_idempotent() {
        let dataset = dataset(
            &["Name", "Phone", "Status"],
            &[&["Ada", "123", "Sent"], &["Grace", "456", "Failed"]],
        );

        let first = Export::from_dataset(&dataset).to_csv().unwrap();
        let second = Export::from_dataset(&dataset).to_csv().unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "Name,Phone,Status\nAda,123,Sent\nGrace,456,Failed\n");
    }

    #[test]
    fn file_name_follows_the_updated_pattern() {
        assert_eq!(Export::file_name_at(1_700_000_000_123, "csv"), "updated_1700000000123.csv");

        let name = Export::file_name("csv");
        assert!(name.starts_with("updated_"));
        assert!(name.ends_with(".csv"));
    }

    #[test]
    fn display_pads_to_column_widths() {
        let dataset = dataset(&["Phone", "Status"], &[&["123", "Sent"]]);
        let rendered = Export::from_dataset(&dataset).to_string();
        let mut lines = rendered.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("Phone"));
        assert_eq!(header.len(), MIN_COLUMN_WIDTH * 2);
    }
}
