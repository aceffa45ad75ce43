// Copyright (c) 2018-2025  Brendan Molloy <brendan@bbqsrc.net>,
//                          Ilya Solovyiov <ilya.solovyiov@gmail.com>,
//                          Kai Ren <tyranron@gmail.com>
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Examples tables.
//!
//! This module provides an [`ExamplesTable`] type: a header row followed by
//! data rows, written as pipe separated cells:
//!
//! ```text
//! |ith|nth   |
//! |--        |
//! |first|ground|
//! ```

use std::fmt;

use super::{
    converters::{Conversion, ConversionError, ParameterConverters},
    types::Parameter,
    Row,
};

const CELL_SEPARATOR: char = '|';
const COMMENT_ROW: &str = "|--";

/// Table of [`Row`]s sharing the same headers.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ExamplesTable {
    headers: Vec<String>,
    rows: Vec<Row>,
}

impl ExamplesTable {
    /// Creates an empty [`ExamplesTable`].
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses an [`ExamplesTable`] out of its textual form.
    ///
    /// Blank lines and `|--` comment rows are skipped, cells are trimmed and
    /// missing trailing cells are treated as empty.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut lines = text
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.starts_with(COMMENT_ROW));

        let Some(header) = lines.next() else {
            return Self::empty();
        };
        let headers = cells(header);
        let rows = lines
            .map(|line| {
                let mut values = cells(line).into_iter();
                headers
                    .iter()
                    .map(|h| (h.clone(), values.next().unwrap_or_default()))
                    .collect::<Row>()
            })
            .collect();
        Self { headers, rows }
    }

    /// Creates an [`ExamplesTable`] out of the provided [`Row`]s, taking the
    /// headers from the first one.
    #[must_use]
    pub fn from_rows(rows: Vec<Row>) -> Self {
        let headers = rows
            .first()
            .map(|r| r.names().map(ToOwned::to_owned).collect())
            .unwrap_or_default();
        Self { headers, rows }
    }

    /// Names of the columns.
    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Data rows, the header excluded.
    #[must_use]
    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    /// Takes the data rows out of this table.
    #[must_use]
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }

    /// Data row at the `index`.
    #[must_use]
    pub fn row(&self, index: usize) -> Option<&Row> {
        self.rows.get(index)
    }

    /// Number of data rows.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Indicates whether this table has no data rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Renders this table back into its textual form.
    #[must_use]
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    /// Converts every data row into `T`.
    ///
    /// # Errors
    ///
    /// If any cell cannot be converted.
    pub fn rows_as<T: FromRow>(
        &self,
        converters: &ParameterConverters,
    ) -> Result<Vec<T>, ConversionError> {
        converters.with_conversion(|conversion| {
            self.rows
                .iter()
                .map(|row| T::from_row(&TypedRow::new(row, conversion)))
                .collect()
        })
    }
}

impl fmt::Display for ExamplesTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.headers.is_empty() {
            return Ok(());
        }
        write_line(f, self.headers.iter().map(String::as_str))?;
        for row in &self.rows {
            writeln!(f)?;
            write_line(
                f,
                self.headers
                    .iter()
                    .map(|h| row.get(h).map_or("", String::as_str)),
            )?;
        }
        Ok(())
    }
}

fn write_line<'a>(
    f: &mut fmt::Formatter<'_>,
    cells: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    write!(f, "{CELL_SEPARATOR}")?;
    for cell in cells {
        write!(f, "{cell}{CELL_SEPARATOR}")?;
    }
    Ok(())
}

fn cells(line: &str) -> Vec<String> {
    let line = line.strip_prefix(CELL_SEPARATOR).unwrap_or(line);
    let line = line.strip_suffix(CELL_SEPARATOR).unwrap_or(line);
    line.split(CELL_SEPARATOR).map(|c| c.trim().to_owned()).collect()
}

/// Type constructible out of a single [`ExamplesTable`] row.
///
/// ```rust
/// # use stepwise::parameters::{
/// #     ConversionError, ExamplesTable, FromRow, ParameterConverters, TypedRow,
/// # };
/// struct Trader {
///     name: String,
///     shares: u32,
/// }
///
/// impl FromRow for Trader {
///     fn from_row(row: &TypedRow<'_>) -> Result<Self, ConversionError> {
///         Ok(Self { name: row.get("name")?, shares: row.get("shares")? })
///     }
/// }
///
/// let table = ExamplesTable::parse("|name|shares|\n|Jones|10|");
/// let traders = table
///     .rows_as::<Trader>(&ParameterConverters::default())
///     .unwrap();
/// assert_eq!(traders[0].name, "Jones");
/// assert_eq!(traders[0].shares, 10);
/// ```
pub trait FromRow: Send + Sized + 'static {
    /// Converts the `row` into this type.
    ///
    /// # Errors
    ///
    /// If a required column is missing or cannot be converted.
    fn from_row(row: &TypedRow<'_>) -> Result<Self, ConversionError>;
}

/// [`Row`] whose cells are converted on access.
#[derive(Clone, Copy, Debug)]
pub struct TypedRow<'a> {
    row: &'a Row,
    conversion: Conversion<'a>,
}

impl<'a> TypedRow<'a> {
    /// Wraps the `row` to be converted within the `conversion`.
    #[must_use]
    pub const fn new(row: &'a Row, conversion: Conversion<'a>) -> Self {
        Self { row, conversion }
    }

    /// Raw value of the `column`.
    #[must_use]
    pub fn raw(&self, column: &str) -> Option<&'a str> {
        self.row.get(column).map(String::as_str)
    }

    /// Value of the `column` converted into `T`.
    ///
    /// # Errors
    ///
    /// If the `column` is missing or its value cannot be converted.
    pub fn get<T: Parameter>(&self, column: &str) -> Result<T, ConversionError> {
        let raw = self.raw(column).ok_or_else(|| {
            ConversionError::malformed(
                column,
                &T::param_type(),
                "no such column",
            )
        })?;
        self.conversion.convert_to(raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_and_rows() {
        let table = ExamplesTable::parse(
            "
            |ith  |nth   |
            |--   a comment|
            |first|ground|

            |second|first|
            ",
        );

        assert_eq!(table.headers(), ["ith", "nth"]);
        assert_eq!(table.row_count(), 2);
        assert_eq!(
            table.row(0).and_then(|r| r.get("nth")).map(String::as_str),
            Some("ground"),
        );
        assert_eq!(
            table.row(1).and_then(|r| r.get("ith")).map(String::as_str),
            Some("second"),
        );
    }

    #[test]
    fn missing_cells_are_empty() {
        let table = ExamplesTable::parse("|a|b|\n|1|");

        assert_eq!(table.rows()[0].get("b").map(String::as_str), Some(""));
    }

    #[test]
    fn blank_text_is_empty_table() {
        let table = ExamplesTable::parse("  \n ");

        assert!(table.is_empty());
        assert!(table.headers().is_empty());
        assert_eq!(table.as_string(), "");
    }

    #[test]
    fn renders_back_to_text() {
        let table = ExamplesTable::parse("| a | b |\n| 1 | 2 |");

        assert_eq!(table.as_string(), "|a|b|\n|1|2|");
        assert_eq!(ExamplesTable::parse(&table.as_string()), table);
    }

    #[test]
    fn builds_from_rows() {
        let table = ExamplesTable::from_rows(vec![
            Row::new().with("x", "1").with("y", "2"),
        ]);

        assert_eq!(table.headers(), ["x", "y"]);
        assert_eq!(table.into_rows().len(), 1);
    }
}
