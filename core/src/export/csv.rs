// constructmate/src/export/csv.rs

use std::fmt;

type ValueFn<R> = Box<dyn Fn(&R) -> Option<String> + Send + Sync>;

/// One CSV column: a header and how to render a row's cell.
pub struct Column<R> {
  pub header: String,
  value_of: ValueFn<R>,
  /// Selection checkboxes and action buttons are shown on screen but never exported.
  pub exportable: bool,
}

impl<R: 'static> Column<R> {
  pub fn new(header: &str, value_of: impl Fn(&R) -> Option<String> + Send + Sync + 'static) -> Self {
    Self {
      header: header.to_string(),
      value_of: Box::new(value_of),
      exportable: true,
    }
  }

  /// A screen-only column (no cell value).
  pub fn display_only(header: &str) -> Self {
    Self {
      header: header.to_string(),
      value_of: Box::new(|_: &R| None),
      exportable: false,
    }
  }

  pub fn value_of(&self, row: &R) -> Option<String> {
    (self.value_of)(row)
  }
}

impl<R> fmt::Debug for Column<R> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Column")
      .field("header", &self.header)
      .field("exportable", &self.exportable)
      .finish()
  }
}

/// Wraps in double quotes, doubling any embedded quote.
pub fn quote_field(value: &str) -> String {
  format!("\"{}\"", value.replace('"', "\"\""))
}

/// Header line followed by one line per row, every field quoted. Absent
/// values render as empty strings; non-exportable columns are left out.
pub fn to_csv<R: 'static>(rows: &[R], columns: &[Column<R>]) -> String {
  let columns: Vec<&Column<R>> = columns.iter().filter(|c| c.exportable).collect();

  let mut lines = Vec::with_capacity(rows.len() + 1);
  lines.push(
    columns
      .iter()
      .map(|c| quote_field(&c.header))
      .collect::<Vec<_>>()
      .join(","),
  );
  for row in rows {
    lines.push(
      columns
        .iter()
        .map(|c| quote_field(&c.value_of(row).unwrap_or_default()))
        .collect::<Vec<_>>()
        .join(","),
    );
  }
  lines.join("\n")
}
