//! In-memory tabular data
//!
//! [`RawTable`] holds the CSV as read, one optional string per cell.
//! [`Frame`] holds typed columns once preprocessing has classified them.

use std::{io, path::Path};

use ndarray::Array2;

/// Cell values treated as missing when reading CSV input
pub const MISSING_MARKERS: [&str; 10] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "null", "NULL", "None", "#N/A",
];

fn is_missing(cell: &str) -> bool {
    MISSING_MARKERS.contains(&cell.trim())
}

/// CSV contents before any typing
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Read a headed CSV. Rows with a different field count are an error.
    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, csv::Error> {
        let mut rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = rdr.headers()?.iter().map(str::to_string).collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(
                record
                    .iter()
                    .map(|cell| (!is_missing(cell)).then(|| cell.to_string()))
                    .collect(),
            );
        }

        Ok(Self { headers, rows })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, csv::Error> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// All cells of one column, in row order
    pub fn column(&self, name: &str) -> Option<Vec<Option<String>>> {
        let idx = self.headers.iter().position(|h| h == name)?;
        Some(self.rows.iter().map(|row| row[idx].clone()).collect())
    }

    /// Split into per-column cell vectors, consuming the table
    pub fn into_columns(self) -> Vec<(String, Vec<Option<String>>)> {
        let mut columns: Vec<(String, Vec<Option<String>>)> = self
            .headers
            .into_iter()
            .map(|h| (h, Vec::with_capacity(self.rows.len())))
            .collect();
        for row in self.rows {
            for (cell, (_, column)) in row.into_iter().zip(columns.iter_mut()) {
                column.push(cell);
            }
        }
        columns
    }
}

/// Values of one typed column
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Numeric(v) => v.len(),
            ColumnData::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_missing(&self, row: usize) -> bool {
        match self {
            ColumnData::Numeric(v) => v[row].is_none(),
            ColumnData::Categorical(v) => v[row].is_none(),
        }
    }

    fn retain_rows(&mut self, keep: &[bool]) {
        fn retain<T>(values: &mut Vec<T>, keep: &[bool]) {
            let mut flags = keep.iter();
            values.retain(|_| *flags.next().unwrap_or(&false));
        }
        match self {
            ColumnData::Numeric(v) => retain(v, keep),
            ColumnData::Categorical(v) => retain(v, keep),
        }
    }
}

/// Named typed column
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// Typed table produced by preprocessing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<Column>,
}

impl Frame {
    pub fn new(columns: Vec<Column>) -> Self {
        Self { columns }
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, |c| c.data.len())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    pub fn push(&mut self, column: Column) {
        self.columns.push(column);
    }

    pub fn remove(&mut self, name: &str) -> Option<Column> {
        let idx = self.columns.iter().position(|c| c.name == name)?;
        Some(self.columns.remove(idx))
    }

    /// Drop every row with a missing cell; returns how many were dropped
    pub fn drop_incomplete_rows(&mut self) -> usize {
        let n = self.n_rows();
        let keep: Vec<bool> = (0..n)
            .map(|row| self.columns.iter().all(|c| !c.data.is_missing(row)))
            .collect();
        let dropped = keep.iter().filter(|k| !**k).count();
        if dropped > 0 {
            for column in &mut self.columns {
                column.data.retain_rows(&keep);
            }
        }
        dropped
    }

    /// Complete numeric column as plain values
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>, String> {
        let column = self
            .column(name)
            .ok_or_else(|| format!("column '{}' not found", name))?;
        match &column.data {
            ColumnData::Numeric(values) => values
                .iter()
                .enumerate()
                .map(|(row, v)| v.ok_or_else(|| format!("column '{}' is missing row {}", name, row)))
                .collect(),
            ColumnData::Categorical(_) => Err(format!("column '{}' is not numeric", name)),
        }
    }

    /// Row-major matrix of the named numeric columns, in the given order
    pub fn to_matrix(&self, names: &[&str]) -> Result<Array2<f64>, String> {
        let n_rows = self.n_rows();
        let mut matrix = Array2::<f64>::zeros((n_rows, names.len()));
        for (j, name) in names.iter().enumerate() {
            let values = self.numeric(name)?;
            for (i, v) in values.into_iter().enumerate() {
                matrix[[i, j]] = v;
            }
        }
        Ok(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "Date,Location,MinTemp\n2008-12-01,Albury,13.4\n2008-12-02,NA,\n";

    #[test]
    fn test_missing_markers_become_none() {
        let table = RawTable::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(table.n_rows(), 2);
        assert_eq!(
            table.column("Location").unwrap(),
            vec![Some("Albury".to_string()), None]
        );
        assert_eq!(table.column("MinTemp").unwrap()[1], None);
    }

    #[test]
    fn test_ragged_csv_is_an_error() {
        let ragged = "a,b\n1,2\n3\n";
        assert!(RawTable::from_reader(ragged.as_bytes()).is_err());
    }

    #[test]
    fn test_into_columns_keeps_order() {
        let table = RawTable::from_reader(CSV.as_bytes()).unwrap();
        let columns = table.into_columns();
        let names: Vec<_> = columns.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["Date", "Location", "MinTemp"]);
        assert_eq!(columns[2].1.len(), 2);
    }

    #[test]
    fn test_drop_incomplete_rows() {
        let mut frame = Frame::new(vec![
            Column {
                name: "a".into(),
                data: ColumnData::Numeric(vec![Some(1.0), None, Some(3.0)]),
            },
            Column {
                name: "b".into(),
                data: ColumnData::Categorical(vec![Some("x".into()), Some("y".into()), None]),
            },
        ]);
        assert_eq!(frame.drop_incomplete_rows(), 2);
        assert_eq!(frame.n_rows(), 1);
        assert_eq!(frame.numeric("a").unwrap(), vec![1.0]);
    }

    #[test]
    fn test_to_matrix_orders_columns() {
        let frame = Frame::new(vec![
            Column {
                name: "a".into(),
                data: ColumnData::Numeric(vec![Some(1.0), Some(2.0)]),
            },
            Column {
                name: "b".into(),
                data: ColumnData::Numeric(vec![Some(10.0), Some(20.0)]),
            },
        ]);
        let m = frame.to_matrix(&["b", "a"]).unwrap();
        assert_eq!(m[[0, 0]], 10.0);
        assert_eq!(m[[1, 1]], 2.0);
        assert!(frame.to_matrix(&["c"]).is_err());
    }
}
