//! Experimental metadata: one row per trial, string-typed columns.
//!
//! Built from the behavioral `.csv` when present, or from the eye-tracking
//! `var` messages when not. Values stay as strings; numeric access parses on
//! demand.
use anyhow::{bail, Context, Result};

use crate::eyelink::EyeTrial;

/// A small column table, one row per trial.
#[derive(Debug, Clone, Default)]
pub struct Metadata {
    pub columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Metadata {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value by row index and column name.
    pub fn get(&self, row: usize, column: &str) -> Option<&str> {
        let col = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row)?.get(col).map(String::as_str)
    }

    /// All values of one column.
    pub fn column(&self, name: &str) -> Option<Vec<&str>> {
        let col = self.columns.iter().position(|c| c == name)?;
        Some(self.rows.iter().map(|r| r[col].as_str()).collect())
    }

    /// One column parsed as `f64`; empty cells become NaN.
    pub fn f64_column(&self, name: &str) -> Result<Vec<f64>> {
        let values = self
            .column(name)
            .with_context(|| format!("no column {name:?}"))?;
        values
            .iter()
            .map(|v| {
                if v.is_empty() {
                    Ok(f64::NAN)
                } else {
                    v.parse()
                        .with_context(|| format!("column {name:?}: non-numeric value {v:?}"))
                }
            })
            .collect()
    }

    /// Parse CSV text. Handles double-quoted fields (embedded commas,
    /// doubled quotes); multi-line fields are not supported.
    pub fn from_csv(text: &str) -> Result<Self> {
        let mut lines = text.lines().filter(|l| !l.trim().is_empty());
        let header = lines.next().context("empty csv file")?;
        let columns = split_csv_line(header);
        let mut rows = Vec::new();
        for (i, line) in lines.enumerate() {
            let row = split_csv_line(line);
            if row.len() != columns.len() {
                bail!(
                    "csv row {} has {} fields, header has {}",
                    i + 2,
                    row.len(),
                    columns.len()
                );
            }
            rows.push(row);
        }
        Ok(Metadata { columns, rows })
    }

    /// Build metadata from the per-trial `var` tables of the eye-tracking
    /// data. The column set is the union of variable names across trials;
    /// trials missing a variable get an empty cell.
    pub fn from_eye_vars(trials: &[EyeTrial]) -> Self {
        let mut columns: Vec<String> = Vec::new();
        for trial in trials {
            for (name, _) in &trial.vars {
                if !columns.contains(name) {
                    columns.push(name.clone());
                }
            }
        }
        let rows = trials
            .iter()
            .map(|trial| {
                columns
                    .iter()
                    .map(|col| {
                        trial
                            .vars
                            .iter()
                            .find(|(name, _)| name == col)
                            .map(|(_, v)| v.clone())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();
        Metadata { columns, rows }
    }
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut field));
            }
            _ => field.push(c),
        }
    }
    fields.push(field);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_roundtrip() {
        let md = Metadata::from_csv("trial,condition,rt\n1,easy,532\n2,\"hard, very\",601\n")
            .unwrap();
        assert_eq!(md.n_rows(), 2);
        assert_eq!(md.columns, vec!["trial", "condition", "rt"]);
        assert_eq!(md.get(1, "condition"), Some("hard, very"));
        let rts = md.f64_column("rt").unwrap();
        approx::assert_abs_diff_eq!(rts[0], 532.0, epsilon = 1e-12);
    }

    #[test]
    fn ragged_csv_is_error() {
        assert!(Metadata::from_csv("a,b\n1\n").is_err());
    }

    #[test]
    fn quoted_quotes() {
        let md = Metadata::from_csv("a\n\"say \"\"hi\"\"\"\n").unwrap();
        assert_eq!(md.get(0, "a"), Some("say \"hi\""));
    }

    #[test]
    fn from_eye_vars_unions_columns() {
        let mut t1 = EyeTrial::default();
        t1.vars = vec![("rt".into(), "532".into()), ("correct".into(), "1".into())];
        let mut t2 = EyeTrial::default();
        t2.vars = vec![("rt".into(), "601".into())];
        let md = Metadata::from_eye_vars(&[t1, t2]);
        assert_eq!(md.columns, vec!["rt", "correct"]);
        assert_eq!(md.get(1, "correct"), Some(""));
        assert_eq!(md.get(1, "rt"), Some("601"));
    }
}
