//! Aligned text tables for terminal display

use std::fmt::Display;

use crate::error::ScreenError;

const COLUMN_SEPARATOR: &str = " | ";

/// Render `rows` under `headers` as an aligned table.
///
/// Every column is padded to the widest value seen in that column, header
/// included. A row of dashes as long as the header line separates the header
/// from the data. Fails with `ShapeMismatch` if a row's length differs from
/// the header's.
pub fn render<H, V>(headers: &[H], rows: &[Vec<V>]) -> Result<String, ScreenError>
where
    H: Display,
    V: Display,
{
    let headers: Vec<String> = headers.iter().map(ToString::to_string).collect();
    let mut cells: Vec<Vec<String>> = Vec::with_capacity(rows.len());

    for (index, row) in rows.iter().enumerate() {
        if row.len() != headers.len() {
            return Err(ScreenError::ShapeMismatch {
                row: index,
                expected: headers.len(),
                found: row.len(),
            });
        }
        cells.push(row.iter().map(ToString::to_string).collect());
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let header_line = format_line(&headers, &widths);
    let mut out = String::new();
    out.push_str(&header_line);
    out.push('\n');
    out.push_str(&"-".repeat(header_line.chars().count()));
    out.push('\n');
    for row in &cells {
        out.push_str(&format_line(row, &widths));
        out.push('\n');
    }

    Ok(out)
}

fn format_line(cells: &[String], widths: &[usize]) -> String {
    cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join(COLUMN_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Value;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_render_pads_columns() {
        let headers = ["Gender", "Age", "BMI Category"];
        let rows = vec![
            vec![Value::from("Male"), Value::Integer(27), Value::from("Overweight")],
            vec![Value::from("Female"), Value::Integer(105), Value::from("Normal")],
        ];

        let table = render(&headers, &rows).unwrap();
        let expected = concat!(
            "Gender | Age | BMI Category\n",
            "---------------------------\n",
            "Male   | 27  | Overweight  \n",
            "Female | 105 | Normal      \n",
        );
        assert_eq!(table, expected);
    }

    #[test]
    fn test_value_wider_than_header() {
        let rows = vec![vec!["Software Engineer"]];
        let table = render(&["Job"], &rows).unwrap();
        assert_eq!(table, "Job              \n-----------------\nSoftware Engineer\n");
    }

    #[test]
    fn test_no_rows_renders_header() {
        let rows: Vec<Vec<String>> = Vec::new();
        let table = render(&["a", "bb"], &rows).unwrap();
        assert_eq!(table, "a | bb\n------\n");
    }

    #[test]
    fn test_shape_mismatch() {
        let rows = vec![vec!["1", "2"], vec!["3"]];
        let err = render(&["a", "b"], &rows).unwrap_err();
        assert!(matches!(
            err,
            ScreenError::ShapeMismatch {
                row: 1,
                expected: 2,
                found: 1
            }
        ));
    }

    #[test]
    fn test_render_is_deterministic() {
        let rows = vec![
            vec![Value::Float(6.1), Value::Missing],
            vec![Value::Float(7.25), Value::from("Insomnia")],
        ];
        let headers = ["Sleep Duration", "Sleep Disorder"];
        assert_eq!(render(&headers, &rows).unwrap(), render(&headers, &rows).unwrap());
    }
}
