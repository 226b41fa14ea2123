#![forbid(unsafe_code)]

use std::io;

#[derive(Debug, Default)]
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cols: impl IntoIterator<Item = impl Into<String>>) {
        self.rows.push(cols.into_iter().map(Into::into).collect());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) -> io::Result<()> {
        self.write_to(io::stdout().lock())
    }

    pub fn print_csv(&self) -> io::Result<()> {
        self.write_csv_to(io::stdout().lock())
    }

    pub fn write_csv_to(&self, out: impl io::Write) -> io::Result<()> {
        let mut wtr = csv::Writer::from_writer(out);
        wtr.write_record(&self.headers)?;
        for row in &self.rows {
            wtr.write_record(row)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_to(&self, mut out: impl io::Write) -> io::Result<()> {
        let widths = self.column_widths();
        writeln!(&mut out, "{}", format_row(&self.headers, &widths))?;
        for row in &self.rows {
            writeln!(&mut out, "{}", format_row(row, &widths))?;
        }
        Ok(())
    }

    fn column_widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| visible_width(h)).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if i >= widths.len() {
                    widths.push(0);
                }
                widths[i] = widths[i].max(visible_width(cell));
            }
        }
        widths
    }
}

fn visible_width(s: &str) -> usize {
    // Best-effort: assume each char is width 1. Ratatui UI handles widths separately.
    s.chars().count()
}

fn format_row(row: &[String], widths: &[usize]) -> String {
    let mut out = String::new();
    let last = row.len().saturating_sub(1);
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            out.push_str("  ");
        }
        out.push_str(cell);
        // No trailing padding on the last column.
        if i == last {
            break;
        }
        let w = widths.get(i).copied().unwrap_or_else(|| visible_width(cell));
        let pad = w.saturating_sub(visible_width(cell));
        out.extend(std::iter::repeat_n(' ', pad));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn columns_are_aligned() {
        let mut t = Table::new(["ID", "TEXT"]);
        t.row(["1", "Buy milk"]);
        t.row(["12345", "Pay"]);

        let mut buf = Vec::new();
        t.write_to(&mut buf).unwrap();
        let out = String::from_utf8(buf).unwrap();
        assert_eq!(out, "ID     TEXT\n1      Buy milk\n12345  Pay\n");
    }

    #[test]
    fn csv_quotes_commas() {
        let mut t = Table::new(["id", "text"]);
        t.row(["1", "milk, eggs"]);

        let mut buf = Vec::new();
        t.write_csv_to(&mut buf).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "id,text\n1,\"milk, eggs\"\n"
        );
    }
}
