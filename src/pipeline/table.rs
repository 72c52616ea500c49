//! Table transform: pipe-table text → rows → {preview, CSV, markdown}.
//!
//! ## Parsing rules
//!
//! 1. Split the text into lines.
//! 2. Keep lines containing at least one `|`.
//! 3. Drop lines containing `---` (the header/body rule). This is a
//!    substring check, so a data cell containing `---` drops its whole row.
//! 4. Split on `|`, drop the first and last fields (the outer pipes of
//!    `| a | b |`), trim each remaining field.
//! 5. Row 0 is the header, used for preview styling only.
//!
//! Column counts are not checked: ragged model output yields ragged rows.
//! The preview and CSV paths each parse the text themselves; the transform
//! is pure so re-parsing costs nothing but time.

use crate::error::Scan2TableError;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};

/// UTF-8 byte-order mark prepended to CSV output.
pub const BOM: char = '\u{FEFF}';

/// Ordered trimmed cells of one table line.
pub type TableRow = Vec<String>;

/// Rows parsed from pipe-table text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    rows: Vec<TableRow>,
}

impl Table {
    /// Parse loosely-formed pipe-table text.
    pub fn parse(markdown: &str) -> Self {
        let rows = markdown
            .lines()
            .filter(|line| line.contains('|'))
            .filter(|line| !is_separator_line(line))
            .map(split_cells)
            .collect();
        Self { rows }
    }

    /// All rows, header first.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    /// Row 0, if any.
    pub fn header(&self) -> Option<&TableRow> {
        self.rows.first()
    }

    /// Rows after the header.
    pub fn body(&self) -> &[TableRow] {
        self.rows.get(1..).unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Render as BOM-prefixed CSV.
    ///
    /// Every cell is quoted and internal quotes are doubled. Rows are joined
    /// with `\n` and there is no trailing newline.
    pub fn to_csv(&self) -> Result<String, Scan2TableError> {
        let lines = self
            .rows
            .iter()
            .map(Vec::as_slice)
            .map(csv_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| Scan2TableError::Internal(format!("CSV encoding failed: {e}")))?;

        let mut out = String::with_capacity(lines.iter().map(|l| l.len() + 1).sum::<usize>() + 3);
        out.push(BOM);
        out.push_str(&lines.join("\n"));
        Ok(out)
    }

    /// Render an HTML `<table>` preview with the header row highlighted.
    pub fn to_html(&self) -> String {
        let mut html = String::from("<table>\n<tbody>\n");
        for (i, row) in self.rows.iter().enumerate() {
            let class = if i == 0 { "header" } else { "row" };
            html.push_str(&format!("<tr class=\"{class}\">"));
            for cell in row {
                if i == 0 {
                    html.push_str(&format!("<th>{}</th>", escape_html(cell)));
                } else {
                    html.push_str(&format!("<td>{}</td>", escape_html(cell)));
                }
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>\n");
        html
    }

    /// Render a plain-text preview, one line per row.
    pub fn to_text_preview(&self) -> String {
        self.rows
            .iter()
            .map(|row| row.join(" │ "))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// True for header/body rule lines. Substring match on `---`.
pub fn is_separator_line(line: &str) -> bool {
    line.contains("---")
}

/// Split a pipe line into trimmed cells, dropping the outer fields.
pub fn split_cells(line: &str) -> TableRow {
    let fields: Vec<&str> = line.split('|').collect();
    if fields.len() <= 2 {
        return Vec::new();
    }
    fields[1..fields.len() - 1]
        .iter()
        .map(|f| f.trim().to_string())
        .collect()
}

/// Parse `markdown` and render it as BOM-prefixed CSV.
pub fn markdown_to_csv(markdown: &str) -> Result<String, Scan2TableError> {
    Table::parse(markdown).to_csv()
}

/// Parse `markdown` and render the HTML preview.
pub fn markdown_to_html(markdown: &str) -> String {
    Table::parse(markdown).to_html()
}

fn csv_record(row: &[String]) -> Result<String, csv::Error> {
    if row.is_empty() {
        return Ok(String::new());
    }

    let mut buf: Vec<u8> = Vec::new();
    {
        let mut wtr = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut buf);
        wtr.write_record(row)?;
        wtr.flush()?;
    }

    let mut line = String::from_utf8_lossy(&buf).into_owned();
    if line.ends_with('\n') {
        line.pop();
    }
    Ok(line)
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
