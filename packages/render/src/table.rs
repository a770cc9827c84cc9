//! The filtered collision rows as a table.

use console::{Alignment, measure_text_width, pad_str};
use ksi_map_road_models::CollisionRecord;
use serde::Serialize;

/// Filtered collisions laid out under the uploaded header row, including
/// the derived `Road_Number` column.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollisionTableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl CollisionTableView {
    /// Builds the table from the collision header row and the filtered
    /// records. Short rows are padded with empty cells.
    #[must_use]
    pub fn new(columns: &[String], records: &[CollisionRecord]) -> Self {
        let rows = records
            .iter()
            .map(|record| {
                let mut cells = record.cells.clone();
                cells.resize(columns.len(), String::new());
                cells
            })
            .collect();

        Self {
            columns: columns.to_vec(),
            rows,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// An HTML `<table>` with every cell escaped.
    #[must_use]
    pub fn to_html_table(&self) -> String {
        let mut html = String::from("<table class=\"collisions\">\n<thead><tr>");
        for column in &self.columns {
            html.push_str("<th>");
            html.push_str(&escape_html(column));
            html.push_str("</th>");
        }
        html.push_str("</tr></thead>\n<tbody>\n");
        for row in &self.rows {
            html.push_str("<tr>");
            for cell in row {
                html.push_str("<td>");
                html.push_str(&escape_html(cell));
                html.push_str("</td>");
            }
            html.push_str("</tr>\n");
        }
        html.push_str("</tbody>\n</table>");
        html
    }

    /// A fixed-width text table for terminals.
    #[must_use]
    pub fn to_text(&self) -> String {
        let widths: Vec<usize> = self
            .columns
            .iter()
            .enumerate()
            .map(|(i, column)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| measure_text_width(cell))
                    .chain(std::iter::once(measure_text_width(column)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, &width)| pad_str(cell, width, Alignment::Left, None).into_owned())
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_owned()
        };

        let mut out = line(&self.columns);
        out.push('\n');
        out.push_str(
            &widths
                .iter()
                .map(|&w| "-".repeat(w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        for row in &self.rows {
            out.push('\n');
            out.push_str(&line(row));
        }
        out
    }
}

/// Escapes text for use in HTML element content and attribute values.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
