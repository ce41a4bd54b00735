//! Text renderings of a [`Table`]: delimited, markdown and HTML.

use perftab_types::{Cell, OutputFormat, Table};

pub const DSV_DELIMITER: u8 = b' ';

/// Render a table in the requested format.
pub fn render(table: &Table, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Dsv => render_dsv(table),
        OutputFormat::Markdown => Ok(render_markdown(table)),
        OutputFormat::Html => Ok(render_html(table)),
    }
}

/// Space-delimited values with a leading unnamed index column.
///
/// Highlighting is ignored so the output stays machine-readable.
pub fn render_dsv(table: &Table) -> anyhow::Result<String> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(DSV_DELIMITER)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    let mut header = vec![String::new()];
    header.extend(table.columns.iter().cloned());
    wtr.write_record(&header)?;

    for (i, row) in table.rows.iter().enumerate() {
        let mut record = vec![i.to_string()];
        record.extend(row.iter().map(Cell::to_string));
        wtr.write_record(&record)?;
    }

    let bytes = wtr.into_inner().map_err(|e| anyhow::anyhow!("{}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Pipe table with a leading index column. Numeric columns are right
/// aligned; every non-empty cell of a highlighted row is wrapped in `**`.
pub fn render_markdown(table: &Table) -> String {
    let mut columns: Vec<Column> = Vec::with_capacity(table.columns.len() + 1);

    columns.push(Column {
        header: String::new(),
        right: true,
        cells: (0..table.rows.len()).map(|i| i.to_string()).collect(),
    });

    for (c, name) in table.columns.iter().enumerate() {
        columns.push(Column {
            header: escape_markdown(name),
            right: table.is_numeric_column(c),
            cells: table
                .rows
                .iter()
                .map(|row| row.get(c).map(|cell| escape_markdown(&cell.to_string())))
                .map(Option::unwrap_or_default)
                .collect(),
        });
    }

    for (r, _) in table.rows.iter().enumerate() {
        if table.is_highlighted(r) {
            for col in &mut columns {
                if !col.cells[r].is_empty() {
                    col.cells[r] = format!("**{}**", col.cells[r]);
                }
            }
        }
    }

    let widths: Vec<usize> = columns.iter().map(Column::width).collect();

    let mut out = String::new();
    push_line(
        &mut out,
        columns
            .iter()
            .zip(&widths)
            .map(|(col, &w)| pad(&col.header, w, col.right)),
    );
    out.push('|');
    for (col, &w) in columns.iter().zip(&widths) {
        let dashes = "-".repeat(w + 1);
        if col.right {
            out.push_str(&format!("{dashes}:|"));
        } else {
            out.push_str(&format!(":{dashes}|"));
        }
    }
    out.push('\n');
    for r in 0..table.rows.len() {
        push_line(
            &mut out,
            columns
                .iter()
                .zip(&widths)
                .map(|(col, &w)| pad(&col.cells[r], w, col.right)),
        );
    }
    out
}

struct Column {
    header: String,
    right: bool,
    cells: Vec<String>,
}

impl Column {
    fn width(&self) -> usize {
        self.cells
            .iter()
            .map(|c| c.chars().count())
            .chain(std::iter::once(self.header.chars().count()))
            .max()
            .unwrap_or(0)
            .max(3)
    }
}

fn pad(s: &str, width: usize, right: bool) -> String {
    if right {
        format!("{s:>width$}")
    } else {
        format!("{s:<width$}")
    }
}

/// A literal `|` would start a new column.
fn escape_markdown(s: &str) -> String {
    s.replace('|', "\\|")
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>) {
    out.push('|');
    for cell in cells {
        out.push(' ');
        out.push_str(&cell);
        out.push_str(" |");
    }
    out.push('\n');
}

/// HTML table without the index column. Highlighted rows carry
/// `class="significant"`.
pub fn render_html(table: &Table) -> String {
    let mut out = String::new();
    out.push_str("<table border=\"1\" class=\"dataframe\">\n");
    out.push_str("  <thead>\n");
    out.push_str("    <tr style=\"text-align: right;\">\n");
    for name in &table.columns {
        out.push_str(&format!("      <th>{}</th>\n", escape_html(name)));
    }
    out.push_str("    </tr>\n");
    out.push_str("  </thead>\n");
    out.push_str("  <tbody>\n");
    for (r, row) in table.rows.iter().enumerate() {
        if table.is_highlighted(r) {
            out.push_str(
                "    <tr class=\"significant\" style=\"background-color: #ffff99;\">\n",
            );
        } else {
            out.push_str("    <tr>\n");
        }
        for cell in row {
            out.push_str(&format!(
                "      <td>{}</td>\n",
                escape_html(&cell.to_string())
            ));
        }
        out.push_str("    </tr>\n");
    }
    out.push_str("  </tbody>\n");
    out.push_str("</table>\n");
    out
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
