//! HTML serialization of rendered reports, with embedded CSS.

use time::{format_description::BorrowedFormatItem, macros::format_description, Duration};

use super::{Document, Layout, Matrix, Summary, Table, Template};
use crate::{domain::Sales, timespan};

const TIME_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[hour]:[minute]");
const DATE_TIME_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]");

/// Escape HTML special characters.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn styles(template: Template) -> &'static str {
    match template {
        Template::Default => {
            r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 20px;
            color: #333;
        }
        table {
            border-collapse: collapse;
            margin-bottom: 20px;
        }
        th, td {
            border-bottom: 1px solid #ddd;
            padding: 6px 10px;
            text-align: left;
        }
        th {
            background-color: #4a90d9;
            color: white;
        }
        td.num, th.num {
            text-align: right;
            font-variant-numeric: tabular-nums;
        }
        tr.depth-0 td {
            font-weight: bold;
        }
        tr.total td {
            border-top: 2px solid #333;
            font-weight: bold;
        }
        .description {
            color: #666;
        }
        "#
        }
        Template::Timelog => {
            r#"
        body {
            font-family: monospace;
            margin: 20px;
        }
        table {
            border-collapse: collapse;
            width: 100%;
        }
        th, td {
            padding: 2px 8px;
            text-align: left;
        }
        td.num, th.num {
            text-align: right;
        }
        tr.frame td {
            color: #555;
        }
        tr.total td {
            border-top: 1px solid black;
        }
        "#
        }
    }
}

fn sales_text(sales: &Sales) -> String {
    sales
        .amounts()
        .map(|money| money.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

fn average_text(average: Option<Duration>) -> String {
    average
        .map(timespan::format_hm)
        .unwrap_or_else(|| "no data".to_string())
}

fn format_instant(instant: time::OffsetDateTime, format: &[BorrowedFormatItem<'_>]) -> String {
    instant.format(format).unwrap_or_default()
}

impl Document {
    /// Serializes the document into a standalone HTML page.
    pub fn to_html(&self) -> String {
        let title = self.title.as_deref().unwrap_or("Time report");

        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n");
        html.push_str("<html lang=\"en\">\n");
        html.push_str("<head>\n");
        html.push_str("    <meta charset=\"UTF-8\">\n");
        html.push_str(&format!("    <title>{}</title>\n", escape_html(title)));
        html.push_str("    <style>");
        html.push_str(styles(self.template));
        html.push_str("</style>\n");
        html.push_str("</head>\n");
        html.push_str(&format!("<body class=\"template-{}\">\n", self.template));
        html.push_str(&format!("    <h1>{}</h1>\n", escape_html(title)));

        if let Some(description) = &self.description {
            html.push_str(&format!(
                "    <p class=\"description\">{}</p>\n",
                escape_html(description)
            ));
        }

        if let Some(summary) = &self.summary {
            html.push_str(&self.summary_html(summary));
        }

        match &self.layout {
            Layout::Table(table) => html.push_str(&self.table_html(table)),
            Layout::Matrix(matrix) => html.push_str(&self.matrix_html(matrix)),
        }

        html.push_str("</body>\n");
        html.push_str("</html>\n");
        html
    }

    fn summary_html(&self, summary: &Summary) -> String {
        let mut rows = vec![
            ("Total", timespan::format_hm(summary.total)),
            ("Hours", timespan::format_decimal(summary.total)),
            ("Frames", summary.frame_count.to_string()),
        ];
        if self.display.show_sales {
            rows.push(("Sales", sales_text(&summary.sales)));
        }
        if self.display.show_tracked_average {
            rows.push(("Tracked average", average_text(summary.averages.tracked)));
        }
        if self.display.show_untracked_average {
            rows.push(("Untracked average", average_text(summary.averages.untracked)));
        }

        let mut html = String::new();
        html.push_str("    <h2>Summary</h2>\n");
        html.push_str("    <table class=\"summary\">\n");
        for (label, value) in rows {
            html.push_str(&format!(
                "        <tr><th>{}</th><td class=\"num\">{}</td></tr>\n",
                label,
                escape_html(&value)
            ));
        }
        html.push_str("    </table>\n");
        html
    }

    fn table_html(&self, table: &Table) -> String {
        let show_sales = self.display.show_sales;
        let show_frames = self.template == Template::Timelog;

        let mut html = String::new();
        html.push_str("    <table class=\"groups\">\n");
        html.push_str("        <tr><th>Group</th>");
        html.push_str("<th class=\"num\">Duration</th><th class=\"num\">Hours</th>");
        if show_sales {
            html.push_str("<th class=\"num\">Sales</th>");
        }
        html.push_str("</tr>\n");

        for row in &table.rows {
            html.push_str(&format!(
                "        <tr class=\"depth-{}\"><td style=\"padding-left: {}em\">{}</td>\
                    <td class=\"num\">{}</td><td class=\"num\">{}</td>",
                row.depth,
                row.depth * 2,
                escape_html(&row.label),
                timespan::format_hm(row.duration),
                timespan::format_decimal(row.duration),
            ));
            if show_sales {
                html.push_str(&format!(
                    "<td class=\"num\">{}</td>",
                    escape_html(&sales_text(&row.sales))
                ));
            }
            html.push_str("</tr>\n");

            if show_frames {
                for frame in &row.frames {
                    let mut text = format!(
                        "{} - {}",
                        format_instant(frame.start, DATE_TIME_FORMAT),
                        format_instant(frame.end, TIME_FORMAT)
                    );
                    if !frame.notes.is_empty() {
                        text.push_str(": ");
                        text.push_str(&frame.notes);
                    }
                    if !frame.tags.is_empty() {
                        text.push_str(&format!(" [{}]", frame.tags.join(", ")));
                    }
                    html.push_str(&format!(
                        "        <tr class=\"frame\"><td style=\"padding-left: {}em\">{}</td>\
                            <td class=\"num\">{}</td><td class=\"num\">{}</td>",
                        (row.depth + 1) * 2,
                        escape_html(&text),
                        timespan::format_hm(frame.duration),
                        timespan::format_decimal(frame.duration),
                    ));
                    if show_sales {
                        html.push_str("<td></td>");
                    }
                    html.push_str("</tr>\n");
                }
            }
        }

        html.push_str(&format!(
            "        <tr class=\"total\"><td>Total</td>\
                <td class=\"num\">{}</td><td class=\"num\">{}</td>",
            timespan::format_hm(self.total),
            timespan::format_decimal(self.total),
        ));
        if show_sales {
            html.push_str(&format!(
                "<td class=\"num\">{}</td>",
                escape_html(&sales_text(&self.sales))
            ));
        }
        html.push_str("</tr>\n");
        html.push_str("    </table>\n");
        html
    }

    fn matrix_html(&self, matrix: &Matrix) -> String {
        let mut html = String::new();
        html.push_str("    <table class=\"matrix\">\n");
        html.push_str(&format!(
            "        <tr><th>{} / {}</th>",
            matrix.row_dimension, matrix.column_dimension
        ));
        for column in &matrix.columns {
            html.push_str(&format!("<th class=\"num\">{}</th>", escape_html(column)));
        }
        html.push_str("<th class=\"num\">Total</th></tr>\n");

        for row in &matrix.rows {
            html.push_str(&format!("        <tr><td>{}</td>", escape_html(&row.label)));
            for cell in &row.cells {
                let text = cell.map(timespan::format_hm).unwrap_or_default();
                html.push_str(&format!("<td class=\"num\">{}</td>", text));
            }
            html.push_str(&format!(
                "<td class=\"num\">{}</td></tr>\n",
                timespan::format_hm(row.total)
            ));
        }

        html.push_str("        <tr class=\"total\"><td>Total</td>");
        for total in &matrix.column_totals {
            html.push_str(&format!("<td class=\"num\">{}</td>", timespan::format_hm(*total)));
        }
        html.push_str(&format!(
            "<td class=\"num\">{}</td></tr>\n",
            timespan::format_hm(matrix.total)
        ));
        html.push_str("    </table>\n");
        html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a&b"), "a&amp;b");
        assert_eq!(escape_html("\"x\" 'y'"), "&quot;x&quot; &#39;y&#39;");
    }

    #[test]
    fn missing_average_reads_no_data() {
        assert_eq!(average_text(None), "no data");
        assert_eq!(average_text(Some(Duration::minutes(90))), "1:30");
    }
}
