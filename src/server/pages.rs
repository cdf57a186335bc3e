//! HTML pages for the web form.

use crate::data::ChartKind;

/// Column form state for a stored upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChoice {
    pub reference: String,
    pub columns: Vec<String>,
    pub rows: Option<usize>,
}

#[derive(Debug, Default)]
pub struct IndexPage<'a> {
    pub error: Option<&'a str>,
    pub choice: Option<&'a ColumnChoice>,
}

const STYLE: &str = "body{font-family:sans-serif;max-width:720px;margin:40px auto;padding:0 16px}\
.error{color:#b00020;background:#fdecea;padding:8px 12px;border-radius:4px}\
form{margin:24px 0}label{display:block;margin:8px 0}";

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{}</title><style>{STYLE}</style></head>\n<body>\n{body}</body></html>\n",
        escape(title)
    )
}

pub fn index(page: &IndexPage<'_>) -> String {
    let mut body = String::from("<h1>Graph Visualizer</h1>\n");

    if let Some(error) = page.error {
        body.push_str(&format!("<p class=\"error\">{}</p>\n", escape(error)));
    }

    body.push_str(
        "<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <input type=\"hidden\" name=\"action\" value=\"upload\">\n\
         <label>CSV file <input type=\"file\" name=\"file\" accept=\".csv\"></label>\n\
         <button type=\"submit\">Upload</button>\n\
         </form>\n",
    );

    if let Some(choice) = page.choice {
        body.push_str(&plot_form(choice));
    }

    layout("Graph Visualizer", &body)
}

fn plot_form(choice: &ColumnChoice) -> String {
    let options: String = choice
        .columns
        .iter()
        .map(|col| format!("<option value=\"{0}\">{0}</option>", escape(col)))
        .collect();
    let kinds: String = ChartKind::ALL
        .iter()
        .map(|kind| {
            format!(
                "<label><input type=\"radio\" name=\"chart_type\" value=\"{}\"{}> {}</label>",
                kind.as_str(),
                if *kind == ChartKind::default() { " checked" } else { "" },
                kind.label()
            )
        })
        .collect();
    let rows = choice
        .rows
        .map(|rows| format!("<p>Rows: {rows}</p>\n"))
        .unwrap_or_default();

    format!(
        "{rows}<form method=\"post\" action=\"/\" enctype=\"multipart/form-data\">\n\
         <input type=\"hidden\" name=\"action\" value=\"plot\">\n\
         <input type=\"hidden\" name=\"saved_file\" value=\"{}\">\n\
         <label>X-axis <select name=\"x_column\">{options}</select></label>\n\
         <label>Y-axis <select name=\"y_column\">{options}</select></label>\n\
         {kinds}\n\
         <button type=\"submit\">Plot</button>\n\
         </form>\n",
        escape(&choice.reference)
    )
}

pub fn plot(image_name: &str, title: &str) -> String {
    let body = format!(
        "<h1>{0}</h1>\n<img src=\"/static/{1}\" alt=\"{0}\">\n<p><a href=\"/\">Plot another file</a></p>\n",
        escape(title),
        escape(image_name)
    );
    layout(title, &body)
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}
