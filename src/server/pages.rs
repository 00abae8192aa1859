//! Shared HTML rendering for the console.
//!
//! The console is a single page with a form; results render as plain
//! sections on the same layout. Everything operator- or sheet-provided is
//! escaped before it reaches markup.

use axum::response::Html;

use crate::sheet::SheetSnapshot;
use crate::types::{MAX_USERNAMES, PostCount};

/// Escapes text for safe embedding in HTML.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Wraps `body` in the page scaffold.
pub fn layout(body: &str) -> Html<String> {
    Html(format!(
        "<!doctype html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <title>Gridwatch</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; margin: 2rem auto; max-width: 60rem; }}\n\
         textarea {{ width: 100%; height: 7rem; }}\n\
         table {{ border-collapse: collapse; }}\n\
         th, td {{ border: 1px solid #ccc; padding: 0.3rem 0.6rem; text-align: left; }}\n\
         .error {{ color: #a00; }}\n\
         .warning {{ color: #850; }}\n\
         .success {{ color: #070; }}\n\
         </style>\n</head>\n<body>\n<h1>Gridwatch</h1>\n{body}\n</body>\n</html>\n"
    ))
}

/// Renders the submission form, optionally with a validation message.
pub fn console(error: Option<&str>) -> Html<String> {
    let banner = match error {
        Some(message) => format!("<p class=\"error\">{}</p>\n", escape(message)),
        None => String::new(),
    };
    let body = format!(
        "{banner}<form method=\"post\" action=\"/run\">\n\
         <p><label for=\"usernames\">Usernames (one per line, up to {MAX_USERNAMES})</label></p>\n\
         <p><textarea id=\"usernames\" name=\"usernames\" \
         placeholder=\"natgeo&#10;@cristiano\"></textarea></p>\n\
         <p><label for=\"posts\">Posts per username</label>\n\
         <input id=\"posts\" name=\"posts\" type=\"number\" \
         min=\"{min}\" max=\"{max}\" value=\"{max}\"></p>\n\
         <p><button type=\"submit\">Run scrape</button></p>\n\
         </form>\n\
         <p><a href=\"/export.csv\">Download current rows as CSV</a></p>",
        min = PostCount::MIN,
        max = PostCount::MAX,
    );
    layout(&body)
}

/// Renders a snapshot as an HTML table, or a placeholder when empty.
pub fn table(snapshot: &SheetSnapshot) -> String {
    if snapshot.is_empty() {
        return "<p>No rows yet.</p>".to_string();
    }

    let mut out = String::from("<table>\n<tr>");
    for header in snapshot.headers() {
        out.push_str("<th>");
        out.push_str(&escape(header));
        out.push_str("</th>");
    }
    out.push_str("</tr>\n");
    for row in snapshot.rows() {
        out.push_str("<tr>");
        for cell in row {
            out.push_str("<td>");
            out.push_str(&escape(cell));
            out.push_str("</td>");
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_neutralizes_markup() {
        assert_eq!(
            escape(r#"<img src=x onerror="pwn('now')">"#),
            "&lt;img src=x onerror=&quot;pwn(&#39;now&#39;)&quot;&gt;"
        );
        assert_eq!(escape("a & b"), "a &amp; b");
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn console_embeds_validation_message() {
        let Html(page) = console(Some("enter at least one username"));
        assert!(page.contains("enter at least one username"));
        assert!(page.contains("name=\"usernames\""));
    }

    #[test]
    fn table_escapes_sheet_content() {
        let snapshot = SheetSnapshot::new(
            vec!["caption".to_string()],
            vec![vec!["<script>x</script>".to_string()]],
        );
        let html = table(&snapshot);
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(!html.contains("<script>x"));
    }

    #[test]
    fn empty_snapshot_renders_placeholder() {
        assert_eq!(table(&SheetSnapshot::empty()), "<p>No rows yet.</p>");
    }
}
