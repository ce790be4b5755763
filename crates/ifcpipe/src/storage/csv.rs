//! Minimal RFC 4180 writer for the flat exports.

/// Quotes a field when it contains a delimiter, quote or line break.
pub fn escape_field(field: &str) -> std::borrow::Cow<'_, str> {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\"")).into()
    } else {
        field.into()
    }
}

/// Renders a header line followed by one line per row, `\n` terminated.
pub fn render<H, R, C>(header: &[H], rows: R) -> String
where
    H: AsRef<str>,
    R: IntoIterator<Item = C>,
    C: IntoIterator,
    C::Item: AsRef<str>,
{
    let mut out = String::new();
    push_line(&mut out, header.iter().map(|h| h.as_ref().to_string()));
    for row in rows {
        push_line(&mut out, row.into_iter().map(|c| c.as_ref().to_string()));
    }
    out
}

fn push_line(out: &mut String, cells: impl Iterator<Item = String>) {
    let line: Vec<String> = cells.map(|c| escape_field(&c).into_owned()).collect();
    out.push_str(&line.join(","));
    out.push('\n');
}
