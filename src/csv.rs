use std::mem::take;

/// Split CSV text into rows of fields. Handles quoted fields, doubled quotes and CRLF.
/// Blank lines are dropped.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                push_row(&mut rows, take(&mut row));
            }
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        push_row(&mut rows, row);
    }

    rows
}

fn push_row(rows: &mut Vec<Vec<String>>, row: Vec<String>) {
    let blank = row.len() == 1 && row[0].trim().is_empty();
    if !blank {
        rows.push(row);
    }
}

/// Header-aware view over parsed CSV text.
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// First row is the header. Returns None for text without any rows.
    pub fn parse(text: &str) -> Option<Self> {
        let mut rows = parse_rows(text);
        if rows.is_empty() {
            return None;
        }
        let headers = rows.remove(0).into_iter().map(|h| h.trim().to_string()).collect();
        Some(Self { headers, rows })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Values of one column; short rows yield an empty string.
    pub fn values<'a>(&'a self, idx: usize) -> impl Iterator<Item = &'a str> + 'a {
        self.rows.iter().map(move |r| r.get(idx).map(|s| s.as_str()).unwrap_or(""))
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Render one row, newline-terminated.
pub fn format_row<S: AsRef<str>>(row: &[S]) -> String {
    let mut line = row
        .iter()
        .map(|cell| {
            let cell = cell.as_ref();
            if needs_quotes(cell) {
                format!("\"{}\"", cell.replace('"', "\"\""))
            } else {
                cell.to_string()
            }
        })
        .collect::<Vec<String>>()
        .join(",");
    line.push('\n');
    line
}
