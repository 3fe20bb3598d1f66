use std::num::ParseIntError;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::Selection;

static SELECTION_TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:-(\d+))?").expect("selection pattern is valid"));

static DISPOSITION_EXTENDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)filename\*\s*=\s*utf-8''([^;\s]+)").expect("disposition pattern is valid")
});

static DISPOSITION_QUOTED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\s*=\s*"((?:[^"\\]|\\.)*)""#).expect("disposition pattern is valid")
});

static DISPOSITION_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)filename\s*=\s*([^";\s]+)"#).expect("disposition pattern is valid")
});

/// Expands a selection such as `"1-3,7"` into `{1, 2, 3, 7}`.
///
/// Every digit run and every `a-b` run is a token; anything else is ignored.
/// A range with `a > b` contributes nothing.
pub fn parse_selection(input: &str) -> Result<Selection, ParseIntError> {
    let mut ranges = Vec::new();
    for caps in SELECTION_TOKEN.captures_iter(input) {
        let start: usize = caps[1].parse()?;
        let end = match caps.get(2) {
            Some(end) => end.as_str().parse()?,
            None => start,
        };
        ranges.push(start..=end);
    }
    Ok(Selection::from_ranges(ranges))
}

/// Extracts the filename from a `Content-Disposition` header value.
///
/// `filename*=utf-8''...` wins over `filename="..."` and bare `filename=...`.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    if let Some(caps) = DISPOSITION_EXTENDED.captures(header) {
        // Escapes that do not decode to UTF-8 fall through to the plain forms.
        if let Ok(decoded) = urlencoding::decode(&caps[1]) {
            if !decoded.is_empty() {
                return Some(decoded.into_owned());
            }
        }
    }

    if let Some(caps) = DISPOSITION_QUOTED.captures(header) {
        let unescaped = unescape_quoted(&caps[1]);
        if !unescaped.is_empty() {
            return Some(unescaped);
        }
    }

    DISPOSITION_TOKEN
        .captures(header)
        .map(|caps| caps[1].to_string())
        .filter(|name| !name.is_empty())
}

fn unescape_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Text after the last `.`, if non-empty.
pub fn file_extension(filename: &str) -> Option<&str> {
    filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty())
}

/// Sanitize filename to remove invalid characters
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*' => '_',
            c if c.is_control() => '_',
            _ => c,
        })
        .collect::<String>()
        .trim_matches(|c| c == '.' || c == ' ')
        .to_string()
}
