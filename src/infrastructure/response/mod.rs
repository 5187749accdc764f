use once_cell::sync::Lazy;
use regex::Regex;

static PATH_PREFIX_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^.*[/\\]").unwrap());

static CONTROL_CHAR_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\x00-\x1F\x7F]").unwrap());

static QUOTE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r#"["]"#).unwrap());

/// Reduce a client-supplied filename to a safe display name.
///
/// Drops control characters and keeps only the last path component. Returns
/// `None` if nothing printable remains.
pub fn clean_upload_filename(raw: &str) -> Option<String> {
    let mut cleaned = CONTROL_CHAR_PATTERN.replace_all(raw, "").to_string();
    cleaned = PATH_PREFIX_PATTERN.replace(&cleaned, "").to_string();
    cleaned = cleaned.trim().to_string();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        None
    } else {
        Some(cleaned)
    }
}

/// `Content-Disposition` value for a downloadable report.
pub fn attachment_disposition(filename: &str) -> String {
    let safe = QUOTE_PATTERN.replace_all(filename, "'");
    format!("attachment; filename=\"{}\"", safe)
}
