//! Title → filename mapping shared by catalog building and poster lookup.

pub const POSTER_EXTENSION: &str = "png";
pub const POSTER_DIR: &str = "images/1bit";

/// Lowercase, hyphen-separated token for a title.
///
/// Keeps letters, digits, whitespace and `-`; runs of whitespace and `-`
/// become a single `-`. Applying it to its own output is a no-op.
pub fn slugify(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut pending_sep = false;
    for ch in title.chars().flat_map(char::to_lowercase) {
        if ch.is_whitespace() || ch == '-' {
            pending_sep = true;
        } else if ch.is_alphanumeric() {
            if pending_sep && !out.is_empty() {
                out.push('-');
            }
            pending_sep = false;
            out.push(ch);
        }
    }
    out
}

pub fn poster_filename(title: &str) -> String {
    format!("{}.{POSTER_EXTENSION}", slugify(title))
}

/// Relative path stored in a catalog record's `image` field.
pub fn catalog_image_path(title: &str) -> String {
    format!("{POSTER_DIR}/{}", poster_filename(title))
}
