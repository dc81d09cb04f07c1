//! Slug and title derivation
//!
//! `title_from_slug` is the lossy inverse of `slug_from_filename`: it cannot
//! restore punctuation or acronyms, so a catalog hit always wins over it.

/// File extension of every book in the bucket
pub const DOCUMENT_EXTENSION: &str = ".pdf";

/// Title used when a file reference has no usable final path segment
pub const UNKNOWN_TITLE: &str = "Unknown Book";

/// `"untitled-notes"` -> `"Untitled Notes"`
pub fn title_from_slug(slug: &str) -> String {
    let spaced = slug.replace('-', " ");
    let mut title = String::with_capacity(spaced.len());
    let mut previous_is_word = false;

    for c in spaced.chars() {
        let is_word = c.is_ascii_alphanumeric() || c == '_';
        if is_word && !previous_is_word {
            title.extend(c.to_uppercase());
        } else {
            title.push(c);
        }
        previous_is_word = is_word;
    }

    title
}

/// Object name the bucket is expected to store a slug's book under
pub fn filename_from_slug(slug: &str) -> String {
    format!("{}{}", title_from_slug(slug), DOCUMENT_EXTENSION)
}

/// Strip a trailing `.pdf`, ignoring case
pub fn strip_document_extension(filename: &str) -> &str {
    let cut = filename.len().saturating_sub(DOCUMENT_EXTENSION.len());
    match (filename.get(..cut), filename.get(cut..)) {
        (Some(stem), Some(ext)) if ext.eq_ignore_ascii_case(DOCUMENT_EXTENSION) => stem,
        _ => filename,
    }
}

/// `"My Summer Trip!.pdf"` -> `"my-summer-trip"`
pub fn slug_from_filename(filename: &str) -> String {
    let lowered = strip_document_extension(filename).to_lowercase();

    let mut slug = String::with_capacity(lowered.len());
    let mut pending_separator = false;

    for c in lowered.chars() {
        if c.is_whitespace() || c == '-' {
            pending_separator = true;
        } else if c.is_ascii_lowercase() || c.is_ascii_digit() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.push(c);
        }
        // anything else is dropped without breaking the word
    }

    slug
}

/// Title shown for a book referenced by file name
pub fn title_from_filename(filename: &str) -> String {
    strip_document_extension(filename).to_string()
}
