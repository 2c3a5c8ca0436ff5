//! Output filename handling.

/// Stem used whenever no usable filename can be derived.
pub const DEFAULT_FILENAME_STEM: &str = "cover_letter";

/// Longest stem kept, in characters.
pub const MAX_STEM_CHARS: usize = 40;

/// Turns raw model output into a filesystem-safe snake_case stem.
///
/// Lowercases, replaces anything that is not alphanumeric or `_` with `_`,
/// collapses runs of `_`, drops leading/trailing `_` and truncates to
/// `MAX_STEM_CHARS`. Falls back to `DEFAULT_FILENAME_STEM` when nothing is
/// left.
pub fn sanitize_filename(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    let replaced: String = lowered
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    let collapsed = replaced
        .split('_')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_");
    let truncated: String = collapsed.chars().take(MAX_STEM_CHARS).collect();

    if truncated.is_empty() {
        DEFAULT_FILENAME_STEM.to_string()
    } else {
        truncated
    }
}

/// Adds `.pdf` unless the name already ends with it (any case).
pub fn with_pdf_extension(name: &str) -> String {
    if name.to_ascii_lowercase().ends_with(".pdf") {
        name.to_string()
    } else {
        format!("{name}.pdf")
    }
}
