//! Filename rules shared by the converter and the index builder.
//!
//! Every directory entry is classified from two facts only: whether the
//! filesystem reports it as a directory, and its filename suffix. Suffixes are
//! matched ASCII case-insensitively, so `Notes.MD` is markup just like
//! `notes.md`.
//!
//! | Entry | Kind | Destination |
//! |-------|------|-------------|
//! | `guide/` | [`EntryKind::Subdirectory`] | `guide/` |
//! | `setup.md` | [`EntryKind::Markup`] | `setup.html` |
//! | `hosts.yaml` | [`EntryKind::SiblingData`] | depends on the data-file policy |
//! | `logo.png` | [`EntryKind::Asset`] | `logo.png` (byte copy) |

pub const MARKUP_SUFFIX: &str = ".md";
pub const DATA_SUFFIX: &str = ".yaml";
pub const HTML_SUFFIX: &str = ".html";

/// What a directory entry is, as far as conversion is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Markup,
    SiblingData,
    Subdirectory,
    Asset,
}

/// Classify an entry. Directories are recognized by type regardless of name.
pub fn classify(file_name: &str, is_dir: bool) -> EntryKind {
    if is_dir {
        EntryKind::Subdirectory
    } else if strip_suffix_ignore_case(file_name, MARKUP_SUFFIX).is_some() {
        EntryKind::Markup
    } else if strip_suffix_ignore_case(file_name, DATA_SUFFIX).is_some() {
        EntryKind::SiblingData
    } else {
        EntryKind::Asset
    }
}

/// Strip `suffix` from the end of `name`, comparing ASCII case-insensitively.
///
/// Returns `None` when the suffix is absent or would leave nothing behind
/// (`.md` alone is a hidden file, not a page called "").
fn strip_suffix_ignore_case<'a>(name: &'a str, suffix: &str) -> Option<&'a str> {
    let split = name.len().checked_sub(suffix.len())?;
    if split == 0 || !name.is_char_boundary(split) {
        return None;
    }
    let (stem, tail) = name.split_at(split);
    tail.eq_ignore_ascii_case(suffix).then_some(stem)
}

/// Display name for an index entry: the filename without its markup or data
/// suffix. Other names are returned unchanged.
///
/// - `setup.md` → `setup`
/// - `hosts.yaml` → `hosts`
/// - `notes.md.md` → `notes.md`
pub fn display_name(file_name: &str) -> &str {
    strip_suffix_ignore_case(file_name, MARKUP_SUFFIX)
        .or_else(|| strip_suffix_ignore_case(file_name, DATA_SUFFIX))
        .unwrap_or(file_name)
}

/// Whether a display name designates the directory's own index page.
pub fn is_index_name(display_name: &str, index_name: &str) -> bool {
    display_name.eq_ignore_ascii_case(index_name)
}

/// Destination filename for a markup file: the trailing `.md` becomes `.html`.
///
/// Only the suffix is touched; `.md` elsewhere in the name is preserved
/// (`a.md.backup.md` → `a.md.backup.html`).
pub fn html_file_name(file_name: &str) -> String {
    match strip_suffix_ignore_case(file_name, MARKUP_SUFFIX) {
        Some(stem) => format!("{stem}{HTML_SUFFIX}"),
        None => file_name.to_string(),
    }
}

/// Destination filename for the `<pre>` wrapper of a sibling data file.
pub fn wrapper_file_name(file_name: &str) -> String {
    format!("{file_name}{HTML_SUFFIX}")
}
