//! Per-directory navigation index.
//!
//! Each directory gets a Markdown bullet list linking to its sibling pages.
//! The list is inserted wherever a page contains the index placeholder, so a
//! directory's `index.md` can simply read:
//!
//! ```markdown
//! # Notes
//!
//! DIRECTORY_INDEX
//! ```
//!
//! For a directory holding `index.md`, `beta.md` and `Alpha.md` this expands
//! to:
//!
//! ```markdown
//! - [Alpha](Alpha.md)
//! - [beta](beta.md)
//! ```
//!
//! Links point at the *source* filenames; the `.md)` → `.html)` rewrite that
//! runs after index substitution turns them into links to rendered pages.
//!
//! Entries are sorted by ordinal (byte-wise, case-sensitive) comparison of the
//! original filename, and the page whose base name matches the index name is
//! never listed, whatever its case.

use crate::naming::{display_name, is_index_name};

/// One line of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexEntry {
    /// Original filename; the sort key.
    pub file_name: String,
    /// Filename with its suffix stripped.
    pub display_name: String,
    /// Link target written into the list item.
    pub link_target: String,
}

/// Build the sorted index entries for a set of sibling filenames.
///
/// `link_target` maps each original filename to the target its list item
/// links to; pass `str::to_string` to link the filename itself.
pub fn index_entries<'a, I, F>(file_names: I, index_name: &str, link_target: F) -> Vec<IndexEntry>
where
    I: IntoIterator<Item = &'a str>,
    F: Fn(&str) -> String,
{
    let mut names: Vec<&str> = file_names.into_iter().collect();
    names.sort_unstable();

    names
        .into_iter()
        .filter(|name| !is_index_name(display_name(name), index_name))
        .map(|name| IndexEntry {
            file_name: name.to_string(),
            display_name: display_name(name).to_string(),
            link_target: link_target(name),
        })
        .collect()
}

/// Render entries as a Markdown bullet list, one item per line.
pub fn render_index(entries: &[IndexEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "- [{}]({})",
                escape_link_text(&e.display_name),
                escape_link_target(&e.link_target)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Build the Index String for a directory whose entries link to their own
/// filenames.
pub fn build_index<'a, I>(file_names: I, index_name: &str) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    render_index(&index_entries(file_names, index_name, str::to_string))
}

fn escape_link_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '[' | ']' | '\\' | '*' | '_' | '`') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Percent-encode the characters that would end or split an inline link
/// destination. The trailing `.md)` stays intact for the link rewrite.
fn escape_link_target(target: &str) -> String {
    let mut out = String::with_capacity(target.len());
    for c in target.chars() {
        match c {
            ' ' => out.push_str("%20"),
            '(' => out.push_str("%28"),
            ')' => out.push_str("%29"),
            '<' => out.push_str("%3C"),
            '>' => out.push_str("%3E"),
            _ => out.push(c),
        }
    }
    out
}
