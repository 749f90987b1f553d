//! # doc-tool
//!
//! Turns a directory of Markdown notes into a browsable tree of HTML pages.
//! The source tree is mirrored one-to-one: every `.md` file becomes an
//! `.html` file at the same relative path, and every other file is copied
//! unchanged.
//!
//! ```text
//! doc-tool docs/ html/
//! ```
//!
//! # What Happens to a Page
//!
//! Before a page is rendered, three literal substitutions run over its text:
//!
//! | Token | Becomes |
//! |-------|---------|
//! | `DIRECTORY_INDEX` | a bullet list linking the page's sibling pages |
//! | `.md)` | `.html)`, so `[setup](setup.md)` links to the rendered page |
//! | `LOCAL_IP_ADDRESS` | the value of `$ipAddress` (empty if unset) |
//!
//! The result is rendered with GitHub-style extensions, heading ids and raw
//! HTML passthrough, and written next to its siblings in the output tree.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`convert`] | Recursive tree walk: classify, copy, index, substitute, render, write |
//! | [`naming`] | Entry classification and destination filenames |
//! | [`index`] | Per-directory Index String |
//! | [`substitute`] | The three ordered placeholder substitutions |
//! | [`render`] | [`render::RenderEngine`] trait and the `pulldown-cmark` engine |
//! | [`wrap`] | `<pre>` HTML wrapper for sibling `.yaml` files |
//! | [`config`] | Immutable conversion settings, optionally from a TOML file |
//! | [`output`] | CLI progress and error formatting |
//!
//! # Design Decisions
//!
//! ## Log and Continue
//!
//! A docs tree is converted as a whole. One broken page or unreadable asset
//! is reported and skipped; it never aborts the run or rolls back what was
//! already written.
//!
//! ## One Directory at a Time
//!
//! Each directory's index is built from its own direct children only, after
//! its subdirectories have been fully converted. Nothing computed for one
//! directory is reused for another, so there is no state to get stale.
//!
//! ## Sibling Data Files
//!
//! `.yaml` files next to pages have been treated differently over time:
//! copied as assets, listed in the index, or both. [`config::DataFilePolicy`]
//! makes the choice explicit; the default copies them like any other asset.

pub mod config;
pub mod convert;
pub mod index;
pub mod naming;
pub mod output;
pub mod render;
pub mod substitute;
pub mod wrap;
