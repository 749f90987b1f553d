//! Placeholder substitution applied to each page before rendering.
//!
//! Three literal replacements run over the raw file bytes, always in this
//! order:
//!
//! 1. the index placeholder (`DIRECTORY_INDEX`) becomes the directory's
//!    Index String;
//! 2. every `.md)` becomes `.html)`, so Markdown links written against source
//!    filenames (`[setup](setup.md)`) point at the rendered pages. This also
//!    rewrites the links the index just inserted;
//! 3. the address placeholder (`LOCAL_IP_ADDRESS`) becomes the host address.
//!
//! Replacements are not scoped to any region of the file: front matter, code
//! blocks and prose are all rewritten alike.

use crate::config::ConvertConfig;
use regex::bytes::Regex;

const LINK_SOURCE: &str = ".md)";
const LINK_TARGET: &[u8] = b".html)";

/// Compiled substitution patterns plus the host address they insert.
///
/// Built once before traversal and shared by reference.
#[derive(Debug, Clone)]
pub struct Substitutions {
    index_pattern: Regex,
    link_pattern: Regex,
    address_pattern: Regex,
    host_address: Vec<u8>,
}

impl Substitutions {
    /// Compile the patterns named in `config`. Tokens are matched literally.
    pub fn new(
        config: &ConvertConfig,
        host_address: impl Into<Vec<u8>>,
    ) -> Result<Self, regex::Error> {
        Ok(Self {
            index_pattern: literal(&config.index_placeholder)?,
            link_pattern: literal(LINK_SOURCE)?,
            address_pattern: literal(&config.address_placeholder)?,
            host_address: host_address.into(),
        })
    }

    /// Apply all three substitutions in order.
    pub fn apply(&self, content: &[u8], index: &str) -> Vec<u8> {
        let with_index = self
            .index_pattern
            .replace_all(content, regex::bytes::NoExpand(index.as_bytes()));
        let with_links = self
            .link_pattern
            .replace_all(&with_index, regex::bytes::NoExpand(LINK_TARGET));
        self.address_pattern
            .replace_all(&with_links, regex::bytes::NoExpand(&self.host_address))
            .into_owned()
    }
}

fn literal(token: &str) -> Result<Regex, regex::Error> {
    Regex::new(&regex::escape(token))
}
