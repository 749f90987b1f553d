//! Pre-formatted HTML wrapper for sibling data files.
//!
//! Only used with `data_files = "wrap"`: a `hosts.yaml` next to the pages is
//! written out as `hosts.yaml.html`, a minimal document showing the file's
//! text verbatim inside `<pre>`. Content is escaped by maud, so a data file
//! can never inject markup.

use maud::{DOCTYPE, Markup, html};

/// Wrap a data file's text in a standalone HTML page titled with its name.
pub fn wrap_data_file(file_name: &str, content: &[u8]) -> Markup {
    let text = String::from_utf8_lossy(content).into_owned();
    html! {
        (DOCTYPE)
        html {
            head {
                meta charset="utf-8";
                title { (file_name) }
            }
            body {
                pre { (text) }
            }
        }
    }
}
