//! Tree conversion: mirror a docs directory as HTML.
//!
//! The converter walks the source tree depth-first and rebuilds it under the
//! destination root, one directory at a time:
//!
//! ```text
//! docs/                          html/
//! ├── index.md          →        ├── index.html
//! ├── setup.md          →        ├── setup.html
//! ├── hosts.yaml        →        ├── hosts.yaml      (data-file policy)
//! ├── logo.png          →        ├── logo.png        (byte copy)
//! └── guide/            →        └── guide/
//!     └── usage.md      →            └── usage.html
//! ```
//!
//! ## Visiting a Directory
//!
//! 1. Create the mirrored destination directory.
//! 2. List children in filename order. Subdirectories are visited right away
//!    (pre-order) and assets are copied right away.
//! 3. Build the directory's Index String from its own markup files (and data
//!    files, if the policy indexes them). Descendants are never listed.
//! 4. For each markup file: read, substitute placeholders, render, write
//!    `<name>.html`.
//!
//! ## Errors
//!
//! Nothing short of bad arguments stops a run. Every failure (an unreadable
//! directory, a page that won't render, a destination that can't be written)
//! is reported as a [`ConvertEvent::Failed`] and the affected unit of work is
//! skipped. Pages are rendered fully in memory before anything is written,
//! so a render failure never leaves a partial file behind.

use crate::config::{ConvertConfig, DataFilePolicy};
use crate::index::{build_index, index_entries, render_index};
use crate::naming::{EntryKind, classify, html_file_name, wrapper_file_name};
use crate::render::{MarkdownEngine, RenderEngine, RenderError};
use crate::substitute::Substitutions;
use crate::wrap::wrap_data_file;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("cannot create directory {}: {source}", dir.display())]
    CreateDir {
        dir: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot list {}: {source}", dir.display())]
    List {
        dir: PathBuf,
        source: walkdir::Error,
    },
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot render {} to {}: {source}", path.display(), dest.display())]
    Render {
        path: PathBuf,
        dest: PathBuf,
        source: RenderError,
    },
    #[error("cannot write {} (from {}): {source}", dest.display(), path.display())]
    Write {
        path: PathBuf,
        dest: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot copy {} to {}: {source}", path.display(), dest.display())]
    Copy {
        path: PathBuf,
        dest: PathBuf,
        source: std::io::Error,
    },
}

/// Progress reported while converting.
#[derive(Debug)]
pub enum ConvertEvent {
    /// A markup file was rendered and written.
    Converted { source: PathBuf, dest: PathBuf },
    /// A file was copied byte for byte.
    Copied { source: PathBuf, dest: PathBuf },
    /// A data file was written as a `<pre>` HTML wrapper.
    Wrapped { source: PathBuf, dest: PathBuf },
    /// A unit of work failed and was skipped.
    Failed(ConvertError),
    /// All of a directory's own files have been handled.
    DirectoryFinished { source: PathBuf },
}

/// Counts for one conversion run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConvertSummary {
    pub directories: usize,
    pub rendered: usize,
    pub copied: usize,
    pub wrapped: usize,
    pub failed: usize,
}

/// Convert `source` into `dest` with the stock Markdown engine.
///
/// The host address is read from the environment once, before traversal.
/// Only pattern compilation can fail; conversion problems are reported
/// through `events` and counted in the summary.
pub fn convert(
    source: &Path,
    dest: &Path,
    config: &ConvertConfig,
    events: Option<Sender<ConvertEvent>>,
) -> Result<ConvertSummary, regex::Error> {
    let substitutions = Substitutions::new(config, config.host_address())?;
    let engine = MarkdownEngine::new(config.render.clone());
    let mut converter = Converter::new(config, &substitutions, &engine, events);
    Ok(converter.convert(source, dest))
}

/// Recursive directory converter.
///
/// Holds only borrowed, read-only configuration plus the running summary.
pub struct Converter<'a> {
    config: &'a ConvertConfig,
    substitutions: &'a Substitutions,
    engine: &'a dyn RenderEngine,
    events: Option<Sender<ConvertEvent>>,
    summary: ConvertSummary,
    dest_root: Option<PathBuf>,
}

impl<'a> Converter<'a> {
    pub fn new(
        config: &'a ConvertConfig,
        substitutions: &'a Substitutions,
        engine: &'a dyn RenderEngine,
        events: Option<Sender<ConvertEvent>>,
    ) -> Self {
        Self {
            config,
            substitutions,
            engine,
            events,
            summary: ConvertSummary::default(),
            dest_root: None,
        }
    }

    /// Convert the whole tree under `source_root` into `dest_root`.
    pub fn convert(&mut self, source_root: &Path, dest_root: &Path) -> ConvertSummary {
        // A destination nested inside the source must not be converted into itself.
        self.dest_root = fs::create_dir_all(dest_root)
            .and_then(|()| fs::canonicalize(dest_root))
            .ok();
        self.visit_directory(source_root, dest_root);
        std::mem::take(&mut self.summary)
    }

    /// Mirror one source directory into `dst_dir`, recursing into subdirectories.
    pub fn visit_directory(&mut self, src_dir: &Path, dst_dir: &Path) {
        self.summary.directories += 1;

        let dst_ready = match fs::create_dir_all(dst_dir) {
            Ok(()) => true,
            Err(source) => {
                self.fail(ConvertError::CreateDir {
                    dir: dst_dir.to_path_buf(),
                    source,
                });
                false
            }
        };

        let policy = self.config.data_files;
        let mut pages: Vec<String> = Vec::new();
        let mut data_files: Vec<String> = Vec::new();

        for (file_name, is_dir) in self.list_children(src_dir) {
            let src = src_dir.join(&file_name);
            let dst = dst_dir.join(&file_name);

            // Names that aren't UTF-8 can't be indexed or renamed; mirror them as-is.
            let Some(name) = file_name.to_str() else {
                if is_dir {
                    self.visit_subdirectory(&src, &dst);
                } else if dst_ready {
                    self.copy(&src, &dst);
                }
                continue;
            };

            match classify(name, is_dir) {
                EntryKind::Subdirectory => self.visit_subdirectory(&src, &dst),
                EntryKind::Markup => pages.push(name.to_string()),
                EntryKind::SiblingData => {
                    if policy.copies() && dst_ready {
                        self.copy(&src, &dst);
                    }
                    if policy.indexes() {
                        data_files.push(name.to_string());
                    }
                }
                EntryKind::Asset => {
                    if dst_ready {
                        self.copy(&src, &dst);
                    }
                }
            }
        }

        if dst_ready {
            let index = self.build_index(&pages, &data_files);

            if policy == DataFilePolicy::Wrap {
                for name in &data_files {
                    self.wrap(&src_dir.join(name), &dst_dir.join(wrapper_file_name(name)));
                }
            }

            for name in &pages {
                self.convert_page(&src_dir.join(name), &dst_dir.join(html_file_name(name)), &index);
            }
        }

        self.emit(ConvertEvent::DirectoryFinished {
            source: src_dir.to_path_buf(),
        });
    }

    fn visit_subdirectory(&mut self, src: &Path, dst: &Path) {
        if let Some(dest_root) = &self.dest_root
            && fs::canonicalize(src).is_ok_and(|p| &p == dest_root)
        {
            return;
        }
        self.visit_directory(src, dst);
    }

    /// Direct children of `dir` as `(file name, is directory)`, in filename
    /// order. Symlinks are not followed.
    fn list_children(&mut self, dir: &Path) -> Vec<(std::ffi::OsString, bool)> {
        let mut children = Vec::new();
        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            match entry {
                Ok(entry) => {
                    children.push((entry.file_name().to_os_string(), entry.file_type().is_dir()))
                }
                Err(source) => {
                    let failed = source.path().unwrap_or(dir).to_path_buf();
                    self.fail(ConvertError::List {
                        dir: failed,
                        source,
                    });
                }
            }
        }
        children
    }

    /// Index String for this directory's pages and indexed data files.
    fn build_index(&self, pages: &[String], data_files: &[String]) -> String {
        let names = pages.iter().chain(data_files).map(String::as_str);
        if self.config.data_files != DataFilePolicy::Wrap {
            return build_index(names, &self.config.index_name);
        }
        // Wrapped data files are linked through their HTML wrapper.
        let entries = index_entries(names, &self.config.index_name, |name| {
            if classify(name, false) == EntryKind::SiblingData {
                wrapper_file_name(name)
            } else {
                name.to_string()
            }
        });
        render_index(&entries)
    }

    fn convert_page(&mut self, src: &Path, dest: &Path, index: &str) {
        let markup = match fs::read(src) {
            Ok(bytes) => bytes,
            Err(source) => {
                return self.fail(ConvertError::Read {
                    path: src.to_path_buf(),
                    source,
                });
            }
        };

        let substituted = self.substitutions.apply(&markup, index);

        let html = match self.engine.render(&substituted) {
            Ok(html) => html,
            Err(source) => {
                return self.fail(ConvertError::Render {
                    path: src.to_path_buf(),
                    dest: dest.to_path_buf(),
                    source,
                });
            }
        };

        if let Err(source) = fs::write(dest, html) {
            return self.fail(ConvertError::Write {
                path: src.to_path_buf(),
                dest: dest.to_path_buf(),
                source,
            });
        }

        self.summary.rendered += 1;
        self.emit(ConvertEvent::Converted {
            source: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }

    fn wrap(&mut self, src: &Path, dest: &Path) {
        let content = match fs::read(src) {
            Ok(bytes) => bytes,
            Err(source) => {
                return self.fail(ConvertError::Read {
                    path: src.to_path_buf(),
                    source,
                });
            }
        };

        let file_name = src
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let html = wrap_data_file(&file_name, &content).into_string();

        if let Err(source) = fs::write(dest, html) {
            return self.fail(ConvertError::Write {
                path: src.to_path_buf(),
                dest: dest.to_path_buf(),
                source,
            });
        }

        self.summary.wrapped += 1;
        self.emit(ConvertEvent::Wrapped {
            source: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }

    fn copy(&mut self, src: &Path, dest: &Path) {
        if let Err(source) = fs::copy(src, dest) {
            return self.fail(ConvertError::Copy {
                path: src.to_path_buf(),
                dest: dest.to_path_buf(),
                source,
            });
        }

        self.summary.copied += 1;
        self.emit(ConvertEvent::Copied {
            source: src.to_path_buf(),
            dest: dest.to_path_buf(),
        });
    }

    fn fail(&mut self, error: ConvertError) {
        self.summary.failed += 1;
        self.emit(ConvertEvent::Failed(error));
    }

    fn emit(&self, event: ConvertEvent) {
        if let Some(tx) = &self.events {
            tx.send(event).ok();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn write(root: &Path, rel: &str, content: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn read(root: &Path, rel: &str) -> String {
        fs::read_to_string(root.join(rel))
            .unwrap_or_else(|e| panic!("cannot read {rel}: {e}"))
    }

    struct Run {
        summary: ConvertSummary,
        events: Vec<ConvertEvent>,
    }

    fn run_with(
        src: &Path,
        dst: &Path,
        config: &ConvertConfig,
        host: &str,
        engine: &dyn RenderEngine,
    ) -> Run {
        let substitutions = Substitutions::new(config, host).unwrap();
        let (tx, rx) = mpsc::channel();
        let mut converter = Converter::new(config, &substitutions, engine, Some(tx));
        let summary = converter.convert(src, dst);
        drop(converter);
        Run {
            summary,
            events: rx.into_iter().collect(),
        }
    }

    fn run(src: &Path, dst: &Path, config: &ConvertConfig) -> Run {
        run_with(src, dst, config, "", &MarkdownEngine::default())
    }

    fn failures(run: &Run) -> Vec<&ConvertError> {
        run.events
            .iter()
            .filter_map(|e| match e {
                ConvertEvent::Failed(err) => Some(err),
                _ => None,
            })
            .collect()
    }

    /// Engine that refuses any page containing `FAIL`.
    struct PickyEngine;

    impl RenderEngine for PickyEngine {
        fn render(&self, markup: &[u8]) -> Result<Vec<u8>, RenderError> {
            if markup.windows(4).any(|w| w == b"FAIL") {
                return Err(RenderError::Rejected("page contains FAIL".into()));
            }
            Ok(markup.to_vec())
        }
    }

    #[test]
    fn mirrors_tree_and_renames_pages() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "index.md", "# Home");
        write(src.path(), "alpha.md", "# Alpha");
        write(src.path(), "logo.png", "PNG");
        write(src.path(), "sub/gamma.md", "# Gamma");
        fs::create_dir_all(src.path().join("empty")).unwrap();

        let run = run(src.path(), dst.path(), &ConvertConfig::default());

        assert!(dst.path().join("index.html").is_file());
        assert!(dst.path().join("alpha.html").is_file());
        assert!(dst.path().join("sub/gamma.html").is_file());
        assert!(dst.path().join("empty").is_dir());
        assert_eq!(read(dst.path(), "logo.png"), "PNG");
        assert!(!dst.path().join("alpha.md").exists());
        assert_eq!(
            run.summary,
            ConvertSummary {
                directories: 3,
                rendered: 3,
                copied: 1,
                wrapped: 0,
                failed: 0,
            }
        );
    }

    #[test]
    fn index_lists_only_direct_siblings() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "index.md", "DIRECTORY_INDEX");
        write(src.path(), "alpha.md", "DIRECTORY_INDEX");
        write(src.path(), "sub/gamma.md", "DIRECTORY_INDEX");

        run(src.path(), dst.path(), &ConvertConfig::default());

        let expected = "<ul>\n<li><a href=\"alpha.html\">alpha</a></li>\n</ul>\n";
        assert_eq!(read(dst.path(), "index.html"), expected);
        assert_eq!(read(dst.path(), "alpha.html"), expected);
        assert_eq!(
            read(dst.path(), "sub/gamma.html"),
            "<ul>\n<li><a href=\"gamma.html\">gamma</a></li>\n</ul>\n"
        );
    }

    #[test]
    fn mixed_case_index_page_not_listed() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "Index.md", "DIRECTORY_INDEX");
        write(src.path(), "notes.md", "x");

        run(src.path(), dst.path(), &ConvertConfig::default());

        let html = read(dst.path(), "Index.html");
        assert!(html.contains("notes.html"));
        assert!(!html.contains("Index.html"));
    }

    #[test]
    fn links_and_address_are_substituted() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(
            src.path(),
            "page.md",
            "see [here](notes.md) at http://LOCAL_IP_ADDRESS:8080/",
        );

        run_with(
            src.path(),
            dst.path(),
            &ConvertConfig::default(),
            "192.168.1.5",
            &MarkdownEngine::default(),
        );

        let html = read(dst.path(), "page.html");
        assert!(html.contains(r#"<a href="notes.html">here</a>"#));
        assert!(html.contains("http://192.168.1.5:8080/"));
        assert!(!html.contains("LOCAL_IP_ADDRESS"));
    }

    #[test]
    fn unset_address_removes_placeholder() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "page.md", "[LOCAL_IP_ADDRESS]");

        run(src.path(), dst.path(), &ConvertConfig::default());

        assert_eq!(read(dst.path(), "page.html"), "<p>[]</p>\n");
    }

    #[test]
    fn data_files_copied_by_default() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "index.md", "DIRECTORY_INDEX");
        write(src.path(), "alpha.md", "");
        write(src.path(), "beta.yaml", "k: v\n");

        let run = run(src.path(), dst.path(), &ConvertConfig::default());

        assert_eq!(read(dst.path(), "beta.yaml"), "k: v\n");
        assert!(!read(dst.path(), "index.html").contains("beta"));
        assert_eq!(run.summary.copied, 1);
    }

    #[test]
    fn index_policy_lists_but_does_not_copy() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "index.md", "DIRECTORY_INDEX");
        write(src.path(), "alpha.md", "");
        write(src.path(), "beta.yaml", "k: v\n");
        let config = ConvertConfig {
            data_files: DataFilePolicy::Index,
            ..ConvertConfig::default()
        };

        run(src.path(), dst.path(), &config);

        assert!(!dst.path().join("beta.yaml").exists());
        let html = read(dst.path(), "index.html");
        assert!(html.contains(r#"<a href="alpha.html">alpha</a>"#));
        assert!(html.contains(r#"<a href="beta.yaml">beta</a>"#));
    }

    #[test]
    fn index_and_copy_policy() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "index.md", "DIRECTORY_INDEX");
        write(src.path(), "beta.yaml", "k: v\n");
        let config = ConvertConfig {
            data_files: DataFilePolicy::IndexAndCopy,
            ..ConvertConfig::default()
        };

        run(src.path(), dst.path(), &config);

        assert_eq!(read(dst.path(), "beta.yaml"), "k: v\n");
        assert!(read(dst.path(), "index.html").contains(r#"href="beta.yaml""#));
    }

    #[test]
    fn wrap_policy_writes_pre_wrapper() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "index.md", "DIRECTORY_INDEX");
        write(src.path(), "beta.yaml", "k: <v>\n");
        let config = ConvertConfig {
            data_files: DataFilePolicy::Wrap,
            ..ConvertConfig::default()
        };

        let run = run(src.path(), dst.path(), &config);

        assert!(!dst.path().join("beta.yaml").exists());
        let wrapper = read(dst.path(), "beta.yaml.html");
        assert!(wrapper.contains("<pre>k: &lt;v&gt;\n</pre>"));
        assert!(read(dst.path(), "index.html").contains(r#"<a href="beta.yaml.html">beta</a>"#));
        assert_eq!(run.summary.wrapped, 1);
    }

    #[test]
    fn render_failure_skips_page_and_continues() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "a.md", "FAIL");
        write(src.path(), "b.md", "fine");

        let run = run_with(
            src.path(),
            dst.path(),
            &ConvertConfig::default(),
            "",
            &PickyEngine,
        );

        assert!(!dst.path().join("a.html").exists());
        assert_eq!(read(dst.path(), "b.html"), "fine");
        assert_eq!(run.summary.failed, 1);
        assert!(matches!(failures(&run)[..], [ConvertError::Render { .. }]));
    }

    #[test]
    fn non_utf8_page_is_rendered() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        fs::write(src.path().join("notes.md"), b"# Caf\xe9\n\nSee [x](y.md)\n").unwrap();

        let run = run(src.path(), dst.path(), &ConvertConfig::default());

        assert_eq!(run.summary.rendered, 1);
        assert_eq!(run.summary.failed, 0);
        let html = read(dst.path(), "notes.html");
        assert!(html.contains("Caf\u{fffd}"));
        assert!(html.contains(r#"<a href="y.html">x</a>"#));
    }

    #[test]
    fn write_failure_is_reported() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "page.md", "# Page");
        write(src.path(), "other.md", "# Other");
        // A directory squatting on the output path makes the write fail
        fs::create_dir_all(dst.path().join("page.html")).unwrap();

        let run = run(src.path(), dst.path(), &ConvertConfig::default());

        assert!(matches!(failures(&run)[..], [ConvertError::Write { .. }]));
        assert!(dst.path().join("other.html").is_file());
    }

    #[test]
    fn missing_source_is_a_list_error() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        let out = dst.path().join("out");

        let run = run(&src.path().join("missing"), &out, &ConvertConfig::default());

        assert!(out.is_dir());
        assert!(matches!(failures(&run)[..], [ConvertError::List { .. }]));
        assert_eq!(run.summary.rendered, 0);
    }

    #[test]
    fn unusable_destination_is_a_create_dir_error() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "page.md", "# Page");
        write(dst.path(), "taken", "a file, not a directory");

        let run = run(src.path(), &dst.path().join("taken"), &ConvertConfig::default());

        assert!(matches!(failures(&run)[..], [ConvertError::CreateDir { .. }]));
        assert_eq!(run.summary.rendered, 0);
    }

    #[cfg(unix)]
    #[test]
    fn broken_links_fail_without_stopping() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "ok.md", "# Ok");
        std::os::unix::fs::symlink(src.path().join("nowhere.md"), src.path().join("gone.md"))
            .unwrap();
        std::os::unix::fs::symlink(src.path().join("nowhere.png"), src.path().join("gone.png"))
            .unwrap();

        let run = run(src.path(), dst.path(), &ConvertConfig::default());

        let errors = failures(&run);
        assert_eq!(errors.len(), 2);
        assert!(errors.iter().any(|e| matches!(e, ConvertError::Read { .. })));
        assert!(errors.iter().any(|e| matches!(e, ConvertError::Copy { .. })));
        assert!(dst.path().join("ok.html").is_file());
    }

    #[test]
    fn subdirectories_finish_before_parent() {
        let src = TempDir::new().unwrap();
        let dst = TempDir::new().unwrap();
        write(src.path(), "a.md", "");
        write(src.path(), "sub/b.md", "");

        let run = run(src.path(), dst.path(), &ConvertConfig::default());

        let order: Vec<String> = run
            .events
            .iter()
            .filter_map(|e| match e {
                ConvertEvent::Converted { source, .. } => {
                    Some(source.file_name().unwrap().to_string_lossy().into_owned())
                }
                ConvertEvent::DirectoryFinished { source } => {
                    Some(format!("end:{}", source.file_name().unwrap().to_string_lossy()))
                }
                _ => None,
            })
            .collect();
        let root_name = src.path().file_name().unwrap().to_string_lossy();
        assert_eq!(
            order,
            vec![
                "b.md".to_string(),
                "end:sub".to_string(),
                "a.md".to_string(),
                format!("end:{root_name}"),
            ]
        );
    }

    #[test]
    fn destination_inside_source_is_skipped() {
        let src = TempDir::new().unwrap();
        write(src.path(), "page.md", "# Page");
        let dst = src.path().join("html");

        let run = run(src.path(), &dst, &ConvertConfig::default());

        assert!(dst.join("page.html").is_file());
        assert!(!dst.join("html").exists());
        assert_eq!(run.summary.directories, 1);
    }
}
