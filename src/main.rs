use clap::Parser;
use doc_tool::config::{self, ConvertConfig, DataFilePolicy};
use doc_tool::{convert, output};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "doc-tool")]
#[command(about = "Render a directory tree of Markdown files as HTML")]
#[command(long_about = "\
Render a directory tree of Markdown files as HTML

Every *.md file under <DOCS_PATH> is rendered to an .html file at the same
relative path under <HTML_PATH>; every other file is copied unchanged.

Before rendering, each page gets three substitutions:

  DIRECTORY_INDEX    list of links to the other pages in its directory
  .md)               .html)  (so [setup](setup.md) links to setup.html)
  LOCAL_IP_ADDRESS   value of the ipAddress environment variable

Embedded HTML is passed through, so pages can carry their own <title>.")]
#[command(version)]
struct Cli {
    /// Directory holding the Markdown files
    #[arg(required_unless_present = "print_config")]
    docs_path: Option<PathBuf>,

    /// Directory that will contain the HTML files
    #[arg(required_unless_present = "print_config")]
    html_path: Option<PathBuf>,

    /// TOML file overriding the default settings
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// How to treat .yaml files found next to pages
    #[arg(long, value_enum, value_name = "POLICY")]
    data_files: Option<DataFilePolicy>,

    /// Print the default settings as TOML and exit
    #[arg(long, exclusive = true)]
    print_config: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Usage errors are printed to stdout along with the usage text.
        Err(err) if err.use_stderr() => {
            print!("{}", err.render());
            std::process::exit(err.exit_code());
        }
        Err(err) => err.exit(),
    };

    if cli.print_config {
        print!("{}", config::stock_config_toml());
        return Ok(());
    }

    let (Some(docs_path), Some(html_path)) = (cli.docs_path, cli.html_path) else {
        return Err("both <DOCS_PATH> and <HTML_PATH> are required".into());
    };

    let mut config = match &cli.config {
        Some(path) => config::load_config(path)?,
        None => ConvertConfig::default(),
    };
    if let Some(policy) = cli.data_files {
        config.data_files = policy;
    }

    println!(
        "==> Converting {} \u{2192} {}",
        docs_path.display(),
        html_path.display()
    );

    let (tx, rx) = std::sync::mpsc::channel();
    let printer = std::thread::spawn(move || {
        for event in rx {
            output::print_event(&event);
        }
    });
    let summary = convert::convert(&docs_path, &html_path, &config, Some(tx))?;
    printer.join().map_err(|_| "output thread panicked")?;

    println!("{}", output::format_summary(&summary));
    Ok(())
}
