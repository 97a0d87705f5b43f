use std::path::PathBuf;

use clap::Parser;

/// Preview a Markdown document as HTML.
///
/// mdp renders the document to `<output_dir>/<path-without-extension>/index.html`,
/// opens it in a browser, and with `--watch` regenerates the page every time the
/// file is saved.
#[derive(Parser, Debug)]
#[command(name = "mdp", version, about, long_about = None)]
pub struct Cli {
    /// Markdown file to render.
    #[arg(required_unless_present = "list")]
    pub file: Option<PathBuf>,

    /// Path to a config file (default: <config dir>/mdp/config.toml).
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Keep running and regenerate the page whenever the file changes.
    #[arg(short, long, conflicts_with = "list")]
    pub watch: bool,

    /// List generated pages instead of rendering a file.
    #[arg(short, long)]
    pub list: bool,

    /// With --list, print the pages as a JSON array.
    #[arg(long, requires = "list")]
    pub json: bool,
}
