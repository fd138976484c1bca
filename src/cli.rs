use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "modalframe",
    version,
    about = "Browse server-rendered pages and their modal dialogs in the terminal"
)]
pub struct Args {
    /// Page to load (falls back to `page.base_url` from the config)
    pub url: Option<String>,

    /// Config file to read instead of the default location
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Layer for dialogs that declare none (e.g. "z-50")
    #[arg(short, long)]
    pub layer: Option<String>,
}
