use std::ffi::OsString;

use clap::Parser;

use crate::models::{FetchOptions, PageRequest};
use crate::normalize::with_scheme;

/// Save a web page, or every image on it, to disk.
#[derive(Debug, Parser)]
#[command(name = "pagegrab", version)]
pub struct Cli {
    /// Website to scrape; `https://` is added when no scheme is given
    pub website: String,

    /// Wait for javascript to load (render the page in a browser)
    #[arg(short = 'w', long)]
    pub wait: bool,

    /// File or directory to store output
    #[arg(short = 'o', long, value_name = "NAME")]
    pub out: Option<String>,

    /// Output the page as .html instead of .txt
    #[arg(long)]
    pub html: bool,

    /// Download all images to a directory
    #[arg(short = 'i', long)]
    pub img: bool,

    /// Start the browser in incognito mode
    #[arg(long)]
    pub incognito: bool,

    /// Keep the browser window hidden
    #[arg(long)]
    pub headless: bool,
}

impl Cli {
    /// Parse process arguments, accepting the single-dash `-html` and `-hl`.
    pub fn parse_args() -> Self {
        Self::parse_from(legacy_args(std::env::args_os()))
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest {
            website: with_scheme(&self.website),
            render: self.wait,
            options: FetchOptions {
                headless: self.headless,
                incognito: self.incognito,
            },
        }
    }

    /// Output path with the file-mode extension applied.
    pub fn output_name(&self) -> Option<String> {
        self.out
            .as_deref()
            .map(|name| resolve_output_name(name, self.img, self.html))
    }
}

/// Directory mode keeps the name; file mode forces `.html` or `.txt`.
pub fn resolve_output_name(name: &str, directory: bool, html: bool) -> String {
    if directory {
        return name.to_string();
    }
    let ext = if html { ".html" } else { ".txt" };
    if name.ends_with(ext) {
        name.to_string()
    } else {
        format!("{}{}", name, ext)
    }
}

fn legacy_args<I>(args: I) -> impl Iterator<Item = OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter().map(|arg| match arg.to_str() {
        Some("-html") => OsString::from("--html"),
        Some("-hl") => OsString::from("--headless"),
        _ => arg,
    })
}
