use std::io;
use std::path::PathBuf;

use anyhow::Context;
use tracing::Instrument;

mod cli;
mod extract;
mod fetch;
mod models;
mod normalize;
mod output;
mod prompt;
mod tag;
#[cfg(test)]
mod test_support;

use cli::Cli;
use fetch::Fetcher;
use output::OutputTarget;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse_args();
    let span = tracing::info_span!("scrape", website = %cli.website);

    if let Err(err) = run(cli).instrument(span).await {
        eprintln!("pagegrab error: {:#}", err);
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let name = cli.output_name();

    if let Some(name) = name.as_deref() {
        let confirmed = prompt::confirm_overwrite(
            PathBuf::from(name).as_path(),
            &mut io::stdin().lock(),
            &mut io::stdout(),
        )
        .context("reading overwrite confirmation")?;
        if !confirmed {
            tracing::info!(name, "keeping existing output, nothing written");
            return Ok(());
        }
    }

    let request = cli.page_request();
    let client = fetch::build_client().context("building http client")?;
    let page = Fetcher::for_request(&request, &client)
        .fetch(&request.website)
        .await
        .with_context(|| format!("fetching {}", request.website))?;

    let structure = extract::build_structure(page, name, cli.img);

    let Some(name) = structure.name.as_deref() else {
        tracing::info!(
            images = structure.images().len(),
            "no output name given, nothing written"
        );
        return Ok(());
    };

    let target = if cli.img {
        OutputTarget::Directory {
            path: PathBuf::from(name),
            client,
        }
    } else {
        OutputTarget::File(PathBuf::from(name))
    };

    let summary = target
        .write(&structure)
        .await
        .with_context(|| format!("writing {}", name))?;
    tracing::info!(saved = summary.saved, total = summary.total, "done");
    Ok(())
}
