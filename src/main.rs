mod cli;
mod config;
mod localizer;
mod translate;
mod utils;
mod xliff;

#[cfg(test)]
mod test_utils;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::EnvFilter;

use cli::Cli;
use config::Config;
use localizer::{localize_display_info, localize_file, to_pretty_json};
use translate::TranslatorFactory;

#[tokio::main]
async fn main() -> ExitCode {
    // stdout is reserved for the display-info JSON
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("xliff_localizer=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    config.translator_config.apply(cli.overrides());
    let settings = config.translator_config.resolve()?;

    let translator = TranslatorFactory::create_translator(&settings);

    if let Some(path) = &cli.file {
        let [to] = settings.to.as_slice() else {
            bail!(
                "--file translates into exactly one language, got {}",
                settings.to.join(",")
            );
        };

        let summary = localize_file(path, translator.as_ref(), &settings.from, to)
            .await
            .with_context(|| format!("Failed to localize {}", path.display()))?;

        return Ok(exit_code(summary.failed > 0));
    }

    if let Some(serialized) = &cli.display_info {
        let outcome = localize_display_info(serialized, translator.as_ref(), &settings.from, &settings.to)
            .await
            .context("Invalid display info JSON")?;

        println!("{}", to_pretty_json(&outcome.results)?);
        return Ok(exit_code(outcome.failed));
    }

    Ok(ExitCode::SUCCESS)
}

fn exit_code(failed: bool) -> ExitCode {
    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
