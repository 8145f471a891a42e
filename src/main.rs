use clap::Parser;

use cms_release::{Result, cli, command};

fn initialize_logger(debug: bool) -> Result<()> {
    let filter = if debug {
        simplelog::LevelFilter::Debug
    } else {
        simplelog::LevelFilter::Info
    };

    let config = simplelog::ConfigBuilder::new()
        .add_filter_allow_str("cms_release")
        .build();

    simplelog::TermLogger::init(
        filter,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let cli_args = cli::Args::parse();

    initialize_logger(cli_args.debug)?;

    match &cli_args.command {
        cli::Command::Release(release_args) => {
            command::release(&cli_args, release_args).await?
        }
        cli::Command::Changelog => command::changelog(&cli_args).await?,
    }

    Ok(())
}
