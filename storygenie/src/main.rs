use args::{Args, Command};
use clap::Parser;

mod args;
mod commands;
mod logger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    logger::init(&args);

    let config = args.config()?;

    match args.command {
        Command::Generate { prompt, save } => {
            let succeeded = commands::generate(&config, &prompt.join(" "), save).await?;

            if !succeeded {
                std::process::exit(1);
            }
        }
        Command::Favorites => commands::favorites(&config)?,
        Command::Stories => commands::stories(&config),
        Command::Read { title } => commands::read(&config, &title.join(" "))?,
    }

    Ok(())
}
