//! winup - inspect and remove installed Windows updates

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use winup_cli::cmd::{self, Context};
use winup_cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Commands::Completions { shell } = cli.command {
        cmd::completions::completions(shell);
        return Ok(());
    }

    let ctx = Context::new(cli.snapshot, cli.dry_run, cli.quiet)?;

    match cli.command {
        Commands::Scan { dump } => cmd::scan::scan(&ctx, dump.as_deref()).await,
        Commands::List {
            category,
            removable,
            search,
            json,
        } => {
            cmd::list::list(
                &ctx,
                category.map(Into::into),
                removable,
                search.as_deref(),
                json,
            )
            .await
        }
        Commands::Remove {
            updates,
            all_removable,
            category,
            yes,
        } => {
            let selection = if all_removable {
                cmd::remove::Selection::AllRemovable(category.map(Into::into))
            } else {
                cmd::remove::Selection::Items(updates)
            };
            cmd::remove::remove(&ctx, &selection, yes).await
        }
        Commands::Export { path, format } => cmd::export::export(&ctx, &path, format).await,
        Commands::Completions { .. } => Ok(()),
    }
}
