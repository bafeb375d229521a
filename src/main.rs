use clap::Parser;
use keytree::cli::{commands, open_session, output, shell, Cli, Commands};
use keytree::errors::Result;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(&cli) {
        output::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Log to stderr, filtered by `KEYTREE_LOG` (default `warn`, or `debug`
/// with `--verbose`).
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_env("KEYTREE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run(cli: &Cli) -> Result<()> {
    // Completions need no store.
    if let Commands::Completions { shell } = cli.command {
        return commands::completions::execute(shell);
    }

    let mut session = open_session(cli)?;

    let result = match cli.command {
        Commands::Get { ref path } => commands::get::execute(&session, path),
        Commands::Set {
            ref path,
            ref value,
        } => commands::set::execute(&mut session, path, value.as_deref(), false),
        Commands::Delete { ref path, force } => {
            commands::delete::execute(&mut session, path, force)
        }
        Commands::Tree => commands::tree::execute(&session),
        Commands::List => commands::list::execute(&session),
        Commands::Search { ref pattern } => commands::search::execute(&session, pattern),
        Commands::Copy { ref path } => commands::copy::execute(&session, path),
        Commands::Generate {
            ref path,
            length,
            ref classes,
        } => commands::generate::execute(&mut session, path, length, classes.as_deref()),
        Commands::Rotate => commands::rotate::execute(&mut session),
        Commands::Shell => shell::run(&mut session),
        Commands::Completions { .. } => Ok(()),
    };

    if result.is_ok() && cli.command.mutates() && session.store().is_dirty() {
        session.flush()?;
    }
    session.close();
    result
}
