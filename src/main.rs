//! circdesk - Main entry point
//!
//! Loads the library, runs one command against it and saves if the command
//! changed anything, or writes out the resolved configuration. All rules
//! live in the library crate; this is glue.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

use circdesk::cli::{Cli, Commands, LibrarianCommands, MemberCommands};
use circdesk::{Library, LibraryConfig, PersistenceStore};

/// Initialize the tracing subscriber; RUST_LOG overrides the default level
fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse_args();
    init_tracing(cli.verbose);
    debug!("CLI arguments parsed");

    if let Err(e) = run(cli) {
        error!("Command failed: {:#}", e);
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}

/// Resolve configuration: file first, then command line overrides
fn load_config(cli: &Cli) -> Result<LibraryConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            LibraryConfig::load_from_file(path)?
        }
        None => LibraryConfig::default(),
    };

    if let Some(dir) = &cli.data_dir {
        config.data_dir = dir.clone();
    }
    if cli.lenient {
        config.strict_load = false;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(&cli)?;

    if let Commands::InitConfig { path, force } = &cli.command {
        return write_config(&config, path, *force);
    }

    let store = PersistenceStore::from_config(&config);

    let mut library = if config.strict_load {
        store.load().context("Failed to load library data")?
    } else {
        let (library, skipped) = store.load_lenient()?;
        for err in &skipped {
            eprintln!("⚠ Skipped {}", err);
        }
        library
    };

    execute(&mut library, &cli.command)?;

    if cli.command.mutates() {
        store.save(&library).context("Failed to save library data")?;
        info!("Library data saved to {:?}", config.data_dir);
    }

    Ok(())
}

/// Persist the resolved configuration so later runs can use `--config`
fn write_config(config: &LibraryConfig, path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!("{:?} already exists (use --force to overwrite)", path);
    }
    config.save_to_file(path)?;
    println!("✓ Configuration written to {:?}", path);
    Ok(())
}

fn execute(library: &mut Library, command: &Commands) -> Result<()> {
    match command {
        Commands::Librarian { action } => match action {
            LibrarianCommands::AddBook { title, author } => {
                library.add_book(title.as_str(), author.as_str())?;
                println!("✓ Book added");
            }
            LibrarianCommands::RemoveBook { title } => {
                library.remove_book(title)?;
                println!("✓ Book removed");
            }
            LibrarianCommands::Register { name } => {
                library.register_user(name.as_str())?;
                println!("✓ User registered");
            }
            LibrarianCommands::Users => {
                println!("Users:");
                for user in library.membership().users() {
                    let held: Vec<&str> = user.held_titles().collect();
                    if held.is_empty() {
                        println!("{}", user.name());
                    } else {
                        println!("{} [{}]", user.name(), held.join(", "));
                    }
                }
            }
            LibrarianCommands::Books => {
                println!("Books:");
                for book in library.catalog().list() {
                    println!("{}", book);
                }
            }
            LibrarianCommands::Audit => {
                let violations = library.audit();
                if !violations.is_empty() {
                    for violation in &violations {
                        eprintln!("✗ {}", violation);
                    }
                    anyhow::bail!("{} circulation problems found", violations.len());
                }
                println!("✓ Circulation records are consistent");
            }
        },
        Commands::Member { action } => match action {
            MemberCommands::Borrow { name, title } => {
                library.borrow(name, title)?;
                println!("✓ Book borrowed");
            }
            MemberCommands::Return { name, title } => {
                library.return_book(name, title)?;
                println!("✓ Book returned");
            }
        },
        Commands::InitConfig { .. } => debug!("init-config does not touch library data"),
    }
    Ok(())
}
