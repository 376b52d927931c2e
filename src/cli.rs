use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// circdesk - track a small library's books, members and loans
#[derive(Parser)]
#[command(name = "circdesk")]
#[command(about = "Book inventory, membership and circulation for a small library")]
#[command(version)]
pub struct Cli {
    /// Path to a JSON configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Directory holding the data files (overrides the configuration file)
    #[arg(short, long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Skip malformed data lines instead of refusing to start.
    ///
    /// Skipped lines are reported on stderr and are lost on the next save.
    #[arg(long, global = true)]
    pub lenient: bool,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Catalog and membership management
    Librarian {
        #[command(subcommand)]
        action: LibrarianCommands,
    },
    /// Borrowing and returning
    Member {
        #[command(subcommand)]
        action: MemberCommands,
    },
    /// Write the effective configuration (file plus flags) to a JSON file
    InitConfig {
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum LibrarianCommands {
    /// Add a book to the catalog
    AddBook {
        title: String,
        author: String,
    },
    /// Remove a book from the catalog (must not be on loan)
    RemoveBook {
        title: String,
    },
    /// Register a new user
    Register {
        name: String,
    },
    /// List registered users
    Users,
    /// List books with their status
    Books,
    /// Check that every loan is consistent
    Audit,
}

#[derive(Subcommand)]
pub enum MemberCommands {
    /// Borrow a book
    Borrow {
        name: String,
        title: String,
    },
    /// Return a borrowed book
    Return {
        name: String,
        title: String,
    },
}

impl Commands {
    /// Whether the command changes state and needs a save afterwards
    pub fn mutates(&self) -> bool {
        match self {
            Self::Librarian { action } => matches!(
                action,
                LibrarianCommands::AddBook { .. }
                    | LibrarianCommands::RemoveBook { .. }
                    | LibrarianCommands::Register { .. }
            ),
            Self::Member { .. } => true,
            Self::InitConfig { .. } => false,
        }
    }
}

impl Cli {
    pub fn parse_args() -> Self {
        <Self as clap::Parser>::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["circdesk"]).is_err());
    }

    #[test]
    fn test_cli_add_book() {
        let cli = Cli::try_parse_from(["circdesk", "librarian", "add-book", "Dune", "Herbert"])
            .unwrap();
        match cli.command {
            Commands::Librarian {
                action: LibrarianCommands::AddBook { title, author },
            } => {
                assert_eq!(title, "Dune");
                assert_eq!(author, "Herbert");
            }
            _ => panic!("Expected AddBook command"),
        }
    }

    #[test]
    fn test_cli_member_borrow_with_global_flags() {
        let cli = Cli::try_parse_from([
            "circdesk",
            "member",
            "borrow",
            "Alice",
            "Dune",
            "--data-dir",
            "/tmp/lib",
            "--lenient",
        ])
        .unwrap();
        assert_eq!(cli.data_dir.unwrap().to_str().unwrap(), "/tmp/lib");
        assert!(cli.lenient);
        assert!(matches!(
            cli.command,
            Commands::Member {
                action: MemberCommands::Borrow { .. }
            }
        ));
    }

    #[test]
    fn test_member_cannot_add_books() {
        assert!(Cli::try_parse_from(["circdesk", "member", "add-book", "Dune", "Herbert"]).is_err());
    }

    #[test]
    fn test_mutating_commands() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().command;
        assert!(parse(&["circdesk", "librarian", "register", "Alice"]).mutates());
        assert!(parse(&["circdesk", "member", "return", "Alice", "Dune"]).mutates());
        assert!(!parse(&["circdesk", "librarian", "books"]).mutates());
        assert!(!parse(&["circdesk", "librarian", "audit"]).mutates());
        assert!(!parse(&["circdesk", "init-config", "circdesk.json"]).mutates());
    }

    #[test]
    fn test_cli_init_config() {
        let cli = Cli::try_parse_from([
            "circdesk",
            "init-config",
            "/etc/circdesk.json",
            "--data-dir",
            "/var/lib/circdesk",
            "--force",
        ])
        .unwrap();
        match cli.command {
            Commands::InitConfig { path, force } => {
                assert_eq!(path.to_str().unwrap(), "/etc/circdesk.json");
                assert!(force);
            }
            _ => panic!("Expected InitConfig command"),
        }
        assert_eq!(cli.data_dir.unwrap().to_str().unwrap(), "/var/lib/circdesk");
    }
}
