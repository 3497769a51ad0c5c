use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod convert;
mod error;
mod inspect;
mod output;
mod pubkey;
mod utils;

use error::Result;

#[derive(Parser)]
#[command(name = "kagi")]
#[command(about = "OpenSSH and PEM private key toolkit", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace). RUST_LOG overrides
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Re-encode a private key, changing its container or passphrase
    ///
    /// Without a new passphrase an OpenSSH key is written with cipher `none`
    /// and an unpadded private section. OpenSSH 9.x pads that section to 8
    /// bytes and refuses to load such a file, so give unencrypted keys meant
    /// for ssh a passphrase or convert them with `--format pem`.
    Convert {
        #[command(flatten)]
        config: convert::Config,
    },
    /// Describe a private key file
    Inspect {
        #[command(flatten)]
        config: inspect::Config,
    },
    /// Print the authorized_keys line of a private key
    Pubkey {
        #[command(flatten)]
        config: pubkey::Config,
    },
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Convert { config } => convert::execute(config)?,
        Commands::Inspect { config } => inspect::execute(config)?,
        Commands::Pubkey { config } => pubkey::execute(config)?,
    }

    Ok(())
}
