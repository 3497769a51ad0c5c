use std::path::PathBuf;

use clap::Args;
use sshkey::MarshalOptions;
use tracing::debug;

use crate::error::Result;
use crate::output::KeyFormat;
use crate::utils::{NewPassphraseArgs, PassphraseArgs, read_input, write_output};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the private key. If not specified, reads from stdin
    pub(crate) file: Option<PathBuf>,

    /// Write the converted key here instead of stdout
    #[arg(long, value_name = "PATH")]
    pub(crate) out: Option<PathBuf>,

    /// Container of the converted key
    #[arg(short, long, value_enum, default_value = "openssh")]
    pub(crate) format: KeyFormat,

    #[command(flatten)]
    pub(crate) passphrase: PassphraseArgs,

    #[command(flatten)]
    pub(crate) new_passphrase: NewPassphraseArgs,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let input = read_input(config.file.as_deref())?;
    let passphrase = config.passphrase.resolve()?;
    let key = sshkey::parse_encrypted_raw_private_key(&input, passphrase.as_deref().map(Vec::as_slice))?;
    debug!(key_type = key.key_type(), bits = key.key_size(), "decoded input key");

    let mut options = MarshalOptions::default().with_format(config.format.into());
    if let Some(new_passphrase) = config.new_passphrase.resolve()? {
        options = options.with_passphrase(&new_passphrase);
    }
    let encoded = sshkey::marshal(&key, &options)?;
    write_output(config.out.as_deref(), &encoded)
}
