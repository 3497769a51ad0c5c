use std::path::PathBuf;

use base64::{Engine, engine::general_purpose::STANDARD};
use clap::Args;
use pem::{Label, Pem};
use std::str::FromStr;

use crate::error::Result;
use crate::utils::{PassphraseArgs, read_input};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the private key. If not specified, reads from stdin
    pub(crate) file: Option<PathBuf>,

    /// Comment appended to the authorized_keys line
    #[arg(short, long)]
    pub(crate) comment: Option<String>,

    #[command(flatten)]
    pub(crate) passphrase: PassphraseArgs,
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let input = read_input(config.file.as_deref())?;
    let contents = String::from_utf8(input)?;
    let pem = Pem::from_str(&contents)?;

    // openssh-key-v1 stores the public key in the clear
    let line = if pem.label() == &Label::OpenSSHPrivateKey {
        let info = sshkey::openssh::inspect(contents.as_bytes())?;
        format!("{} {}", info.key_type, STANDARD.encode(&info.public_key_blob))
    } else {
        let passphrase = config.passphrase.resolve()?;
        let key = sshkey::parse_encrypted_raw_private_key(
            contents.as_bytes(),
            passphrase.as_deref().map(Vec::as_slice),
        )?;
        key.authorized_key()?
    };

    match config.comment {
        Some(comment) => println!("{} {}", line, comment),
        None => println!("{}", line),
    }
    Ok(())
}
