use std::fmt::Write as _;
use std::path::PathBuf;
use std::str::FromStr;

use base64::{Engine, engine::general_purpose::STANDARD};
use clap::Args;
use pem::{DEK_INFO_HEADER, Label, Pem};
use serde::Serialize;
use sshkey::KeyMaterial;
use tracing::debug;

use crate::error::Result;
use crate::output::OutputFormat;
use crate::utils::{PassphraseArgs, read_input};

#[derive(Args)]
pub(crate) struct Config {
    /// Path to the private key. If not specified, reads from stdin
    pub(crate) file: Option<PathBuf>,

    /// Output format (text, json)
    #[arg(short, long, value_enum, default_value = "text")]
    pub(crate) output: OutputFormat,

    #[command(flatten)]
    pub(crate) passphrase: PassphraseArgs,
}

#[derive(Debug, Default, Serialize)]
struct KeyInfo {
    format: String,
    label: String,
    encrypted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    cipher: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kdf: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    rounds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bits: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    public_key: Option<String>,
    /// Whether the private half was decoded and checked.
    decoded: bool,
}

impl KeyInfo {
    fn fill_from_key(&mut self, key: &KeyMaterial) -> Result<()> {
        self.key_type = Some(key.key_type().to_string());
        self.bits = Some(key.key_size());
        self.public_key = key.authorized_key().ok();
        self.decoded = true;
        Ok(key.validate()?)
    }

    fn to_text(&self) -> Result<String> {
        let mut out = String::new();
        writeln!(out, "Format: {}", self.format)?;
        writeln!(out, "Label: {}", self.label)?;
        writeln!(out, "Encrypted: {}", if self.encrypted { "yes" } else { "no" })?;
        if let Some(cipher) = &self.cipher {
            writeln!(out, "Cipher: {}", cipher)?;
        }
        match (&self.kdf, self.rounds) {
            (Some(kdf), Some(rounds)) => writeln!(out, "KDF: {} ({} rounds)", kdf, rounds)?,
            (Some(kdf), None) => writeln!(out, "KDF: {}", kdf)?,
            _ => {}
        }
        if let Some(key_type) = &self.key_type {
            writeln!(out, "Key type: {}", key_type)?;
        }
        if let Some(bits) = self.bits {
            writeln!(out, "Key size: {} bits", bits)?;
        }
        if let Some(public_key) = &self.public_key {
            writeln!(out, "Public key: {}", public_key)?;
        }
        Ok(out)
    }
}

fn classic_key_type(label: &Label) -> Option<String> {
    match label {
        Label::RSAPrivateKey => Some("ssh-rsa".to_string()),
        Label::DSAPrivateKey => Some("ssh-dss".to_string()),
        _ => None,
    }
}

pub(crate) fn execute(config: Config) -> Result<()> {
    let input = read_input(config.file.as_deref())?;
    let contents = String::from_utf8(input)?;
    let pem = Pem::from_str(&contents)?;
    let passphrase = config.passphrase.resolve()?;
    let passphrase = passphrase.as_deref().map(Vec::as_slice);

    let mut info = KeyInfo {
        label: pem.label().to_string(),
        ..Default::default()
    };

    match pem.label() {
        Label::OpenSSHPrivateKey => {
            let container = sshkey::openssh::inspect(contents.as_bytes())?;
            info.format = "openssh-key-v1".to_string();
            info.encrypted = container.is_encrypted();
            info.cipher = Some(container.cipher.clone());
            info.kdf = Some(container.kdf.clone());
            info.rounds = container.rounds;
            info.key_type = Some(container.key_type.clone());
            info.public_key = Some(format!(
                "{} {}",
                container.key_type,
                STANDARD.encode(&container.public_key_blob)
            ));
        }
        Label::RSAPrivateKey | Label::ECPrivateKey | Label::DSAPrivateKey => {
            info.format = "pem".to_string();
            info.encrypted = pem.is_encrypted();
            info.cipher = pem
                .header(DEK_INFO_HEADER)
                .and_then(|dek| dek.split(',').next())
                .map(|name| name.trim().to_string());
            if info.encrypted {
                info.kdf = Some("EVP_BytesToKey".to_string());
            }
            info.key_type = classic_key_type(pem.label());
        }
        other => return Err(format!("not a private key: {}", other).into()),
    }

    if !info.encrypted || passphrase.is_some() {
        let key = sshkey::parse_encrypted_raw_private_key(contents.as_bytes(), passphrase)?;
        info.fill_from_key(&key)?;
    } else {
        debug!("no passphrase, skipping private key");
    }

    match config.output {
        OutputFormat::Text => print!("{}", info.to_text()?),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&info)?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_skips_missing_fields() {
        let info = KeyInfo {
            format: "pem".to_string(),
            label: "RSA PRIVATE KEY".to_string(),
            encrypted: true,
            cipher: Some("AES-128-CBC".to_string()),
            kdf: Some("EVP_BytesToKey".to_string()),
            key_type: Some("ssh-rsa".to_string()),
            ..Default::default()
        };
        let text = info.to_text().unwrap();
        assert!(text.contains("Encrypted: yes\n"));
        assert!(text.contains("Cipher: AES-128-CBC\n"));
        assert!(text.contains("KDF: EVP_BytesToKey\n"));
        assert!(!text.contains("Key size"));
        assert!(!text.contains("Public key"));
    }
}
