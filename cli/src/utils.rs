use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::Args;
use zeroize::Zeroizing;

use crate::error::Result;

/// Passphrase of the key being read.
#[derive(Args)]
pub(crate) struct PassphraseArgs {
    /// Read the passphrase from the first line of a file
    #[arg(long, value_name = "PATH")]
    pub(crate) passphrase_file: Option<PathBuf>,

    /// Passphrase of the input key
    #[arg(long, env = "KAGI_PASSPHRASE", hide = true, hide_env_values = true)]
    pub(crate) passphrase: Option<String>,
}

impl PassphraseArgs {
    pub(crate) fn resolve(&self) -> Result<Option<Zeroizing<Vec<u8>>>> {
        resolve(self.passphrase_file.as_deref(), self.passphrase.as_deref())
    }
}

/// Passphrase protecting the key being written.
#[derive(Args)]
pub(crate) struct NewPassphraseArgs {
    /// Read the new passphrase from the first line of a file
    #[arg(long, value_name = "PATH")]
    pub(crate) new_passphrase_file: Option<PathBuf>,

    /// Passphrase of the output key
    #[arg(long, env = "KAGI_NEW_PASSPHRASE", hide = true, hide_env_values = true)]
    pub(crate) new_passphrase: Option<String>,
}

impl NewPassphraseArgs {
    pub(crate) fn resolve(&self) -> Result<Option<Zeroizing<Vec<u8>>>> {
        resolve(
            self.new_passphrase_file.as_deref(),
            self.new_passphrase.as_deref(),
        )
    }
}

// A file takes precedence over the environment.
fn resolve(file: Option<&Path>, value: Option<&str>) -> Result<Option<Zeroizing<Vec<u8>>>> {
    if let Some(path) = file {
        let contents = Zeroizing::new(fs::read(path)?);
        let line = contents
            .split(|b| *b == b'\n')
            .next()
            .unwrap_or_default();
        let line = line.strip_suffix(b"\r").unwrap_or(line);
        return Ok(Some(Zeroizing::new(line.to_vec())));
    }
    Ok(value.map(|v| Zeroizing::new(v.as_bytes().to_vec())))
}

/// Read input from a file or stdin
///
/// If `file` is `Some`, reads from the specified file path.
/// If `file` is `None`, reads from stdin.
pub(crate) fn read_input(file: Option<&Path>) -> Result<Vec<u8>> {
    match file {
        Some(path) => Ok(fs::read(path)?),
        None => {
            let mut buffer = Vec::new();
            io::stdin().read_to_end(&mut buffer)?;
            Ok(buffer)
        }
    }
}

/// Writes `data` to `file`, or stdout when `None`.
///
/// Files are created owner-readable only since they hold private keys.
pub(crate) fn write_output(file: Option<&Path>, data: &[u8]) -> Result<()> {
    match file {
        Some(path) => {
            let mut options = fs::OpenOptions::new();
            options.write(true).create(true).truncate(true);
            #[cfg(unix)]
            {
                use std::os::unix::fs::OpenOptionsExt;
                options.mode(0o600);
            }
            options.open(path)?.write_all(data)?;
        }
        None => io::stdout().write_all(data)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_passphrase_file_first_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pass");
        fs::write(&path, "s3cret\r\nignored\n").unwrap();
        let resolved = resolve(Some(&path), Some("from-env")).unwrap().unwrap();
        assert_eq!(b"s3cret".as_slice(), resolved.as_slice());
    }

    #[test]
    fn test_passphrase_from_env_value() {
        let resolved = resolve(None, Some("from-env")).unwrap().unwrap();
        assert_eq!(b"from-env".as_slice(), resolved.as_slice());
        assert!(resolve(None, None).unwrap().is_none());
    }
}
