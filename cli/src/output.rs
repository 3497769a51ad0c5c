#[derive(Clone, Copy, clap::ValueEnum)]
pub(crate) enum OutputFormat {
    /// Human-readable text
    Text,
    /// JSON format
    Json,
}

/// Container written by `convert`.
#[derive(Clone, Copy, Default, clap::ValueEnum)]
pub(crate) enum KeyFormat {
    /// OPENSSH PRIVATE KEY (openssh-key-v1)
    #[default]
    Openssh,
    /// Classic PEM (RSA/EC/DSA PRIVATE KEY)
    Pem,
}

impl From<KeyFormat> for sshkey::Format {
    fn from(format: KeyFormat) -> Self {
        match format {
            KeyFormat::Openssh => sshkey::Format::OpenSSHv1,
            KeyFormat::Pem => sshkey::Format::ClassicPem,
        }
    }
}
