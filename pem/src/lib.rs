pub mod error;

use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use base64::{Engine, engine::general_purpose::STANDARD};
use error::Error;
use kagi::decoder::{DecodableFrom, Decoder};
use regex::Regex;

const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
const RSA_PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";
const EC_PRIVATE_KEY_LABEL: &str = "EC PRIVATE KEY";
const DSA_PRIVATE_KEY_LABEL: &str = "DSA PRIVATE KEY";
const OPENSSH_PRIVATE_KEY_LABEL: &str = "OPENSSH PRIVATE KEY";

/// Header names of the RFC 1421 legacy encryption scheme.
pub const PROC_TYPE_HEADER: &str = "Proc-Type";
pub const DEK_INFO_HEADER: &str = "DEK-Info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Label {
    /// PKCS#8 private key
    PrivateKey,
    /// PKCS#1 RSA private key
    RSAPrivateKey,
    /// SEC1 EC private key
    ECPrivateKey,
    /// OpenSSL DSA private key
    DSAPrivateKey,
    /// openssh-key-v1 container
    OpenSSHPrivateKey,
    /// Any other well-formed label. Kept verbatim so callers can report it.
    Other(String),
}

impl Display for Label {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Label::PrivateKey => write!(f, "{}", PRIVATE_KEY_LABEL),
            Label::RSAPrivateKey => write!(f, "{}", RSA_PRIVATE_KEY_LABEL),
            Label::ECPrivateKey => write!(f, "{}", EC_PRIVATE_KEY_LABEL),
            Label::DSAPrivateKey => write!(f, "{}", DSA_PRIVATE_KEY_LABEL),
            Label::OpenSSHPrivateKey => write!(f, "{}", OPENSSH_PRIVATE_KEY_LABEL),
            Label::Other(s) => write!(f, "{}", s),
        }
    }
}

impl From<&str> for Label {
    fn from(s: &str) -> Self {
        match s {
            PRIVATE_KEY_LABEL => Label::PrivateKey,
            RSA_PRIVATE_KEY_LABEL => Label::RSAPrivateKey,
            EC_PRIVATE_KEY_LABEL => Label::ECPrivateKey,
            DSA_PRIVATE_KEY_LABEL => Label::DSAPrivateKey,
            OPENSSH_PRIVATE_KEY_LABEL => Label::OpenSSHPrivateKey,
            other => Label::Other(other.to_string()),
        }
    }
}

/// Which side of the body a boundary line sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Boundary {
    Begin,
    End,
}

impl Label {
    fn get_label(line: &str) -> Result<(Boundary, Label), Error> {
        let re = Regex::new(r"^-----(BEGIN|END) ([A-Z0-9 ]+)-----\s*$")
            .map_err(|_| Error::InvalidEncapsulationBoundary)?;
        let captured = re
            .captures(line)
            .ok_or(Error::InvalidEncapsulationBoundary)?;
        let boundary = match captured.get(1).map(|m| m.as_str()) {
            Some("BEGIN") => Boundary::Begin,
            Some("END") => Boundary::End,
            _ => return Err(Error::InvalidEncapsulationBoundary),
        };
        let label = captured
            .get(2)
            .ok_or(Error::InvalidEncapsulationBoundary)?
            .as_str();
        Ok((boundary, Label::from(label)))
    }
}

/*
ref: https://www.rfc-editor.org/rfc/rfc7468.html#section-3
ref: https://www.rfc-editor.org/rfc/rfc1421.html#section-4.4 (encapsulated headers)
*/

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pem {
    label: Label,
    headers: Vec<(String, String)>,
    base64_data: String, // base64 encoded data
}

impl Pem {
    pub fn new(label: Label, base64_data: String) -> Self {
        Pem {
            label,
            headers: Vec::new(),
            base64_data,
        }
    }

    pub fn from_bytes(label: Label, data: &[u8]) -> Self {
        Pem::new(label, STANDARD.encode(data))
    }

    /// Appends an encapsulated header. Order is preserved on output.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn label(&self) -> &Label {
        &self.label
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Looks up a header value by name, case-sensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// True when the block carries RFC 1421 legacy encryption headers.
    pub fn is_encrypted(&self) -> bool {
        self.header(PROC_TYPE_HEADER)
            .is_some_and(|v| v.contains("ENCRYPTED"))
    }

    pub fn data(&self) -> &str {
        &self.base64_data
    }
}

impl Display for Pem {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "-----BEGIN {}-----", self.label)?;
        if !self.headers.is_empty() {
            for (name, value) in &self.headers {
                writeln!(f, "{}: {}", name, value)?;
            }
            writeln!(f)?;
        }
        // RFC 7468: base64 text should be wrapped at 64 characters
        for chunk in self.base64_data.as_bytes().chunks(64) {
            let line = std::str::from_utf8(chunk).map_err(|_| std::fmt::Error)?;
            writeln!(f, "{}", line)?;
        }
        write!(f, "-----END {}-----", self.label)
    }
}

impl DecodableFrom<Pem> for Vec<u8> {}

impl Decoder<Pem, Vec<u8>> for Pem {
    type Error = Error;

    fn decode(&self) -> Result<Vec<u8>, Self::Error> {
        // Labels and headers are dropped here; callers inspect them first.
        STANDARD.decode(self.data()).map_err(Error::Base64Decode)
    }
}

impl DecodableFrom<String> for Pem {}

impl Decoder<String, Pem> for String {
    type Error = Error;

    fn decode(&self) -> Result<Pem, Self::Error> {
        Pem::from_str(self)
    }
}

impl DecodableFrom<&str> for Pem {}

impl Decoder<&str, Pem> for &str {
    type Error = Error;

    fn decode(&self) -> Result<Pem, Self::Error> {
        Pem::from_str(self)
    }
}

impl FromStr for Pem {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut state = PemParsingState::default();
        let mut label = Label::Other(String::new());
        let mut headers = vec![];
        let mut base64_lines = vec![];
        let mut base64_finl_lines = vec![];
        let mut lines = s.lines();
        loop {
            match state {
                PemParsingState::Init => match lines.next() {
                    Some(line) => {
                        if let Ok((boundary, l)) = Label::get_label(line.trim_start()) {
                            if boundary == Boundary::End {
                                return Err(Error::MissingPreEncapsulationBoundary);
                            }
                            label = l;
                            state = PemParsingState::PreEncapsulationBoundary;
                        }
                        // Anything before the first boundary is explanatory text.
                    }
                    None => return Err(Error::MissingPreEncapsulationBoundary),
                },
                PemParsingState::PreEncapsulationBoundary => match lines.next() {
                    Some(line) => {
                        if line.is_empty() || Label::get_label(line).is_ok() {
                            return Err(Error::MissingData);
                        }
                        if headers.is_empty() && base64_lines.is_empty() && is_header(line) {
                            headers.push(parse_header(line)?);
                            state = PemParsingState::Headers;
                        } else if is_base64_finl(line) {
                            base64_finl_lines.push(line);
                            state = PemParsingState::Base64Finl;
                        } else {
                            base64_lines.push(line);
                            state = PemParsingState::Base64Lines;
                        }
                    }
                    None => return Err(Error::MissingData),
                },
                PemParsingState::Headers => match lines.next() {
                    Some(line) => {
                        if line.trim().is_empty() {
                            // blank line closes the header block
                            state = PemParsingState::PreEncapsulationBoundary;
                        } else if is_header(line) {
                            headers.push(parse_header(line)?);
                        } else {
                            return Err(Error::InvalidHeader(line.to_string()));
                        }
                    }
                    None => return Err(Error::MissingPostEncapsulationBoundary),
                },
                PemParsingState::Base64Lines => match lines.next() {
                    Some(line) => {
                        if line.is_empty() {
                            return Err(Error::InvalidBase64Line);
                        }
                        if let Ok((_, l)) = Label::get_label(line) {
                            // reach postdb
                            if l.ne(&label) {
                                return Err(Error::LabelMissMatch);
                            }
                            state = PemParsingState::PostEncapsulationBoundary;
                        } else if is_base64_finl(line) {
                            base64_finl_lines.push(line);
                            state = PemParsingState::Base64Finl;
                        } else {
                            base64_lines.push(line.trim_end());
                        }
                    }
                    None => return Err(Error::MissingPostEncapsulationBoundary),
                },
                PemParsingState::Base64Finl => match lines.next() {
                    Some(line) => {
                        if line.is_empty() {
                            return Err(Error::InvalidBase64Finl);
                        }
                        if let Ok((_, l)) = Label::get_label(line) {
                            if l.ne(&label) {
                                return Err(Error::LabelMissMatch);
                            }
                            state = PemParsingState::PostEncapsulationBoundary;
                        } else {
                            if !is_base64_finl(line) {
                                return Err(Error::InvalidBase64Finl);
                            }
                            base64_finl_lines.push(line);
                        }
                    }
                    None => return Err(Error::MissingPostEncapsulationBoundary),
                },
                PemParsingState::PostEncapsulationBoundary => break,
            }
        }
        let finl = base64_finl(&base64_finl_lines)?;
        base64_lines.push(&finl);

        Ok(Pem {
            label,
            headers,
            base64_data: base64_lines.join(""),
        })
    }
}

/*
* pre-eb -> headers -> blank -|
*    |--------------------->  |-> base64finl ------------> post-eb
*                             |-> base64lines -|---------->
*                                  |_|
 */
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
enum PemParsingState {
    #[default]
    Init,
    PreEncapsulationBoundary,
    Headers,
    Base64Lines,
    Base64Finl,
    PostEncapsulationBoundary,
}

// base64 never contains ':', so a colon marks an encapsulated header.
fn is_header(line: &str) -> bool {
    line.contains(':')
}

fn parse_header(line: &str) -> Result<(String, String), Error> {
    let (name, value) = line
        .split_once(':')
        .ok_or_else(|| Error::InvalidHeader(line.to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::InvalidHeader(line.to_string()));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

fn base64_finl(lines: &[&str]) -> Result<String, Error> {
    // base64finl = *base64char (base64pad *WSP eol base64pad / *2base64pad) *WSP eol
    if lines.iter().any(|l| l.is_empty()) {
        return Err(Error::InvalidBase64Finl);
    }
    let lines = lines.iter().map(|l| l.trim()).collect::<Vec<&str>>();
    Ok(lines.join(""))
}

fn is_base64_finl(line: &str) -> bool {
    line.contains('=')
}
