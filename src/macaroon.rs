//! Structural decoding of binary (version 2) macaroons.
//!
//! lnd writes `admin.macaroon` in the V2 binary format. This module checks the
//! layout and exposes the identifier, caveats and signature; it does not verify
//! the HMAC chain, which only the node can do.

use std::fmt;

const VERSION_2: u8 = 2;
const SIGNATURE_LEN: usize = 32;

const FIELD_EOS: u64 = 0;
const FIELD_LOCATION: u64 = 1;
const FIELD_IDENTIFIER: u64 = 2;
const FIELD_VID: u64 = 4;
const FIELD_SIGNATURE: u64 = 6;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MacaroonError {
    #[error("macaroon is empty")]
    Empty,
    #[error("unsupported macaroon version byte {0:#04x}")]
    UnsupportedVersion(u8),
    #[error("macaroon truncated")]
    UnexpectedEof,
    #[error("varint overflows u64")]
    VarintOverflow,
    #[error("expected field type {expected}, found {found}")]
    UnexpectedField { expected: u64, found: u64 },
    #[error("macaroon location is not valid UTF-8")]
    InvalidLocation,
    #[error("signature must be {SIGNATURE_LEN} bytes, got {0}")]
    BadSignatureLength(usize),
    #[error("{0} trailing bytes after signature")]
    TrailingBytes(usize),
}

/// A third-party or first-party caveat attached to a macaroon.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Caveat {
    pub location: Option<String>,
    pub id: Vec<u8>,
    pub verification_id: Option<Vec<u8>>,
}

impl Caveat {
    #[must_use]
    pub fn is_first_party(&self) -> bool {
        self.verification_id.is_none()
    }
}

/// A decoded macaroon which keeps its original serialization so it can be
/// forwarded to the node byte-for-byte.
#[derive(Clone, PartialEq, Eq)]
pub struct Macaroon {
    raw: Vec<u8>,
    location: Option<String>,
    identifier: Vec<u8>,
    caveats: Vec<Caveat>,
    signature: [u8; SIGNATURE_LEN],
}

impl Macaroon {
    /// Decode a V2 binary macaroon.
    ///
    /// # Errors
    /// Returns [`MacaroonError`] when the bytes do not follow the V2 field layout.
    pub fn decode(bytes: &[u8]) -> Result<Self, MacaroonError> {
        let (&version, rest) = bytes.split_first().ok_or(MacaroonError::Empty)?;
        if version != VERSION_2 {
            return Err(MacaroonError::UnsupportedVersion(version));
        }
        let mut r = Reader { buf: rest };

        let location = r.optional_field(FIELD_LOCATION)?.map(utf8).transpose()?;
        let identifier = r.field(FIELD_IDENTIFIER)?.to_vec();
        r.eos()?;

        let mut caveats = Vec::new();
        while r.peek_type()? != FIELD_EOS {
            let location = r.optional_field(FIELD_LOCATION)?.map(utf8).transpose()?;
            let id = r.field(FIELD_IDENTIFIER)?.to_vec();
            let verification_id = r.optional_field(FIELD_VID)?.map(<[u8]>::to_vec);
            r.eos()?;
            caveats.push(Caveat {
                location,
                id,
                verification_id,
            });
        }
        r.eos()?;

        let sig = r.field(FIELD_SIGNATURE)?;
        let signature: [u8; SIGNATURE_LEN] = sig
            .try_into()
            .map_err(|_| MacaroonError::BadSignatureLength(sig.len()))?;
        if !r.buf.is_empty() {
            return Err(MacaroonError::TrailingBytes(r.buf.len()));
        }

        Ok(Self {
            raw: bytes.to_vec(),
            location,
            identifier,
            caveats,
            signature,
        })
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Lowercase hex of the binary encoding, the form lnd expects in the
    /// `macaroon` request header.
    #[must_use]
    pub fn to_hex(&self) -> String {
        hex::encode(&self.raw)
    }

    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    #[must_use]
    pub fn identifier(&self) -> &[u8] {
        &self.identifier
    }

    #[must_use]
    pub fn caveats(&self) -> &[Caveat] {
        &self.caveats
    }

    #[must_use]
    pub fn signature(&self) -> &[u8; SIGNATURE_LEN] {
        &self.signature
    }
}

// Bearer credential: never print the signature or raw bytes.
impl fmt::Debug for Macaroon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Macaroon")
            .field("location", &self.location)
            .field("identifier", &hex::encode(&self.identifier))
            .field("caveats", &self.caveats.len())
            .finish_non_exhaustive()
    }
}

fn utf8(bytes: &[u8]) -> Result<String, MacaroonError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|_| MacaroonError::InvalidLocation)
}

struct Reader<'a> {
    buf: &'a [u8],
}

impl<'a> Reader<'a> {
    fn uvarint(&mut self) -> Result<u64, MacaroonError> {
        let mut value: u64 = 0;
        for (i, &b) in self.buf.iter().enumerate().take(10) {
            if i == 9 && b > 1 {
                return Err(MacaroonError::VarintOverflow);
            }
            value |= u64::from(b & 0x7f) << (7 * i);
            if b & 0x80 == 0 {
                self.buf = &self.buf[i + 1..];
                return Ok(value);
            }
        }
        if self.buf.len() >= 10 {
            Err(MacaroonError::VarintOverflow)
        } else {
            Err(MacaroonError::UnexpectedEof)
        }
    }

    fn peek_type(&self) -> Result<u64, MacaroonError> {
        Reader { buf: self.buf }.uvarint()
    }

    fn eos(&mut self) -> Result<(), MacaroonError> {
        match self.uvarint()? {
            FIELD_EOS => Ok(()),
            found => Err(MacaroonError::UnexpectedField {
                expected: FIELD_EOS,
                found,
            }),
        }
    }

    fn body(&mut self) -> Result<&'a [u8], MacaroonError> {
        let len = usize::try_from(self.uvarint()?).map_err(|_| MacaroonError::VarintOverflow)?;
        if self.buf.len() < len {
            return Err(MacaroonError::UnexpectedEof);
        }
        let (data, rest) = self.buf.split_at(len);
        self.buf = rest;
        Ok(data)
    }

    fn field(&mut self, expected: u64) -> Result<&'a [u8], MacaroonError> {
        let found = self.uvarint()?;
        if found != expected {
            return Err(MacaroonError::UnexpectedField { expected, found });
        }
        self.body()
    }

    fn optional_field(&mut self, ty: u64) -> Result<Option<&'a [u8]>, MacaroonError> {
        if self.peek_type()? == ty {
            self.uvarint()?;
            self.body().map(Some)
        } else {
            Ok(None)
        }
    }
}
