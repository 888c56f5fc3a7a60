use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use crate::{
    auth::MacaroonInterceptor,
    config::{MACAROON_FILE, TLS_CERT_FILE},
    macaroon::{Macaroon, MacaroonError},
};

#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    #[error("could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("could not decode macaroon: {0}")]
    Decode(#[from] MacaroonError),
}

/// TLS certificate and macaroon used to reach a single lnd node.
///
/// Both parts are read once and never change; the value is moved into the
/// [`crate::transport::Connection`] it authorizes.
#[derive(Clone)]
pub struct Credential {
    tls_cert: Vec<u8>,
    macaroon: Macaroon,
}

impl Credential {
    /// Read `tls.cert` and `admin.macaroon` from an lnd data directory.
    ///
    /// # Errors
    /// [`CredentialError::Io`] when either file cannot be read, [`CredentialError::Decode`] when
    /// the macaroon is not a well-formed binary macaroon.
    pub fn load(data_dir: impl AsRef<Path>) -> Result<Self, CredentialError> {
        let data_dir = data_dir.as_ref();
        let macaroon = read(&data_dir.join(MACAROON_FILE))?;
        let tls_cert = read(&data_dir.join(TLS_CERT_FILE))?;
        Self::from_parts(tls_cert, &macaroon)
    }

    /// Build a credential from bytes sourced elsewhere (secret store, env, ...).
    ///
    /// # Errors
    /// Returns [`CredentialError::Decode`] when the macaroon bytes are malformed.
    pub fn from_parts(tls_cert_pem: Vec<u8>, macaroon: &[u8]) -> Result<Self, CredentialError> {
        let macaroon = Macaroon::decode(macaroon)?;
        Ok(Self {
            tls_cert: tls_cert_pem,
            macaroon,
        })
    }

    /// PEM-encoded certificate the node presents; trusted as the sole CA.
    #[must_use]
    pub fn tls_cert(&self) -> &[u8] {
        &self.tls_cert
    }

    #[must_use]
    pub fn macaroon(&self) -> &Macaroon {
        &self.macaroon
    }

    /// Per-call authorization attachment, reusable across every call on a channel.
    #[must_use]
    pub fn interceptor(&self) -> MacaroonInterceptor {
        MacaroonInterceptor::new(&self.macaroon)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("tls_cert_len", &self.tls_cert.len())
            .field("macaroon", &self.macaroon)
            .finish()
    }
}

fn read(path: &Path) -> Result<Vec<u8>, CredentialError> {
    std::fs::read(path).map_err(|source| CredentialError::Io {
        path: path.to_path_buf(),
        source,
    })
}
