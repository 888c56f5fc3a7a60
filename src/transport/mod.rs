use std::{borrow::Cow, error::Error};

use tonic::{service::interceptor::InterceptedService, transport::Channel};

use crate::auth::MacaroonInterceptor;

type BoxError = Box<dyn Error + Send + Sync>;

/// An encrypted channel with the macaroon attached to every call.
///
/// Cloning is cheap and all clones multiplex over the same HTTP/2 connection, so
/// one `Connection` serves the request path and the invoice subscription alike.
pub type Connection = InterceptedService<Channel, MacaroonInterceptor>;

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("{context}")]
    Connection {
        context: Cow<'static, str>,
        #[source]
        source: Option<BoxError>,
    },
}

impl TransportError {
    /// Build a connection error with context and an underlying source.
    pub fn connection<S, E>(context: S, source: E) -> Self
    where
        S: Into<Cow<'static, str>>,
        E: Error + Send + Sync + 'static,
    {
        Self::Connection {
            context: context.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Build a connection error that only has context (no underlying source).
    pub fn connection_message<S>(context: S) -> Self
    where
        S: Into<Cow<'static, str>>,
    {
        Self::Connection {
            context: context.into(),
            source: None,
        }
    }
}

#[cfg(feature = "transport-direct")]
pub mod direct;
