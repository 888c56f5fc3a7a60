use tonic::{metadata::AsciiMetadataValue, service::Interceptor, Request, Status};

use crate::macaroon::Macaroon;

/// Metadata key lnd reads the hex-encoded macaroon from.
pub const MACAROON_HEADER: &str = "macaroon";

/// Attaches a macaroon to every outgoing call.
///
/// The header value is encoded once up front; each call only clones it. Wrap a
/// channel with [`tonic::service::interceptor::InterceptedService`] (see
/// [`crate::transport::Connection`]) so callers never attach it by hand.
#[derive(Clone, Debug)]
pub struct MacaroonInterceptor {
    value: AsciiMetadataValue,
}

impl MacaroonInterceptor {
    #[must_use]
    pub fn new(macaroon: &Macaroon) -> Self {
        Self::from_hex(&macaroon.to_hex())
    }

    fn from_hex(hex: &str) -> Self {
        // Lowercase hex is always a valid ASCII header value.
        let value = AsciiMetadataValue::try_from(hex)
            .unwrap_or_else(|_| AsciiMetadataValue::from_static(""));
        Self { value }
    }

    /// The header value attached to each call.
    #[must_use]
    pub fn header_value(&self) -> &AsciiMetadataValue {
        &self.value
    }
}

impl Interceptor for MacaroonInterceptor {
    fn call(&mut self, mut req: Request<()>) -> Result<Request<()>, Status> {
        if self.value.is_empty() {
            return Err(Status::unauthenticated("no macaroon configured"));
        }
        req.metadata_mut().insert(MACAROON_HEADER, self.value.clone());
        Ok(req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::macaroon::tests::sample_macaroon_bytes;

    #[test]
    fn attaches_hex_macaroon_header() {
        let bytes = sample_macaroon_bytes();
        let mac = Macaroon::decode(&bytes).expect("decode");
        let mut interceptor = MacaroonInterceptor::new(&mac);

        let req = interceptor.call(Request::new(())).expect("intercept");
        let got = req
            .metadata()
            .get(MACAROON_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        assert_eq!(got, Some(hex::encode(&bytes)));
    }

    #[test]
    fn overwrites_caller_supplied_header() {
        let mac = Macaroon::decode(&sample_macaroon_bytes()).expect("decode");
        let mut interceptor = MacaroonInterceptor::new(&mac);

        let mut req = Request::new(());
        req.metadata_mut()
            .insert(MACAROON_HEADER, AsciiMetadataValue::from_static("bogus"));
        let req = interceptor.call(req).expect("intercept");
        assert_eq!(req.metadata().get_all(MACAROON_HEADER).iter().count(), 1);
        assert_ne!(
            req.metadata().get(MACAROON_HEADER),
            Some(&AsciiMetadataValue::from_static("bogus"))
        );
    }

    #[test]
    fn empty_value_is_rejected() {
        let mut interceptor = MacaroonInterceptor::from_hex("");
        let err = interceptor.call(Request::new(())).expect_err("must fail");
        assert_eq!(err.code(), tonic::Code::Unauthenticated);
    }
}
