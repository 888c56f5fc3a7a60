// Generated prost/tonic code when build.rs found lnd protos under protos/lnd/<tag>.
#[cfg(lnrpc_generated)]
pub mod lnrpc {
    #![allow(clippy::all, clippy::pedantic, deprecated)]
    include!(concat!(env!("OUT_DIR"), "/lnrpc.rs"));
}

// Otherwise, checked-in code for the slice of lnd's `lnrpc` package this crate speaks.
// Field tags and method paths follow lnd's `lightning.proto`.
#[cfg(not(lnrpc_generated))]
pub mod lnrpc {
    #![allow(clippy::all, clippy::pedantic)]

    #[derive(serde::Serialize, serde::Deserialize)]
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct ListPeersRequest {
        #[prost(bool, tag = "1")]
        pub latest_error: bool,
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct ListPeersResponse {
        #[prost(message, repeated, tag = "1")]
        pub peers: ::prost::alloc::vec::Vec<Peer>,
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Peer {
        #[prost(string, tag = "1")]
        pub pub_key: ::prost::alloc::string::String,
        #[prost(string, tag = "3")]
        pub address: ::prost::alloc::string::String,
        #[prost(uint64, tag = "4")]
        pub bytes_sent: u64,
        #[prost(uint64, tag = "5")]
        pub bytes_recv: u64,
        #[prost(int64, tag = "6")]
        pub sat_sent: i64,
        #[prost(int64, tag = "7")]
        pub sat_recv: i64,
        #[prost(bool, tag = "8")]
        pub inbound: bool,
        #[prost(int64, tag = "9")]
        pub ping_time: i64,
        #[prost(int32, tag = "13")]
        pub flap_count: i32,
        #[prost(int64, tag = "14")]
        pub last_flap_ns: i64,
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct Invoice {
        #[prost(string, tag = "1")]
        pub memo: ::prost::alloc::string::String,
        #[prost(bytes = "vec", tag = "3")]
        pub r_preimage: ::prost::alloc::vec::Vec<u8>,
        #[prost(bytes = "vec", tag = "4")]
        pub r_hash: ::prost::alloc::vec::Vec<u8>,
        #[prost(int64, tag = "5")]
        pub value: i64,
        #[prost(bool, tag = "6")]
        pub settled: bool,
        #[prost(int64, tag = "7")]
        pub creation_date: i64,
        #[prost(int64, tag = "8")]
        pub settle_date: i64,
        #[prost(string, tag = "9")]
        pub payment_request: ::prost::alloc::string::String,
        #[prost(bytes = "vec", tag = "10")]
        pub description_hash: ::prost::alloc::vec::Vec<u8>,
        #[prost(int64, tag = "11")]
        pub expiry: i64,
        #[prost(string, tag = "12")]
        pub fallback_addr: ::prost::alloc::string::String,
        #[prost(uint64, tag = "13")]
        pub cltv_expiry: u64,
        #[prost(bool, tag = "15")]
        pub private: bool,
        #[prost(uint64, tag = "16")]
        pub add_index: u64,
        #[prost(uint64, tag = "17")]
        pub settle_index: u64,
        #[prost(int64, tag = "19")]
        pub amt_paid_sat: i64,
        #[prost(int64, tag = "20")]
        pub amt_paid_msat: i64,
        #[prost(enumeration = "invoice::InvoiceState", tag = "21")]
        pub state: i32,
        #[prost(int64, tag = "23")]
        pub value_msat: i64,
        #[prost(bool, tag = "25")]
        pub is_keysend: bool,
        #[prost(bytes = "vec", tag = "26")]
        pub payment_addr: ::prost::alloc::vec::Vec<u8>,
        #[prost(bool, tag = "27")]
        pub is_amp: bool,
    }

    /// Nested message and enum types in `Invoice`.
    pub mod invoice {
        #[derive(serde::Serialize, serde::Deserialize)]
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
        #[repr(i32)]
        pub enum InvoiceState {
            Open = 0,
            Settled = 1,
            Canceled = 2,
            Accepted = 3,
        }

        impl InvoiceState {
            pub fn as_str_name(&self) -> &'static str {
                match self {
                    Self::Open => "OPEN",
                    Self::Settled => "SETTLED",
                    Self::Canceled => "CANCELED",
                    Self::Accepted => "ACCEPTED",
                }
            }
        }
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct AddInvoiceResponse {
        #[prost(bytes = "vec", tag = "1")]
        pub r_hash: ::prost::alloc::vec::Vec<u8>,
        #[prost(string, tag = "2")]
        pub payment_request: ::prost::alloc::string::String,
        #[prost(uint64, tag = "16")]
        pub add_index: u64,
        #[prost(bytes = "vec", tag = "17")]
        pub payment_addr: ::prost::alloc::vec::Vec<u8>,
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PayReqString {
        #[prost(string, tag = "1")]
        pub pay_req: ::prost::alloc::string::String,
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PayReq {
        #[prost(string, tag = "1")]
        pub destination: ::prost::alloc::string::String,
        #[prost(string, tag = "2")]
        pub payment_hash: ::prost::alloc::string::String,
        #[prost(int64, tag = "3")]
        pub num_satoshis: i64,
        #[prost(int64, tag = "4")]
        pub timestamp: i64,
        #[prost(int64, tag = "5")]
        pub expiry: i64,
        #[prost(string, tag = "6")]
        pub description: ::prost::alloc::string::String,
        #[prost(string, tag = "7")]
        pub description_hash: ::prost::alloc::string::String,
        #[prost(string, tag = "8")]
        pub fallback_addr: ::prost::alloc::string::String,
        #[prost(int64, tag = "9")]
        pub cltv_expiry: i64,
        #[prost(bytes = "vec", tag = "11")]
        pub payment_addr: ::prost::alloc::vec::Vec<u8>,
        #[prost(int64, tag = "12")]
        pub num_msat: i64,
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    #[derive(Clone, PartialEq, ::prost::Message)]
    pub struct PaymentHash {
        #[prost(string, tag = "1")]
        pub r_hash_str: ::prost::alloc::string::String,
        #[prost(bytes = "vec", tag = "2")]
        pub r_hash: ::prost::alloc::vec::Vec<u8>,
    }

    #[derive(serde::Serialize, serde::Deserialize)]
    #[derive(Clone, Copy, PartialEq, ::prost::Message)]
    pub struct InvoiceSubscription {
        #[prost(uint64, tag = "1")]
        pub add_index: u64,
        #[prost(uint64, tag = "2")]
        pub settle_index: u64,
    }

    /// Generated client implementations.
    pub mod lightning_client {
        #![allow(
            unused_variables,
            dead_code,
            missing_docs,
            clippy::wildcard_imports,
            clippy::let_unit_value
        )]
        use tonic::codegen::http::Uri;
        use tonic::codegen::*;

        #[derive(Debug, Clone)]
        pub struct LightningClient<T> {
            inner: tonic::client::Grpc<T>,
        }

        impl<T> LightningClient<T>
        where
            T: tonic::client::GrpcService<tonic::body::BoxBody>,
            T::Error: Into<StdError>,
            T::ResponseBody: Body<Data = Bytes> + std::marker::Send + 'static,
            <T::ResponseBody as Body>::Error: Into<StdError> + std::marker::Send,
        {
            pub fn new(inner: T) -> Self {
                let inner = tonic::client::Grpc::new(inner);
                Self { inner }
            }

            pub fn with_origin(inner: T, origin: Uri) -> Self {
                let inner = tonic::client::Grpc::with_origin(inner, origin);
                Self { inner }
            }

            async fn ready(&mut self) -> std::result::Result<(), tonic::Status> {
                self.inner.ready().await.map_err(|e| {
                    tonic::Status::unknown(format!("Service was not ready: {}", e.into()))
                })
            }

            pub async fn list_peers(
                &mut self,
                request: impl tonic::IntoRequest<super::ListPeersRequest>,
            ) -> std::result::Result<tonic::Response<super::ListPeersResponse>, tonic::Status>
            {
                self.ready().await?;
                let codec = tonic::codec::ProstCodec::default();
                let path = http::uri::PathAndQuery::from_static("/lnrpc.Lightning/ListPeers");
                let mut req = request.into_request();
                req.extensions_mut()
                    .insert(GrpcMethod::new("lnrpc.Lightning", "ListPeers"));
                self.inner.unary(req, path, codec).await
            }

            pub async fn add_invoice(
                &mut self,
                request: impl tonic::IntoRequest<super::Invoice>,
            ) -> std::result::Result<tonic::Response<super::AddInvoiceResponse>, tonic::Status>
            {
                self.ready().await?;
                let codec = tonic::codec::ProstCodec::default();
                let path = http::uri::PathAndQuery::from_static("/lnrpc.Lightning/AddInvoice");
                let mut req = request.into_request();
                req.extensions_mut()
                    .insert(GrpcMethod::new("lnrpc.Lightning", "AddInvoice"));
                self.inner.unary(req, path, codec).await
            }

            pub async fn decode_pay_req(
                &mut self,
                request: impl tonic::IntoRequest<super::PayReqString>,
            ) -> std::result::Result<tonic::Response<super::PayReq>, tonic::Status> {
                self.ready().await?;
                let codec = tonic::codec::ProstCodec::default();
                let path = http::uri::PathAndQuery::from_static("/lnrpc.Lightning/DecodePayReq");
                let mut req = request.into_request();
                req.extensions_mut()
                    .insert(GrpcMethod::new("lnrpc.Lightning", "DecodePayReq"));
                self.inner.unary(req, path, codec).await
            }

            pub async fn lookup_invoice(
                &mut self,
                request: impl tonic::IntoRequest<super::PaymentHash>,
            ) -> std::result::Result<tonic::Response<super::Invoice>, tonic::Status> {
                self.ready().await?;
                let codec = tonic::codec::ProstCodec::default();
                let path = http::uri::PathAndQuery::from_static("/lnrpc.Lightning/LookupInvoice");
                let mut req = request.into_request();
                req.extensions_mut()
                    .insert(GrpcMethod::new("lnrpc.Lightning", "LookupInvoice"));
                self.inner.unary(req, path, codec).await
            }

            pub async fn subscribe_invoices(
                &mut self,
                request: impl tonic::IntoRequest<super::InvoiceSubscription>,
            ) -> std::result::Result<
                tonic::Response<tonic::codec::Streaming<super::Invoice>>,
                tonic::Status,
            > {
                self.ready().await?;
                let codec = tonic::codec::ProstCodec::default();
                let path =
                    http::uri::PathAndQuery::from_static("/lnrpc.Lightning/SubscribeInvoices");
                let mut req = request.into_request();
                req.extensions_mut()
                    .insert(GrpcMethod::new("lnrpc.Lightning", "SubscribeInvoices"));
                self.inner.server_streaming(req, path, codec).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use prost::Message;

    use super::lnrpc::{invoice::InvoiceState, Invoice, InvoiceSubscription};

    #[test]
    fn invoice_state_decodes_from_wire_tag() {
        let inv = Invoice {
            state: InvoiceState::Settled as i32,
            add_index: 7,
            ..Invoice::default()
        };
        let buf = inv.encode_to_vec();
        // field 21 (varint) = 0xa8 0x01, field 16 (varint) = 0x80 0x01
        assert!(buf.windows(3).any(|w| w == [0xa8, 0x01, 0x01]));
        assert!(buf.windows(3).any(|w| w == [0x80, 0x01, 0x07]));
        let back = Invoice::decode(buf.as_slice()).expect("decode");
        assert_eq!(InvoiceState::try_from(back.state).ok(), Some(InvoiceState::Settled));
    }

    #[test]
    fn zero_cursor_encodes_empty() {
        let sub = InvoiceSubscription::default();
        assert!(sub.encode_to_vec().is_empty());
    }
}
