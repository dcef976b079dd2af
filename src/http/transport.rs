use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::{Client, ClientBuilder, Request};
use url::Url;

use crate::args::VolleyArgs;
use crate::error::HttpError;

/// What the engine keeps from a response once its body has been released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResponseMeta {
    pub status: u16,
    pub body_bytes: u64,
}

/// Issues one request and awaits one response.
///
/// Implementations own whatever connection state they need; the engine never
/// shares a transport between workers.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: Request) -> Result<ResponseMeta, HttpError>;
}

/// Creates one [`Transport`] per worker.
pub trait TransportFactory: Send + Sync + 'static {
    type Transport: Transport + 'static;

    /// # Errors
    ///
    /// Returns an error when the transport cannot be constructed; only the
    /// worker that asked for it is affected.
    fn create_transport(&self) -> Result<Self::Transport, HttpError>;
}

/// Builds the GET request every iteration sends to the target.
pub(crate) fn build_request(target: &Url) -> Result<Request, HttpError> {
    let request = http::Request::get(target.as_str())
        .body(Vec::<u8>::new())
        .map_err(|err| HttpError::BuildRequestFailed { source: err })?;
    Request::try_from(request).map_err(|err| HttpError::ConvertRequestFailed { source: err })
}

/// Construction-time parameters of the reqwest-backed transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub insecure: bool,
    pub http2: bool,
    pub http3: bool,
}

impl ClientSettings {
    #[must_use]
    pub fn from_args(args: &VolleyArgs) -> Self {
        Self {
            request_timeout: args.request_timeout,
            connect_timeout: args.connect_timeout,
            insecure: args.insecure,
            http2: args.http2,
            http3: args.http3,
        }
    }

    fn validate(&self) -> Result<(), HttpError> {
        if self.http2 && self.http3 {
            return Err(HttpError::Http2Http3Conflict);
        }
        if self.http3 && !cfg!(feature = "http3") {
            return Err(HttpError::Http3NotEnabled);
        }
        Ok(())
    }
}

/// Builds an independent `reqwest::Client` for every worker.
#[derive(Debug, Clone)]
pub struct ReqwestFactory {
    settings: ClientSettings,
}

impl ReqwestFactory {
    /// # Errors
    ///
    /// Returns an error when the settings ask for a protocol combination this
    /// build cannot provide.
    pub fn new(settings: ClientSettings) -> Result<Self, HttpError> {
        settings.validate()?;
        Ok(Self { settings })
    }
}

impl TransportFactory for ReqwestFactory {
    type Transport = ReqwestTransport;

    fn create_transport(&self) -> Result<ReqwestTransport, HttpError> {
        let mut client_builder = Client::builder()
            .timeout(self.settings.request_timeout)
            .connect_timeout(self.settings.connect_timeout);

        if self.settings.insecure {
            client_builder = client_builder
                .danger_accept_invalid_certs(true)
                .danger_accept_invalid_hostnames(true);
        }
        client_builder = apply_protocol(client_builder, &self.settings);

        let client = client_builder
            .build()
            .map_err(|err| HttpError::BuildClientFailed { source: err })?;
        Ok(ReqwestTransport { client })
    }
}

fn apply_protocol(builder: ClientBuilder, settings: &ClientSettings) -> ClientBuilder {
    #[cfg(feature = "http3")]
    if settings.http3 {
        return builder.http3_prior_knowledge();
    }
    if settings.http2 {
        return builder.http2_prior_knowledge();
    }
    builder
}

#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(&self, request: Request) -> Result<ResponseMeta, HttpError> {
        let response = self
            .client
            .execute(request)
            .await
            .map_err(|err| HttpError::RequestFailed { source: err })?;
        let status = response.status().as_u16();
        let body_bytes = drain_response_body(response)
            .await
            .map_err(|err| HttpError::ReadBodyFailed { source: err })?;
        Ok(ResponseMeta { status, body_bytes })
    }
}

async fn drain_response_body(response: reqwest::Response) -> Result<u64, reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
    }
    Ok(total_bytes)
}
