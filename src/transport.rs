use std::future::Future;

use log::debug;
use reqwest::Client;

use crate::{
    error::{describe_chain, Error, ProbeFailure, Result},
    request::ProbeRequest,
};

/// Summary of a completed exchange.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct Exchange {
    pub status: u16,
    pub body_len: u64,
}

/// Performs one HTTP exchange for a probe.
///
/// An implementation must drain the whole response body before resolving
/// with `Ok`. Failures are classified into [`ProbeFailure`] variants.
pub trait Transport: Send + Sync + 'static {
    fn send(
        &self,
        request: ProbeRequest,
    ) -> impl Future<Output = std::result::Result<Exchange, ProbeFailure>> + Send;
}

/// [`Transport`] backed by `reqwest`.
///
/// Idle connections are not kept, so every exchange opens and releases its own
/// connection.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// # Errors
    /// Returns an error if the TLS backend cannot be initialised.
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|err| {
                Error::Opaque(format!("failed to create http client, reason: {}", err).into())
            })?;
        Ok(Self { client })
    }
}

impl Transport for HttpTransport {
    fn send(
        &self,
        request: ProbeRequest,
    ) -> impl Future<Output = std::result::Result<Exchange, ProbeFailure>> + Send {
        let client = self.client.clone();
        async move {
            let mut builder = client
                .request(request.method, request.url)
                .headers(request.headers)
                .timeout(request.timeout);
            if let Some(body) = request.body {
                builder = builder.body(body);
            }
            let request = builder
                .build()
                .map_err(|err| ProbeFailure::RequestConstruction(describe_chain(&err)))?;

            let url = request.url().clone();
            let mut response = client
                .execute(request)
                .await
                .map_err(|err| ProbeFailure::Transport(describe_chain(&err)))?;
            let status = response.status();

            let mut body_len = 0u64;
            loop {
                match response.chunk().await {
                    Ok(Some(chunk)) => body_len += chunk.len() as u64,
                    Ok(None) => break,
                    Err(err) if err.is_timeout() => {
                        return Err(ProbeFailure::Transport(describe_chain(&err)))
                    }
                    Err(err) => return Err(ProbeFailure::BodyRead(describe_chain(&err))),
                }
            }
            debug!("{} answered {} with {} body bytes", url, status, body_len);

            Ok(Exchange {
                status: status.as_u16(),
                body_len,
            })
        }
    }
}
