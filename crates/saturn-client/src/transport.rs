//! HTTP/1.1 over the daemon's local transport.

use bytes::Bytes;
use http_body_util::{BodyExt, Empty};
use hyper::Request;
use hyper::client::conn::http1;
use hyper_util::rt::TokioIo;
use saturn_protocol::Endpoint;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
#[cfg(unix)]
use tokio::net::UnixStream;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

/// Send one request on a fresh connection and return the response body.
pub async fn send(endpoint: &Endpoint, request: Request<Empty<Bytes>>) -> ClientResult<String> {
    match endpoint {
        #[cfg(unix)]
        Endpoint::Unix(path) => exchange(UnixStream::connect(path).await?, request).await,
        Endpoint::Tcp(addr) => exchange(TcpStream::connect(addr).await?, request).await,
    }
}

async fn exchange<S>(stream: S, request: Request<Empty<Bytes>>) -> ClientResult<String>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (mut sender, connection) = http1::handshake(TokioIo::new(stream)).await?;
    tokio::spawn(async move {
        if let Err(err) = connection.await {
            debug!("Connection closed: {}", err);
        }
    });

    // Dropping the pending response makes the connection task close the socket
    let response = sender.send_request(request).await?;
    let status = response.status();
    let body = response.into_body().collect().await?.to_bytes();
    if !status.is_success() {
        return Err(ClientError::Transport(format!("unexpected status {status}")));
    }
    String::from_utf8(body.to_vec())
        .map_err(|e| ClientError::Transport(format!("response body is not UTF-8: {e}")))
}
