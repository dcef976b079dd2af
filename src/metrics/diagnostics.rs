use std::net::SocketAddr;
use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::error::{AppError, AppResult, MetricsError};
use crate::shutdown::CancelSignal;

use super::latency::{LatencyRecorder, LatencySnapshot};
use super::tally::{OutcomeTally, TallySnapshot};

/// Path that serves the live counters.
pub const DIAGNOSTICS_PATH: &str = "/debug/vars";

const MAX_REQUEST_BYTES: usize = 8 * 1024;

/// Live view of a running load test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticsSnapshot {
    pub breakdown: TallySnapshot,
    pub latency: LatencySnapshot,
}

/// Serves [`DiagnosticsSnapshot`] as JSON over plain HTTP/1.1 while a run is
/// in progress.
#[derive(Debug)]
pub struct DiagnosticsServer {
    listener: TcpListener,
    tally: Arc<OutcomeTally>,
    latency: Arc<LatencyRecorder>,
}

impl DiagnosticsServer {
    /// Binds the listener; serving starts with [`DiagnosticsServer::serve`].
    ///
    /// # Errors
    ///
    /// Returns an error when the address cannot be bound.
    pub async fn bind(
        addr: &str,
        tally: Arc<OutcomeTally>,
        latency: Arc<LatencyRecorder>,
    ) -> AppResult<Self> {
        let listener = TcpListener::bind(addr).await.map_err(|err| {
            AppError::metrics(MetricsError::Bind {
                addr: addr.to_owned(),
                source: err,
            })
        })?;
        Ok(Self {
            listener,
            tally,
            latency,
        })
    }

    /// # Errors
    ///
    /// Returns an error when the bound address cannot be read back.
    pub fn local_addr(&self) -> AppResult<SocketAddr> {
        self.listener.local_addr().map_err(|err| {
            AppError::metrics(MetricsError::Io {
                context: "read diagnostics address",
                source: err,
            })
        })
    }

    /// Accepts connections until `shutdown` fires.
    pub async fn serve(self, mut shutdown: CancelSignal) {
        if let Ok(addr) = self.listener.local_addr() {
            info!("Diagnostics listening on http://{}{}", addr, DIAGNOSTICS_PATH);
        }
        loop {
            tokio::select! {
                biased;
                () = shutdown.cancelled() => break,
                accepted = self.listener.accept() => {
                    let (socket, _) = match accepted {
                        Ok(result) => result,
                        Err(err) => {
                            warn!("Failed to accept diagnostics connection: {}", err);
                            continue;
                        }
                    };
                    let snapshot = DiagnosticsSnapshot {
                        breakdown: self.tally.snapshot(),
                        latency: self.latency.snapshot(),
                    };
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(socket, &snapshot).await {
                            debug!("Diagnostics connection failed: {}", err);
                        }
                    });
                }
            }
        }
        debug!("Diagnostics listener stopped");
    }
}

async fn handle_connection(mut socket: TcpStream, snapshot: &DiagnosticsSnapshot) -> AppResult<()> {
    let head = read_request_head(&mut socket).await?;
    let mut parts = head.split_whitespace();
    let method = parts.next().unwrap_or_default();
    let path = parts.next().unwrap_or_default();

    if method != "GET" {
        return write_error_response(&mut socket, 405, "Only GET is supported").await;
    }
    if path != DIAGNOSTICS_PATH && path != "/" {
        return write_error_response(&mut socket, 404, "Not found").await;
    }
    let body = serde_json::to_vec(snapshot).map_err(|err| {
        AppError::metrics(MetricsError::Serialize {
            context: "diagnostics snapshot",
            source: err,
        })
    })?;
    write_response(&mut socket, 200, &body).await
}

/// Reads up to the end of the request headers and returns the request line.
async fn read_request_head(socket: &mut TcpStream) -> AppResult<String> {
    let mut buffer: Vec<u8> = Vec::with_capacity(512);
    let mut chunk = [0u8; 512];
    loop {
        let bytes = socket.read(&mut chunk).await.map_err(|err| {
            AppError::metrics(MetricsError::Io {
                context: "read diagnostics request",
                source: err,
            })
        })?;
        if bytes == 0 {
            break;
        }
        if let Some(read_slice) = chunk.get(..bytes) {
            buffer.extend_from_slice(read_slice);
        }
        if buffer.windows(4).any(|window| window == b"\r\n\r\n")
            || buffer.len() > MAX_REQUEST_BYTES
        {
            break;
        }
    }
    let text = String::from_utf8_lossy(&buffer);
    Ok(text.lines().next().unwrap_or_default().to_owned())
}

const fn status_text(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        405 => "Method Not Allowed",
        _ => "Bad Request",
    }
}

async fn write_error_response(socket: &mut TcpStream, status: u16, message: &str) -> AppResult<()> {
    #[derive(Serialize)]
    struct ErrorResponse<'msg> {
        error: &'msg str,
    }
    let body = serde_json::to_vec(&ErrorResponse { error: message }).map_err(|err| {
        AppError::metrics(MetricsError::Serialize {
            context: "diagnostics error response",
            source: err,
        })
    })?;
    write_response(socket, status, &body).await
}

async fn write_response(socket: &mut TcpStream, status: u16, body: &[u8]) -> AppResult<()> {
    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        status,
        status_text(status),
        body.len()
    );
    socket.write_all(head.as_bytes()).await.map_err(|err| {
        AppError::metrics(MetricsError::Io {
            context: "write diagnostics response",
            source: err,
        })
    })?;
    socket.write_all(body).await.map_err(|err| {
        AppError::metrics(MetricsError::Io {
            context: "write diagnostics response body",
            source: err,
        })
    })?;
    Ok(())
}
