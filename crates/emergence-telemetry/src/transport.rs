//! Stream transports.
//!
//! The connection task is generic over [`Transport`] so tests can script
//! opens, frames, and failures without a socket. [`WsTransport`] is the
//! production implementation over `tokio-tungstenite`.

use std::future::Future;

use futures::stream::{BoxStream, Stream, StreamExt};
use reqwest::Url;
use tokio_tungstenite::tungstenite::Message;

use crate::error::TransportError;

/// Something that can open a stream of text frames.
///
/// The returned stream yields one item per text message. It ends when the
/// peer closes; an `Err` item means the connection broke. Either way the
/// connection task drops it and schedules a retry.
pub trait Transport: Send + Sync + 'static {
    /// The open stream.
    type Stream: Stream<Item = Result<String, TransportError>> + Send + Unpin + 'static;

    /// Open a new subscription to `url`.
    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Stream, TransportError>> + Send;
}

/// WebSocket transport for the observer's `/ws/ticks` endpoint.
#[derive(Debug, Clone, Copy, Default)]
pub struct WsTransport;

impl Transport for WsTransport {
    type Stream = BoxStream<'static, Result<String, TransportError>>;

    fn connect(&self, url: &str) -> impl Future<Output = Result<Self::Stream, TransportError>> + Send {
        let url = url.to_owned();
        async move {
            let (socket, _response) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::Connect(format!("{url}: {e}")))?;

            let frames = socket
                .filter_map(|message| async move {
                    match message {
                        Ok(Message::Text(text)) => Some(Ok(text.as_str().to_owned())),
                        // Invalid UTF-8 becomes U+FFFD; the codec rejects the result as JSON.
                        Ok(Message::Binary(bytes)) => {
                            Some(Ok(String::from_utf8_lossy(&bytes).into_owned()))
                        }
                        Ok(Message::Ping(_) | Message::Pong(_) | Message::Close(_) | Message::Frame(_)) => {
                            None
                        }
                        Err(e) => Some(Err(TransportError::Read(e.to_string()))),
                    }
                })
                .boxed();

            Ok(frames)
        }
    }
}

/// Derive the stream URL from the observer's HTTP base URL.
///
/// `http` becomes `ws` and `https` becomes `wss`; the path is replaced by
/// `stream_path`.
pub fn stream_url(base_url: &str, stream_path: &str) -> Result<String, TransportError> {
    let base = Url::parse(base_url).map_err(|e| TransportError::Url(format!("{base_url}: {e}")))?;
    let mut url = base
        .join(stream_path)
        .map_err(|e| TransportError::Url(format!("{stream_path}: {e}")))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => return Err(TransportError::Url(format!("unsupported scheme {other}"))),
    };
    url.set_scheme(scheme)
        .map_err(|()| TransportError::Url(format!("cannot switch {base_url} to {scheme}")))?;

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn http_base_becomes_ws() {
        let url = stream_url("http://localhost:8080", "/ws/ticks").ok();
        assert_eq!(url.as_deref(), Some("ws://localhost:8080/ws/ticks"));
    }

    #[test]
    fn https_base_becomes_wss_and_path_is_replaced() {
        let url = stream_url("https://observer.example/api/", "/ws/ticks").ok();
        assert_eq!(url.as_deref(), Some("wss://observer.example/ws/ticks"));
    }

    #[test]
    fn unsupported_scheme_is_rejected() {
        assert!(matches!(
            stream_url("ftp://observer.example", "/ws/ticks"),
            Err(TransportError::Url(_))
        ));
        assert!(stream_url("not a url", "/ws/ticks").is_err());
    }
}
