//! Error types for the telemetry client.
//!
//! None of these terminate the client. Decode failures drop a single frame
//! or response, transport failures feed the reconnect machine, and query
//! failures leave the previous snapshot in place until the next tick.

/// A payload did not match the fixed schema for its record type.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The payload is not valid JSON, a field has the wrong type, a
    /// required field is missing, or an enum value is out of range.
    #[error("schema violation in {record}: {source}")]
    Schema {
        /// The record type being decoded.
        record: &'static str,
        /// The underlying deserialization error.
        source: serde_json::Error,
    },
}

impl DecodeError {
    /// Wrap a `serde_json` failure for the named record type.
    pub const fn schema(record: &'static str, source: serde_json::Error) -> Self {
        Self::Schema { record, source }
    }
}

/// The stream transport failed to open or broke mid-stream.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The connection could not be established.
    #[error("connect failed: {0}")]
    Connect(String),

    /// The established connection failed while reading.
    #[error("stream read failed: {0}")]
    Read(String),

    /// The stream URL could not be derived from the configured base URL.
    #[error("invalid stream url: {0}")]
    Url(String),
}

/// A query against the observer's request/response API failed.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, refused, timeout, ...).
    #[error("request to {endpoint} failed: {message}")]
    Request {
        /// The path that was queried.
        endpoint: String,
        /// The transport failure.
        message: String,
    },

    /// The server answered with a non-success status.
    #[error("{endpoint} returned {status}: {body}")]
    Status {
        /// The path that was queried.
        endpoint: String,
        /// The HTTP status code.
        status: u16,
        /// The response body, for diagnostics.
        body: String,
    },

    /// The response body did not match the expected schema.
    #[error("{endpoint} returned an undecodable body: {source}")]
    Decode {
        /// The path that was queried.
        endpoint: String,
        /// The decode failure.
        source: DecodeError,
    },

    /// The configured base URL could not be joined with the endpoint path.
    #[error("invalid url for {endpoint}: {message}")]
    Url {
        /// The path that was being joined.
        endpoint: String,
        /// The parse failure.
        message: String,
    },
}

/// The telemetry client could not be started.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// The query client could not be built.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The stream URL could not be derived.
    #[error(transparent)]
    Transport(#[from] TransportError),
}
