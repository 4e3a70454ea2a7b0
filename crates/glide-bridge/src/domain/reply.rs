//! Caller-visible success values.

use bytes::Bytes;

/// Successful outcome of an operation.
///
/// A native success callback either carries bytes or nothing at all. What
/// "nothing" means depends on the command, so the null case is split into
/// [`Reply::Ok`] and [`Reply::Nil`] by the operation's
/// [`RequestType`](crate::domain::request_type::RequestType).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Command acknowledged (e.g. `SET`).
    Ok,
    /// Command succeeded but there is no value (e.g. `GET` on a missing key).
    Nil,
    /// Payload returned by the engine.
    Data(Bytes),
}

impl Reply {
    /// Canonical acknowledgement text, as the store itself would reply.
    pub const OK_TEXT: &'static str = "OK";

    pub fn is_nil(&self) -> bool {
        matches!(self, Reply::Nil)
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Reply::Ok)
    }

    /// Raw payload, if any.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Reply::Data(data) => Some(data),
            Reply::Ok | Reply::Nil => None,
        }
    }

    /// Payload as UTF-8. Acknowledgements render as `"OK"`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Reply::Ok => Some(Self::OK_TEXT),
            Reply::Nil => None,
            Reply::Data(data) => std::str::from_utf8(data).ok(),
        }
    }

    /// Parse an integer payload (replies to `DEL`, `INCR`, `EXISTS`, ...).
    pub fn as_i64(&self) -> Option<i64> {
        self.as_str()?.parse().ok()
    }
}

impl From<Bytes> for Reply {
    fn from(data: Bytes) -> Self {
        Reply::Data(data)
    }
}
