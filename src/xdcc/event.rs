//! Transfer lifecycle events and abort reasons.
//!
//! One transfer emits at most one [`TransferEvent::Started`] (always first),
//! any number of [`TransferEvent::Progress`], and exactly one terminal event
//! ([`TransferEvent::Completed`] or [`TransferEvent::Aborted`]) before the
//! event channel is closed.

use std::net::IpAddr;
use thiserror::Error;

/// A lifecycle event for one transfer, delivered in order over the transfer's
/// event channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransferEvent {
    /// The data connection is open. `file_size` is the size announced in the
    /// DCC offer; 0 when the bot did not announce one.
    Started { file_size: u64 },
    /// Bytes received since the previous progress event, and the receive rate
    /// (bytes/sec) over that window.
    Progress { bytes: u64, rate: u64 },
    /// All announced bytes were received and written.
    Completed,
    /// The transfer ended without completing.
    Aborted { reason: AbortReason },
}

/// Why a transfer failed, either as a `start()` error or inside a terminal
/// [`TransferEvent::Aborted`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AbortReason {
    /// Bot rejection, classified from known phrasings.
    #[error("bot's transfer queue is full")]
    QueueFull,
    #[error("bot has no open slots")]
    NoSlots,
    #[error("bot requires joining one of its channels first")]
    ChannelRequired,
    #[error("banned by the bot")]
    Banned,
    /// Rejection text that matched no known phrasing; the original text is
    /// preserved.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The bot sent a DCC offer that could not be parsed.
    #[error("malformed DCC offer: {0}")]
    MalformedOffer(String),
    /// A handshake phase timed out. The payload names the phase.
    #[error("timed out while {0}")]
    Timeout(&'static str),
    /// The caller invoked `abort()`.
    #[error("transfer cancelled")]
    Cancelled,
    /// `start()` was called on a transfer that already ran.
    #[error("transfer already started")]
    AlreadyStarted,

    /// The offer pointed at a private/loopback address and the configuration
    /// does not allow those.
    #[error("offer from private address {0} refused")]
    PrivateAddress(IpAddr),
    /// The announced size exceeds the configured limit.
    #[error("announced size {size} exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
    /// The stream ended early or delivered more than the announced size.
    #[error("size mismatch: expected {expected} bytes, received {received}")]
    SizeMismatch { expected: u64, received: u64 },

    /// Connection-level failure (DNS, refused, reset, IRC errors).
    #[error("network error: {0}")]
    Network(String),
    /// Could not create or write the destination file; the underlying
    /// filesystem error text is preserved.
    #[error("i/o error: {0}")]
    Io(String),
}
