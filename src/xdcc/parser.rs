//! DCC offer parsing and bot-rejection classification.
//!
//! Parses `DCC SEND <filename> <ip> <port> [<size>]` CTCP payloads into a
//! [`DccSendOffer`], and classifies free-text rejection notices from bots
//! against known phrasings.

use std::net::{IpAddr, Ipv4Addr};

use crate::xdcc::event::AbortReason;
use crate::xdcc::security;

/// A parsed, sanitized DCC SEND offer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DccSendOffer {
    /// Offered filename, sanitized to a bare file name.
    pub filename: String,
    /// Address to connect to for the data stream.
    pub ip: IpAddr,
    pub port: u16,
    /// Announced byte size; 0 when the bot did not announce one.
    pub size: u64,
}

/// Parse a `DCC SEND` CTCP payload into a [`DccSendOffer`].
///
/// Handles both quoted and unquoted filenames. The address may be either a
/// decimal network-byte-order u32 (the common form) or an IP literal, which
/// some IPv6 bots send. The size field is optional; a missing size means the
/// bot streams until it closes the connection.
pub fn parse_dcc_send(ctcp: &str) -> Option<DccSendOffer> {
    let content = ctcp.strip_prefix("DCC SEND ")?;

    let (filename, rest) = if let Some(quoted) = content.strip_prefix('"') {
        let end = quoted.find('"')?;
        (&quoted[..end], quoted[end + 1..].trim_start())
    } else {
        let end = content.find(' ')?;
        (&content[..end], content[end + 1..].trim_start())
    };

    let mut fields = rest.split_whitespace();
    let ip = parse_offer_addr(fields.next()?)?;
    let port: u16 = fields.next()?.parse().ok()?;
    let size: u64 = match fields.next() {
        Some(raw) => raw.parse().ok()?,
        None => 0,
    };

    let filename = security::sanitize_filename(filename)?;

    Some(DccSendOffer {
        filename,
        ip,
        port,
        size,
    })
}

fn parse_offer_addr(raw: &str) -> Option<IpAddr> {
    if let Ok(decimal) = raw.parse::<u32>() {
        return Some(IpAddr::V4(Ipv4Addr::from(decimal)));
    }
    raw.parse::<IpAddr>().ok()
}

/// Classify a rejection notice from a bot or the network.
///
/// Matching is case-insensitive and substring based, so it degrades
/// gracefully: unrecognized phrasings become [`AbortReason::Rejected`] with
/// the original text preserved.
pub fn classify_rejection(text: &str) -> AbortReason {
    let lowered = text.to_lowercase();
    if lowered.contains("queue is full") || lowered.contains("queue full") {
        AbortReason::QueueFull
    } else if lowered.contains("no slots") || lowered.contains("all slots") {
        AbortReason::NoSlots
    } else if lowered.contains("known channel") || lowered.contains("join a channel") {
        AbortReason::ChannelRequired
    } else if lowered.contains("banned") {
        AbortReason::Banned
    } else {
        AbortReason::Rejected(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_offer() {
        let offer = parse_dcc_send("DCC SEND file.tar.gz 3232235521 2000 1048576").unwrap();
        assert_eq!(
            offer,
            DccSendOffer {
                filename: "file.tar.gz".into(),
                ip: "192.168.0.1".parse().unwrap(),
                port: 2000,
                size: 1048576,
            }
        );
    }

    #[test]
    fn parses_quoted_filename() {
        let offer = parse_dcc_send("DCC SEND \"two words.mkv\" 134744072 5001 42").unwrap();
        assert_eq!(offer.filename, "two words.mkv");
        assert_eq!(offer.ip, "8.8.8.8".parse::<IpAddr>().unwrap());
        assert_eq!(offer.port, 5001);
        assert_eq!(offer.size, 42);
    }

    #[test]
    fn parses_ip_literal_and_missing_size() {
        let offer = parse_dcc_send("DCC SEND file.bin 2001:db8::1 6000").unwrap();
        assert_eq!(offer.ip, "2001:db8::1".parse::<IpAddr>().unwrap());
        assert_eq!(offer.size, 0);
    }

    #[test]
    fn sanitizes_offered_filename() {
        let offer = parse_dcc_send("DCC SEND ../../etc/passwd 134744072 5001 10").unwrap();
        assert_eq!(offer.filename, "passwd");
    }

    #[test]
    fn rejects_malformed_offers() {
        assert_eq!(parse_dcc_send("DCC CHAT chat 134744072 5001"), None);
        assert_eq!(parse_dcc_send("DCC SEND lonely.bin"), None);
        assert_eq!(parse_dcc_send("DCC SEND f.bin notanip 5001 10"), None);
        assert_eq!(parse_dcc_send("DCC SEND f.bin 134744072 70000 10"), None);
    }

    #[test]
    fn classifies_known_rejections() {
        assert_eq!(
            classify_rejection("Sorry, the queue is full. Try again later."),
            AbortReason::QueueFull
        );
        assert_eq!(
            classify_rejection("** All Slots Full, no slots open"),
            AbortReason::NoSlots
        );
        assert_eq!(
            classify_rejection("You must be on a known channel to request a pack"),
            AbortReason::ChannelRequired
        );
        assert_eq!(
            classify_rejection("You are BANNED from this bot"),
            AbortReason::Banned
        );
    }

    #[test]
    fn unknown_rejection_keeps_original_text() {
        let text = "the stars are not aligned";
        assert_eq!(
            classify_rejection(text),
            AbortReason::Rejected(text.to_string())
        );
    }
}
