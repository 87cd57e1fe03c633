//! Pack locators.
//!
//! An [`IrcFile`] names exactly one pack on one network: where to connect,
//! which channel (if any) the bot requires, which bot to ask, and which pack
//! number to request. Locator equality is field-by-field and is what the
//! search aggregator deduplicates on.
//!
//! The text form is a small URL-like grammar, kept stable because locators
//! are printed by `search` and fed back to `fetch`:
//!
//! ```text
//! irc://<host>[:<port>]/[<#channel>/]<bot>/<pack>
//! ```
//!
//! The port is omitted when it is the default (6667). The channel segment is
//! present only when the bot requires channel membership and always keeps its
//! leading `#` (or `&`). `parse(format(loc)) == loc` holds for every valid
//! locator.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Default plaintext IRC port, omitted from the text form.
pub const DEFAULT_IRC_PORT: u16 = 6667;

/// Default TLS IRC port, used when a TLS-only transfer is asked for on a
/// locator that does not name an explicit port.
pub const DEFAULT_IRC_TLS_PORT: u16 = 6697;

/// Identifies one pack offered by one bot on one IRC network.
///
/// Immutable once constructed; two locators are equal iff all fields are
/// equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct IrcFile {
    /// Network host name or address.
    pub network: String,
    /// Port to connect to (6667 when unspecified in the text form).
    pub port: u16,
    /// Channel the bot requires membership of, if any.
    pub channel: Option<String>,
    /// Nickname of the bot offering the pack.
    pub bot: String,
    /// Pack number to request.
    pub pack: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocatorError {
    #[error("locator must start with irc://")]
    BadScheme,
    #[error("locator has no path after the host")]
    MissingPath,
    #[error("locator host is empty")]
    EmptyHost,
    #[error("invalid port: {0}")]
    BadPort(String),
    #[error("expected [#channel/]bot/pack after the host, got {0:?}")]
    BadPath(String),
    #[error("invalid pack number: {0}")]
    BadPack(String),
}

impl IrcFile {
    /// Parse the `irc://` text form described in the module docs.
    pub fn parse(input: &str) -> Result<Self, LocatorError> {
        let rest = input
            .trim()
            .strip_prefix("irc://")
            .ok_or(LocatorError::BadScheme)?;

        let (authority, path) = rest.split_once('/').ok_or(LocatorError::MissingPath)?;

        let (host, port) = match authority.rsplit_once(':') {
            Some((host, port)) => {
                let port = port
                    .parse::<u16>()
                    .map_err(|_| LocatorError::BadPort(port.to_string()))?;
                (host, port)
            }
            None => (authority, DEFAULT_IRC_PORT),
        };
        if host.is_empty() {
            return Err(LocatorError::EmptyHost);
        }

        let segments: Vec<&str> = path.split('/').collect();
        let (channel, bot, pack) = match segments.as_slice() {
            [bot, pack] => (None, *bot, *pack),
            [channel, bot, pack] if channel.starts_with(['#', '&']) => {
                (Some(channel.to_string()), *bot, *pack)
            }
            _ => return Err(LocatorError::BadPath(path.to_string())),
        };
        if bot.is_empty() {
            return Err(LocatorError::BadPath(path.to_string()));
        }

        let pack = pack
            .parse::<u32>()
            .map_err(|_| LocatorError::BadPack(pack.to_string()))?;

        Ok(IrcFile {
            network: host.to_string(),
            port,
            channel,
            bot: bot.to_string(),
            pack,
        })
    }
}

impl fmt::Display for IrcFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "irc://{}", self.network)?;
        if self.port != DEFAULT_IRC_PORT {
            write!(f, ":{}", self.port)?;
        }
        if let Some(channel) = &self.channel {
            write!(f, "/{}", channel)?;
        }
        write!(f, "/{}/{}", self.bot, self.pack)
    }
}

impl FromStr for IrcFile {
    type Err = LocatorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IrcFile::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator(channel: Option<&str>, port: u16) -> IrcFile {
        IrcFile {
            network: "irc.rizon.net".into(),
            port,
            channel: channel.map(str::to_string),
            bot: "Ginpachi-Sensei".into(),
            pack: 831,
        }
    }

    #[test]
    fn parses_full_form() {
        let parsed = IrcFile::parse("irc://irc.rizon.net:7000/#news/Ginpachi-Sensei/831").unwrap();
        assert_eq!(parsed, locator(Some("#news"), 7000));
    }

    #[test]
    fn parses_without_channel() {
        let parsed = IrcFile::parse("irc://irc.rizon.net/Ginpachi-Sensei/831").unwrap();
        assert_eq!(parsed, locator(None, DEFAULT_IRC_PORT));
    }

    #[test]
    fn round_trips() {
        for loc in [
            locator(None, DEFAULT_IRC_PORT),
            locator(None, 7000),
            locator(Some("#news"), DEFAULT_IRC_PORT),
            locator(Some("&local"), 6697),
        ] {
            assert_eq!(IrcFile::parse(&loc.to_string()).unwrap(), loc);
        }
    }

    #[test]
    fn default_port_is_omitted_from_display() {
        assert_eq!(
            locator(None, DEFAULT_IRC_PORT).to_string(),
            "irc://irc.rizon.net/Ginpachi-Sensei/831"
        );
        assert_eq!(
            locator(Some("#news"), 7000).to_string(),
            "irc://irc.rizon.net:7000/#news/Ginpachi-Sensei/831"
        );
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(
            IrcFile::parse("http://irc.rizon.net/bot/1"),
            Err(LocatorError::BadScheme)
        );
        assert_eq!(IrcFile::parse("irc://host"), Err(LocatorError::MissingPath));
        assert!(matches!(
            IrcFile::parse("irc://host:notaport/bot/1"),
            Err(LocatorError::BadPort(_))
        ));
        // Three segments where the first is not a channel.
        assert!(matches!(
            IrcFile::parse("irc://host/notachannel/bot/1"),
            Err(LocatorError::BadPath(_))
        ));
        assert!(matches!(
            IrcFile::parse("irc://host/bot/abc"),
            Err(LocatorError::BadPack(_))
        ));
        assert!(matches!(
            IrcFile::parse("irc://host/bot/1/2/3"),
            Err(LocatorError::BadPath(_))
        ));
    }

    #[test]
    fn equality_is_field_by_field() {
        let a = locator(Some("#news"), 6667);
        let mut b = a.clone();
        assert_eq!(a, b);
        b.pack = 832;
        assert_ne!(a, b);
    }
}
