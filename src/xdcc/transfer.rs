//! One XDCC transfer, from pack request to completion or abort.
//!
//! A [`Transfer`] owns one IRC connection for the lifetime of one download.
//! `start()` drives the handshake synchronously: connect and register, join
//! the bot's channel when the locator names one, send the `XDCC SEND` CTCP
//! request, and wait for the bot's DCC offer. Once the offer is accepted the
//! raw-socket download runs on a background task and is observed through the
//! transfer's event channel.
//!
//! State machine:
//!
//! ```text
//! Idle -> Connecting -> Requesting -> AwaitingOffer -> Downloading
//!                                                        |-> Completed
//!                                                        '-> Aborted
//! ```
//!
//! Terminal states are absorbing. [`Transfer::abort`] is idempotent and safe
//! from any state; an in-flight download answers it with a terminal
//! `Aborted { Cancelled }` event and releases the socket and file handle.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures::StreamExt;
use irc::client::prelude::{Client, Command, Config as IrcConfig, Prefix, Response};
use irc::client::{ClientStream, Sender};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::{mpsc, watch};
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::nickname::generate_nickname;
use crate::xdcc::event::{AbortReason, TransferEvent};
use crate::xdcc::locator::{IrcFile, DEFAULT_IRC_PORT, DEFAULT_IRC_TLS_PORT};
use crate::xdcc::parser::{classify_rejection, parse_dcc_send, DccSendOffer};
use crate::xdcc::security;

/// How often the download worker emits progress events; also the window the
/// instantaneous rate is computed over.
const PROGRESS_INTERVAL: Duration = Duration::from_millis(250);

const READ_BUFFER_SIZE: usize = 8192;

/// What to fetch and where to put it. Supplied once at construction,
/// immutable afterward.
#[derive(Debug, Clone)]
pub struct TransferConfig {
    /// The pack to request.
    pub file: IrcFile,
    /// Directory the downloaded file lands in. The file name comes from the
    /// bot's offer, sanitized.
    pub out_dir: PathBuf,
    /// Require a TLS connection to the IRC network instead of plaintext.
    pub tls_only: bool,
}

/// Engine knobs with working defaults; the CLI fills these from its config
/// file.
#[derive(Debug, Clone)]
pub struct TransferSettings {
    /// Bound on connect + registration.
    pub registration_timeout: Duration,
    /// Bound on the join/request/offer exchange with the bot.
    pub request_timeout: Duration,
    /// Accept offers that point at private/loopback addresses.
    pub allow_private_ips: bool,
    /// Refuse offers announcing more than this many bytes; 0 disables the
    /// check.
    pub max_file_size: u64,
    /// Session nickname; a random one is generated when unset.
    pub nickname: Option<String>,
}

impl Default for TransferSettings {
    fn default() -> Self {
        Self {
            registration_timeout: Duration::from_secs(30),
            request_timeout: Duration::from_secs(60),
            allow_private_ips: false,
            max_file_size: 20 * 1024 * 1024 * 1024,
            nickname: None,
        }
    }
}

/// Where a transfer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferState {
    Idle,
    Connecting,
    Requesting,
    AwaitingOffer,
    Downloading,
    Completed,
    Aborted,
}

/// Lets a caller abort a running transfer from another task.
#[derive(Debug, Clone)]
pub struct AbortHandle {
    cancel_tx: watch::Sender<bool>,
}

impl AbortHandle {
    /// Request the transfer stop. Idempotent; a no-op once the transfer is
    /// terminal.
    pub fn abort(&self) {
        let _ = self.cancel_tx.send(true);
    }
}

/// One client-side XDCC download session.
pub struct Transfer {
    config: TransferConfig,
    settings: TransferSettings,
    nickname: String,
    state: Arc<Mutex<TransferState>>,
    events_tx: Option<mpsc::UnboundedSender<TransferEvent>>,
    events_rx: Option<mpsc::UnboundedReceiver<TransferEvent>>,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
}

impl Transfer {
    pub fn new(config: TransferConfig) -> Self {
        Self::with_settings(config, TransferSettings::default())
    }

    pub fn with_settings(config: TransferConfig, settings: TransferSettings) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let nickname = settings
            .nickname
            .clone()
            .unwrap_or_else(generate_nickname);
        Self {
            config,
            settings,
            nickname,
            state: Arc::new(Mutex::new(TransferState::Idle)),
            events_tx: Some(events_tx),
            events_rx: Some(events_rx),
            cancel_tx,
            cancel_rx,
        }
    }

    pub fn state(&self) -> TransferState {
        *self.state.lock().unwrap()
    }

    /// Take the event stream. The download worker is the only producer; the
    /// channel closes right after the terminal event.
    ///
    /// Panics if called twice — there is exactly one consumer.
    pub fn events(&mut self) -> mpsc::UnboundedReceiver<TransferEvent> {
        self.events_rx
            .take()
            .expect("transfer event stream already taken")
    }

    /// Handle for aborting this transfer from another task (e.g. a Ctrl-C
    /// handler).
    pub fn abort_handle(&self) -> AbortHandle {
        AbortHandle {
            cancel_tx: self.cancel_tx.clone(),
        }
    }

    /// Abort the transfer. Idempotent and safe from any state.
    pub fn abort(&self) {
        let _ = self.cancel_tx.send(true);
    }

    /// Run the handshake. Returns once the bot's offer has been accepted and
    /// the download launched in the background, or with the error that ended
    /// the attempt — in which case no background work is left running and the
    /// event channel closes without events.
    pub async fn start(&mut self) -> Result<(), AbortReason> {
        let events_tx = self.events_tx.take().ok_or(AbortReason::AlreadyStarted)?;
        match self.handshake().await {
            Ok((offer, dest, stream, sender)) => {
                self.set_state(TransferState::Downloading);
                tokio::spawn(run_download(
                    offer,
                    dest,
                    events_tx,
                    self.cancel_rx.clone(),
                    Arc::clone(&self.state),
                    stream,
                    sender,
                ));
                Ok(())
            }
            Err(reason) => {
                self.set_state(TransferState::Aborted);
                Err(reason)
            }
        }
    }

    async fn handshake(
        &mut self,
    ) -> Result<(DccSendOffer, PathBuf, ClientStream, Sender), AbortReason> {
        if *self.cancel_rx.borrow() {
            return Err(AbortReason::Cancelled);
        }

        let file = self.config.file.clone();
        self.set_state(TransferState::Connecting);

        // A TLS-only transfer on a locator without an explicit port goes to
        // the conventional TLS port instead of 6667.
        let port = if self.config.tls_only && file.port == DEFAULT_IRC_PORT {
            DEFAULT_IRC_TLS_PORT
        } else {
            file.port
        };
        debug!(network = %file.network, port, nick = %self.nickname, "connecting");

        let irc_config = IrcConfig {
            server: Some(file.network.clone()),
            port: Some(port),
            use_tls: Some(self.config.tls_only),
            nickname: Some(self.nickname.clone()),
            ..IrcConfig::default()
        };

        let mut client = Client::from_config(irc_config)
            .await
            .map_err(|e| AbortReason::Network(e.to_string()))?;
        client
            .identify()
            .map_err(|e| AbortReason::Network(e.to_string()))?;
        let sender = client.sender();
        let mut stream = client
            .stream()
            .map_err(|e| AbortReason::Network(e.to_string()))?;

        tokio::time::timeout(
            self.settings.registration_timeout,
            wait_for_registration(&mut stream),
        )
        .await
        .map_err(|_| AbortReason::Timeout("waiting for registration"))??;
        debug!(network = %file.network, "registered");

        self.set_state(TransferState::Requesting);
        if let Some(channel) = &file.channel {
            sender
                .send_join(channel)
                .map_err(|e| AbortReason::Network(e.to_string()))?;
            tokio::time::timeout(
                self.settings.request_timeout,
                wait_for_join(&mut stream, &self.nickname, channel),
            )
            .await
            .map_err(|_| AbortReason::Timeout("joining the bot's channel"))??;
            debug!(channel, "joined");
        }

        sender
            .send_privmsg(&file.bot, format!("\x01XDCC SEND {}\x01", file.pack))
            .map_err(|e| AbortReason::Network(e.to_string()))?;
        debug!(bot = %file.bot, pack = file.pack, "pack requested");

        self.set_state(TransferState::AwaitingOffer);
        let offer = tokio::time::timeout(
            self.settings.request_timeout,
            wait_for_offer(&mut stream, &file.bot),
        )
        .await
        .map_err(|_| AbortReason::Timeout("waiting for the bot's offer"))??;
        debug!(
            filename = %offer.filename,
            ip = %offer.ip,
            port = offer.port,
            size = offer.size,
            "offer received"
        );

        if !self.settings.allow_private_ips && security::is_private_addr(&offer.ip) {
            return Err(AbortReason::PrivateAddress(offer.ip));
        }
        if self.settings.max_file_size > 0 && offer.size > self.settings.max_file_size {
            return Err(AbortReason::TooLarge {
                size: offer.size,
                limit: self.settings.max_file_size,
            });
        }

        let dest = security::resolve_download_path(&self.config.out_dir, &offer.filename)
            .ok_or_else(|| {
                AbortReason::Io(format!(
                    "no safe download path for offered name {:?}",
                    offer.filename
                ))
            })?;

        Ok((offer, dest, stream, sender))
    }

    fn set_state(&self, state: TransferState) {
        *self.state.lock().unwrap() = state;
    }
}

fn message_nick(message: &irc::proto::Message) -> Option<&str> {
    match &message.prefix {
        Some(Prefix::Nickname(nick, _, _)) => Some(nick.as_str()),
        _ => None,
    }
}

/// Drain the stream until the server confirms registration.
async fn wait_for_registration(stream: &mut ClientStream) -> Result<(), AbortReason> {
    while let Some(message) = stream.next().await {
        let message = message.map_err(|e| AbortReason::Network(e.to_string()))?;
        if let Command::Response(code, _) = &message.command {
            match code {
                Response::RPL_WELCOME | Response::RPL_ENDOFMOTD | Response::ERR_NOMOTD => {
                    return Ok(())
                }
                Response::ERR_NICKNAMEINUSE => {
                    return Err(AbortReason::Network("nickname already in use".into()))
                }
                _ => {}
            }
        }
    }
    Err(AbortReason::Network(
        "connection closed during registration".into(),
    ))
}

/// Drain the stream until our own JOIN for `channel` echoes back.
async fn wait_for_join(
    stream: &mut ClientStream,
    nickname: &str,
    channel: &str,
) -> Result<(), AbortReason> {
    while let Some(message) = stream.next().await {
        let message = message.map_err(|e| AbortReason::Network(e.to_string()))?;
        match &message.command {
            Command::JOIN(chan, _, _)
                if chan.eq_ignore_ascii_case(channel)
                    && message_nick(&message)
                        .is_some_and(|n| n.eq_ignore_ascii_case(nickname)) =>
            {
                return Ok(())
            }
            Command::Response(Response::ERR_BANNEDFROMCHAN, _) => {
                return Err(AbortReason::Banned)
            }
            _ => {}
        }
    }
    Err(AbortReason::Network("connection closed while joining".into()))
}

/// Wait for the bot to answer the pack request: either a DCC SEND offer or a
/// rejection notice.
async fn wait_for_offer(
    stream: &mut ClientStream,
    bot: &str,
) -> Result<DccSendOffer, AbortReason> {
    while let Some(message) = stream.next().await {
        let message = message.map_err(|e| AbortReason::Network(e.to_string()))?;
        if let Some(reply) = evaluate_bot_reply(&message, bot) {
            return reply;
        }
    }
    Err(AbortReason::Network(
        "connection closed while awaiting the offer".into(),
    ))
}

/// Decide whether a message answers the pack request. `None` means keep
/// waiting; traffic from anyone but the bot (services, other users) is not
/// an answer.
fn evaluate_bot_reply(
    message: &irc::proto::Message,
    bot: &str,
) -> Option<Result<DccSendOffer, AbortReason>> {
    let from_bot = message_nick(message).is_some_and(|n| n.eq_ignore_ascii_case(bot));

    match &message.command {
        Command::PRIVMSG(_, text) if from_bot => {
            if let Some(ctcp) = strip_ctcp(text) {
                if ctcp.starts_with("DCC SEND ") {
                    return Some(
                        parse_dcc_send(ctcp)
                            .ok_or_else(|| AbortReason::MalformedOffer(ctcp.to_string())),
                    );
                }
                // Other DCC/CTCP traffic from the bot is not the answer we
                // are waiting for.
                debug!(ctcp, "ignoring unrelated CTCP from bot");
                None
            } else {
                Some(Err(classify_rejection(text)))
            }
        }
        Command::NOTICE(_, text) if from_bot => {
            let text = strip_ctcp(text).unwrap_or(text);
            Some(Err(classify_rejection(text)))
        }
        Command::ERROR(text) => Some(Err(AbortReason::Network(text.clone()))),
        _ => None,
    }
}

fn strip_ctcp(text: &str) -> Option<&str> {
    text.strip_prefix('\x01')?.strip_suffix('\x01')
}

/// Background worker: runs the raw-socket download, keeps the IRC session
/// polled, and emits the terminal event before the channel closes.
async fn run_download(
    offer: DccSendOffer,
    dest: PathBuf,
    events_tx: mpsc::UnboundedSender<TransferEvent>,
    mut cancel_rx: watch::Receiver<bool>,
    state: Arc<Mutex<TransferState>>,
    mut stream: ClientStream,
    sender: Sender,
) {
    // The IRC session stays connected (and polled, so PINGs are answered)
    // for the duration of the download; some bots cancel the send when the
    // requester disappears from the network.
    let keep_irc_alive = async {
        while stream.next().await.is_some() {}
        std::future::pending::<()>().await
    };

    let result = tokio::select! {
        result = receive_file(&offer, &dest, &events_tx) => result,
        _ = cancelled(&mut cancel_rx) => Err(AbortReason::Cancelled),
        _ = keep_irc_alive => unreachable!(),
    };

    let _ = sender.send_quit("");

    match result {
        Ok(()) => {
            *state.lock().unwrap() = TransferState::Completed;
            let _ = events_tx.send(TransferEvent::Completed);
        }
        Err(reason) => {
            warn!(%reason, dest = %dest.display(), "transfer aborted");
            *state.lock().unwrap() = TransferState::Aborted;
            let _ = events_tx.send(TransferEvent::Aborted { reason });
        }
    }
    // events_tx drops here, closing the stream after the terminal event.
}

async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            // All abort handles gone; cancellation can no longer happen.
            std::future::pending::<()>().await;
        }
    }
}

/// Copy the offered stream to `dest`, acking received byte counts and
/// emitting `Started`/`Progress` events.
async fn receive_file(
    offer: &DccSendOffer,
    dest: &PathBuf,
    events_tx: &mpsc::UnboundedSender<TransferEvent>,
) -> Result<(), AbortReason> {
    let mut sock = TcpStream::connect((offer.ip, offer.port))
        .await
        .map_err(|e| AbortReason::Network(e.to_string()))?;

    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| AbortReason::Io(e.to_string()))?;
    }
    let mut out = tokio::fs::File::create(dest)
        .await
        .map_err(|e| AbortReason::Io(e.to_string()))?;

    let _ = events_tx.send(TransferEvent::Started {
        file_size: offer.size,
    });

    let mut buf = [0u8; READ_BUFFER_SIZE];
    let mut received: u64 = 0;
    let mut window_start = Instant::now();
    let mut window_bytes: u64 = 0;

    loop {
        let n = sock
            .read(&mut buf)
            .await
            .map_err(|e| AbortReason::Network(e.to_string()))?;
        if n == 0 {
            // End of stream: completion when no size was announced,
            // truncation otherwise.
            if offer.size == 0 {
                break;
            }
            return Err(AbortReason::SizeMismatch {
                expected: offer.size,
                received,
            });
        }

        out.write_all(&buf[..n])
            .await
            .map_err(|e| AbortReason::Io(e.to_string()))?;
        received += n as u64;

        // DCC ack: cumulative received count as 4 bytes big-endian. Write
        // errors are ignored; not every sender reads them.
        let ack = (received as u32).to_be_bytes();
        let _ = sock.write_all(&ack).await;

        window_bytes += n as u64;
        let elapsed = window_start.elapsed();
        if elapsed >= PROGRESS_INTERVAL {
            let rate = (window_bytes as f64 / elapsed.as_secs_f64()) as u64;
            let _ = events_tx.send(TransferEvent::Progress {
                bytes: window_bytes,
                rate,
            });
            window_bytes = 0;
            window_start = Instant::now();
        }

        if offer.size > 0 {
            if received > offer.size {
                return Err(AbortReason::SizeMismatch {
                    expected: offer.size,
                    received,
                });
            }
            if received == offer.size {
                break;
            }
        }
    }

    out.flush().await.map_err(|e| AbortReason::Io(e.to_string()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::IpAddr;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    async fn serve_bytes(payload: Vec<u8>, read_acks: bool) -> (IpAddr, u16) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            sock.write_all(&payload).await.unwrap();
            if read_acks {
                let mut acks = vec![0u8; 64];
                let _ = sock.read(&mut acks).await;
            }
            // Close without waiting for the peer.
        });
        (addr.ip(), addr.port())
    }

    fn offer(ip: IpAddr, port: u16, size: u64) -> DccSendOffer {
        DccSendOffer {
            filename: "payload.bin".into(),
            ip,
            port,
            size,
        }
    }

    #[tokio::test]
    async fn download_writes_all_bytes_and_orders_events() {
        let payload: Vec<u8> = (0..40_000u32).map(|i| i as u8).collect();
        let (ip, port) = serve_bytes(payload.clone(), true).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("payload.bin");
        let (tx, mut rx) = mpsc::unbounded_channel();

        receive_file(&offer(ip, port, payload.len() as u64), &dest, &tx)
            .await
            .unwrap();
        drop(tx);

        assert_eq!(tokio::fs::read(&dest).await.unwrap(), payload);

        let mut events = Vec::new();
        while let Some(ev) = rx.recv().await {
            events.push(ev);
        }
        assert!(matches!(
            events.first(),
            Some(TransferEvent::Started { file_size }) if *file_size == payload.len() as u64
        ));
        for ev in &events[1..] {
            assert!(matches!(ev, TransferEvent::Progress { .. }), "{ev:?}");
        }
    }

    #[tokio::test]
    async fn unannounced_size_completes_on_eof() {
        let payload = b"short stream".to_vec();
        let (ip, port) = serve_bytes(payload.clone(), false).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("payload.bin");
        let (tx, _rx) = mpsc::unbounded_channel();

        receive_file(&offer(ip, port, 0), &dest, &tx).await.unwrap();
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), payload);
    }

    #[tokio::test]
    async fn truncated_stream_is_a_size_mismatch() {
        let (ip, port) = serve_bytes(vec![0u8; 100], false).await;
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("payload.bin");
        let (tx, _rx) = mpsc::unbounded_channel();

        let err = receive_file(&offer(ip, port, 500), &dest, &tx)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            AbortReason::SizeMismatch {
                expected: 500,
                received: 100
            }
        );
    }

    #[tokio::test]
    async fn worker_answers_cancellation_with_aborted_event() {
        // A listener that accepts but never sends keeps the worker blocked in
        // its read until the abort lands.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (_sock, _) = listener.accept().await.unwrap();
            std::future::pending::<()>().await
        });

        let dir = tempfile::tempdir().unwrap();
        let config = TransferConfig {
            file: IrcFile::parse("irc://irc.example.net/bot/1").unwrap(),
            out_dir: dir.path().to_path_buf(),
            tls_only: false,
        };
        let transfer = Transfer::new(config);
        let state = Arc::clone(&transfer.state);
        let (tx, mut rx) = mpsc::unbounded_channel();
        let cancel_rx = transfer.cancel_rx.clone();

        // Drive the worker directly; the IRC half is replaced by a pending
        // future since the handshake is not under test here.
        let worker = tokio::spawn({
            let dest = dir.path().join("payload.bin");
            let offer = offer(addr.ip(), addr.port(), 1000);
            let mut cancel_rx = cancel_rx;
            async move {
                let result = tokio::select! {
                    result = receive_file(&offer, &dest, &tx) => result,
                    _ = cancelled(&mut cancel_rx) => Err(AbortReason::Cancelled),
                };
                if let Err(reason) = result {
                    *state.lock().unwrap() = TransferState::Aborted;
                    let _ = tx.send(TransferEvent::Aborted { reason });
                }
            }
        });

        // Let the worker reach its read, then abort twice: the second call
        // must be a harmless no-op.
        tokio::time::sleep(Duration::from_millis(50)).await;
        transfer.abort();
        transfer.abort();
        worker.await.unwrap();

        let mut terminal = None;
        while let Some(ev) = rx.recv().await {
            terminal = Some(ev);
        }
        assert_eq!(
            terminal,
            Some(TransferEvent::Aborted {
                reason: AbortReason::Cancelled
            })
        );
        assert_eq!(transfer.state(), TransferState::Aborted);
    }

    #[tokio::test]
    async fn failed_start_emits_nothing_and_closes_the_stream() {
        let dir = tempfile::tempdir().unwrap();
        let mut transfer = Transfer::new(TransferConfig {
            file: IrcFile::parse("irc://irc.example.net/bot/1").unwrap(),
            out_dir: dir.path().to_path_buf(),
            tls_only: false,
        });
        let mut events = transfer.events();

        // An abort before start() makes the handshake fail without touching
        // the network.
        transfer.abort();
        let err = transfer.start().await.unwrap_err();
        assert_eq!(err, AbortReason::Cancelled);
        assert_eq!(transfer.state(), TransferState::Aborted);

        // No background work and no events: the stream is already closed.
        assert_eq!(events.recv().await, None);
    }

    fn irc_line(line: &str) -> irc::proto::Message {
        format!("{line}\r\n").parse().unwrap()
    }

    #[test]
    fn bot_reply_notice_rejections_are_classified() {
        let notice = irc_line(":SomeBot!x@y NOTICE DustyHeron7 :** The queue is full **");
        assert_eq!(
            evaluate_bot_reply(&notice, "somebot"),
            Some(Err(AbortReason::QueueFull))
        );

        let unknown = irc_line(":SomeBot!x@y NOTICE DustyHeron7 :try again at midnight");
        assert_eq!(
            evaluate_bot_reply(&unknown, "SomeBot"),
            Some(Err(AbortReason::Rejected("try again at midnight".into())))
        );

        // Notices from anyone but the bot are not an answer.
        let services = irc_line(":NickServ!s@host NOTICE DustyHeron7 :This nick is registered");
        assert_eq!(evaluate_bot_reply(&services, "SomeBot"), None);
    }

    #[test]
    fn bot_reply_dcc_send_yields_the_offer() {
        let offer = irc_line(
            ":SomeBot!x@y PRIVMSG DustyHeron7 :\x01DCC SEND file.bin 134744072 5001 10\x01",
        );
        let reply = evaluate_bot_reply(&offer, "SomeBot").unwrap().unwrap();
        assert_eq!(reply.filename, "file.bin");
        assert_eq!(reply.port, 5001);
        assert_eq!(reply.size, 10);

        let malformed =
            irc_line(":SomeBot!x@y PRIVMSG DustyHeron7 :\x01DCC SEND broken\x01");
        assert!(matches!(
            evaluate_bot_reply(&malformed, "SomeBot"),
            Some(Err(AbortReason::MalformedOffer(_)))
        ));

        // A DCC SEND from a third party is ignored, not accepted.
        let spoofed = irc_line(
            ":Imposter!x@y PRIVMSG DustyHeron7 :\x01DCC SEND file.bin 134744072 5001 10\x01",
        );
        assert_eq!(evaluate_bot_reply(&spoofed, "SomeBot"), None);
    }

    #[test]
    fn event_stream_can_only_be_taken_once() {
        let dir = std::env::temp_dir();
        let mut transfer = Transfer::new(TransferConfig {
            file: IrcFile::parse("irc://irc.example.net/bot/1").unwrap(),
            out_dir: dir,
            tls_only: false,
        });
        let _events = transfer.events();
        assert!(transfer.events_rx.is_none());
    }

    #[test]
    fn ctcp_payloads_are_unwrapped() {
        assert_eq!(strip_ctcp("\x01XDCC SEND 1\x01"), Some("XDCC SEND 1"));
        assert_eq!(strip_ctcp("plain notice"), None);
    }
}
