//! Producer-side connector
//!
//! Sends log text to a running viewer. Every datagram carries the full
//! caption list and one `logK` key per channel, all empty except the
//! target, so a datagram on its own fully describes the sender's layout.
//!
//! ```text
//! let mut conn = Connector::new("127.0.0.1", 1947, captions).await?.with_time(true);
//! conn.log(0, "user signed in")?;   // -> {"tabs":[..],"log1":"<time>[..]</time> user signed in",..}
//! ```

use crate::engine::Payload;
use std::fmt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::UdpSocket;

/// Longest fragment put in a single datagram, in characters
pub const MAX_FRAGMENT_CHARS: usize = 5000;

/// Pause after this many datagrams so the viewer's receive buffer keeps up
const PAUSE_EVERY: u64 = 50;
const PAUSE: Duration = Duration::from_millis(100);

/// Color used for keys in [`Connector::dump`]
const DUMP_KEY_STYLE: &str = "color:#9ee7ff";

#[derive(Debug)]
pub enum ConnectorError {
    /// Target could not be resolved
    Resolve(String),
    Io(std::io::Error),
    /// Channel index beyond the caption list
    NoSuchChannel { channel: usize, channels: usize },
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resolve(target) => write!(f, "Cannot resolve {}", target),
            Self::Io(e) => write!(f, "Send failed: {}", e),
            Self::NoSuchChannel { channel, channels } => write!(
                f,
                "Channel {} does not exist (sender has {} channels)",
                channel + 1,
                channels
            ),
        }
    }
}

impl std::error::Error for ConnectorError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConnectorError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

pub struct Connector {
    socket: UdpSocket,
    target: SocketAddr,
    captions: Vec<String>,
    show_time: bool,
    sent: u64,
    pause_every: u64,
    pause: Duration,
}

impl Connector {
    /// Resolve the viewer address and open an unconnected socket
    ///
    /// The socket is never connected: a viewer that is not running must not
    /// turn into send errors.
    pub async fn new(
        address: &str,
        port: u16,
        captions: Vec<String>,
    ) -> Result<Self, ConnectorError> {
        let target = tokio::net::lookup_host((address, port))
            .await?
            .next()
            .ok_or_else(|| ConnectorError::Resolve(format!("{}:{}", address, port)))?;

        let local = if target.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(local).await?;

        Ok(Self {
            socket,
            target,
            captions,
            show_time: false,
            sent: 0,
            pause_every: PAUSE_EVERY,
            pause: PAUSE,
        })
    }

    /// Prefix logged messages with `<time>[HH:MM:SS]</time>`
    pub fn with_time(mut self, show_time: bool) -> Self {
        self.show_time = show_time;
        self
    }

    pub fn with_pacing(mut self, every: u64, pause: Duration) -> Self {
        self.pause_every = every;
        self.pause = pause;
        self
    }

    pub fn captions(&self) -> &[String] {
        &self.captions
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Number of datagrams sent so far
    pub fn sent(&self) -> u64 {
        self.sent
    }

    /// Send one fragment verbatim (markup allowed) to a channel
    pub async fn send(&mut self, channel: usize, fragment: &str) -> Result<(), ConnectorError> {
        if channel >= self.captions.len() {
            return Err(ConnectorError::NoSuchChannel {
                channel,
                channels: self.captions.len(),
            });
        }

        let mut payload = Payload {
            captions: self.captions.clone(),
            ..Default::default()
        };
        payload.entries.insert(channel, fragment.to_string());
        let datagram = payload.encode(self.captions.len());

        self.sent += 1;
        if self.pause_every > 0 && self.sent % self.pause_every == 0 {
            tokio::time::sleep(self.pause).await;
        }

        self.socket.send_to(datagram.as_bytes(), self.target).await?;
        Ok(())
    }

    /// Log plain text: escaped, newlines kept as line breaks, split into
    /// datagram-sized fragments. Returns the number of datagrams sent.
    pub async fn log(&mut self, channel: usize, message: &str) -> Result<usize, ConnectorError> {
        let mut text = nl2br(&escape_html(message));
        if self.show_time {
            text.insert_str(0, &time_prefix());
        }

        let fragments = split_fragments(&text, MAX_FRAGMENT_CHARS);
        for fragment in &fragments {
            self.send(channel, fragment).await?;
        }
        Ok(fragments.len())
    }

    /// Log key/value pairs, one per paragraph with highlighted keys
    pub async fn dump<K, V>(
        &mut self,
        channel: usize,
        pairs: &[(K, V)],
    ) -> Result<usize, ConnectorError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let text = format_dump(pairs);
        let fragments = split_fragments(&text, MAX_FRAGMENT_CHARS);
        for fragment in &fragments {
            self.send(channel, fragment).await?;
        }
        Ok(fragments.len())
    }
}

/// Escape text so it renders literally inside markup
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// Turn line endings into `<br />`
pub fn nl2br(text: &str) -> String {
    text.replace("\r\n", "<br />")
        .replace(['\r', '\n'], "<br />")
}

/// `<time>[HH:MM:SS]</time> ` for the local wall clock
fn time_prefix() -> String {
    format!("<time>[{}]</time> ", chrono::Local::now().format("%H:%M:%S"))
}

/// Split into pieces of at most `max_chars` characters, on char boundaries
pub fn split_fragments(text: &str, max_chars: usize) -> Vec<&str> {
    if text.is_empty() || max_chars == 0 {
        return Vec::new();
    }

    let mut fragments = Vec::new();
    let mut start = 0;
    let mut count = 0;
    for (offset, _) in text.char_indices() {
        if count == max_chars {
            fragments.push(&text[start..offset]);
            start = offset;
            count = 0;
        }
        count += 1;
    }
    fragments.push(&text[start..]);
    fragments
}

fn format_dump<K: AsRef<str>, V: AsRef<str>>(pairs: &[(K, V)]) -> String {
    let lines: Vec<String> = pairs
        .iter()
        .map(|(key, value)| {
            format!(
                "<b style=\"{}\">{}</b> :&nbsp;&nbsp;{}",
                DUMP_KEY_STYLE,
                escape_html(key.as_ref()),
                escape_html(value.as_ref())
            )
        })
        .collect();
    format!("{}<br />", lines.join("<br /><br />"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn captions() -> Vec<String> {
        vec!["&User".into(), "&Errors".into(), "&Request".into()]
    }

    async fn viewer() -> (UdpSocket, u16) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = socket.local_addr().unwrap().port();
        (socket, port)
    }

    async fn recv_json(socket: &UdpSocket) -> Value {
        let mut buf = vec![0u8; 65_535];
        let (len, _) = tokio::time::timeout(Duration::from_secs(2), socket.recv_from(&mut buf))
            .await
            .unwrap()
            .unwrap();
        serde_json::from_slice(&buf[..len]).unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_nl2br() {
        assert_eq!(nl2br("a\nb\r\nc\rd"), "a<br />b<br />c<br />d");
    }

    #[test]
    fn test_split_fragments_respects_char_boundaries() {
        assert!(split_fragments("", 5).is_empty());
        assert_eq!(split_fragments("abcdefg", 3), ["abc", "def", "g"]);
        assert_eq!(split_fragments("abc", 3), ["abc"]);
        assert_eq!(split_fragments("ñañañ", 2), ["ña", "ña", "ñ"]);
    }

    #[test]
    fn test_format_dump() {
        let text = format_dump(&[("user", "ana"), ("<id>", "7")]);
        assert_eq!(
            text,
            "<b style=\"color:#9ee7ff\">user</b> :&nbsp;&nbsp;ana<br /><br />\
             <b style=\"color:#9ee7ff\">&lt;id&gt;</b> :&nbsp;&nbsp;7<br />"
        );
    }

    #[tokio::test]
    async fn test_send_carries_captions_and_every_channel_key() {
        let (socket, port) = viewer().await;
        let mut conn = Connector::new("127.0.0.1", port, captions()).await.unwrap();

        conn.send(1, "<h1>boom</h1>").await.unwrap();

        let json = recv_json(&socket).await;
        assert_eq!(json["tabs"], serde_json::json!(["&User", "&Errors", "&Request"]));
        assert_eq!(json["log1"], "");
        assert_eq!(json["log2"], "<h1>boom</h1>");
        assert_eq!(json["log3"], "");
        assert_eq!(conn.sent(), 1);
    }

    #[tokio::test]
    async fn test_send_to_missing_channel_fails() {
        let (_socket, port) = viewer().await;
        let mut conn = Connector::new("127.0.0.1", port, captions()).await.unwrap();

        let err = conn.send(3, "x").await.unwrap_err();
        assert!(matches!(
            err,
            ConnectorError::NoSuchChannel {
                channel: 3,
                channels: 3
            }
        ));
        assert_eq!(conn.sent(), 0);
    }

    #[tokio::test]
    async fn test_log_escapes_and_prefixes_time() {
        let (socket, port) = viewer().await;
        let mut conn = Connector::new("127.0.0.1", port, captions())
            .await
            .unwrap()
            .with_time(true);

        assert_eq!(conn.log(0, "a < b\nnext").await.unwrap(), 1);

        let json = recv_json(&socket).await;
        let text = json["log1"].as_str().unwrap();
        assert!(text.starts_with("<time>["), "{}", text);
        assert!(text.ends_with("]</time> a &lt; b<br />next"), "{}", text);
    }

    #[tokio::test]
    async fn test_long_message_is_split() {
        let (socket, port) = viewer().await;
        let mut conn = Connector::new("127.0.0.1", port, captions()).await.unwrap();

        let message = "x".repeat(MAX_FRAGMENT_CHARS + 10);
        assert_eq!(conn.log(2, &message).await.unwrap(), 2);

        let first = recv_json(&socket).await;
        let second = recv_json(&socket).await;
        assert_eq!(first["log3"].as_str().unwrap().len(), MAX_FRAGMENT_CHARS);
        assert_eq!(second["log3"].as_str().unwrap().len(), 10);
    }

    #[tokio::test]
    async fn test_pacing_pauses_every_n_datagrams() {
        let (_socket, port) = viewer().await;
        let mut conn = Connector::new("127.0.0.1", port, captions())
            .await
            .unwrap()
            .with_pacing(2, Duration::from_millis(60));

        let started = std::time::Instant::now();
        conn.send(0, "a").await.unwrap();
        conn.send(0, "b").await.unwrap();
        conn.send(0, "c").await.unwrap();

        assert!(started.elapsed() >= Duration::from_millis(60));
        assert_eq!(conn.sent(), 3);
    }
}
