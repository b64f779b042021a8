//! Syslog Sink - each event as one alert-severity message
//!
//! Messages use the BSD syslog layout written by most network loggers:
//!
//! ```text
//! <25>2026-10-17T08:30:00+02:00 sensor-01 vigil[4242]: {"version":"0.1",..}
//! ```
//!
//! The priority is `facility * 8 + severity` with severity fixed to
//! alert (1). The connection is established when the sink is created;
//! a broken TCP connection is re-dialled once per failed delivery.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{Local, SecondsFormat};
use tokio::io::AsyncWriteExt;
use tokio::net::{TcpStream, UdpSocket, lookup_host};
use tracing::{info, warn};

use crate::common::{Sink, SinkError, SinkMetrics};


/// Syslog severity used for every event
pub const SEVERITY_ALERT: u8 = 1;

/// Transport protocol
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Protocol {
    #[default]
    Udp,
    Tcp,
}

impl FromStr for Protocol {
    type Err = SinkError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "udp" => Ok(Self::Udp),
            "tcp" => Ok(Self::Tcp),
            other => Err(SinkError::config(format!(
                "unknown syslog protocol '{other}', expected udp or tcp"
            ))),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Udp => "udp",
            Self::Tcp => "tcp",
        })
    }
}

/// Syslog facility
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Facility {
    Kern,
    User,
    Mail,
    #[default]
    Daemon,
    Auth,
    Syslog,
    Lpr,
    News,
    Uucp,
    Cron,
    AuthPriv,
    Ftp,
    Local0,
    Local1,
    Local2,
    Local3,
    Local4,
    Local5,
    Local6,
    Local7,
}

impl Facility {
    const NAMES: [(&'static str, Facility); 20] = [
        ("kern", Self::Kern),
        ("user", Self::User),
        ("mail", Self::Mail),
        ("daemon", Self::Daemon),
        ("auth", Self::Auth),
        ("syslog", Self::Syslog),
        ("lpr", Self::Lpr),
        ("news", Self::News),
        ("uucp", Self::Uucp),
        ("cron", Self::Cron),
        ("authpriv", Self::AuthPriv),
        ("ftp", Self::Ftp),
        ("local0", Self::Local0),
        ("local1", Self::Local1),
        ("local2", Self::Local2),
        ("local3", Self::Local3),
        ("local4", Self::Local4),
        ("local5", Self::Local5),
        ("local6", Self::Local6),
        ("local7", Self::Local7),
    ];

    /// Numeric facility code
    pub const fn code(self) -> u8 {
        match self {
            Self::Kern => 0,
            Self::User => 1,
            Self::Mail => 2,
            Self::Daemon => 3,
            Self::Auth => 4,
            Self::Syslog => 5,
            Self::Lpr => 6,
            Self::News => 7,
            Self::Uucp => 8,
            Self::Cron => 9,
            Self::AuthPriv => 10,
            Self::Ftp => 11,
            Self::Local0 => 16,
            Self::Local1 => 17,
            Self::Local2 => 18,
            Self::Local3 => 19,
            Self::Local4 => 20,
            Self::Local5 => 21,
            Self::Local6 => 22,
            Self::Local7 => 23,
        }
    }

    /// Priority value for an alert in this facility
    pub const fn alert_priority(self) -> u8 {
        self.code() * 8 + SEVERITY_ALERT
    }
}

impl FromStr for Facility {
    type Err = SinkError;

    /// Accepts `daemon`, `DAEMON` and `LOG_DAEMON`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        let name = lower.strip_prefix("log_").unwrap_or(&lower);
        Self::NAMES
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, f)| *f)
            .ok_or_else(|| SinkError::config(format!("unknown syslog facility '{s}'")))
    }
}

/// Syslog connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyslogConfig {
    pub host: String,
    pub port: u16,
    pub protocol: Protocol,
    pub tag: String,
    pub facility: Facility,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 514,
            protocol: Protocol::Udp,
            tag: "vigil".to_string(),
            facility: Facility::Daemon,
        }
    }
}

impl SyslogConfig {
    fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

enum Transport {
    Udp(UdpSocket),
    Tcp(TcpStream),
}

async fn dial(config: &SyslogConfig) -> Result<Transport, SinkError> {
    let address = config.address();
    let connect_err = |e: std::io::Error| SinkError::connection(format!("{address}: {e}"));

    match config.protocol {
        Protocol::Tcp => Ok(Transport::Tcp(
            TcpStream::connect(address.as_str()).await.map_err(connect_err)?,
        )),
        Protocol::Udp => {
            let target = lookup_host(address.as_str())
                .await
                .map_err(connect_err)?
                .next()
                .ok_or_else(|| SinkError::connection(format!("{address}: no address")))?;
            let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
            let socket = UdpSocket::bind(local).await.map_err(connect_err)?;
            socket.connect(target).await.map_err(connect_err)?;
            Ok(Transport::Udp(socket))
        }
    }
}

/// Syslog sink
pub struct SyslogSink {
    config: SyslogConfig,
    transport: Transport,
    hostname: String,
    pid: u32,
    metrics: SinkMetrics,
}

impl SyslogSink {
    /// Connect to the syslog endpoint
    pub async fn connect(config: SyslogConfig) -> Result<Self, SinkError> {
        let transport = dial(&config).await?;
        let hostname = hostname::get()
            .ok()
            .and_then(|h| h.to_str().map(str::to_string))
            .unwrap_or_else(|| "localhost".to_string());

        info!(
            address = %config.address(),
            protocol = %config.protocol,
            tag = %config.tag,
            "syslog sink connected"
        );

        Ok(Self {
            config,
            transport,
            hostname,
            pid: std::process::id(),
            metrics: SinkMetrics::new(),
        })
    }

    pub fn config(&self) -> &SyslogConfig {
        &self.config
    }

    /// Frame one event as a syslog message (newline terminated)
    pub fn format_message(&self, event: &str) -> String {
        format_message(
            self.config.facility,
            &Local::now().to_rfc3339_opts(SecondsFormat::Secs, true),
            &self.hostname,
            &self.config.tag,
            self.pid,
            event,
        )
    }

    async fn send(&mut self, message: &[u8]) -> std::io::Result<()> {
        match &mut self.transport {
            Transport::Udp(socket) => socket.send(message).await.map(|_| ()),
            Transport::Tcp(stream) => stream.write_all(message).await,
        }
    }
}

/// Build `<PRI>TIMESTAMP HOST TAG[PID]: MSG\n`
pub fn format_message(
    facility: Facility,
    timestamp: &str,
    hostname: &str,
    tag: &str,
    pid: u32,
    event: &str,
) -> String {
    let newline = if event.ends_with('\n') { "" } else { "\n" };
    format!(
        "<{}>{} {} {}[{}]: {}{}",
        facility.alert_priority(),
        timestamp,
        hostname,
        tag,
        pid,
        event,
        newline
    )
}

#[async_trait]
impl Sink for SyslogSink {
    fn name(&self) -> &str {
        "syslog"
    }

    /// Send one event as a single message
    ///
    /// A TCP write that fails is sent once more on a fresh connection, so
    /// a restarted collector does not cost every later event. Nothing
    /// beyond that one redial is attempted.
    async fn deliver(&mut self, event: &str) -> Result<(), SinkError> {
        let message = self.format_message(event);

        let mut result = self.send(message.as_bytes()).await;
        if result.is_err() && self.config.protocol == Protocol::Tcp {
            warn!(address = %self.config.address(), "syslog connection lost, redialling");
            match dial(&self.config).await {
                Ok(transport) => {
                    self.transport = transport;
                    result = self.send(message.as_bytes()).await;
                }
                Err(e) => {
                    self.metrics.write_error();
                    return Err(e);
                }
            }
        }

        match result {
            Ok(()) => {
                self.metrics.event_written(message.len() as u64);
                Ok(())
            }
            Err(e) => {
                self.metrics.write_error();
                Err(SinkError::write(format!("syslog {}: {e}", self.config.address())))
            }
        }
    }

    async fn close(&mut self) -> Result<(), SinkError> {
        if let Transport::Tcp(stream) = &mut self.transport {
            stream.shutdown().await?;
        }
        Ok(())
    }

    fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}
