//! Async SMTP client with implicit-TLS, STARTTLS, and AUTH PLAIN support.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::client::danger::{
    HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier,
};
use tokio_rustls::rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use tokio_rustls::rustls::{
    ClientConfig, DigitallySignedStruct, RootCertStore, SignatureScheme,
};
use tracing::{trace, warn};

use crate::error::{ClientError, Result};
use crate::reply::Reply;

/// Size of each read from the socket.
const BUFFER_SIZE: usize = 8192;

/// Upper bound on buffered reply bytes (1MB).
const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// The transport under the client, plain TCP or TLS-wrapped.
enum Connection {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
}

impl Connection {
    async fn send(&mut self, data: &[u8]) -> Result<()> {
        match self {
            Self::Plain(stream) => {
                stream.write_all(data).await?;
                stream.flush().await?;
            }
            Self::Tls(stream) => {
                stream.write_all(data).await?;
                stream.flush().await?;
            }
        }
        Ok(())
    }

    async fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let read = match self {
            Self::Plain(stream) => stream.read(buffer).await?,
            Self::Tls(stream) => stream.read(buffer).await?,
        };
        if read == 0 {
            return Err(ClientError::ConnectionClosed);
        }
        Ok(read)
    }

    /// Wraps a plain transport in TLS. Fails if already encrypted.
    async fn upgrade(self, server_name: &str, accept_invalid_certs: bool) -> Result<Self> {
        match self {
            Self::Plain(stream) => {
                let tls = tls_connect(stream, server_name, accept_invalid_certs).await?;
                Ok(Self::Tls(Box::new(tls)))
            }
            Self::Tls(_) => Err(ClientError::Tls(
                "connection is already encrypted".to_owned(),
            )),
        }
    }
}

/// Performs the TLS handshake over an established TCP stream.
async fn tls_connect(
    stream: TcpStream,
    server_name: &str,
    accept_invalid_certs: bool,
) -> Result<TlsStream<TcpStream>> {
    let config = if accept_invalid_certs {
        ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(InsecureVerifier))
            .with_no_client_auth()
    } else {
        let loaded = rustls_native_certs::load_native_certs();
        if !loaded.errors.is_empty() {
            warn!(errors = ?loaded.errors, "some system certificates could not be loaded");
        }

        let mut roots = RootCertStore::empty();
        roots.add_parsable_certificates(loaded.certs);

        ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth()
    };

    let connector = TlsConnector::from(Arc::new(config));
    let domain = ServerName::try_from(server_name.to_owned())
        .map_err(|error| ClientError::Tls(format!("invalid server name: {error}")))?;

    connector
        .connect(domain, stream)
        .await
        .map_err(|error| ClientError::Tls(error.to_string()))
}

/// Certificate verifier that accepts every certificate.
///
/// Only installed when the caller opts in, for relays behind self-signed
/// certificates and for tests.
#[derive(Debug)]
struct InsecureVerifier;

impl ServerCertVerifier for InsecureVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> std::result::Result<ServerCertVerified, tokio_rustls::rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &CertificateDer<'_>,
        _dss: &DigitallySignedStruct,
    ) -> std::result::Result<HandshakeSignatureValid, tokio_rustls::rustls::Error> {
        Ok(HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        vec![
            SignatureScheme::RSA_PKCS1_SHA256,
            SignatureScheme::RSA_PSS_SHA256,
            SignatureScheme::ECDSA_NISTP256_SHA256,
            SignatureScheme::ED25519,
        ]
    }
}

/// An SMTP client driving one connection through the command/reply protocol.
///
/// The client enforces no timeouts of its own; callers wrap each operation
/// in [`tokio::time::timeout`] as needed.
pub struct SmtpClient {
    connection: Option<Connection>,
    buffer: Vec<u8>,
    server_name: String,
    accept_invalid_certs: bool,
}

impl SmtpClient {
    /// Opens a TCP connection to `host:port`.
    ///
    /// The greeting is not read here; call [`Self::read_greeting`] next, or
    /// [`Self::establish_tls`] first on implicit-TLS ports.
    ///
    /// # Errors
    ///
    /// Returns an error if resolution or the connection fails.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port)).await?;

        Ok(Self {
            connection: Some(Connection::Plain(stream)),
            buffer: Vec::with_capacity(BUFFER_SIZE),
            server_name: host.to_owned(),
            accept_invalid_certs: false,
        })
    }

    /// Sets whether to accept invalid TLS certificates.
    ///
    /// Default is `false`; enable only for relays with self-signed
    /// certificates or in tests.
    #[must_use]
    pub const fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    /// Performs the TLS handshake immediately, before any SMTP exchange.
    ///
    /// This is the implicit-TLS (SMTPS, port 465) flow; the server greeting
    /// arrives over the encrypted stream.
    ///
    /// # Errors
    ///
    /// Returns an error if the handshake fails or the connection is already
    /// encrypted.
    pub async fn establish_tls(&mut self) -> Result<()> {
        self.upgrade_tls().await
    }

    /// Reads the initial server greeting.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or parsing fails.
    pub async fn read_greeting(&mut self) -> Result<Reply> {
        self.read_reply().await
    }

    /// Sends EHLO with the given client hostname.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn ehlo(&mut self, hostname: &str) -> Result<Reply> {
        self.command(&format!("EHLO {hostname}")).await
    }

    /// Sends STARTTLS and, when the server agrees, upgrades the transport.
    ///
    /// A refusal is returned as the server's reply without upgrading, so the
    /// caller can decide whether to continue in the clear.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange or the handshake fails.
    pub async fn starttls(&mut self) -> Result<Reply> {
        let reply = self.command("STARTTLS").await?;
        if reply.is_success() {
            self.upgrade_tls().await?;
        }
        Ok(reply)
    }

    /// Authenticates with AUTH PLAIN (RFC 4616 initial response form).
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn auth_plain(&mut self, username: &str, password: &str) -> Result<Reply> {
        let credentials = BASE64.encode(format!("\0{username}\0{password}"));
        trace!("outgoing: AUTH PLAIN ****");
        self.send_raw(format!("AUTH PLAIN {credentials}\r\n").as_bytes())
            .await?;
        self.read_reply().await
    }

    /// Sends MAIL FROM with the given envelope sender.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn mail_from(&mut self, sender: &str) -> Result<Reply> {
        self.command(&format!("MAIL FROM:<{sender}>")).await
    }

    /// Sends RCPT TO with the given envelope recipient.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn rcpt_to(&mut self, recipient: &str) -> Result<Reply> {
        self.command(&format!("RCPT TO:<{recipient}>")).await
    }

    /// Sends DATA and returns the server's go-ahead (or refusal).
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn data(&mut self) -> Result<Reply> {
        self.command("DATA").await
    }

    /// Transmits the message body and the end-of-data marker.
    ///
    /// Applies RFC 5321 dot transparency, so the message may safely contain
    /// lines starting with a dot.
    ///
    /// # Errors
    ///
    /// Returns an error if sending or reading the reply fails.
    pub async fn send_data(&mut self, message: &str) -> Result<Reply> {
        let payload = dot_stuff(message);
        trace!("outgoing: {} bytes of message data", payload.len());
        self.send_raw(&payload).await?;
        self.read_reply().await
    }

    /// Sends QUIT.
    ///
    /// # Errors
    ///
    /// Returns an error if the exchange fails.
    pub async fn quit(&mut self) -> Result<Reply> {
        self.command("QUIT").await
    }

    async fn command(&mut self, command: &str) -> Result<Reply> {
        trace!("outgoing: {command}");
        self.send_raw(format!("{command}\r\n").as_bytes()).await?;
        self.read_reply().await
    }

    async fn send_raw(&mut self, data: &[u8]) -> Result<()> {
        self.connection_mut()?.send(data).await
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        loop {
            if let Some((reply, consumed)) = Reply::parse(&self.buffer)? {
                self.buffer.drain(..consumed);
                trace!("incoming: {} {}", reply.code, reply.text());
                return Ok(reply);
            }
            if self.buffer.len() > MAX_BUFFER_SIZE {
                return Err(ClientError::Parse(
                    "reply exceeds maximum buffered size".to_owned(),
                ));
            }

            let mut chunk = [0u8; BUFFER_SIZE];
            let read = self.connection_mut()?.read(&mut chunk).await?;
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    async fn upgrade_tls(&mut self) -> Result<()> {
        let connection = self.connection.take().ok_or(ClientError::ConnectionClosed)?;
        let upgraded = connection
            .upgrade(&self.server_name, self.accept_invalid_certs)
            .await?;
        self.connection = Some(upgraded);
        Ok(())
    }

    fn connection_mut(&mut self) -> Result<&mut Connection> {
        self.connection.as_mut().ok_or(ClientError::ConnectionClosed)
    }
}

/// Applies dot transparency, normalises line endings to CRLF, and appends
/// the end-of-data marker.
fn dot_stuff(message: &str) -> Vec<u8> {
    let mut payload = Vec::with_capacity(message.len() + 8);
    let mut lines = message.split('\n').peekable();

    while let Some(line) = lines.next() {
        // A trailing newline yields one empty tail segment, not a blank line.
        if line.is_empty() && lines.peek().is_none() {
            break;
        }
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.starts_with('.') {
            payload.push(b'.');
        }
        payload.extend_from_slice(line.as_bytes());
        payload.extend_from_slice(b"\r\n");
    }

    payload.extend_from_slice(b".\r\n");
    payload
}
