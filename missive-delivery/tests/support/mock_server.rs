//! In-process SMTP server for exercising the delivery path end to end.
//!
//! Binds an ephemeral local port, answers the command phase with scripted
//! replies, and records every command and accepted message so tests can
//! assert on what actually crossed the wire.

#![allow(dead_code)] // Shared test utility; not every knob is used by every test.

use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::RwLock,
    task::JoinHandle,
};

/// A command observed during a session, with its raw argument text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpCommand {
    Ehlo(String),
    Auth(String),
    MailFrom(String),
    RcptTo(String),
    Data,
    Quit,
    Other(String),
}

/// A fixed reply the server issues for one command.
#[derive(Debug, Clone)]
pub struct MockReply {
    pub code: u16,
    pub text: String,
}

impl MockReply {
    pub fn new(code: u16, text: impl Into<String>) -> Self {
        Self { code, text: text.into() }
    }

    fn to_line(&self) -> String {
        format!("{} {}\r\n", self.code, self.text)
    }
}

/// One message accepted by the server, together with its envelope.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub sender: String,
    pub recipients: Vec<String>,
    /// The data section exactly as it crossed the wire, dot transparency
    /// intact.
    pub data: String,
}

#[derive(Debug, Clone)]
struct MockConfig {
    greeting: MockReply,
    ehlo_capabilities: Vec<String>,
    auth: MockReply,
    mail_from: MockReply,
    rcpt_to: MockReply,
    data_go_ahead: MockReply,
    data_accepted: MockReply,
    rejected_recipient: Option<String>,
    drop_after_commands: Option<usize>,
    stall_on_command: Option<usize>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            greeting: MockReply::new(220, "mock ESMTP ready"),
            ehlo_capabilities: vec![
                "mock.localdomain".to_owned(),
                "AUTH PLAIN LOGIN".to_owned(),
                "8BITMIME".to_owned(),
            ],
            auth: MockReply::new(235, "2.7.0 Authentication succeeded"),
            mail_from: MockReply::new(250, "OK"),
            rcpt_to: MockReply::new(250, "OK"),
            data_go_ahead: MockReply::new(354, "End data with <CR><LF>.<CR><LF>"),
            data_accepted: MockReply::new(250, "OK: queued"),
            rejected_recipient: None,
            drop_after_commands: None,
            stall_on_command: None,
        }
    }
}

struct ServerState {
    config: MockConfig,
    commands: RwLock<Vec<SmtpCommand>>,
    messages: RwLock<Vec<ReceivedMessage>>,
    connections: AtomicUsize,
}

/// Builder for a [`MockSmtpServer`] with scripted replies.
#[derive(Debug, Default)]
pub struct MockServerBuilder {
    config: MockConfig,
}

impl MockServerBuilder {
    #[must_use]
    pub fn with_greeting(mut self, code: u16, text: &str) -> Self {
        self.config.greeting = MockReply::new(code, text);
        self
    }

    #[must_use]
    pub fn with_ehlo_capabilities(mut self, capabilities: &[&str]) -> Self {
        self.config.ehlo_capabilities =
            capabilities.iter().map(|&capability| capability.to_owned()).collect();
        self
    }

    #[must_use]
    pub fn with_auth_reply(mut self, code: u16, text: &str) -> Self {
        self.config.auth = MockReply::new(code, text);
        self
    }

    #[must_use]
    pub fn with_mail_from_reply(mut self, code: u16, text: &str) -> Self {
        self.config.mail_from = MockReply::new(code, text);
        self
    }

    #[must_use]
    pub fn with_rcpt_to_reply(mut self, code: u16, text: &str) -> Self {
        self.config.rcpt_to = MockReply::new(code, text);
        self
    }

    #[must_use]
    pub fn with_data_go_ahead(mut self, code: u16, text: &str) -> Self {
        self.config.data_go_ahead = MockReply::new(code, text);
        self
    }

    #[must_use]
    pub fn with_data_accepted(mut self, code: u16, text: &str) -> Self {
        self.config.data_accepted = MockReply::new(code, text);
        self
    }

    /// Refuses any RCPT TO whose address contains the given text.
    #[must_use]
    pub fn with_rejected_recipient(mut self, address: &str) -> Self {
        self.config.rejected_recipient = Some(address.to_owned());
        self
    }

    /// Closes the connection without a reply once `count` commands were read.
    #[must_use]
    pub const fn with_drop_after_commands(mut self, count: usize) -> Self {
        self.config.drop_after_commands = Some(count);
        self
    }

    /// Stops replying just before the zero-indexed `index`th command.
    #[must_use]
    pub const fn with_stall_on_command(mut self, index: usize) -> Self {
        self.config.stall_on_command = Some(index);
        self
    }

    /// Binds an ephemeral port and starts accepting sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind.
    pub async fn build(self) -> io::Result<MockSmtpServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let state = Arc::new(ServerState {
            config: self.config,
            commands: RwLock::new(Vec::new()),
            messages: RwLock::new(Vec::new()),
            connections: AtomicUsize::new(0),
        });

        let accept_state = Arc::clone(&state);
        let accept_task = tokio::spawn(async move {
            loop {
                let Ok((stream, _)) = listener.accept().await else {
                    break;
                };
                let session_state = Arc::clone(&accept_state);
                tokio::spawn(async move {
                    let _ = handle_session(stream, session_state).await;
                });
            }
        });

        Ok(MockSmtpServer { addr, state, accept_task })
    }
}

/// A scripted SMTP server bound to an ephemeral local port.
pub struct MockSmtpServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    accept_task: JoinHandle<()>,
}

impl MockSmtpServer {
    #[must_use]
    pub fn builder() -> MockServerBuilder {
        MockServerBuilder::default()
    }

    /// Starts a server that accepts everything.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind.
    pub async fn start() -> io::Result<Self> {
        Self::builder().build().await
    }

    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Every command read so far, across all connections.
    pub async fn commands(&self) -> Vec<SmtpCommand> {
        self.state.commands.read().await.clone()
    }

    /// Every message accepted so far, in order of arrival.
    pub async fn messages(&self) -> Vec<ReceivedMessage> {
        self.state.messages.read().await.clone()
    }

    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.state.connections.load(Ordering::Relaxed)
    }
}

impl Drop for MockSmtpServer {
    fn drop(&mut self) {
        self.accept_task.abort();
    }
}

#[allow(clippy::too_many_lines)]
async fn handle_session(stream: TcpStream, state: Arc<ServerState>) -> io::Result<()> {
    state.connections.fetch_add(1, Ordering::Relaxed);

    let config = &state.config;
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    writer.write_all(config.greeting.to_line().as_bytes()).await?;

    let mut sender = String::new();
    let mut recipients: Vec<String> = Vec::new();
    let mut handled = 0_usize;
    let mut line = String::new();

    loop {
        if let Some(limit) = config.drop_after_commands
            && handled >= limit
        {
            return Ok(());
        }
        if config.stall_on_command == Some(handled) {
            tokio::time::sleep(Duration::from_secs(600)).await;
            return Ok(());
        }

        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        handled += 1;

        let input = line.trim_end();
        let (verb, argument) = input.split_once(' ').map_or_else(
            || (input.to_ascii_uppercase(), String::new()),
            |(verb, argument)| (verb.to_ascii_uppercase(), argument.to_owned()),
        );

        match verb.as_str() {
            "EHLO" => {
                state.commands.write().await.push(SmtpCommand::Ehlo(argument));
                writer.write_all(ehlo_reply(&config.ehlo_capabilities).as_bytes()).await?;
            }
            "AUTH" => {
                state.commands.write().await.push(SmtpCommand::Auth(argument));
                writer.write_all(config.auth.to_line().as_bytes()).await?;
            }
            "MAIL" => {
                sender = angle_address(&argument);
                state.commands.write().await.push(SmtpCommand::MailFrom(argument));
                writer.write_all(config.mail_from.to_line().as_bytes()).await?;
            }
            "RCPT" => {
                let address = angle_address(&argument);
                state.commands.write().await.push(SmtpCommand::RcptTo(argument));

                let refused = config
                    .rejected_recipient
                    .as_deref()
                    .is_some_and(|rejected| address.contains(rejected));
                if refused {
                    let reply = MockReply::new(550, "5.1.1 Recipient refused");
                    writer.write_all(reply.to_line().as_bytes()).await?;
                } else {
                    recipients.push(address);
                    writer.write_all(config.rcpt_to.to_line().as_bytes()).await?;
                }
            }
            "DATA" => {
                state.commands.write().await.push(SmtpCommand::Data);
                writer.write_all(config.data_go_ahead.to_line().as_bytes()).await?;
                if config.data_go_ahead.code != 354 {
                    continue;
                }

                let mut data = String::new();
                loop {
                    line.clear();
                    if reader.read_line(&mut line).await? == 0 {
                        return Ok(());
                    }
                    if line.trim_end() == "." {
                        break;
                    }
                    data.push_str(&line);
                }

                state.messages.write().await.push(ReceivedMessage {
                    sender: std::mem::take(&mut sender),
                    recipients: std::mem::take(&mut recipients),
                    data,
                });
                writer.write_all(config.data_accepted.to_line().as_bytes()).await?;
            }
            "QUIT" => {
                state.commands.write().await.push(SmtpCommand::Quit);
                let reply = MockReply::new(221, "2.0.0 Bye");
                writer.write_all(reply.to_line().as_bytes()).await?;
                return Ok(());
            }
            _ => {
                state.commands.write().await.push(SmtpCommand::Other(input.to_owned()));
                let reply = MockReply::new(500, "5.5.1 Command unrecognised");
                writer.write_all(reply.to_line().as_bytes()).await?;
            }
        }
    }
}

fn ehlo_reply(capabilities: &[String]) -> String {
    let mut reply = String::new();
    for (index, capability) in capabilities.iter().enumerate() {
        let separator = if index + 1 == capabilities.len() { ' ' } else { '-' };
        reply.push_str(&format!("250{separator}{capability}\r\n"));
    }
    reply
}

fn angle_address(argument: &str) -> String {
    argument
        .split_once('<')
        .and_then(|(_, rest)| rest.split_once('>'))
        .map_or_else(|| argument.to_owned(), |(address, _)| address.to_owned())
}
