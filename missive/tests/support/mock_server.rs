//! Minimal recording SMTP server for end-to-end tests.
//!
//! Accepts every command and records the envelope and data of each message
//! so tests can assert on what the service actually handed to the relay.
//! Failure scenarios that need a scripted relay live in the delivery
//! crate's tests; end to end we only distinguish "relay up" from "relay
//! down", and the latter needs no server at all.

#![allow(dead_code)] // Shared test utility; not every accessor is used by every test.

use std::{
    io,
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
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
    MailFrom(String),
    RcptTo(String),
    Data,
    Quit,
    Other(String),
}

/// One message accepted by the server, together with its envelope.
#[derive(Debug, Clone)]
pub struct ReceivedMessage {
    pub sender: String,
    pub recipients: Vec<String>,
    pub data: String,
}

#[derive(Default)]
struct ServerState {
    commands: RwLock<Vec<SmtpCommand>>,
    messages: RwLock<Vec<ReceivedMessage>>,
    connections: AtomicUsize,
}

/// An accept-everything SMTP server bound to an ephemeral local port.
pub struct MockSmtpServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
    accept_task: JoinHandle<()>,
}

impl MockSmtpServer {
    /// Binds an ephemeral port and starts accepting sessions.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind.
    pub async fn start() -> io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let state = Arc::new(ServerState::default());

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

        Ok(Self {
            addr,
            state,
            accept_task,
        })
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

async fn handle_session(stream: TcpStream, state: Arc<ServerState>) -> io::Result<()> {
    state.connections.fetch_add(1, Ordering::Relaxed);

    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);

    writer.write_all(b"220 mock ESMTP ready\r\n").await?;

    let mut sender = String::new();
    let mut recipients: Vec<String> = Vec::new();
    let mut line = String::new();

    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }

        let input = line.trim_end();
        let (verb, argument) = input.split_once(' ').map_or_else(
            || (input.to_ascii_uppercase(), String::new()),
            |(verb, argument)| (verb.to_ascii_uppercase(), argument.to_owned()),
        );

        match verb.as_str() {
            "EHLO" => {
                state.commands.write().await.push(SmtpCommand::Ehlo(argument));
                writer
                    .write_all(b"250-mock.localdomain\r\n250 8BITMIME\r\n")
                    .await?;
            }
            "MAIL" => {
                sender = angle_address(&argument);
                state.commands.write().await.push(SmtpCommand::MailFrom(argument));
                writer.write_all(b"250 OK\r\n").await?;
            }
            "RCPT" => {
                recipients.push(angle_address(&argument));
                state.commands.write().await.push(SmtpCommand::RcptTo(argument));
                writer.write_all(b"250 OK\r\n").await?;
            }
            "DATA" => {
                state.commands.write().await.push(SmtpCommand::Data);
                writer
                    .write_all(b"354 End data with <CR><LF>.<CR><LF>\r\n")
                    .await?;

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
                writer.write_all(b"250 OK: queued\r\n").await?;
            }
            "QUIT" => {
                state.commands.write().await.push(SmtpCommand::Quit);
                writer.write_all(b"221 2.0.0 Bye\r\n").await?;
                return Ok(());
            }
            _ => {
                state.commands.write().await.push(SmtpCommand::Other(input.to_owned()));
                writer.write_all(b"250 OK\r\n").await?;
            }
        }
    }
}

fn angle_address(argument: &str) -> String {
    argument
        .split_once('<')
        .and_then(|(_, rest)| rest.split_once('>'))
        .map_or_else(|| argument.to_owned(), |(address, _)| address.to_owned())
}
