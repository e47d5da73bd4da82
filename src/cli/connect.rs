//! Connect command implementation

use super::ConnectionOverrides;
use crate::config::ConnectionConfig;
use crate::listeners::{Event, EventListeners};
use crate::options::ValidatedArgs;
use crate::socket::BoomerangSocket;
use crate::ws::{Message, NORMAL_CLOSURE};
use clap::Args;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;

#[derive(Args, Debug)]
pub struct ConnectArgs {
    #[command(flatten)]
    pub connection: ConnectionOverrides,
}

impl ConnectArgs {
    pub async fn execute(&self, configured: &ConnectionConfig) -> anyhow::Result<()> {
        let ValidatedArgs {
            url,
            protocols,
            options,
        } = self.connection.apply(configured.clone())?.validate()?;

        let listeners = EventListeners::shared();
        let socket = BoomerangSocket::connect(&url, protocols, options, listeners)?;
        let closed = Arc::new(Notify::new());

        socket.set_onopen(|_| tracing::info!("Connected"));
        socket.set_onmessage(|event| {
            if let Event::Message(message) = event {
                match message {
                    Message::Text(text) => println!("{}", text),
                    Message::Binary(data) => println!("<{} bytes>", data.len()),
                }
            }
        });
        socket.set_onerror(|event| {
            if let Event::Error(error) = event {
                tracing::warn!(error = %error, "Socket error");
            }
        });
        {
            let closed = closed.clone();
            socket.set_onclose(move |event| {
                if let Event::Close(close) = event {
                    tracing::info!(code = close.code, reason = %close.reason, "Disconnected");
                }
                closed.notify_one();
            });
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutting down");
                    socket.close(Some(NORMAL_CLOSURE), None);
                    break;
                }
                _ = closed.notified() => {
                    if socket.reconnector().is_closed() || !socket.reconnector().options().reconnect {
                        tracing::info!("Connection closed for good");
                        break;
                    }
                }
                line = lines.next_line(), if stdin_open => {
                    match line? {
                        Some(line) => {
                            if let Err(e) = socket.send(line) {
                                tracing::warn!(error = %e, "Message not sent");
                            }
                        }
                        None => stdin_open = false,
                    }
                }
            }
        }

        Ok(())
    }
}
