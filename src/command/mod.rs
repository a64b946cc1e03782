//! Operator commands read line by line from the console.
//!
//! `/resync` asks the server to replay the item list on the next tick; the
//! rest inspect or steer the session.

use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use crate::session::{SessionControl, SessionSnapshot};
use crate::sync::SyncFlag;

const HELP: &str = "commands:
  /resync              request the full item list from the server
  /status              show connection and progress
  /connect [address]   reconnect, optionally to a new server
  /disconnect          drop the connection and stay offline
  /help                show this list
  /exit                stop the client";

/// One operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Request a `Sync` on the next tick.
    Resync,
    /// Print the session state.
    Status,
    /// Reconnect, optionally to a new address.
    Connect(Option<String>),
    /// Go offline.
    Disconnect,
    /// Print the command list.
    Help,
    /// Shut the client down.
    Exit,
    /// A `/word` we do not know.
    Unknown(String),
    /// Input that is not a command.
    Text(String),
}

/// Parse one console line. Blank lines yield `None`.
pub fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let Some(rest) = line.strip_prefix('/') else {
        return Some(Command::Text(line.to_string()));
    };

    let mut parts = rest.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let argument = parts.next().map(str::to_string);

    Some(match name.as_str() {
        "resync" => Command::Resync,
        "status" => Command::Status,
        "connect" => Command::Connect(argument),
        "disconnect" => Command::Disconnect,
        "help" => Command::Help,
        "exit" | "quit" => Command::Exit,
        _ => Command::Unknown(name),
    })
}

/// Result of running a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandReply {
    /// Text for the operator.
    pub message: String,
    /// Whether the console loop should stop.
    pub exit: bool,
}

impl CommandReply {
    fn say(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            exit: false,
        }
    }
}

/// Executes operator commands against the running client.
#[derive(Debug, Clone)]
pub struct CommandSurface {
    sync_flag: SyncFlag,
    snapshots: watch::Receiver<SessionSnapshot>,
    control: mpsc::UnboundedSender<SessionControl>,
    shutdown: watch::Sender<bool>,
}

impl CommandSurface {
    /// Create a command surface.
    pub fn new(
        sync_flag: SyncFlag,
        snapshots: watch::Receiver<SessionSnapshot>,
        control: mpsc::UnboundedSender<SessionControl>,
        shutdown: watch::Sender<bool>,
    ) -> Self {
        Self {
            sync_flag,
            snapshots,
            control,
            shutdown,
        }
    }

    /// Run one command.
    pub fn execute(&self, command: Command) -> CommandReply {
        match command {
            Command::Resync => {
                self.sync_flag.request();
                CommandReply::say("Syncing items.")
            }
            Command::Status => CommandReply::say(self.status()),
            Command::Connect(address) => {
                let reply = match &address {
                    Some(address) => format!("Connecting to {address}."),
                    None => "Reconnecting.".to_string(),
                };
                self.control_reply(SessionControl::Connect(address), reply)
            }
            Command::Disconnect => {
                self.control_reply(SessionControl::Disconnect, "Disconnecting.".to_string())
            }
            Command::Help => CommandReply::say(HELP),
            Command::Exit => {
                self.shutdown.send_replace(true);
                CommandReply {
                    message: "Exiting.".to_string(),
                    exit: true,
                }
            }
            Command::Unknown(name) => CommandReply::say(format!("unknown command /{name}\n{HELP}")),
            Command::Text(_) => {
                CommandReply::say("Not a command. Commands start with '/', try /help.")
            }
        }
    }

    fn control_reply(&self, control: SessionControl, reply: String) -> CommandReply {
        match self.control.send(control) {
            Ok(()) => CommandReply::say(reply),
            Err(_) => CommandReply::say("The session is not running."),
        }
    }

    fn status(&self) -> String {
        let snapshot = self.snapshots.borrow().clone();
        let mut status = format!("phase: {}", snapshot.phase);
        if let Some(slot) = &snapshot.slot {
            status.push_str(&format!(
                ", slot {} (team {}), seed {}",
                slot.slot, slot.team, slot.seed_name
            ));
        }
        status.push_str(&format!(
            ", items: {}, checked: {}, goal: {}",
            snapshot.received_items.len(),
            snapshot.acknowledged_locations.len(),
            if snapshot.goal_reached { "reported" } else { "pending" },
        ));
        if self.sync_flag.is_requested() {
            status.push_str(", resync pending");
        }
        status
    }

    /// Read commands from `reader` until EOF, `/exit`, or shutdown.
    pub async fn run<R>(self, reader: R)
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        let mut shutdown = self.shutdown.subscribe();

        loop {
            tokio::select! {
                line = lines.next_line() => match line {
                    Ok(Some(line)) => {
                        let Some(command) = parse_command(&line) else {
                            continue;
                        };
                        let reply = self.execute(command);
                        info!("{}", reply.message);
                        if reply.exit {
                            break;
                        }
                    }
                    Ok(None) => {
                        debug!("console input closed");
                        break;
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to read console input");
                        break;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
