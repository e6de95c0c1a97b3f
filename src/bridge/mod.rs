mod host;
mod picker;

pub use host::{BridgeHost, load_inline_audio};
pub use picker::{FilePicker, NativePicker};

use crate::model::{AppMode, PlayableFile};
use crate::resolver::normalize_path;
use anyhow::{Context, Result};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const DEFAULT_DEV_SERVER: &str = "http://localhost:9080";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ticket(u64);

impl Ticket {
    pub fn from_raw(raw: u64) -> Self {
        Self(raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Show,
    PickFiles,
    PickFolders,
    ResolveDropped(Vec<PathBuf>),
    LoadAudio(PlayableFile),
}

#[derive(Debug)]
pub enum Reply {
    Shown,
    Files(Option<Vec<PlayableFile>>),
    Audio {
        file: PlayableFile,
        result: Result<String, BridgeError>,
    },
}

#[derive(Debug)]
pub struct Response {
    pub ticket: Ticket,
    pub reply: Reply,
}

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("could not determine type of {}", .path.display())]
    UnrecognizedMedia { path: PathBuf },
    #[error("failed to read {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("{} was never handed out by the resolver", .path.display())]
    NotGranted { path: PathBuf },
    #[error("bridge host is not running")]
    Disconnected,
}

pub trait CapabilityBridge {
    fn submit(&mut self, request: Request) -> Result<Ticket, BridgeError>;
    fn try_recv(&mut self) -> Option<Response>;

    fn base_name(&self, path: &Path) -> String {
        base_name(path)
    }

    fn resolve_static_asset(&self, name: &str) -> String;
}

pub fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetResolver {
    mode: AppMode,
    dev_origin: String,
    static_dir: PathBuf,
}

impl AssetResolver {
    pub fn new(mode: AppMode, dev_origin: impl Into<String>, static_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            dev_origin: dev_origin.into(),
            static_dir: static_dir.into(),
        }
    }

    pub fn from_env(mode: AppMode) -> Self {
        let dev_origin =
            std::env::var("KURENAI_DEV_SERVER").unwrap_or_else(|_| String::from(DEFAULT_DEV_SERVER));
        let static_dir = std::env::var_os("KURENAI_STATIC_DIR")
            .map(PathBuf::from)
            .or_else(|| {
                std::env::current_exe()
                    .ok()
                    .and_then(|exe| exe.parent().map(|dir| dir.join("static")))
            })
            .unwrap_or_else(|| PathBuf::from("static"));
        Self::new(mode, dev_origin, static_dir)
    }

    pub fn resolve(&self, name: &str) -> String {
        let name = name.trim_start_matches(['/', '\\']);
        if self.mode.is_development() {
            format!("{}/{name}", self.dev_origin.trim_end_matches('/'))
        } else {
            normalize_path(&self.static_dir.join(name))
                .display()
                .to_string()
        }
    }
}

enum HostCommand {
    Request(Ticket, Request),
    Shutdown,
}

pub struct Bridge {
    cmd_tx: Sender<HostCommand>,
    reply_rx: Receiver<Response>,
    next_ticket: u64,
    assets: AssetResolver,
}

impl Bridge {
    pub fn start(host: BridgeHost, assets: AssetResolver) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (reply_tx, reply_rx) = mpsc::channel();

        thread::Builder::new()
            .name(String::from("kurenai-bridge"))
            .spawn(move || host.run(cmd_rx, reply_tx))
            .context("failed to spawn bridge host thread")?;

        Ok(Self {
            cmd_tx,
            reply_rx,
            next_ticket: 0,
            assets,
        })
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<Response> {
        self.reply_rx.recv_timeout(timeout).ok()
    }

    pub fn shutdown(&self) {
        let _ = self.cmd_tx.send(HostCommand::Shutdown);
    }
}

impl CapabilityBridge for Bridge {
    fn submit(&mut self, request: Request) -> Result<Ticket, BridgeError> {
        self.next_ticket += 1;
        let ticket = Ticket(self.next_ticket);
        debug!(?ticket, ?request, "bridge request");
        self.cmd_tx
            .send(HostCommand::Request(ticket, request))
            .map_err(|_| BridgeError::Disconnected)?;
        Ok(ticket)
    }

    fn try_recv(&mut self) -> Option<Response> {
        self.reply_rx.try_recv().ok()
    }

    fn resolve_static_asset(&self, name: &str) -> String {
        self.assets.resolve(name)
    }
}
