use super::{BridgeError, FilePicker, HostCommand, Reply, Request, Response};
use crate::model::{PlayableFile, Selection};
use crate::resolver::PathResolver;
use crate::sniff::sniff_mime;
use base64::prelude::*;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender};
use tracing::{debug, info, warn};

pub struct BridgeHost {
    resolver: PathResolver,
    picker: Box<dyn FilePicker>,
    granted: HashSet<PathBuf>,
}

impl BridgeHost {
    pub fn new(resolver: PathResolver, picker: Box<dyn FilePicker>) -> Self {
        Self {
            resolver,
            picker,
            granted: HashSet::new(),
        }
    }

    pub fn handle(&mut self, request: Request) -> Reply {
        match request {
            Request::Show => {
                info!("window revealed");
                Reply::Shown
            }
            Request::PickFiles => {
                let extensions = self.resolver.filter().extensions().to_vec();
                let picked = self.picker.pick_files(&extensions);
                Reply::Files(picked.map(|paths| self.resolve(Selection::Files(paths))))
            }
            Request::PickFolders => {
                let picked = self.picker.pick_folders();
                Reply::Files(picked.map(|paths| self.resolve(Selection::Folders(paths))))
            }
            Request::ResolveDropped(paths) => {
                Reply::Files(Some(self.resolve(Selection::Dropped(paths))))
            }
            Request::LoadAudio(file) => {
                let result = if self.granted.contains(file.as_path()) {
                    load_inline_audio(file.as_path())
                } else {
                    Err(BridgeError::NotGranted {
                        path: file.as_path().to_path_buf(),
                    })
                };
                if let Err(err) = &result {
                    warn!("load failed: {err}");
                }
                Reply::Audio { file, result }
            }
        }
    }

    fn resolve(&mut self, selection: Selection) -> Vec<PlayableFile> {
        let files = self.resolver.resolve(&selection);
        self.granted
            .extend(files.iter().map(|file| file.as_path().to_path_buf()));
        files
    }

    pub(super) fn run(mut self, cmd_rx: Receiver<HostCommand>, reply_tx: Sender<Response>) {
        while let Ok(command) = cmd_rx.recv() {
            let (ticket, request) = match command {
                HostCommand::Request(ticket, request) => (ticket, request),
                HostCommand::Shutdown => break,
            };

            let reply = self.handle(request);
            if reply_tx.send(Response { ticket, reply }).is_err() {
                break;
            }
        }
        debug!("bridge host stopped");
    }
}

pub fn load_inline_audio(path: &Path) -> Result<String, BridgeError> {
    let bytes = fs::read(path).map_err(|source| BridgeError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mime = sniff_mime(&bytes).ok_or_else(|| BridgeError::UnrecognizedMedia {
        path: path.to_path_buf(),
    })?;
    debug!(path = %path.display(), mime, bytes = bytes.len(), "encoded inline audio");
    Ok(format!("data:{mime};base64,{}", BASE64_STANDARD.encode(&bytes)))
}
