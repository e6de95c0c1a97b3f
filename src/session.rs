use crate::audio::{AudioEngine, InlineSource};
use crate::bridge::{BridgeError, CapabilityBridge, Reply, Request, Response, Ticket};
use crate::config;
use crate::model::{PersistedState, PlayableFile};
use crate::playlist::PlaylistController;
use crate::transport::Transport;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, warn};

pub const APP_NAME: &str = "KURENAI";

/// Everything the UI loop mutates: queue, transport, labels and the one
/// in-flight audio load.
#[derive(Debug)]
pub struct Session {
    pub playlist: PlaylistController,
    pub transport: Transport,
    pub now_playing: Option<String>,
    pub status: String,
    pub dirty: bool,
    pub visible: bool,
    state: PersistedState,
    state_path: Option<PathBuf>,
    pending_load: Option<(Ticket, PlayableFile)>,
    halted: bool,
}

impl Session {
    pub fn from_persisted(state: PersistedState, state_path: Option<PathBuf>) -> Self {
        Self {
            playlist: PlaylistController::new(),
            transport: Transport::new(state.saved_volume),
            now_playing: None,
            status: String::from("Ready"),
            dirty: true,
            visible: false,
            state,
            state_path,
            pending_load: None,
            halted: false,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.pending_load.is_some()
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn window_title(&self) -> String {
        match &self.now_playing {
            Some(name) => format!("{name} - {APP_NAME}"),
            None => String::from(APP_NAME),
        }
    }

    pub fn save(&mut self) -> anyhow::Result<()> {
        let Some(path) = self.state_path.as_deref() else {
            return Ok(());
        };
        config::save_state_to(path, &self.state)
    }

    pub fn reveal(&mut self, bridge: &mut dyn CapabilityBridge) {
        self.request(bridge, Request::Show);
    }

    pub fn pick_files(&mut self, bridge: &mut dyn CapabilityBridge) {
        self.set_status("Choosing files...");
        self.request(bridge, Request::PickFiles);
    }

    pub fn pick_folders(&mut self, bridge: &mut dyn CapabilityBridge) {
        self.set_status("Choosing folders...");
        self.request(bridge, Request::PickFolders);
    }

    pub fn drop_paths(&mut self, bridge: &mut dyn CapabilityBridge, paths: Vec<PathBuf>) {
        if paths.is_empty() {
            return;
        }
        debug!(count = paths.len(), "paths dropped");
        self.request(bridge, Request::ResolveDropped(paths));
    }

    pub fn handle_response(
        &mut self,
        bridge: &mut dyn CapabilityBridge,
        audio: &mut dyn AudioEngine,
        response: Response,
    ) {
        match response.reply {
            Reply::Shown => {
                self.visible = true;
                self.dirty = true;
            }
            Reply::Files(None) => {
                debug!("selection cancelled");
                self.set_status("Ready");
            }
            Reply::Files(Some(files)) => {
                if files.is_empty() {
                    self.set_status("No playable files found");
                    return;
                }
                let count = files.len();
                let active = self.playlist.append(files);
                self.set_status(&format!("Added {count} tracks"));
                self.load_and_play(bridge, audio, active);
            }
            Reply::Audio { file, result } => {
                let is_current = self
                    .pending_load
                    .as_ref()
                    .is_some_and(|(ticket, _)| *ticket == response.ticket);
                if !is_current {
                    debug!(file = %file, "ignoring stale audio reply");
                    return;
                }
                self.pending_load = None;
                self.finish_load(bridge, audio, &file, result);
            }
        }
    }

    pub fn next(&mut self, bridge: &mut dyn CapabilityBridge, audio: &mut dyn AudioEngine) {
        let active = self.playlist.next();
        self.load_and_play(bridge, audio, active);
    }

    pub fn prev(&mut self, bridge: &mut dyn CapabilityBridge, audio: &mut dyn AudioEngine) {
        let active = self.playlist.prev();
        self.load_and_play(bridge, audio, active);
    }

    pub fn append(
        &mut self,
        bridge: &mut dyn CapabilityBridge,
        audio: &mut dyn AudioEngine,
        files: Vec<PlayableFile>,
    ) {
        let active = self.playlist.append(files);
        self.load_and_play(bridge, audio, active);
    }

    pub fn tick(&mut self, bridge: &mut dyn CapabilityBridge, audio: &mut dyn AudioEngine) {
        let current = audio.position().map_or(f64::NAN, |pos| pos.as_secs_f64());
        let duration = audio.duration().map_or(f64::NAN, |dur| dur.as_secs_f64());
        if self
            .transport
            .on_position_update(self.playlist.play_index(), current, duration)
        {
            self.dirty = true;
        }

        if self.pending_load.is_none() && audio.is_finished() {
            debug!("track ended");
            let active = self.playlist.on_track_ended();
            self.load_and_play(bridge, audio, active);
        }
    }

    pub fn toggle_pause(&mut self, bridge: &mut dyn CapabilityBridge, audio: &mut dyn AudioEngine) {
        if self.pending_load.is_some() {
            return;
        }
        if !audio.is_loaded() {
            let active = self.playlist.active_track().cloned();
            self.load_and_play(bridge, audio, active);
            return;
        }

        if audio.is_paused() {
            audio.play();
            self.set_status("Playing");
        } else {
            audio.pause();
            self.set_status("Paused");
        }
    }

    pub fn stop(&mut self, audio: &mut dyn AudioEngine) {
        if !audio.is_loaded() {
            return;
        }
        audio.stop();
        self.transport.seek.sync(0.0, self.transport.seek.max());
        self.set_status("Stopped");
    }

    pub fn begin_seek(&mut self, value: f64) {
        self.transport.seek.begin_drag(value);
        self.dirty = true;
    }

    pub fn drag_seek(&mut self, value: f64) {
        if self.transport.seek.is_seeking() {
            self.transport.seek.drag_to(value);
            self.dirty = true;
        }
    }

    pub fn end_seek(&mut self, audio: &mut dyn AudioEngine) {
        if !self.transport.seek.is_seeking() {
            return;
        }
        let target = self.transport.seek.release();
        self.seek_to(audio, target);
    }

    pub fn seek_relative(&mut self, audio: &mut dyn AudioEngine, delta_secs: f64) {
        let Some(position) = audio.position() else {
            return;
        };
        let target = (position.as_secs_f64() + delta_secs).max(0.0);
        self.seek_to(audio, target);
    }

    fn seek_to(&mut self, audio: &mut dyn AudioEngine, seconds: f64) {
        if !seconds.is_finite() || !audio.is_loaded() {
            return;
        }
        match audio.seek_to(Duration::from_secs_f64(seconds.max(0.0))) {
            Ok(()) => self.dirty = true,
            Err(err) => self.set_status(&format!("seek error: {err:#}")),
        }
    }

    pub fn set_volume(&mut self, audio: &mut dyn AudioEngine, volume: f32) {
        let volume = self.transport.set_volume(volume);
        audio.set_volume(volume);
        self.set_status(&format!("Volume: {}%", (volume * 100.0).round() as u16));
    }

    pub fn commit_volume(&mut self, audio: &mut dyn AudioEngine, volume: f32) {
        self.set_volume(audio, volume);
        self.state.saved_volume = self.transport.volume();
        if let Err(err) = self.save() {
            warn!("failed to persist volume: {err:#}");
            self.set_status(&format!("save error: {err:#}"));
        }
    }

    fn load_and_play(
        &mut self,
        bridge: &mut dyn CapabilityBridge,
        audio: &mut dyn AudioEngine,
        file: Option<PlayableFile>,
    ) {
        let Some(file) = file else {
            return;
        };

        audio.pause();
        match bridge.submit(Request::LoadAudio(file.clone())) {
            Ok(ticket) => {
                debug!(file = %file, ?ticket, "load requested");
                self.pending_load = Some((ticket, file));
                self.dirty = true;
            }
            Err(err) => self.fail_load(audio, &err.to_string()),
        }
    }

    fn finish_load(
        &mut self,
        bridge: &mut dyn CapabilityBridge,
        audio: &mut dyn AudioEngine,
        file: &PlayableFile,
        result: Result<String, BridgeError>,
    ) {
        let bound = result
            .map_err(anyhow::Error::from)
            .and_then(|uri| InlineSource::from_data_uri(&uri))
            .and_then(|source| audio.load(source));
        if let Err(err) = bound {
            self.fail_load(audio, &format!("{err:#}"));
            return;
        }

        audio.set_volume(self.transport.volume());
        audio.play();
        self.halted = false;
        self.transport.clear();

        let name = bridge.base_name(file.as_path());
        info!(file = %file, "now playing");
        self.set_status(&format!("Playing {name}"));
        self.now_playing = Some(name);
    }

    fn fail_load(&mut self, audio: &mut dyn AudioEngine, message: &str) {
        warn!("playback halted: {message}");
        audio.eject();
        self.transport.clear();
        self.halted = true;
        self.set_status(&format!("playback error: {message}"));
    }

    fn request(&mut self, bridge: &mut dyn CapabilityBridge, request: Request) {
        if let Err(err) = bridge.submit(request) {
            self.set_status(&format!("bridge error: {err}"));
        }
    }

    fn set_status(&mut self, message: &str) {
        self.status = message.to_string();
        self.dirty = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::NullAudioEngine;
    use crate::bridge::load_inline_audio;
    use std::collections::VecDeque;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    #[derive(Default)]
    struct FakeBridge {
        next_ticket: u64,
        submitted: VecDeque<(Ticket, Request)>,
        disconnected: bool,
    }

    impl FakeBridge {
        fn take(&mut self) -> (Ticket, Request) {
            self.submitted.pop_front().expect("a request was submitted")
        }

        fn answer_load(&mut self) -> Response {
            let (ticket, file) = match self.take() {
                (ticket, Request::LoadAudio(file)) => (ticket, file),
                (_, other) => panic!("expected a load request, got {other:?}"),
            };
            let result = load_inline_audio(file.as_path());
            Response {
                ticket,
                reply: Reply::Audio { file, result },
            }
        }
    }

    impl CapabilityBridge for FakeBridge {
        fn submit(&mut self, request: Request) -> Result<Ticket, BridgeError> {
            if self.disconnected {
                return Err(BridgeError::Disconnected);
            }
            self.next_ticket += 1;
            let ticket = Ticket::from_raw(self.next_ticket);
            self.submitted.push_back((ticket, request));
            Ok(ticket)
        }

        fn try_recv(&mut self) -> Option<Response> {
            None
        }

        fn resolve_static_asset(&self, name: &str) -> String {
            format!("http://localhost:9080/{name}")
        }
    }

    fn write_wav(dir: &Path, name: &str, duration_ms: u32) -> PlayableFile {
        let path = dir.join(name);
        fs::write(&path, crate::audio::wav_bytes(duration_ms)).expect("write wav");
        PlayableFile::new(path)
    }

    fn session() -> Session {
        Session::from_persisted(PersistedState::default(), None)
    }

    #[test]
    fn show_acknowledgement_makes_session_visible() {
        let mut bridge = FakeBridge::default();
        let mut audio = NullAudioEngine::new();
        let mut session = session();

        session.reveal(&mut bridge);
        let (ticket, request) = bridge.take();
        assert_eq!(request, Request::Show);
        assert!(!session.visible);

        session.handle_response(
            &mut bridge,
            &mut audio,
            Response {
                ticket,
                reply: Reply::Shown,
            },
        );
        assert!(session.visible);
    }

    #[test]
    fn cancelled_picker_changes_nothing() {
        let mut bridge = FakeBridge::default();
        let mut audio = NullAudioEngine::new();
        let mut session = session();

        session.pick_files(&mut bridge);
        let (ticket, _) = bridge.take();
        session.handle_response(
            &mut bridge,
            &mut audio,
            Response {
                ticket,
                reply: Reply::Files(None),
            },
        );

        assert!(session.playlist.is_empty());
        assert!(bridge.submitted.is_empty());
    }

    #[test]
    fn resolved_files_are_appended_and_played() {
        let dir = tempdir().expect("tempdir");
        let first = write_wav(dir.path(), "First Song.mp3", 500);
        let second = write_wav(dir.path(), "second.mp3", 500);

        let mut bridge = FakeBridge::default();
        let mut audio = NullAudioEngine::new();
        let mut session = session();

        session.handle_response(
            &mut bridge,
            &mut audio,
            Response {
                ticket: Ticket::from_raw(99),
                reply: Reply::Files(Some(vec![first, second])),
            },
        );
        assert_eq!(session.playlist.index(), Some(0));
        assert!(session.is_loading());

        let response = bridge.answer_load();
        session.handle_response(&mut bridge, &mut audio, response);

        assert!(!session.is_loading());
        assert!(audio.is_loaded());
        assert!(!audio.is_paused());
        assert_eq!(session.now_playing.as_deref(), Some("First Song"));
        assert_eq!(session.window_title(), "First Song - KURENAI");
    }

    #[test]
    fn stale_load_replies_are_ignored() {
        let dir = tempdir().expect("tempdir");
        let files = vec![
            write_wav(dir.path(), "a.mp3", 500),
            write_wav(dir.path(), "b.mp3", 500),
        ];

        let mut bridge = FakeBridge::default();
        let mut audio = NullAudioEngine::new();
        let mut session = session();

        session.append(&mut bridge, &mut audio, files);
        let stale = bridge.answer_load();
        session.next(&mut bridge, &mut audio);

        session.handle_response(&mut bridge, &mut audio, stale);
        assert!(!audio.is_loaded());
        assert!(session.is_loading());

        let fresh = bridge.answer_load();
        session.handle_response(&mut bridge, &mut audio, fresh);
        assert_eq!(session.now_playing.as_deref(), Some("b"));
    }

    #[test]
    fn pause_toggle_waits_for_a_pending_load() {
        let dir = tempdir().expect("tempdir");
        let files = vec![
            write_wav(dir.path(), "a.mp3", 500),
            write_wav(dir.path(), "b.mp3", 500),
        ];

        let mut bridge = FakeBridge::default();
        let mut audio = NullAudioEngine::new();
        let mut session = session();

        session.append(&mut bridge, &mut audio, files);
        let first = bridge.answer_load();
        session.handle_response(&mut bridge, &mut audio, first);
        assert!(!audio.is_paused());

        session.next(&mut bridge, &mut audio);
        assert!(audio.is_paused());

        session.toggle_pause(&mut bridge, &mut audio);
        assert!(audio.is_paused());
        assert_eq!(bridge.submitted.len(), 1);

        let second = bridge.answer_load();
        session.handle_response(&mut bridge, &mut audio, second);
        assert_eq!(session.now_playing.as_deref(), Some("b"));
        assert!(!audio.is_paused());
    }

    #[test]
    fn unrecognized_media_halts_without_advancing() {
        let dir = tempdir().expect("tempdir");
        let bogus = dir.path().join("bogus.mp3");
        fs::write(&bogus, b"plain text, not audio").expect("write");
        let good = write_wav(dir.path(), "good.mp3", 500);

        let mut bridge = FakeBridge::default();
        let mut audio = NullAudioEngine::new();
        let mut session = session();

        session.append(&mut bridge, &mut audio, vec![PlayableFile::new(&bogus), good]);
        let response = bridge.answer_load();
        session.handle_response(&mut bridge, &mut audio, response);

        assert!(session.is_halted());
        assert!(session.status.contains("could not determine type"));
        assert!(!audio.is_loaded());

        session.tick(&mut bridge, &mut audio);
        assert_eq!(session.playlist.index(), Some(0));
        assert!(bridge.submitted.is_empty());
    }

    #[test]
    fn finished_track_advances_and_wraps() {
        let dir = tempdir().expect("tempdir");
        let files = vec![
            write_wav(dir.path(), "a.mp3", 20),
            write_wav(dir.path(), "b.mp3", 20),
        ];

        let mut bridge = FakeBridge::default();
        let mut audio = NullAudioEngine::new();
        let mut session = session();

        session.append(&mut bridge, &mut audio, files);
        let response = bridge.answer_load();
        session.handle_response(&mut bridge, &mut audio, response);
        session.next(&mut bridge, &mut audio);
        let response = bridge.answer_load();
        session.handle_response(&mut bridge, &mut audio, response);
        assert_eq!(session.playlist.index(), Some(1));

        std::thread::sleep(Duration::from_millis(60));
        session.tick(&mut bridge, &mut audio);

        assert_eq!(session.playlist.index(), Some(0));
        assert!(session.is_loading());
        session.tick(&mut bridge, &mut audio);
        assert_eq!(bridge.submitted.len(), 1, "no duplicate load while pending");
    }

    #[test]
    fn ticks_update_label_but_not_a_dragged_seek_bar() {
        let dir = tempdir().expect("tempdir");
        let mut bridge = FakeBridge::default();
        let mut audio = NullAudioEngine::new();
        let mut session = session();

        session.append(&mut bridge, &mut audio, vec![write_wav(dir.path(), "a.mp3", 2_000)]);
        let response = bridge.answer_load();
        session.handle_response(&mut bridge, &mut audio, response);

        session.tick(&mut bridge, &mut audio);
        assert!(session.transport.time_label.starts_with("001 - 00:00 / 00:0"));

        session.begin_seek(1.5);
        session.tick(&mut bridge, &mut audio);
        assert_eq!(session.transport.seek.value(), 1.5);

        session.end_seek(&mut audio);
        let position = audio.position().expect("position");
        assert!(position >= Duration::from_millis(1_500));
    }

    #[test]
    fn stop_rewinds_without_moving_the_index() {
        let dir = tempdir().expect("tempdir");
        let mut bridge = FakeBridge::default();
        let mut audio = NullAudioEngine::new();
        let mut session = session();

        session.append(
            &mut bridge,
            &mut audio,
            vec![
                write_wav(dir.path(), "a.mp3", 2_000),
                write_wav(dir.path(), "b.mp3", 2_000),
            ],
        );
        let response = bridge.answer_load();
        session.handle_response(&mut bridge, &mut audio, response);
        session.seek_relative(&mut audio, 1.0);

        session.stop(&mut audio);

        assert_eq!(audio.position(), Some(Duration::ZERO));
        assert!(audio.is_paused());
        assert_eq!(session.playlist.index(), Some(0));
    }

    #[test]
    fn committed_volume_is_persisted() {
        let dir = tempdir().expect("tempdir");
        let state_path = dir.path().join("state.json");
        let mut audio = NullAudioEngine::new();
        let mut session =
            Session::from_persisted(PersistedState::default(), Some(state_path.clone()));

        session.set_volume(&mut audio, 0.2);
        assert!(!state_path.exists(), "live changes are not persisted");

        session.commit_volume(&mut audio, 0.4);
        let saved = config::load_state_from(&state_path).expect("load");
        assert_eq!(saved.saved_volume, 0.4);
        assert_eq!(audio.volume(), 0.4);
    }

    #[test]
    fn disconnected_bridge_is_reported() {
        let mut bridge = FakeBridge {
            disconnected: true,
            ..FakeBridge::default()
        };
        let mut session = session();

        session.pick_folders(&mut bridge);
        assert!(session.status.contains("not running"));
    }
}
