use crate::audio::{AudioEngine, NullAudioEngine, RodioAudioEngine};
use crate::bridge::{AssetResolver, Bridge, BridgeHost, CapabilityBridge, NativePicker};
use crate::config;
use crate::model::AppMode;
use crate::resolver::{ExtensionFilter, PathResolver};
use crate::session::Session;
use crate::ui::{self, HitAreas};
use anyhow::Result;
use crossterm::event::{
    self, DisableBracketedPaste, DisableMouseCapture, EnableBracketedPaste, EnableMouseCapture,
    Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, SetTitle, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io::stdout;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{info, warn};

const TICK: Duration = Duration::from_millis(250);
const SEEK_STEP_SECS: f64 = 5.0;
const VOLUME_STEP: f32 = 0.05;

#[derive(Debug, Clone, Default)]
pub struct AppStartupOptions {
    pub mode: AppMode,
    pub null_audio: bool,
    pub initial_paths: Vec<PathBuf>,
}

enum Flow {
    Continue,
    Quit,
}

pub fn run_with_startup(options: AppStartupOptions) -> Result<()> {
    let state_path = config::state_path()?;
    let state = config::load_state_from(&state_path)?;
    info!(mode = ?options.mode, state = %state_path.display(), "starting");

    let resolver = PathResolver::new(ExtensionFilter::from_state(&state));
    let host = BridgeHost::new(resolver, Box::new(NativePicker));
    let mut bridge = Bridge::start(host, AssetResolver::from_env(options.mode))?;
    info!(icon = %bridge.resolve_static_asset("KURENAI.ico"), "static assets");

    let mut audio: Box<dyn AudioEngine> = if options.null_audio {
        Box::new(NullAudioEngine::new())
    } else {
        match RodioAudioEngine::new() {
            Ok(engine) => Box::new(engine),
            Err(err) => {
                warn!("audio output unavailable, continuing silently: {err:#}");
                Box::new(NullAudioEngine::new())
            }
        }
    };
    audio.set_volume(state.saved_volume);

    let mut session = Session::from_persisted(state, Some(state_path));
    session.reveal(&mut bridge);
    session.drop_paths(&mut bridge, options.initial_paths);

    let outcome = enable_raw_mode()
        .map_err(anyhow::Error::from)
        .and_then(|()| event_loop(&mut session, &mut bridge, &mut *audio));
    let restored = restore_terminal();
    wind_down(&mut session, &bridge, outcome.and(restored))
}

fn event_loop(
    session: &mut Session,
    bridge: &mut dyn CapabilityBridge,
    audio: &mut dyn AudioEngine,
) -> Result<()> {
    let mut out = stdout();
    execute!(
        out,
        EnterAlternateScreen,
        EnableMouseCapture,
        EnableBracketedPaste,
        SetTitle(session.window_title())
    )?;
    let backend = CrosstermBackend::new(out);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut command_mode = false;
    let mut command_buffer = String::new();
    let mut last_tick = Instant::now();
    let mut window_title = session.window_title();
    let mut hit_areas = HitAreas::default();

    loop {
        while let Some(response) = bridge.try_recv() {
            session.handle_response(bridge, audio, response);
        }

        if last_tick.elapsed() >= TICK {
            session.tick(bridge, audio);
            last_tick = Instant::now();
        }

        let title = session.window_title();
        if title != window_title {
            execute!(terminal.backend_mut(), SetTitle(&title))?;
            window_title = title;
        }

        if session.visible && session.dirty {
            terminal.draw(|frame| {
                hit_areas = ui::hit_areas(frame.area());
                let command = command_mode.then_some(command_buffer.as_str());
                ui::draw(frame, &*session, &*audio, command)
            })?;
            session.dirty = false;
        }

        if !event::poll(Duration::from_millis(33))? {
            continue;
        }

        match event::read()? {
            Event::Mouse(mouse) => handle_mouse(session, audio, mouse, hit_areas),
            Event::Paste(text) => session.drop_paths(bridge, parse_dropped_paths(&text)),
            Event::Resize(..) => session.dirty = true,
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                if command_mode {
                    match key.code {
                        KeyCode::Esc => {
                            command_mode = false;
                            command_buffer.clear();
                            session.dirty = true;
                        }
                        KeyCode::Enter => {
                            run_command(session, bridge, &command_buffer);
                            command_mode = false;
                            command_buffer.clear();
                            session.dirty = true;
                        }
                        KeyCode::Backspace => {
                            command_buffer.pop();
                            session.dirty = true;
                        }
                        KeyCode::Char(ch) => {
                            command_buffer.push(ch);
                            session.dirty = true;
                        }
                        _ => {}
                    }
                    continue;
                }

                if key.code == KeyCode::Char(':') {
                    command_mode = true;
                    session.dirty = true;
                    continue;
                }

                if let Flow::Quit = handle_key(session, bridge, audio, key) {
                    return Ok(());
                }
            }
            _ => {}
        }
    }
}

/// Undoes every terminal mode `event_loop` may have switched on. Each step
/// runs even if an earlier one fails.
fn restore_terminal() -> Result<()> {
    let raw = disable_raw_mode();
    let screen = execute!(
        stdout(),
        LeaveAlternateScreen,
        DisableMouseCapture,
        DisableBracketedPaste,
        Show
    );
    raw.and(screen).map_err(anyhow::Error::from)
}

fn wind_down(session: &mut Session, bridge: &Bridge, outcome: Result<()>) -> Result<()> {
    bridge.shutdown();
    let saved = session.save();
    if let Err(err) = &outcome {
        warn!("event loop ended with an error: {err:#}");
    }
    info!("stopped");
    outcome.and(saved)
}

fn handle_key(
    session: &mut Session,
    bridge: &mut dyn CapabilityBridge,
    audio: &mut dyn AudioEngine,
    key: KeyEvent,
) -> Flow {
    match key.code {
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Flow::Quit,
        KeyCode::Char('q') | KeyCode::Esc => return Flow::Quit,
        KeyCode::Char('o') => session.pick_files(bridge),
        KeyCode::Char('f') => session.pick_folders(bridge),
        KeyCode::Char('p') | KeyCode::Char(' ') => session.toggle_pause(bridge, audio),
        KeyCode::Char('s') => session.stop(audio),
        KeyCode::Char('n') => session.next(bridge, audio),
        KeyCode::Char('b') => session.prev(bridge, audio),
        KeyCode::Char('[') => session.seek_relative(audio, -SEEK_STEP_SECS),
        KeyCode::Char(']') => session.seek_relative(audio, SEEK_STEP_SECS),
        KeyCode::Char('+') | KeyCode::Char('=') => {
            let next = session.transport.volume() + VOLUME_STEP;
            session.commit_volume(audio, next);
        }
        KeyCode::Char('-') => {
            let next = session.transport.volume() - VOLUME_STEP;
            session.commit_volume(audio, next);
        }
        _ => {}
    }
    Flow::Continue
}

fn handle_mouse(
    session: &mut Session,
    audio: &mut dyn AudioEngine,
    mouse: MouseEvent,
    areas: HitAreas,
) {
    let max = session.transport.seek.max();
    match mouse.kind {
        MouseEventKind::Down(MouseButton::Left)
            if ui::point_in_rect(mouse.column, mouse.row, areas.seek) =>
        {
            session.begin_seek(ui::ratio_at(areas.seek, mouse.column) * max);
        }
        MouseEventKind::Down(MouseButton::Left)
            if ui::point_in_rect(mouse.column, mouse.row, areas.volume) =>
        {
            session.commit_volume(audio, ui::ratio_at(areas.volume, mouse.column) as f32);
        }
        MouseEventKind::Drag(MouseButton::Left) => {
            session.drag_seek(ui::ratio_at(areas.seek, mouse.column) * max);
        }
        MouseEventKind::Up(MouseButton::Left) => session.end_seek(audio),
        _ => {}
    }
}

fn run_command(session: &mut Session, bridge: &mut dyn CapabilityBridge, raw: &str) {
    let input = raw.trim();
    if input.is_empty() {
        session.status = String::from("No command");
        return;
    }

    let mut command_split = input.splitn(2, char::is_whitespace);
    let command = command_split.next().unwrap_or_default();
    let rest = command_split.next().unwrap_or("").trim();

    match command {
        "help" => {
            session.status =
                String::from("Commands: add <path> | files | folder | help");
        }
        "add" => {
            let paths = parse_dropped_paths(rest);
            if paths.is_empty() {
                session.status = String::from("Usage: add <path>");
            } else {
                session.drop_paths(bridge, paths);
            }
        }
        "files" => session.pick_files(bridge),
        "folder" | "folders" => session.pick_folders(bridge),
        _ => session.status = String::from("Unknown command. Use :help"),
    }
}

/// Splits pasted or typed text into paths. Handles quoting, backslash
/// escapes (not on Windows, where backslash is the separator) and
/// `file://` URIs, one or more per line.
pub fn parse_dropped_paths(text: &str) -> Vec<PathBuf> {
    split_pasted(text, !cfg!(windows))
        .into_iter()
        .map(|token| match token.strip_prefix("file://") {
            Some(uri) => decode_file_uri(uri),
            None => PathBuf::from(token),
        })
        .filter(|path| !path.as_os_str().is_empty())
        .collect()
}

fn split_pasted(text: &str, backslash_escapes: bool) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;
    let mut in_token = false;
    let mut chars = text.chars();

    while let Some(ch) = chars.next() {
        match (quote, ch) {
            (Some(open), ch) if ch == open => quote = None,
            (Some('"'), '\\') if backslash_escapes => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
            }
            (Some(_), ch) => current.push(ch),
            (None, '\'' | '"') => {
                quote = Some(ch);
                in_token = true;
            }
            (None, '\\') if backslash_escapes => {
                if let Some(escaped) = chars.next() {
                    current.push(escaped);
                }
                in_token = true;
            }
            (None, ch) if ch.is_whitespace() => {
                if in_token {
                    tokens.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            (None, ch) => {
                current.push(ch);
                in_token = true;
            }
        }
    }

    if in_token {
        tokens.push(current);
    }
    tokens.retain(|token| !token.is_empty());
    tokens
}

fn decode_file_uri(uri: &str) -> PathBuf {
    let path = uri.strip_prefix("localhost").unwrap_or(uri);
    let decoded = urlencoding::decode_binary(path.as_bytes());
    match decoded.as_ref() {
        [b'/', drive, b':', ..] if drive.is_ascii_alphabetic() => path_from_bytes(&decoded[1..]),
        bytes => path_from_bytes(bytes),
    }
}

#[cfg(unix)]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    use std::os::unix::ffi::OsStrExt;
    PathBuf::from(std::ffi::OsStr::from_bytes(bytes))
}

#[cfg(not(unix))]
fn path_from_bytes(bytes: &[u8]) -> PathBuf {
    PathBuf::from(String::from_utf8_lossy(bytes).into_owned())
}
