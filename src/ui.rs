use crate::audio::AudioEngine;
use crate::bridge::base_name;
use crate::session::{APP_NAME, Session};
use crate::transport::format_time;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

const KEY_HINTS: &str = "o files  f folders  p play/pause  s stop  n/b next/prev  [ ] seek  +/- volume  : command  q quit";

#[derive(Clone, Copy)]
struct Palette {
    bg: Color,
    panel_bg: Color,
    panel_alt_bg: Color,
    border: Color,
    text: Color,
    muted: Color,
    accent: Color,
    alert: Color,
    selected_bg: Color,
}

const PALETTE: Palette = Palette {
    bg: Color::Rgb(16, 2, 2),
    panel_bg: Color::Rgb(30, 6, 7),
    panel_alt_bg: Color::Rgb(44, 10, 11),
    border: Color::Rgb(176, 38, 38),
    text: Color::Rgb(245, 214, 214),
    muted: Color::Rgb(188, 133, 133),
    accent: Color::Rgb(255, 92, 92),
    alert: Color::Rgb(255, 171, 83),
    selected_bg: Color::Rgb(72, 17, 19),
};

/// Screen areas that react to the mouse, in terminal cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HitAreas {
    pub seek: Rect,
    pub volume: Rect,
}

fn sections(area: Rect) -> std::rc::Rc<[Rect]> {
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(3),
        ])
        .split(area)
}

pub fn hit_areas(area: Rect) -> HitAreas {
    let vertical = sections(area);
    HitAreas {
        seek: bar_rect(vertical[2]),
        volume: bar_rect(vertical[3]),
    }
}

fn bar_rect(panel: Rect) -> Rect {
    panel.inner(Margin {
        vertical: 1,
        horizontal: 1,
    })
}

pub fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    if rect.width == 0 || rect.height == 0 {
        return false;
    }
    x >= rect.x
        && x < rect.x.saturating_add(rect.width)
        && y >= rect.y
        && y < rect.y.saturating_add(rect.height)
}

/// Maps a column inside a bar to `0.0..=1.0`, left edge to right edge.
pub fn ratio_at(rect: Rect, column: u16) -> f64 {
    let span = rect.width.saturating_sub(1);
    if span == 0 {
        return 0.0;
    }
    let offset = column.saturating_sub(rect.x).min(span);
    f64::from(offset) / f64::from(span)
}

pub fn draw(
    frame: &mut Frame,
    session: &Session,
    audio: &dyn AudioEngine,
    command: Option<&str>,
) {
    let colors = PALETTE;
    frame.render_widget(
        Block::default().style(Style::default().bg(colors.bg)),
        frame.area(),
    );

    let vertical = sections(frame.area());

    let title = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("{APP_NAME}  "),
            Style::default()
                .fg(colors.accent)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            session.now_playing.as_deref().unwrap_or("-"),
            Style::default().fg(colors.text),
        ),
        Span::styled("  |  ", Style::default().fg(colors.muted)),
        Span::styled(
            audio.output_name().unwrap_or_else(|| String::from("no output")),
            Style::default().fg(colors.muted),
        ),
    ]))
    .block(panel_block("Player", colors.panel_bg, colors.text, colors.border));
    frame.render_widget(title, vertical[0]);

    let state_label = if session.is_loading() {
        "Loading"
    } else if session.is_halted() {
        "Halted"
    } else if !audio.is_loaded() {
        "Idle"
    } else if audio.is_paused() {
        "Paused"
    } else {
        "Playing"
    };
    let info = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(
                "Now",
                Style::default()
                    .fg(colors.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", session.now_playing.as_deref().unwrap_or("-")),
                Style::default().fg(colors.text),
            ),
            Span::styled(format!("  [{state_label}]"), Style::default().fg(colors.alert)),
        ]),
        Line::from(Span::styled(
            if session.transport.time_label.is_empty() {
                "--- - --:-- / --:--"
            } else {
                session.transport.time_label.as_str()
            },
            Style::default().fg(colors.muted),
        )),
    ])
    .block(panel_block(
        "Now Playing",
        colors.panel_alt_bg,
        colors.text,
        colors.border,
    ))
    .wrap(Wrap { trim: true });
    frame.render_widget(info, vertical[1]);

    let seek = session.transport.seek;
    let seek_title = if seek.is_seeking() {
        format!(
            "Seek -> {}",
            format_time(seek.value()).unwrap_or_else(|| String::from("--:--"))
        )
    } else {
        String::from("Seek")
    };
    let seek_width = usize::from(bar_rect(vertical[2]).width);
    frame.render_widget(
        Paragraph::new(Span::styled(
            progress_bar(seek.ratio(), seek_width),
            Style::default().fg(colors.accent),
        ))
        .block(panel_block(&seek_title, colors.panel_bg, colors.text, colors.border)),
        vertical[2],
    );

    let volume = session.transport.volume();
    let volume_width = usize::from(bar_rect(vertical[3]).width);
    frame.render_widget(
        Paragraph::new(Span::styled(
            progress_bar(f64::from(volume), volume_width),
            Style::default().fg(colors.text),
        ))
        .block(panel_block(
            &format!("Volume {:>3}%", (volume * 100.0).round() as u16),
            colors.panel_bg,
            colors.text,
            colors.border,
        )),
        vertical[3],
    );

    let active = session.playlist.index();
    let items: Vec<ListItem> = session
        .playlist
        .queue()
        .iter()
        .enumerate()
        .map(|(idx, file)| {
            let marker = if Some(idx) == active { "  > " } else { "    " };
            ListItem::new(Line::from(vec![
                Span::styled(marker, Style::default().fg(colors.muted)),
                Span::styled(
                    format!("{:03}  ", idx + 1),
                    Style::default().fg(colors.muted),
                ),
                Span::styled(base_name(file.as_path()), Style::default().fg(colors.text)),
            ]))
        })
        .collect();

    let mut state = ListState::default();
    state.select(active);
    let queue_title = format!("Queue ({})", session.playlist.len());
    let queue = List::new(items)
        .block(panel_block(
            &queue_title,
            colors.panel_bg,
            colors.text,
            colors.border,
        ))
        .highlight_style(
            Style::default()
                .bg(colors.selected_bg)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        );
    frame.render_stateful_widget(queue, vertical[4], &mut state);

    let footer = match command {
        Some(buffer) => Line::from(vec![
            Span::styled(":", Style::default().fg(colors.accent)),
            Span::styled(buffer, Style::default().fg(colors.text)),
        ]),
        None => Line::from(vec![
            Span::styled(KEY_HINTS, Style::default().fg(colors.muted)),
            Span::styled("  |  ", Style::default().fg(colors.muted)),
            Span::styled(session.status.as_str(), Style::default().fg(colors.text)),
        ]),
    };
    frame.render_widget(
        Paragraph::new(footer).block(panel_block(
            "Message",
            colors.panel_bg,
            colors.text,
            colors.border,
        )),
        vertical[5],
    );
}

fn panel_block(title: &str, bg: Color, text: Color, border: Color) -> Block<'_> {
    Block::default()
        .borders(Borders::ALL)
        .title(Span::styled(
            format!(" {title} "),
            Style::default().fg(text).add_modifier(Modifier::BOLD),
        ))
        .border_style(Style::default().fg(border))
        .style(Style::default().bg(bg))
}

fn progress_bar(ratio: f64, width: usize) -> String {
    let clamped = if ratio.is_finite() {
        ratio.clamp(0.0, 1.0)
    } else {
        0.0
    };
    let filled = (clamped * width as f64).round() as usize;
    let mut bar = String::with_capacity(width);
    bar.push_str(&"#".repeat(filled));
    bar.push_str(&"-".repeat(width.saturating_sub(filled)));
    bar
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bars_sit_inside_their_panels() {
        let areas = hit_areas(Rect::new(0, 0, 80, 30));
        assert_eq!(areas.seek, Rect::new(1, 8, 78, 1));
        assert_eq!(areas.volume, Rect::new(1, 11, 78, 1));
    }

    #[test]
    fn ratio_covers_the_whole_bar() {
        let bar = Rect::new(1, 8, 11, 1);
        assert_eq!(ratio_at(bar, 1), 0.0);
        assert_eq!(ratio_at(bar, 6), 0.5);
        assert_eq!(ratio_at(bar, 11), 1.0);
        assert_eq!(ratio_at(bar, 40), 1.0);
        assert_eq!(ratio_at(bar, 0), 0.0);
    }

    #[test]
    fn point_in_rect_excludes_far_edges() {
        let rect = Rect::new(2, 2, 3, 1);
        assert!(point_in_rect(2, 2, rect));
        assert!(point_in_rect(4, 2, rect));
        assert!(!point_in_rect(5, 2, rect));
        assert!(!point_in_rect(2, 3, rect));
        assert!(!point_in_rect(0, 0, Rect::default()));
    }

    #[test]
    fn progress_bar_fills_proportionally() {
        assert_eq!(progress_bar(0.5, 10), "#####-----");
        assert_eq!(progress_bar(f64::NAN, 4), "----");
        assert_eq!(progress_bar(2.0, 3), "###");
    }
}
