//! UI rendering helpers for the terminal user interface.
//!
//! This module contains functions to render the TUI using `ratatui`.

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout},
    style::{Color, Modifier, Style, Stylize},
    widgets::{Block, Borders, Gauge, List, ListItem, Padding, Paragraph, Wrap},
};

use crate::app::App;
use crate::config::UiSettings;
use crate::library::format_duration;
use crate::session::PlaybackState;

const CONTROLS: &[(&str, &str)] = &[
    ("j/k", "up/down"),
    ("h/l", "prev/next song"),
    // H/L is filled in from config.
    ("H/L", ""),
    ("enter", "play selected song"),
    ("space/p", "play/pause"),
    ("s", "stop"),
    ("R", "reload"),
    ("q", "quit"),
];

/// Render the controls help text, incorporating the seek step.
fn controls_text(seek_step_seconds: u64) -> String {
    CONTROLS
        .iter()
        .map(|(key, action)| {
            if *key == "H/L" {
                format!("[H/L] seek -/+{seek_step_seconds}s")
            } else {
                format!("[{key}] {action}")
            }
        })
        .collect::<Vec<String>>()
        .join(" | ")
}

fn state_text(state: &PlaybackState) -> &'static str {
    match state {
        PlaybackState::Idle => "Stopped",
        PlaybackState::Loading => "Loading",
        PlaybackState::Playing => "Playing",
        PlaybackState::Paused => "Paused",
        PlaybackState::Failed(_) => "Failed",
    }
}

/// Status line parts: state, song with times, failure reason, last message.
pub(crate) fn status_text(app: &App) -> String {
    let snapshot = &app.snapshot;
    let mut parts: Vec<String> = vec![format!(" {}", state_text(&snapshot.state))];

    if let Some(track) = &snapshot.track {
        parts.push(format!(
            "Song: {} [{} / {}]",
            track.display(),
            format_duration(app.displayed_position()),
            format_duration(app.duration_ms)
        ));
    }
    if let Some(reason) = snapshot.state.failure() {
        parts.push(format!("Error: {reason}"));
    }
    if app.is_dragging() {
        parts.push("Seeking".to_string());
    }
    if let Some(msg) = &app.status_message {
        parts.push(msg.clone());
    }

    parts.join(" • ")
}

/// Render the entire UI into the provided `frame` using `app` state and settings.
pub fn draw(frame: &mut Frame, app: &App, ui_settings: &UiSettings) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Length(3),
            Constraint::Min(1),
            Constraint::Length(4),
        ])
        .split(frame.area());

    let header = Paragraph::new(ui_settings.header_text.as_str())
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" carmusic ")
                .title_alignment(Alignment::Center),
        );
    frame.render_widget(header, chunks[0]);

    let status = Paragraph::new(status_text(app))
        .block(
            Block::bordered()
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                })
                .title(" status "),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(status, chunks[1]);

    let gauge_style = if app.is_dragging() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::Cyan)
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" progress "))
        .gauge_style(gauge_style)
        .ratio(app.progress_ratio())
        .label(format!(
            "{} / {}",
            format_duration(app.displayed_position()),
            format_duration(app.duration_ms)
        ));
    frame.render_widget(gauge, chunks[2]);

    // Center the selected item when possible; only build items for the visible window.
    {
        let total = app.tracks.len();
        let list_height = chunks[3].height.saturating_sub(2) as usize;
        let (start, end, selected_in_window) = if total <= list_height || list_height == 0 {
            (0, total, app.selected)
        } else {
            let half = list_height / 2;
            let mut start = app.selected.saturating_sub(half);
            if start + list_height > total {
                start = total - list_height;
            }
            (start, start + list_height, app.selected - start)
        };

        let playing = app.playing_index();
        let items: Vec<ListItem> = app.tracks[start..end]
            .iter()
            .enumerate()
            .map(|(offset, track)| {
                let line = format!("{}  {}", track.display(), format_duration(track.duration_ms));
                if playing == Some(start + offset) {
                    ListItem::new(line).bold()
                } else {
                    ListItem::new(line)
                }
            })
            .collect();

        let title = if total == 0 {
            " tracks (none, try `carmusic import <path>`) ".to_string()
        } else {
            format!(" tracks ({total}) ")
        };
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ratatui::widgets::ListState::default();
        if total > 0 {
            state.select(Some(selected_in_window));
        }
        frame.render_stateful_widget(list, chunks[3], &mut state);
    }

    let footer = Paragraph::new(controls_text(ui_settings.seek_step_seconds))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(" controls ")
                .padding(Padding {
                    left: 1,
                    right: 0,
                    top: 0,
                    bottom: 0,
                }),
        )
        .wrap(Wrap { trim: true });
    frame.render_widget(footer, chunks[4]);
}
