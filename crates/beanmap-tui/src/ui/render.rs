use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use beanmap_core::utils::{format_size, format_timestamp};

use crate::app::{App, AppState, Screen};

use super::screens::{landing, map};
use super::styles;

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title bar
            Constraint::Min(10),   // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    match app.screen {
        Screen::Landing => landing::render(frame, app, chunks[1]),
        Screen::Map => map::render(frame, app, chunks[1]),
    }
    render_status_bar(frame, app, chunks[2]);

    // Overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::WritingNote => render_input_overlay(frame, app, " Add Note ", "Write your note"),
        AppState::EditingNote(_) => render_input_overlay(frame, app, " Edit Note ", "Edit your note"),
        AppState::EnteringPhotoPath { retake } => {
            let title = if retake.is_some() { " Retake Photo " } else { " Take Photo " };
            render_input_overlay(frame, app, title, "Path to an image file")
        }
        AppState::ConfirmingPhoto { retake } => render_photo_confirm_overlay(frame, app, retake.is_some()),
        AppState::ViewingPhotos => render_slideshow_overlay(frame, app),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.screen {
        Screen::Landing => "  Beanmap",
        Screen::Map => "  Beanmap  >  Map",
    };
    let help_hint = "[?] Help";

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title.len() as u16 + help_hint.len() as u16 + 2) as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(title_line).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let shortcuts = match app.screen {
        Screen::Landing => "[m]ap | [r]efresh | [q]uit",
        Screen::Map => "[Esc] back | [r]efresh | [q]uit",
    };

    let (left_text, left_style) = if let Some(ref notice) = app.notice {
        (format!(" {} ", notice.message), styles::notice_style(notice.severity))
    } else if app.is_loading() {
        (
            format!(" {} Looking for coffee... ", SPINNER[app.tick / 2 % SPINNER.len()]),
            styles::highlight_style(),
        )
    } else if let Some(position) = app.user_location {
        (format!(" You are at {} ", position.display()), styles::muted_style())
    } else {
        (" Location unknown ".to_string(), styles::muted_style())
    };

    let right_text = format!(" {} ", shortcuts);
    let padding = (area.width as usize)
        .saturating_sub(left_text.chars().count())
        .saturating_sub(right_text.len());

    let status_line = Line::from(vec![
        Span::styled(left_text, left_style),
        Span::raw(" ".repeat(padding)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(Paragraph::new(status_line).style(styles::status_bar_style()), area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::help_key_style()),
        Span::styled(desc, styles::help_desc_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 26, frame.area());
    frame.render_widget(Clear, area);

    let help_text = vec![
        Line::from(Span::styled("  Beanmap", styles::title_style())),
        Line::from(Span::styled(
            format!("  version {}", env!("CARGO_PKG_VERSION")),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        help_line("↑/↓ j/k", "Navigate list"),
        help_line("Enter", "Open shop / view photos"),
        help_line("m", "Open the map"),
        help_line("Tab", "Switch notes ↔ photos"),
        help_line("Esc", "Go back"),
        help_line("r", "Refresh location and shops"),
        Line::from(""),
        Line::from(Span::styled(" Shop Detail", styles::highlight_style())),
        help_line("n", "Add note"),
        help_line("e", "Edit selected note"),
        help_line("p", "Take photo"),
        help_line("t", "Retake selected photo"),
        help_line("d", "Delete selected note/photo"),
        Line::from(""),
        Line::from(Span::styled(" Photo Viewer", styles::highlight_style())),
        help_line("←/→", "Previous/next photo"),
        help_line("d", "Delete photo"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(40, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Text entry dialog for notes and photo paths.
fn render_input_overlay(frame: &mut Frame, app: &App, title: &str, prompt: &str) {
    let area = centered_rect_fixed(60, 10, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(Span::styled(format!(" {}", prompt), styles::muted_style())),
        Line::from(""),
        Line::from(vec![
            Span::raw(" "),
            Span::styled(app.input.clone(), styles::input_style()),
            Span::styled("▌", styles::input_style()),
        ]),
        Line::from(""),
        Line::from(vec![
            Span::styled(" [Enter]", styles::help_key_style()),
            Span::styled(" save  ", styles::muted_style()),
            Span::styled("[Esc]", styles::help_key_style()),
            Span::styled(" cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .title(title.to_string())
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_photo_confirm_overlay(frame: &mut Frame, app: &App, retake: bool) {
    let area = centered_rect_fixed(60, 8, frame.area());
    frame.render_widget(Clear, area);

    let mut lines = vec![Line::from("")];
    if let Some(capture) = app.pending_capture() {
        lines.push(Line::from(vec![
            Span::styled(" Source: ", styles::highlight_style()),
            Span::raw(capture.path().display().to_string()),
        ]));
        lines.push(Line::from(vec![
            Span::styled(" Image:  ", styles::highlight_style()),
            Span::raw(format!(
                "{}, {}",
                capture.mime(),
                format_size(capture.size_bytes() as usize)
            )),
        ]));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" [Enter]", styles::help_key_style()),
        Span::styled(if retake { " retake  " } else { " capture  " }, styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" cancel", styles::muted_style()),
    ]));

    let block = Block::default()
        .title(if retake { " Retake Photo " } else { " Take Photo " })
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_slideshow_overlay(frame: &mut Frame, app: &App) {
    let area = centered_rect_fixed(56, 11, frame.area());
    frame.render_widget(Clear, area);

    let total = app.selected_shop().map(|s| s.photos.len()).unwrap_or(0);
    let mut lines = vec![Line::from("")];

    if let Some(photo) = app.slideshow_photo() {
        lines.push(Line::from(Span::styled(
            format!(" Photo {} of {}", app.slideshow_index + 1, total),
            styles::title_style(),
        )));
        lines.push(Line::from(""));
        lines.push(Line::from(vec![
            Span::styled(" Taken:  ", styles::highlight_style()),
            Span::raw(format_timestamp(&photo.created_at)),
        ]));
        if let Some(edited) = photo.edited_at {
            lines.push(Line::from(vec![
                Span::styled(" Edited: ", styles::highlight_style()),
                Span::raw(format_timestamp(&edited)),
            ]));
        }
        lines.push(Line::from(vec![
            Span::styled(" Image:  ", styles::highlight_style()),
            Span::raw(format!(
                "{}, {}",
                photo.mime_type().unwrap_or("unknown"),
                format_size(photo.approx_size_bytes())
            )),
        ]));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled(" [←/→]", styles::help_key_style()),
        Span::styled(" browse  ", styles::muted_style()),
        Span::styled("[d]", styles::help_key_style()),
        Span::styled(" delete  ", styles::muted_style()),
        Span::styled("[Esc]", styles::help_key_style()),
        Span::styled(" close", styles::muted_style()),
    ]));

    let title = app
        .selected_shop()
        .map(|s| format!(" {} ", s.display_name()))
        .unwrap_or_default();
    let block = Block::default()
        .title(title)
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
