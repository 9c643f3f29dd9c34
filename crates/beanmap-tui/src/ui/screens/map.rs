//! Map screen: shop list, a position plot around the map center, and the
//! selected shop's details with its notes and photos.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Points},
        Block, Borders, List, ListItem, ListState, Paragraph, Wrap,
    },
    Frame,
};

use beanmap_core::utils::{format_size, format_timestamp, truncate_string};
use beanmap_core::ShopRecord;

use crate::app::{App, DetailSection, Focus, MapView};
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(area);

    render_shop_list(frame, app, chunks[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    render_map(frame, app, right[0]);
    render_detail(frame, app, right[1]);
}

fn render_shop_list(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::List);
    let block = Block::default()
        .title(format!(" Shops ({}) ", app.shops.len()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    if app.shops.is_empty() {
        let message = match app.lookup_error {
            Some(ref error) => Span::styled(format!(" {}", error), styles::error_style()),
            None if app.is_loading() => Span::styled(" Searching...", styles::muted_style()),
            None => Span::styled(" No coffee shops found nearby", styles::muted_style()),
        };
        let paragraph = Paragraph::new(Line::from(message))
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
    }

    let name_width = (area.width as usize).saturating_sub(13).max(8);
    let items: Vec<ListItem> = app
        .shops
        .iter()
        .enumerate()
        .map(|(i, shop)| {
            let marker = if app.selected_shop == Some(shop.id) { "▶" } else { " " };
            let line = Line::from(vec![
                Span::raw(format!(
                    "{}{:<width$}",
                    marker,
                    truncate_string(shop.display_name(), name_width),
                    width = name_width
                )),
                Span::styled(format!("{:>8}", shop.display_distance()), styles::highlight_style()),
            ]);

            let style = if i == app.shop_selection && focused {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.shop_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}

/// Longitude and latitude bounds visible for `view` in a plot of the given
/// character size. Each zoom level halves the visible span.
pub fn view_bounds(view: &MapView, width: u16, height: u16) -> ([f64; 2], [f64; 2]) {
    let lon_span = 720.0 / 2f64.powi(view.zoom as i32);
    // Terminal cells are roughly twice as tall as they are wide.
    let aspect = (height.max(1) as f64 * 2.0) / width.max(1) as f64;
    let lat_span = lon_span * aspect * view.center.lat.to_radians().cos().abs().max(0.01);

    (
        [view.center.lon - lon_span / 2.0, view.center.lon + lon_span / 2.0],
        [view.center.lat - lat_span / 2.0, view.center.lat + lat_span / 2.0],
    )
}

fn render_map(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Map ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    let Some(view) = app.map_view else {
        let paragraph = Paragraph::new(Line::from(Span::styled(
            " Waiting for your location...",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let (x_bounds, y_bounds) = view_bounds(&view, area.width.saturating_sub(2), area.height.saturating_sub(2));
    let others: Vec<(f64, f64)> = app
        .shops
        .iter()
        .filter(|s| app.selected_shop != Some(s.id))
        .map(|s| (s.location.lon, s.location.lat))
        .collect();
    let selected = app.selected_shop();
    let user = app.user_location;

    let canvas = Canvas::default()
        .block(block.title_bottom(Line::from(Span::styled(
            format!(" {} z{} ", view.center.display(), view.zoom),
            styles::muted_style(),
        ))))
        .marker(Marker::Braille)
        .x_bounds(x_bounds)
        .y_bounds(y_bounds)
        .paint(move |ctx| {
            ctx.draw(&Points {
                coords: &others,
                color: styles::PRIMARY,
            });
            if let Some(position) = user {
                ctx.print(
                    position.lon,
                    position.lat,
                    Span::styled("@ you", styles::user_marker_style()),
                );
            }
            if let Some(shop) = selected {
                ctx.print(
                    shop.location.lon,
                    shop.location.lat,
                    Span::styled(
                        format!("* {}", shop.display_name()),
                        styles::shop_marker_style(true),
                    ),
                );
            }
        });

    frame.render_widget(canvas, area);
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let focused = matches!(app.focus, Focus::Detail);

    let Some(shop) = app.selected_shop() else {
        let block = Block::default()
            .title(" No Shop Selected ")
            .title_style(styles::title_style())
            .borders(Borders::ALL)
            .border_style(styles::border_style(focused));
        let paragraph = Paragraph::new(Line::from(Span::styled(
            " Select a shop from the list",
            styles::muted_style(),
        )))
        .block(block);
        frame.render_widget(paragraph, area);
        return;
    };

    let mut lines = shop_info_lines(shop);
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::raw(" "),
        Span::styled(
            format!("Notes ({})", shop.notes.len()),
            styles::section_style(app.detail_section == DetailSection::Notes),
        ),
        Span::styled("  |  ", styles::muted_style()),
        Span::styled(
            format!("Photos ({})", shop.photos.len()),
            styles::section_style(app.detail_section == DetailSection::Photos),
        ),
    ]));

    match app.detail_section {
        DetailSection::Notes => {
            if shop.notes.is_empty() {
                lines.push(Line::from(Span::styled(
                    "  No notes yet. Press n to add one.",
                    styles::muted_style(),
                )));
            }
            for (i, note) in shop.notes.iter().enumerate() {
                let style = if focused && i == app.note_selection {
                    styles::selected_style()
                } else {
                    styles::list_item_style()
                };
                let edited = if note.is_edited() { " (edited)" } else { "" };
                lines.push(Line::from(vec![
                    Span::styled(format!("  {}", note.text), style),
                    Span::styled(
                        format!("  {}{}", format_timestamp(&note.updated_at()), edited),
                        styles::muted_style(),
                    ),
                ]));
            }
        }
        DetailSection::Photos => {
            if shop.photos.is_empty() {
                lines.push(Line::from(Span::styled(
                    "  No photos yet. Press p to take one.",
                    styles::muted_style(),
                )));
            }
            for (i, photo) in shop.photos.iter().enumerate() {
                let style = if focused && i == app.photo_selection {
                    styles::selected_style()
                } else {
                    styles::list_item_style()
                };
                let edited = if photo.is_edited() { " (edited)" } else { "" };
                lines.push(Line::from(vec![
                    Span::styled(format!("  Photo {}", i + 1), style),
                    Span::styled(
                        format!(
                            "  {}  {}{}",
                            format_timestamp(&photo.created_at),
                            format_size(photo.approx_size_bytes()),
                            edited
                        ),
                        styles::muted_style(),
                    ),
                ]));
            }
        }
    }

    let block = Block::default()
        .title(format!(" {} ", shop.display_name()))
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(focused));

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn shop_info_lines(shop: &ShopRecord) -> Vec<Line<'static>> {
    let field = |label: &'static str, value: String| {
        Line::from(vec![
            Span::styled(format!(" {:<10}", label), styles::highlight_style()),
            Span::raw(value),
        ])
    };

    vec![
        field("Address", shop.display_address().to_string()),
        field("Phone", shop.display_phone().to_string()),
        field("Website", shop.display_website().to_string()),
        field("Hours", shop.display_opening_hours().to_string()),
        field("Cuisine", shop.display_cuisine().to_string()),
        field("Distance", shop.display_distance()),
        Line::from(Span::styled(
            format!(" {}", shop.attachment_summary()),
            styles::muted_style(),
        )),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use beanmap_core::Coordinates;

    #[test]
    fn test_view_bounds_center_and_zoom() {
        let view = MapView {
            center: Coordinates::new(0.0, 10.0),
            zoom: 15,
        };
        let (x, y) = view_bounds(&view, 40, 20);
        assert!(((x[0] + x[1]) / 2.0 - 10.0).abs() < 1e-9);
        assert!(((y[0] + y[1]) / 2.0).abs() < 1e-9);

        let closer = MapView { zoom: 16, ..view };
        let (x2, _) = view_bounds(&closer, 40, 20);
        let ratio = (x[1] - x[0]) / (x2[1] - x2[0]);
        assert!((ratio - 2.0).abs() < 1e-9);
    }
}
