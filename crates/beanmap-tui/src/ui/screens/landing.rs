use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use beanmap_core::utils::truncate_string;

use crate::app::App;
use crate::ui::styles;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Min(5)])
        .split(area);

    render_intro(frame, chunks[0]);
    render_preview(frame, app, chunks[1]);
}

fn render_intro(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(" Find your next cup.", styles::title_style())),
        Line::from(Span::styled(
            " Coffee shops near you, with your own notes and photos for each.",
            styles::muted_style(),
        )),
        Line::from(vec![
            Span::styled(" Press ", styles::muted_style()),
            Span::styled("m", styles::help_key_style()),
            Span::styled(" to open the map, or ", styles::muted_style()),
            Span::styled("Enter", styles::help_key_style()),
            Span::styled(" on a shop below.", styles::muted_style()),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }), area);
}

fn render_preview(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .title(" Nearby Coffee Shops ")
        .title_style(styles::title_style())
        .borders(Borders::ALL)
        .border_style(styles::border_style(true));

    let shops = app.landing_shops();

    if shops.is_empty() {
        let message = if let Some(ref error) = app.lookup_error {
            Span::styled(format!(" {}", error), styles::error_style())
        } else if app.is_loading() {
            Span::styled(" Finding coffee shops near you...", styles::muted_style())
        } else {
            Span::styled(" No coffee shops found nearby.", styles::muted_style())
        };
        frame.render_widget(Paragraph::new(Line::from(message)).block(block), area);
        return;
    }

    let name_width = (area.width as usize).saturating_sub(34).clamp(12, 48);
    let items: Vec<ListItem> = shops
        .iter()
        .enumerate()
        .map(|(i, shop)| {
            let line = Line::from(vec![
                Span::raw(format!(
                    " {:<width$} ",
                    truncate_string(shop.display_name(), name_width),
                    width = name_width
                )),
                Span::styled(format!("{:>8} ", shop.display_distance()), styles::highlight_style()),
                Span::styled(shop.attachment_summary(), styles::muted_style()),
            ]);

            let style = if i == app.landing_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let mut state = ListState::default();
    state.select(Some(app.landing_selection));
    frame.render_stateful_widget(List::new(items).block(block), area, &mut state);
}
