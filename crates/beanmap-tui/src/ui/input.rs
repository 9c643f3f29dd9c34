//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use crate::app::{App, AppState, DetailSection, Focus, Screen, MAX_NOTE_LENGTH, MAX_PATH_LENGTH};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.release_capture();
        app.state = AppState::Quitting;
        return Ok(true);
    }

    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                app.release_capture();
                app.state = AppState::Quitting;
                Ok(true)
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                app.state = AppState::Normal;
                Ok(false)
            }
            _ => Ok(false),
        },
        AppState::WritingNote | AppState::EditingNote(_) => {
            handle_text_input(app, key, MAX_NOTE_LENGTH);
            Ok(false)
        }
        AppState::EnteringPhotoPath { .. } => {
            handle_text_input(app, key, MAX_PATH_LENGTH);
            Ok(false)
        }
        AppState::ConfirmingPhoto { .. } => {
            match key.code {
                KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char(' ') => app.confirm_photo(),
                KeyCode::Esc | KeyCode::Char('n') => app.cancel_photo(),
                _ => {}
            }
            Ok(false)
        }
        AppState::ViewingPhotos => {
            match key.code {
                KeyCode::Right | KeyCode::Char('l') | KeyCode::Char(' ') => app.next_photo(),
                KeyCode::Left | KeyCode::Char('h') => app.previous_photo(),
                KeyCode::Char('d') => app.delete_slideshow_photo(),
                KeyCode::Esc | KeyCode::Char('q') | KeyCode::Enter => app.close_slideshow(),
                _ => {}
            }
            Ok(false)
        }
        AppState::Quitting => Ok(true),
        AppState::Normal => {
            handle_normal_input(app, key);
            Ok(false)
        }
    }
}

/// Shared editing for the note and photo path dialogs.
fn handle_text_input(app: &mut App, key: KeyEvent, max_len: usize) {
    match key.code {
        KeyCode::Esc => app.cancel_input(),
        KeyCode::Enter => match app.state {
            AppState::EnteringPhotoPath { .. } => app.open_photo_source(),
            _ => app.submit_note(),
        },
        KeyCode::Backspace => {
            app.input.pop();
        }
        KeyCode::Char(c) => {
            if app.input.chars().count() < max_len {
                app.input.push(c);
            }
        }
        _ => {}
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    // Global keys
    match key.code {
        KeyCode::Char('?') => {
            app.state = AppState::ShowingHelp;
            return;
        }
        KeyCode::Char('q') => {
            app.state = AppState::ConfirmingQuit;
            return;
        }
        KeyCode::Char('r') => {
            app.start_lookup();
            return;
        }
        KeyCode::Up | KeyCode::Char('k') => {
            app.move_selection(false);
            return;
        }
        KeyCode::Down | KeyCode::Char('j') => {
            app.move_selection(true);
            return;
        }
        _ => {}
    }

    match app.screen {
        Screen::Landing => handle_landing_input(app, key),
        Screen::Map => handle_map_input(app, key),
    }
}

fn handle_landing_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('m') => app.open_map(None),
        KeyCode::Enter => {
            let shop_id = app.landing_shops().get(app.landing_selection).map(|s| s.id);
            if shop_id.is_some() {
                app.open_map(shop_id);
            }
        }
        _ => {}
    }
}

fn handle_map_input(app: &mut App, key: KeyEvent) {
    match app.focus {
        Focus::List => match key.code {
            KeyCode::Enter | KeyCode::Right => app.select_shop_at(app.shop_selection),
            KeyCode::Esc | KeyCode::Backspace => app.go_to_landing(),
            _ => {}
        },
        Focus::Detail => match key.code {
            KeyCode::Esc | KeyCode::Left => app.close_detail(),
            KeyCode::Tab | KeyCode::BackTab => {
                app.detail_section = app.detail_section.toggle();
            }
            KeyCode::Char('n') => app.begin_note(),
            KeyCode::Char('p') => app.begin_photo(false),
            KeyCode::Char('e') if app.detail_section == DetailSection::Notes => app.begin_edit_note(),
            KeyCode::Char('t') if app.detail_section == DetailSection::Photos => app.begin_photo(true),
            KeyCode::Enter if app.detail_section == DetailSection::Notes => app.begin_edit_note(),
            KeyCode::Enter if app.detail_section == DetailSection::Photos => app.open_slideshow(),
            KeyCode::Char('d') => match app.detail_section {
                DetailSection::Notes => app.delete_selected_note(),
                DetailSection::Photos => app.delete_selected_photo(),
            },
            _ => {}
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{app_with_photos, app_with_shops, photo_names, shown_photo};

    fn press(app: &mut App, code: KeyCode) -> bool {
        handle_input(app, KeyEvent::new(code, KeyModifiers::NONE)).unwrap()
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    #[test]
    fn test_slideshow_keys() {
        let mut app = app_with_photos(1, &["a.jpg", "b.jpg", "c.jpg"]);
        assert_eq!(app.focus, Focus::Detail);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::ViewingPhotos);
        assert_eq!(shown_photo(&app).as_deref(), Some("a.jpg"));

        press(&mut app, KeyCode::Right);
        assert_eq!(shown_photo(&app).as_deref(), Some("b.jpg"));
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Left);
        assert_eq!(shown_photo(&app).as_deref(), Some("c.jpg"));

        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Char('d'));
        assert_eq!(photo_names(&app.store.photos(1).unwrap()), vec!["a.jpg", "c.jpg"]);
        assert_eq!(shown_photo(&app).as_deref(), Some("c.jpg"));
        assert_eq!(app.state, AppState::ViewingPhotos);

        assert!(!press(&mut app, KeyCode::Esc));
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.slideshow_index, 0);
    }

    #[test]
    fn test_detail_note_keys() {
        let mut app = app_with_shops();
        app.open_map(Some(3));

        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.state, AppState::WritingNote);
        type_text(&mut app, "Oat flat white");
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::Normal);
        let note_id = app.store.notes(3).unwrap()[0].id;

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::EditingNote(note_id));
        assert_eq!(app.input, "Oat flat white");
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);

        // Retake only applies to the photo list
        press(&mut app, KeyCode::Char('t'));
        assert_eq!(app.state, AppState::Normal);

        press(&mut app, KeyCode::Char('d'));
        assert!(app.store.notes(3).unwrap().is_empty());
        assert!(app.selected_shop().unwrap().notes.is_empty());
    }

    #[test]
    fn test_detail_photo_keys() {
        let mut app = app_with_photos(4, &["a.jpg", "b.jpg"]);
        app.store.add_note(4, "keep me").unwrap();
        let photos = app.store.photos(4).unwrap();

        press(&mut app, KeyCode::Down);
        assert_eq!(app.photo_selection, 1);

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.state, AppState::Normal);

        press(&mut app, KeyCode::Char('t'));
        assert_eq!(
            app.state,
            AppState::EnteringPhotoPath {
                retake: Some(photos[1].id)
            }
        );
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state, AppState::Normal);

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(photo_names(&app.store.photos(4).unwrap()), vec!["a.jpg"]);
        assert_eq!(app.photo_selection, 0);
        assert_eq!(app.store.notes(4).unwrap().len(), 1);

        press(&mut app, KeyCode::Tab);
        assert_eq!(app.detail_section, DetailSection::Notes);
    }

    #[test]
    fn test_ctrl_c_quits_from_any_state() {
        let mut app = app_with_photos(1, &["a.jpg"]);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state, AppState::ViewingPhotos);

        let quit = handle_input(&mut app, KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)).unwrap();
        assert!(quit);
        assert_eq!(app.state, AppState::Quitting);
    }
}
