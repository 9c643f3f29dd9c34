//! Application state management for beanmap.
//!
//! This module contains the core `App` struct that manages all application
//! state: the two screens, the fetched shop list, per-shop notes and photos,
//! transient notifications and background lookup coordination.

use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use beanmap_core::api::{nearby_shops, NearbyShops, OverpassClient};
use beanmap_core::geo::{Coordinates, FixedLocator, IpLocator, Locator};
use beanmap_core::models::{Note, Photo, ShopRecord};
use beanmap_core::store::{FileStore, KeyValueStore, ShopStore, StoreError};
use beanmap_core::Config;

use crate::capture::PhotoCapture;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background lookup channel.
const CHANNEL_BUFFER_SIZE: usize = 16;

/// How long a notification stays on screen.
const NOTICE_DURATION: Duration = Duration::from_secs(6);

/// Zoom used when the map opens on a pre-selected shop.
pub const SHOP_ZOOM: u8 = 16;

/// Zoom used when the map opens on the user's position.
pub const DEFAULT_ZOOM: u8 = 15;

/// Maximum length for note input.
pub const MAX_NOTE_LENGTH: usize = 2000;

/// Maximum length for a photo path.
pub const MAX_PATH_LENGTH: usize = 4096;

// ============================================================================
// UI State Types
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Landing,
    Map,
}

/// Initial map position carried into the map screen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
}

/// Current focus on the map screen (shop list or shop detail)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Detail,
}

/// Which attachment list the detail panel is navigating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetailSection {
    Notes,
    Photos,
}

impl DetailSection {
    pub fn toggle(&self) -> Self {
        match self {
            DetailSection::Notes => DetailSection::Photos,
            DetailSection::Photos => DetailSection::Notes,
        }
    }
}

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Normal,
    WritingNote,
    EditingNote(i64),
    /// Typing the path of the image to capture; `retake` names the photo
    /// being replaced.
    EnteringPhotoPath { retake: Option<i64> },
    /// Source acquired, waiting for the user to keep or discard it.
    ConfirmingPhoto { retake: Option<i64> },
    ViewingPhotos,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Success,
    Info,
    Error,
}

/// A transient notification.
#[derive(Debug, Clone)]
pub struct Notice {
    pub message: String,
    pub severity: Severity,
    shown_at: Instant,
}

impl Notice {
    fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
            shown_at: Instant::now(),
        }
    }

    fn is_expired(&self) -> bool {
        self.shown_at.elapsed() > NOTICE_DURATION
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Results sent back from a background lookup. Lookups are never cancelled;
/// whichever finishes last wins.
#[derive(Debug)]
pub enum LookupResult {
    /// A position fix was obtained
    Located(Coordinates),
    /// Nearby shops (possibly empty, with an error message)
    Shops(NearbyShops),
    /// No position could be obtained
    LocationFailed(String),
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub store: ShopStore<Box<dyn KeyValueStore>>,
    overpass: OverpassClient,
    locator: Arc<dyn Locator>,

    // UI State
    pub state: AppState,
    pub screen: Screen,
    pub focus: Focus,
    pub detail_section: DetailSection,
    pub map_view: Option<MapView>,
    pub input: String,
    pub notice: Option<Notice>,
    pub tick: usize,

    // Lookup state
    pub user_location: Option<Coordinates>,
    pub shops: Vec<ShopRecord>,
    pub lookup_error: Option<String>,
    lookups_in_flight: usize,

    // Selection
    pub selected_shop: Option<i64>,
    pub landing_selection: usize,
    pub shop_selection: usize,
    pub note_selection: usize,
    pub photo_selection: usize,
    pub slideshow_index: usize,

    // Photo source held between acquisition and capture
    capture: Option<PhotoCapture>,

    // Background task channel
    lookup_rx: mpsc::Receiver<LookupResult>,
    lookup_tx: mpsc::Sender<LookupResult>,
}

impl App {
    /// Create the application from configuration, opening the on-disk store.
    pub fn new(config: Config) -> Result<Self> {
        let data_dir = config.data_dir()?;
        debug!(?data_dir, "Data directory configured");
        let store: Box<dyn KeyValueStore> = Box::new(FileStore::open(data_dir)?);

        let overpass = OverpassClient::new(config.overpass_url.clone())?;
        let locator: Arc<dyn Locator> = match config.location {
            Some(position) => {
                info!(position = %position.display(), "Using configured location");
                Arc::new(FixedLocator::new(position))
            }
            None => Arc::new(IpLocator::new(config.locator_url.clone())?),
        };

        Ok(Self::with_parts(config, ShopStore::new(store), overpass, locator))
    }

    pub fn with_parts(
        config: Config,
        store: ShopStore<Box<dyn KeyValueStore>>,
        overpass: OverpassClient,
        locator: Arc<dyn Locator>,
    ) -> Self {
        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Self {
            config,
            store,
            overpass,
            locator,

            state: AppState::Normal,
            screen: Screen::Landing,
            focus: Focus::List,
            detail_section: DetailSection::Notes,
            map_view: None,
            input: String::new(),
            notice: None,
            tick: 0,

            user_location: None,
            shops: Vec::new(),
            lookup_error: None,
            lookups_in_flight: 0,

            selected_shop: None,
            landing_selection: 0,
            shop_selection: 0,
            note_selection: 0,
            photo_selection: 0,
            slideshow_index: 0,

            capture: None,

            lookup_rx: rx,
            lookup_tx: tx,
        }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub fn is_loading(&self) -> bool {
        self.lookups_in_flight > 0
    }

    /// Locate the user and fetch nearby shops in the background.
    pub fn start_lookup(&mut self) {
        self.lookups_in_flight += 1;
        self.lookup_error = None;

        let tx = self.lookup_tx.clone();
        let locator = Arc::clone(&self.locator);
        let client = self.overpass.clone();
        let radius = self.config.radius_meters;

        tokio::spawn(async move {
            match locator.locate().await {
                Ok(position) => {
                    let _ = tx.send(LookupResult::Located(position)).await;
                    let nearby = nearby_shops(&client, position, radius).await;
                    let _ = tx.send(LookupResult::Shops(nearby)).await;
                }
                Err(e) => {
                    error!(error = %e, "Error getting location");
                    let _ = tx.send(LookupResult::LocationFailed(e.to_string())).await;
                }
            }
        });
    }

    /// Drain finished background work and expire old notifications.
    pub fn check_background_tasks(&mut self) {
        self.tick = self.tick.wrapping_add(1);

        while let Ok(result) = self.lookup_rx.try_recv() {
            self.apply_lookup_result(result);
        }

        if self.notice.as_ref().is_some_and(Notice::is_expired) {
            self.notice = None;
        }
    }

    pub fn apply_lookup_result(&mut self, result: LookupResult) {
        match result {
            LookupResult::Located(position) => {
                debug!(position = %position.display(), "Location fix");
                self.user_location = Some(position);
                if self.screen == Screen::Map && self.map_view.is_none() {
                    self.map_view = Some(MapView {
                        center: position,
                        zoom: DEFAULT_ZOOM,
                    });
                }
            }
            LookupResult::Shops(nearby) => {
                self.finish_lookup();
                let mut shops = nearby.shops;
                for shop in &mut shops {
                    if let Err(e) = self.store.attach(shop) {
                        warn!(shop_id = shop.id, error = %e, "Failed to load saved shop data");
                        self.notify(
                            format!("Could not read saved data for {}", shop.display_name()),
                            Severity::Error,
                        );
                    }
                }
                info!(count = shops.len(), "Shop list updated");
                self.shops = shops;
                self.lookup_error = nearby.error;
                self.clamp_selections();
            }
            LookupResult::LocationFailed(_) => {
                self.finish_lookup();
                self.shops.clear();
                self.lookup_error = Some(
                    "Error getting location. Set a location in the config or BEANMAP_LOCATION."
                        .to_string(),
                );
                self.clamp_selections();
            }
        }
    }

    fn finish_lookup(&mut self) {
        self.lookups_in_flight = self.lookups_in_flight.saturating_sub(1);
    }

    fn clamp_selections(&mut self) {
        let preview = self.landing_shops().len();
        self.landing_selection = self.landing_selection.min(preview.saturating_sub(1));
        self.shop_selection = self.shop_selection.min(self.shops.len().saturating_sub(1));
        if let Some(id) = self.selected_shop {
            if self.shop(id).is_none() {
                self.selected_shop = None;
                self.focus = Focus::List;
            }
        }
        self.clamp_detail_selections();
    }

    fn clamp_detail_selections(&mut self) {
        let (notes, photos) = self
            .selected_shop()
            .map(|s| (s.notes.len(), s.photos.len()))
            .unwrap_or((0, 0));
        self.note_selection = self.note_selection.min(notes.saturating_sub(1));
        self.photo_selection = self.photo_selection.min(photos.saturating_sub(1));
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    /// Nearest shops shown on the landing screen.
    pub fn landing_shops(&self) -> &[ShopRecord] {
        let n = self.shops.len().min(self.config.landing_preview);
        &self.shops[..n]
    }

    pub fn shop(&self, id: i64) -> Option<&ShopRecord> {
        self.shops.iter().find(|s| s.id == id)
    }

    pub fn selected_shop(&self) -> Option<&ShopRecord> {
        self.selected_shop.and_then(|id| self.shop(id))
    }

    /// Switch to the map screen, optionally with a shop pre-selected.
    pub fn open_map(&mut self, shop_id: Option<i64>) {
        self.screen = Screen::Map;
        self.state = AppState::Normal;

        let target = shop_id.and_then(|id| {
            self.shops
                .iter()
                .position(|s| s.id == id)
                .map(|index| (index, self.shops[index].location))
        });

        match target {
            Some((index, center)) => {
                self.shop_selection = index;
                self.select_shop_at(index);
                self.map_view = Some(MapView {
                    center,
                    zoom: SHOP_ZOOM,
                });
            }
            None => {
                self.selected_shop = None;
                self.focus = Focus::List;
                self.map_view = self.user_location.map(|center| MapView {
                    center,
                    zoom: DEFAULT_ZOOM,
                });
            }
        }
    }

    pub fn go_to_landing(&mut self) {
        self.release_capture();
        self.state = AppState::Normal;
        self.screen = Screen::Landing;
        self.selected_shop = None;
        self.focus = Focus::List;
    }

    /// Show the shop at `index` in the detail panel.
    pub fn select_shop_at(&mut self, index: usize) {
        let Some(shop) = self.shops.get(index) else {
            return;
        };
        self.selected_shop = Some(shop.id);
        if let Some(view) = self.map_view.as_mut() {
            view.center = shop.location;
        }
        self.focus = Focus::Detail;
        self.detail_section = DetailSection::Notes;
        self.note_selection = 0;
        self.photo_selection = 0;
    }

    pub fn close_detail(&mut self) {
        self.release_capture();
        self.selected_shop = None;
        self.focus = Focus::List;
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    pub fn notify(&mut self, message: impl Into<String>, severity: Severity) {
        self.notice = Some(Notice::new(message, severity));
    }

    fn notify_store_error(&mut self, action: &str, e: StoreError) {
        error!(action, error = %e, "Store operation failed");
        let message = match e {
            StoreError::EmptyNote => "Note is empty".to_string(),
            other => format!("Could not {}: {}", action, other),
        };
        self.notify(message, Severity::Error);
    }

    // =========================================================================
    // Notes
    // =========================================================================

    fn selected_notes(&self) -> &[Note] {
        self.selected_shop().map(|s| s.notes.as_slice()).unwrap_or(&[])
    }

    fn selected_photos(&self) -> &[Photo] {
        self.selected_shop().map(|s| s.photos.as_slice()).unwrap_or(&[])
    }

    fn set_notes(&mut self, shop_id: i64, notes: Vec<Note>) {
        if let Some(shop) = self.shops.iter_mut().find(|s| s.id == shop_id) {
            shop.notes = notes;
        }
        self.clamp_detail_selections();
    }

    fn set_photos(&mut self, shop_id: i64, photos: Vec<Photo>) {
        if let Some(shop) = self.shops.iter_mut().find(|s| s.id == shop_id) {
            shop.photos = photos;
        }
        self.clamp_detail_selections();
    }

    pub fn begin_note(&mut self) {
        if self.selected_shop.is_some() {
            self.input.clear();
            self.state = AppState::WritingNote;
        }
    }

    pub fn begin_edit_note(&mut self) {
        let Some(note) = self.selected_notes().get(self.note_selection) else {
            return;
        };
        let (id, text) = (note.id, note.text.clone());
        self.input = text;
        self.state = AppState::EditingNote(id);
    }

    /// Save the note being written or edited.
    pub fn submit_note(&mut self) {
        let Some(shop_id) = self.selected_shop else {
            self.state = AppState::Normal;
            return;
        };

        let result = match self.state {
            AppState::WritingNote => self
                .store
                .add_note(shop_id, &self.input)
                .map(|notes| (notes, "Note added successfully!")),
            AppState::EditingNote(note_id) => self
                .store
                .edit_note(shop_id, note_id, &self.input)
                .map(|notes| (notes, "Note updated successfully!")),
            _ => return,
        };

        match result {
            Ok((notes, message)) => {
                let added = matches!(self.state, AppState::WritingNote);
                let count = notes.len();
                self.set_notes(shop_id, notes);
                if added {
                    self.note_selection = count.saturating_sub(1);
                }
                self.input.clear();
                self.state = AppState::Normal;
                self.notify(message, Severity::Success);
            }
            Err(e) => self.notify_store_error("save note", e),
        }
    }

    pub fn cancel_input(&mut self) {
        self.input.clear();
        self.state = AppState::Normal;
    }

    pub fn delete_selected_note(&mut self) {
        let Some(shop_id) = self.selected_shop else {
            return;
        };
        let Some(note_id) = self.selected_notes().get(self.note_selection).map(|n| n.id) else {
            return;
        };

        match self.store.delete_note(shop_id, note_id) {
            Ok((notes, _)) => {
                self.set_notes(shop_id, notes);
                self.notify("Note deleted successfully!", Severity::Success);
            }
            Err(e) => self.notify_store_error("delete note", e),
        }
    }

    // =========================================================================
    // Photos
    // =========================================================================

    pub fn begin_photo(&mut self, retake: bool) {
        if self.selected_shop.is_none() {
            return;
        }
        let retake = if retake {
            match self.selected_photos().get(self.photo_selection) {
                Some(photo) => Some(photo.id),
                None => return,
            }
        } else {
            None
        };
        self.input.clear();
        self.state = AppState::EnteringPhotoPath { retake };
    }

    /// Acquire the image source named by the input.
    pub fn open_photo_source(&mut self) {
        let AppState::EnteringPhotoPath { retake } = self.state else {
            return;
        };
        let path = self.input.trim().to_string();
        self.input.clear();

        match PhotoCapture::open(&path) {
            Ok(capture) => {
                self.release_capture();
                self.capture = Some(capture);
                self.state = AppState::ConfirmingPhoto { retake };
            }
            Err(e) => {
                error!(error = %e, "Error accessing photo source");
                self.state = AppState::Normal;
                self.notify(format!("Error accessing photo: {}", e), Severity::Error);
            }
        }
    }

    pub fn pending_capture(&self) -> Option<&PhotoCapture> {
        self.capture.as_ref()
    }

    /// Capture the acquired image into the selected shop.
    pub fn confirm_photo(&mut self) {
        let AppState::ConfirmingPhoto { retake } = self.state else {
            return;
        };
        self.state = AppState::Normal;

        let (Some(capture), Some(shop_id)) = (self.capture.take(), self.selected_shop) else {
            return;
        };

        let (bytes, mime) = match capture.capture() {
            Ok(captured) => captured,
            Err(e) => {
                error!(error = %e, "Photo capture failed");
                self.notify(format!("Error capturing photo: {}", e), Severity::Error);
                return;
            }
        };

        let result = match retake {
            Some(photo_id) => self
                .store
                .edit_photo(shop_id, photo_id, &bytes, mime)
                .map(|photos| (photos, "Photo updated successfully!")),
            None => self
                .store
                .add_photo(shop_id, &bytes, mime)
                .map(|photos| (photos, "Photo taken successfully!")),
        };

        match result {
            Ok((photos, message)) => {
                let count = photos.len();
                self.set_photos(shop_id, photos);
                if retake.is_none() {
                    self.photo_selection = count.saturating_sub(1);
                }
                self.notify(message, Severity::Success);
            }
            Err(e) => self.notify_store_error("save photo", e),
        }
    }

    pub fn cancel_photo(&mut self) {
        self.release_capture();
        self.input.clear();
        self.state = AppState::Normal;
        self.notify("Photo discarded", Severity::Info);
    }

    /// Let go of any acquired photo source.
    pub fn release_capture(&mut self) {
        if let Some(capture) = self.capture.take() {
            capture.cancel();
        }
    }

    /// Delete the photo highlighted in the detail panel.
    pub fn delete_selected_photo(&mut self) {
        let Some(photo_id) = self.selected_photos().get(self.photo_selection).map(|p| p.id) else {
            return;
        };
        self.delete_photo(photo_id);
    }

    /// Delete the photo currently shown in the slideshow.
    pub fn delete_slideshow_photo(&mut self) {
        let Some(photo_id) = self.slideshow_photo().map(|p| p.id) else {
            return;
        };
        self.delete_photo(photo_id);
        // The detail panel follows the photo that slid into view
        self.photo_selection = self.slideshow_index;
    }

    fn delete_photo(&mut self, photo_id: i64) {
        let Some(shop_id) = self.selected_shop else {
            return;
        };

        match self.store.delete_photo(shop_id, photo_id) {
            Ok((photos, _)) => {
                self.set_photos(shop_id, photos);
                let last = self.selected_photos().len().saturating_sub(1);
                if matches!(self.state, AppState::ViewingPhotos) && self.selected_photos().is_empty() {
                    self.state = AppState::Normal;
                }
                self.slideshow_index = self.slideshow_index.min(last);
                self.notify("Photo deleted successfully!", Severity::Success);
            }
            Err(e) => self.notify_store_error("delete photo", e),
        }
    }

    // =========================================================================
    // Slideshow
    // =========================================================================

    pub fn open_slideshow(&mut self) {
        if self.selected_photos().is_empty() {
            return;
        }
        self.slideshow_index = self.photo_selection;
        self.state = AppState::ViewingPhotos;
    }

    pub fn close_slideshow(&mut self) {
        self.slideshow_index = 0;
        self.state = AppState::Normal;
    }

    pub fn next_photo(&mut self) {
        let len = self.selected_photos().len();
        if len > 0 {
            self.slideshow_index = (self.slideshow_index + 1) % len;
        }
    }

    pub fn previous_photo(&mut self) {
        let len = self.selected_photos().len();
        if len > 0 {
            self.slideshow_index = (self.slideshow_index + len - 1) % len;
        }
    }

    pub fn slideshow_photo(&self) -> Option<&Photo> {
        self.selected_photos().get(self.slideshow_index)
    }

    // =========================================================================
    // List navigation
    // =========================================================================

    pub fn move_selection(&mut self, down: bool) {
        fn step(current: usize, len: usize, down: bool) -> usize {
            if len == 0 {
                0
            } else if down {
                (current + 1).min(len - 1)
            } else {
                current.saturating_sub(1)
            }
        }

        match (self.screen, self.focus, self.detail_section) {
            (Screen::Landing, _, _) => {
                self.landing_selection = step(self.landing_selection, self.landing_shops().len(), down);
            }
            (Screen::Map, Focus::List, _) => {
                self.shop_selection = step(self.shop_selection, self.shops.len(), down);
            }
            (Screen::Map, Focus::Detail, DetailSection::Notes) => {
                self.note_selection = step(self.note_selection, self.selected_notes().len(), down);
            }
            (Screen::Map, Focus::Detail, DetailSection::Photos) => {
                self.photo_selection = step(self.photo_selection, self.selected_photos().len(), down);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use beanmap_core::store::MemoryStore;
    use tempfile::TempDir;

    fn shop(id: i64, lat: f64, distance_km: f64) -> ShopRecord {
        ShopRecord {
            id,
            name: Some(format!("Shop {}", id)),
            location: Coordinates::new(lat, -73.0),
            address: None,
            phone: None,
            website: None,
            opening_hours: None,
            cuisine: None,
            distance_km,
            notes: Vec::new(),
            photos: Vec::new(),
        }
    }

    pub(crate) fn app() -> App {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        App::with_parts(
            Config::default(),
            ShopStore::new(store),
            OverpassClient::new("http://127.0.0.1:9/").unwrap(),
            Arc::new(FixedLocator::new(Coordinates::new(40.0, -73.0))),
        )
    }

    pub(crate) fn app_with_shops() -> App {
        let mut app = app();
        app.apply_lookup_result(LookupResult::Located(Coordinates::new(40.0, -73.0)));
        app.apply_lookup_result(LookupResult::Shops(NearbyShops {
            shops: (1..=7).map(|i| shop(i, 40.0 + i as f64 * 0.001, i as f64 * 0.1)).collect(),
            error: None,
        }));
        app
    }

    /// Open the map on `shop_id` with one stored photo per name; each photo's
    /// image bytes are its name.
    pub(crate) fn app_with_photos(shop_id: i64, names: &[&str]) -> App {
        let mut app = app_with_shops();
        for name in names {
            app.store.add_photo(shop_id, name.as_bytes(), "image/jpeg").unwrap();
        }
        app.open_map(Some(shop_id));
        let photos = app.store.photos(shop_id).unwrap();
        app.set_photos(shop_id, photos);
        app.detail_section = DetailSection::Photos;
        app
    }

    pub(crate) fn photo_names(photos: &[Photo]) -> Vec<String> {
        photos
            .iter()
            .map(|p| String::from_utf8(p.image_bytes().unwrap()).unwrap())
            .collect()
    }

    pub(crate) fn shown_photo(app: &App) -> Option<String> {
        app.slideshow_photo()
            .map(|p| String::from_utf8(p.image_bytes().unwrap()).unwrap())
    }

    #[test]
    fn test_landing_preview_is_capped() {
        let app = app_with_shops();
        assert_eq!(app.shops.len(), 7);
        assert_eq!(app.landing_shops().len(), 5);
    }

    #[test]
    fn test_open_map_with_shop() {
        let mut app = app_with_shops();
        app.open_map(Some(3));

        assert_eq!(app.screen, Screen::Map);
        assert_eq!(app.selected_shop, Some(3));
        assert_eq!(app.focus, Focus::Detail);
        let view = app.map_view.unwrap();
        assert_eq!(view.zoom, SHOP_ZOOM);
        assert_eq!(view.center, app.shop(3).unwrap().location);
    }

    #[test]
    fn test_open_map_without_shop_centers_on_user() {
        let mut app = app_with_shops();
        app.open_map(None);
        assert_eq!(app.selected_shop, None);
        assert_eq!(
            app.map_view,
            Some(MapView {
                center: Coordinates::new(40.0, -73.0),
                zoom: DEFAULT_ZOOM
            })
        );
    }

    #[test]
    fn test_add_edit_delete_note_through_app() {
        let mut app = app_with_shops();
        app.open_map(Some(2));

        app.begin_note();
        app.input = "Great espresso".to_string();
        app.submit_note();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.selected_shop().unwrap().notes.len(), 1);
        assert_eq!(app.store.notes(2).unwrap(), app.selected_shop().unwrap().notes);

        app.begin_edit_note();
        assert_eq!(app.input, "Great espresso");
        app.input = "Great espresso, slow service".to_string();
        app.submit_note();
        assert_eq!(app.store.notes(2).unwrap()[0].text, "Great espresso, slow service");

        app.delete_selected_note();
        assert!(app.selected_shop().unwrap().notes.is_empty());
        assert!(app.store.notes(2).unwrap().is_empty());
        assert_eq!(app.notice.as_ref().unwrap().message, "Note deleted successfully!");
    }

    #[test]
    fn test_empty_note_keeps_editor_open() {
        let mut app = app_with_shops();
        app.open_map(Some(1));
        app.begin_note();
        app.input = "   ".to_string();
        app.submit_note();
        assert_eq!(app.state, AppState::WritingNote);
        assert_eq!(app.notice.as_ref().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_photo_capture_and_slideshow() {
        let dir = TempDir::new().unwrap();
        let mut app = app_with_shops();
        app.open_map(Some(1));

        for name in ["a.jpg", "b.jpg", "c.png"] {
            let path = dir.path().join(name);
            std::fs::write(&path, name.as_bytes()).unwrap();
            app.begin_photo(false);
            app.input = path.display().to_string();
            app.open_photo_source();
            assert!(app.pending_capture().is_some());
            app.confirm_photo();
            assert!(app.pending_capture().is_none());
        }
        assert_eq!(app.store.photos(1).unwrap().len(), 3);

        app.photo_selection = 0;
        app.open_slideshow();
        assert_eq!(app.state, AppState::ViewingPhotos);
        app.previous_photo();
        assert_eq!(app.slideshow_index, 2);
        app.next_photo();
        app.next_photo();
        assert_eq!(app.slideshow_index, 1);
        assert_eq!(app.slideshow_photo().unwrap().image_bytes().unwrap(), b"b.jpg".to_vec());
    }

    #[test]
    fn test_slideshow_delete_removes_shown_photo() {
        let mut app = app_with_photos(2, &["a.jpg", "b.jpg", "c.jpg"]);
        app.photo_selection = 0;
        app.open_slideshow();
        app.next_photo();
        assert_eq!(shown_photo(&app).as_deref(), Some("b.jpg"));

        app.delete_slideshow_photo();
        assert_eq!(photo_names(&app.store.photos(2).unwrap()), vec!["a.jpg", "c.jpg"]);
        assert_eq!(app.state, AppState::ViewingPhotos);
        assert_eq!(app.slideshow_index, 1);
        assert_eq!(app.photo_selection, 1);
        assert_eq!(shown_photo(&app).as_deref(), Some("c.jpg"));

        // Deleting the last photo in the list steps back to the new last one
        app.delete_slideshow_photo();
        assert_eq!(photo_names(&app.store.photos(2).unwrap()), vec!["a.jpg"]);
        assert_eq!(app.slideshow_index, 0);

        app.delete_slideshow_photo();
        assert!(app.store.photos(2).unwrap().is_empty());
        assert_eq!(app.state, AppState::Normal);
    }

    #[test]
    fn test_photo_source_released_when_leaving() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("shot.jpg");
        std::fs::write(&path, b"jpg").unwrap();

        let mut app = app_with_shops();
        app.open_map(Some(1));
        app.begin_photo(false);
        app.input = path.display().to_string();
        app.open_photo_source();
        assert!(app.pending_capture().is_some());

        app.go_to_landing();
        assert!(app.pending_capture().is_none());
        assert!(app.store.photos(1).unwrap().is_empty());
    }

    #[test]
    fn test_missing_photo_source_aborts() {
        let mut app = app_with_shops();
        app.open_map(Some(1));
        app.begin_photo(false);
        app.input = "/definitely/not/here.jpg".to_string();
        app.open_photo_source();
        assert_eq!(app.state, AppState::Normal);
        assert_eq!(app.notice.as_ref().unwrap().severity, Severity::Error);
    }

    #[test]
    fn test_later_lookup_wins() {
        let mut app = app_with_shops();
        app.open_map(Some(7));
        app.apply_lookup_result(LookupResult::Shops(NearbyShops {
            shops: vec![shop(1, 40.001, 0.1)],
            error: None,
        }));
        assert_eq!(app.shops.len(), 1);
        // The selected shop is gone from the new list.
        assert_eq!(app.selected_shop, None);
        assert_eq!(app.focus, Focus::List);
    }

    #[test]
    fn test_failed_lookup_shows_error_and_empty_list() {
        let mut app = app_with_shops();
        app.apply_lookup_result(LookupResult::Shops(NearbyShops {
            shops: Vec::new(),
            error: Some("Error fetching coffee shops".to_string()),
        }));
        assert!(app.shops.is_empty());
        assert_eq!(app.lookup_error.as_deref(), Some("Error fetching coffee shops"));

        app.apply_lookup_result(LookupResult::LocationFailed("denied".to_string()));
        assert!(app.lookup_error.unwrap().starts_with("Error getting location"));
    }

    #[test]
    fn test_saved_notes_attached_on_lookup() {
        let mut app = app();
        app.store.add_note(4, "remembered").unwrap();
        app.apply_lookup_result(LookupResult::Shops(NearbyShops {
            shops: vec![shop(4, 40.0, 0.0)],
            error: None,
        }));
        assert_eq!(app.shops[0].attachment_summary(), "Notes: 1 | Photos: 0");
    }
}
