use bookmarks_gui::{
    bookmark::{default_bookmarks_path, BookmarkSet, BookmarkStore},
    config::{Config, MarkerStyleConfig},
    flags::{self, FeatureFlag},
    markers::{self, MarkerLane},
    session::{
        self, playstate_to_str, spawn_snapshot_worker, NowPlaying, PlayState, SnapshotCommand,
        SnapshotResult, Timeline,
    },
    settings::{default_settings_path, Settings},
};
use eframe::egui::{
    self, Align, Color32, CornerRadius, Pos2, Rect, RichText, Sense, Vec2, ViewportBuilder,
};
use std::{
    sync::mpsc::{Receiver, Sender, TryRecvError},
    time::{Duration, Instant},
};
use strum::IntoEnumIterator;

const TIMELINE_PADDING_RATIO: f32 = 0.06;
const TIMELINE_PADDING_MIN: f32 = 12.0;
const TIMELINE_PADDING_MAX: f32 = 32.0;
const TIMELINE_MIN_CONTENT_WIDTH: f32 = 160.0;

const TRACK_THICKNESS: f32 = 6.0;
const THUMB_RADIUS: f32 = 7.0;
const MARKER_HEIGHT: f32 = 14.0;
const BOOKMARK_LIST_MAX_HEIGHT: f32 = 180.0;

const SETTINGS_KEY_POLL_MS: &str = "overlay_poll_ms";

#[derive(Debug, Copy, Clone)]
struct StripMetrics {
    total_width: f32,
    content_width: f32,
    margin: f32,
}

impl StripMetrics {
    fn padded(total_width: f32, padding: f32) -> Self {
        let total = total_width.max(1.0);
        let margin = padding.clamp(0.0, total / 2.0);
        let content = (total - 2.0 * margin).max(1.0);
        Self {
            total_width: total,
            content_width: content,
            margin,
        }
    }

    fn content_width(&self) -> f32 {
        self.content_width
    }

    fn show_anchored<R>(
        &self,
        ui: &mut egui::Ui,
        align: Align,
        builder: impl FnOnce(&mut egui::Ui) -> R,
    ) -> R {
        ui.allocate_ui_with_layout(
            egui::vec2(self.total_width, 0.0),
            egui::Layout::left_to_right(Align::Center),
            |row| {
                let extra = (self.total_width - self.content_width).max(0.0);
                let (left_space, right_space) = match align {
                    Align::Min => (0.0, extra),
                    Align::Center => (extra / 2.0, extra / 2.0),
                    Align::Max => (extra, 0.0),
                };

                if left_space > 0.0 {
                    row.add_space(left_space);
                }

                let result = row
                    .allocate_ui_with_layout(
                        egui::vec2(self.content_width, 0.0),
                        egui::Layout::top_down(Align::Center),
                        builder,
                    )
                    .inner;

                if right_space > 0.0 {
                    row.add_space(right_space);
                }

                result
            },
        )
        .inner
    }
}

fn timeline_strip_metrics(total_width: f32) -> StripMetrics {
    let total = total_width.max(1.0);
    let mut padding =
        (total * TIMELINE_PADDING_RATIO).clamp(TIMELINE_PADDING_MIN, TIMELINE_PADDING_MAX);
    let max_padding = (total - TIMELINE_MIN_CONTENT_WIDTH).max(0.0) / 2.0;
    padding = padding.min(max_padding);
    StripMetrics::padded(total, padding)
}

fn format_timestamp(seconds: f64) -> String {
    let total_seconds = seconds.max(0.0).floor() as u64;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let secs = total_seconds % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{secs:02}")
    } else {
        format!("{minutes}:{secs:02}")
    }
}

fn format_timestamp_ms(time_ms: u64) -> String {
    format_timestamp(time_ms as f64 / 1000.0)
}

/// Custom seek strip: track, progress fill, one tick per projected bookmark
/// fraction, then the thumb. Fractions are clamped to the track here and
/// nowhere else.
fn seek_slider(
    ui: &mut egui::Ui,
    value: &mut f64,
    duration: f64,
    lane: &MarkerLane,
    style: &MarkerStyleConfig,
) -> egui::Response {
    let span = duration.max(f64::MIN_POSITIVE);
    let fraction = (*value / span).clamp(0.0, 1.0) as f32;

    let desired_height = MARKER_HEIGHT.max(THUMB_RADIUS * 2.0).max(TRACK_THICKNESS) + 8.0;
    let width = ui.available_width();
    let (rect, mut response) =
        ui.allocate_exact_size(Vec2::new(width, desired_height), Sense::click_and_drag());

    if response.hovered() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    let available_width = rect.width().max(1.0);
    let thumb_guard = THUMB_RADIUS.min(available_width / 2.0);
    let track_min_x = rect.min.x + thumb_guard;
    let track_max_x = rect.max.x - thumb_guard;
    let track_width = (track_max_x - track_min_x).max(1.0);

    if response.dragged() || response.drag_started() || response.clicked() {
        if let Some(pos) = ui.input(|input| input.pointer.interact_pos()) {
            let t = ((pos.x - track_min_x) / track_width).clamp(0.0, 1.0);
            let new_value = span * t as f64;
            if (new_value - *value).abs() > f64::EPSILON {
                *value = new_value;
                response.mark_changed();
            }
        }
    }

    let painter = ui.painter_at(rect);
    let track_rect = Rect::from_min_max(
        Pos2::new(track_min_x, rect.center().y - TRACK_THICKNESS / 2.0),
        Pos2::new(track_min_x + track_width, rect.center().y + TRACK_THICKNESS / 2.0),
    );
    let rounding = CornerRadius::same(3);
    painter.rect_filled(track_rect, rounding, Color32::from_rgb(64, 64, 64));

    if fraction > 0.0 {
        let fill_rect = Rect::from_min_max(
            track_rect.min,
            Pos2::new(track_rect.min.x + track_width * fraction, track_rect.max.y),
        );
        painter.rect_filled(fill_rect, rounding, Color32::from_rgb(0, 120, 212));
    }

    for &marker in lane.fractions() {
        let x = track_min_x + track_width * marker.clamp(0.0, 1.0);
        let marker_rect = Rect::from_center_size(
            Pos2::new(x, rect.center().y),
            Vec2::new(style.width(), MARKER_HEIGHT),
        );
        painter.rect_filled(marker_rect, CornerRadius::same(1), style.color);
    }

    let thumb_center = Pos2::new(track_min_x + track_width * fraction, track_rect.center().y);
    painter.circle_filled(thumb_center, THUMB_RADIUS, Color32::from_rgb(230, 230, 230));

    response
}

enum RowAction {
    Seek(u64),
    BeginRename(usize, String),
    CommitRename,
    CancelRename,
    Delete(usize),
}

struct App {
    now: NowPlaying,
    timeline: Option<Timeline>,
    err: Option<String>,
    last_pull: Instant,
    last_position_update: Instant,
    last_position_secs: f64,
    pending_seek_target: Option<f64>,
    pending_seek_deadline: Option<Instant>,
    snapshot_rx: Option<Receiver<SnapshotResult>>,
    snapshot_request_tx: Option<Sender<SnapshotCommand>>,
    snapshot_inflight: bool,
    last_snapshot_request: Option<Instant>,

    config: Config,
    settings: Settings,
    store: BookmarkStore,
    bookmarks: BookmarkSet,
    marker_lane: MarkerLane,
    show_empty_hint: bool,
    media_key: Option<String>,
    last_duration_ms: i64,

    bookmarks_open: bool,
    renaming: Option<(usize, String)>,
    settings_open: bool,
}

impl Default for App {
    fn default() -> Self {
        let config = Config::load().unwrap_or_else(|err| {
            log::warn!("Falling back to default config: {err:?}");
            Config::default()
        });

        let settings_path = config
            .storage
            .settings_path
            .clone()
            .unwrap_or_else(default_settings_path);
        let settings = Settings::open(&settings_path).unwrap_or_else(|err| {
            log::warn!("Failed to open settings: {err:?}");
            Settings::open(default_settings_path()).expect("default settings path must open")
        });

        let bookmarks_path = config
            .storage
            .bookmarks_path
            .clone()
            .unwrap_or_else(default_bookmarks_path);
        let mut store = BookmarkStore::load(&bookmarks_path).unwrap_or_else(|err| {
            log::warn!("Failed to load bookmarks: {err:?}");
            BookmarkStore::load(default_bookmarks_path()).expect("default bookmark path must load")
        });
        if config.storage.watch_bookmarks {
            if let Err(err) = store.enable_hot_reload() {
                log::warn!("Bookmark hot reload unavailable: {err:?}");
            }
        }

        let (request_tx, snapshot_rx) = spawn_snapshot_worker();

        Self {
            now: NowPlaying::default(),
            timeline: None,
            err: None,
            last_pull: Instant::now() - Duration::from_secs(1),
            last_position_update: Instant::now(),
            last_position_secs: 0.0,
            pending_seek_target: None,
            pending_seek_deadline: None,
            snapshot_rx: Some(snapshot_rx),
            snapshot_request_tx: Some(request_tx),
            snapshot_inflight: false,
            last_snapshot_request: None,

            config,
            settings,
            store,
            bookmarks: BookmarkSet::default(),
            marker_lane: MarkerLane::default(),
            show_empty_hint: true,
            media_key: None,
            last_duration_ms: 0,

            bookmarks_open: true,
            renaming: None,
            settings_open: false,
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let mut snapshots = Vec::new();
        if let Some(rx) = self.snapshot_rx.as_mut() {
            loop {
                match rx.try_recv() {
                    Ok(res) => snapshots.push(res),
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => {
                        self.snapshot_rx = None;
                        self.snapshot_request_tx = None;
                        self.snapshot_inflight = false;
                        self.last_snapshot_request = None;
                        break;
                    }
                }
            }
        }

        for res in snapshots {
            self.snapshot_inflight = false;
            self.last_snapshot_request = None;
            match res {
                Ok((now, timeline)) => self.apply_snapshot(now, timeline),
                Err(e) => {
                    self.err = Some(e);
                    self.timeline = None;
                    self.last_pull = Instant::now();
                }
            }
        }

        if let Some(timeline) = &mut self.timeline {
            let is_playing = self.now.state == PlayState::Playing;
            if is_playing && self.pending_seek_target.is_none() {
                let now = Instant::now();
                let elapsed = now.duration_since(self.last_position_update).as_secs_f64();
                let new_pos = (self.last_position_secs + elapsed)
                    .clamp(timeline.start_secs, timeline.end_secs);
                timeline.position_secs = new_pos;
                self.last_position_secs = new_pos;
                self.last_position_update = now;
            } else {
                self.last_position_update = Instant::now();
                self.last_position_secs = timeline.position_secs;
            }
        }

        if self.store.poll_changes() {
            self.refresh_bookmarks();
        }

        let duration_ms = self
            .timeline
            .as_ref()
            .map(|timeline| timeline.duration_ms())
            .unwrap_or(0);
        if duration_ms != self.last_duration_ms {
            self.refresh_markers();
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.spacing_mut().item_spacing.y = 8.0;
            self.render_header(ui);
            self.render_timeline(ui);
            if self.bookmarks_open {
                self.render_bookmark_list(ui);
            }
        });

        if self.settings_open {
            self.render_settings_window(ctx);
        }

        self.maybe_request_snapshot();
        ctx.request_repaint_after(self.desired_repaint_interval());
    }
}

impl App {
    fn refresh_bookmarks(&mut self) {
        self.bookmarks = match &self.media_key {
            Some(key) => self.store.set_for(key),
            None => BookmarkSet::default(),
        };
        self.refresh_markers();
    }

    fn refresh_markers(&mut self) {
        let duration_ms = self
            .timeline
            .as_ref()
            .map(|timeline| timeline.duration_ms())
            .unwrap_or(0);
        self.last_duration_ms = duration_ms;
        self.show_empty_hint =
            markers::sync_lane(&mut self.marker_lane, &self.bookmarks, duration_ms);
    }

    fn apply_snapshot(&mut self, now: NowPlaying, timeline: Option<Timeline>) {
        let now_instant = Instant::now();
        let track_changed = self.now != now;

        if let Some(mut tl) = timeline {
            if let Some(target) = self.pending_seek_target {
                let settled = (tl.position_secs - target).abs() <= 0.5;
                let expired = self
                    .pending_seek_deadline
                    .is_some_and(|deadline| now_instant >= deadline);
                if settled || expired {
                    self.pending_seek_target = None;
                    self.pending_seek_deadline = None;
                } else {
                    tl.position_secs = target;
                }
            }
            self.last_position_secs = tl.position_secs;
            self.last_position_update = now_instant;
            self.timeline = Some(tl);
        } else {
            self.timeline = None;
            self.pending_seek_target = None;
            self.pending_seek_deadline = None;
        }

        self.now = now;
        self.err = None;
        self.last_pull = now_instant;

        if track_changed || self.media_key.is_none() {
            self.media_key = Some(self.now.media_key());
            self.renaming = None;
            self.refresh_bookmarks();
        }
    }

    fn desired_repaint_interval(&self) -> Duration {
        match self.now.state {
            PlayState::Playing => Duration::from_millis(100),
            PlayState::Changing | PlayState::Opened => Duration::from_millis(120),
            PlayState::Paused => Duration::from_millis(250),
            _ => Duration::from_millis(300),
        }
    }

    fn snapshot_poll_interval(&self) -> Duration {
        // A positive settings override wins; zero means "no override".
        let override_ms = self.settings.get_i64(SETTINGS_KEY_POLL_MS);
        if override_ms > 0 {
            return Duration::from_millis(override_ms as u64);
        }

        match self.now.state {
            PlayState::Playing => Duration::from_millis(800),
            PlayState::Changing => Duration::from_millis(500),
            PlayState::Opened => Duration::from_secs(2),
            PlayState::Paused => Duration::from_secs(3),
            PlayState::Stopped => Duration::from_secs(4),
            PlayState::Closed | PlayState::Unknown => Duration::from_secs(5),
        }
    }

    fn maybe_request_snapshot(&mut self) {
        let now = Instant::now();

        if self.snapshot_inflight {
            if let Some(sent_at) = self.last_snapshot_request {
                if now.duration_since(sent_at) > Duration::from_secs(5) {
                    self.snapshot_inflight = false;
                    self.last_snapshot_request = None;
                }
            } else {
                self.snapshot_inflight = false;
            }
        }

        if self.snapshot_inflight {
            return;
        }

        if now.duration_since(self.last_pull) < self.snapshot_poll_interval() {
            return;
        }

        if let Some(tx) = self.snapshot_request_tx.as_ref() {
            match tx.send(SnapshotCommand::Fetch) {
                Ok(()) => {
                    self.snapshot_inflight = true;
                    self.last_snapshot_request = Some(now);
                }
                Err(_) => {
                    self.snapshot_request_tx = None;
                }
            }
        }
    }

    fn seek_to(&mut self, target_secs: f64) {
        match session::seek(target_secs) {
            Ok(true) => {
                self.pending_seek_target = Some(target_secs);
                self.pending_seek_deadline = Some(Instant::now() + Duration::from_secs(4));
                if let Some(timeline) = &mut self.timeline {
                    timeline.position_secs =
                        target_secs.clamp(timeline.start_secs, timeline.end_secs);
                }
                self.last_position_secs = target_secs;
                self.last_position_update = Instant::now();
            }
            Ok(false) => {
                self.err = Some("Seek command was rejected by the media session.".to_string());
            }
            Err(e) => {
                self.err = Some(format!("Seek failed: {e}"));
            }
        }
    }

    fn add_bookmark_at_position(&mut self) {
        let Some(key) = self.media_key.clone() else {
            return;
        };
        let Some(timeline) = &self.timeline else {
            return;
        };
        let time_ms = timeline.position_ms();
        let title = self.now.display_title().to_string();
        if let Err(err) = self.store.add(&key, &title, time_ms) {
            self.err = Some(format!("Failed to add bookmark: {err:?}"));
        }
        self.refresh_bookmarks();
    }

    fn previews_enabled(&self) -> bool {
        flags::is_enabled(&self.settings, FeatureFlag::MarkerPreviews)
    }

    fn scrubbing_enabled(&self) -> bool {
        // Effective only while its prerequisite is on; the registry itself
        // never cascades.
        self.previews_enabled() && flags::is_enabled(&self.settings, FeatureFlag::PreviewScrubbing)
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|row| {
            row.label(RichText::new(self.now.display_title()).strong().size(16.0));
            row.with_layout(egui::Layout::right_to_left(Align::Center), |right| {
                if right.button("Settings").clicked() {
                    self.settings_open = !self.settings_open;
                }
                let bookmark_label = if self.bookmarks_open {
                    "Hide bookmarks"
                } else {
                    "Bookmarks"
                };
                if right.button(bookmark_label).clicked() {
                    self.bookmarks_open = !self.bookmarks_open;
                }
                right.label(
                    RichText::new(playstate_to_str(self.now.state))
                        .weak()
                        .size(12.0),
                );
            });
        });

        let subtitle = match (self.now.artist.is_empty(), self.now.album.is_empty()) {
            (false, false) => format!("{} — {}", self.now.artist, self.now.album),
            (false, true) => self.now.artist.clone(),
            (true, false) => self.now.album.clone(),
            (true, true) => String::new(),
        };
        if !subtitle.is_empty() {
            ui.label(RichText::new(subtitle).weak());
        }

        if let Some(err) = &self.err {
            ui.label(
                RichText::new(err)
                    .weak()
                    .color(Color32::from_rgb(220, 80, 80)),
            );
        }
    }

    fn render_timeline(&mut self, ui: &mut egui::Ui) {
        let (duration, start_secs, position_secs, can_seek) = match &self.timeline {
            Some(timeline) => (
                timeline.duration_secs(),
                timeline.start_secs,
                timeline.position_secs,
                timeline.can_seek,
            ),
            None => {
                ui.label(RichText::new("Timeline unavailable for this session.").weak());
                return;
            }
        };

        let mut relative = if duration > 0.0 {
            (position_secs - start_secs).clamp(0.0, duration)
        } else {
            0.0
        };
        let previous_position = position_secs;

        let metrics = timeline_strip_metrics(ui.available_width());

        if duration > f64::EPSILON {
            let lane = &self.marker_lane;
            let style = &self.config.ui.markers;
            let response = metrics.show_anchored(ui, Align::Center, |inner| {
                inner.set_width(metrics.content_width());
                if can_seek {
                    seek_slider(inner, &mut relative, duration, lane, style)
                } else {
                    inner
                        .add_enabled_ui(false, |disabled| {
                            seek_slider(disabled, &mut relative, duration, lane, style)
                        })
                        .inner
                }
            });

            self.render_marker_preview(&response, duration);

            let start_label = format_timestamp(relative);
            let end_label = format_timestamp(duration);
            metrics.show_anchored(ui, Align::Center, |inner| {
                inner.set_width(metrics.content_width());
                inner.horizontal(|row| {
                    row.label(RichText::new(start_label).weak().size(12.0));
                    row.with_layout(egui::Layout::right_to_left(Align::Center), |right| {
                        right.label(RichText::new(end_label).weak().size(12.0));
                    });
                });
            });

            if can_seek && response.changed() {
                if let Some(timeline) = &mut self.timeline {
                    timeline.position_secs = start_secs + relative;
                }
                self.last_position_secs = start_secs + relative;
                self.last_position_update = Instant::now();
            }

            let commit_seek =
                can_seek && (response.drag_stopped() || (response.clicked() && !response.dragged()));
            if commit_seek {
                let target_secs = start_secs + relative;
                if (target_secs - previous_position).abs() > 0.001 {
                    self.seek_to(target_secs);
                }
            }
        } else {
            metrics.show_anchored(ui, Align::Center, |inner| {
                inner.set_width(metrics.content_width());
                inner.add(egui::ProgressBar::new(0.0).desired_width(f32::INFINITY));
            });
            ui.label(RichText::new("Live").weak().size(12.0));
        }
    }

    /// Hover previews on the seek strip, gated by the experimental flags.
    fn render_marker_preview(&self, response: &egui::Response, duration: f64) {
        if !self.previews_enabled() {
            return;
        }
        let Some(pos) = response.hover_pos() else {
            return;
        };

        let rect = response.rect;
        let t = ((pos.x - rect.min.x) / rect.width().max(1.0)).clamp(0.0, 1.0);

        let mut nearest: Option<(f32, &str, u64)> = None;
        for (fraction, bookmark) in self
            .marker_lane
            .fractions()
            .iter()
            .zip(self.bookmarks.entries())
        {
            let distance = (fraction.clamp(0.0, 1.0) - t).abs();
            if distance <= 0.02 && nearest.is_none_or(|(best, _, _)| distance < best) {
                nearest = Some((distance, &bookmark.name, bookmark.time_ms));
            }
        }

        let text = match nearest {
            Some((_, name, time_ms)) => format!("{name} — {}", format_timestamp_ms(time_ms)),
            None if self.scrubbing_enabled() => format_timestamp(t as f64 * duration),
            None => return,
        };

        response.clone().on_hover_text(text);
    }

    fn render_bookmark_list(&mut self, ui: &mut egui::Ui) {
        ui.separator();
        ui.horizontal(|row| {
            row.label(RichText::new("Bookmarks").strong());
            row.with_layout(egui::Layout::right_to_left(Align::Center), |right| {
                let can_add = self.media_key.is_some() && self.timeline.is_some();
                if right
                    .add_enabled(can_add, egui::Button::new("Add at current time"))
                    .clicked()
                {
                    self.add_bookmark_at_position();
                }
            });
        });

        if self.show_empty_hint {
            ui.label(
                RichText::new("No bookmarks for this media yet.")
                    .weak()
                    .italics(),
            );
            return;
        }

        let renaming_row = self.renaming.as_ref().map(|(idx, _)| *idx);
        let mut action: Option<RowAction> = None;

        egui::ScrollArea::vertical()
            .max_height(BOOKMARK_LIST_MAX_HEIGHT)
            .show(ui, |list| {
                for (idx, bookmark) in self.bookmarks.entries().iter().enumerate() {
                    list.horizontal(|row| {
                        if renaming_row == Some(idx) {
                            if let Some((_, buffer)) = &mut self.renaming {
                                row.add(egui::TextEdit::singleline(buffer).desired_width(160.0));
                            }
                            if row.button("Save").clicked() {
                                action = Some(RowAction::CommitRename);
                            }
                            if row.button("Cancel").clicked() {
                                action = Some(RowAction::CancelRename);
                            }
                        } else {
                            let label = row.add(
                                egui::Label::new(format!(
                                    "{} — {}",
                                    bookmark.name,
                                    format_timestamp_ms(bookmark.time_ms)
                                ))
                                .sense(Sense::click()),
                            );
                            if label.clicked() {
                                action = Some(RowAction::Seek(bookmark.time_ms));
                            }
                            row.with_layout(egui::Layout::right_to_left(Align::Center), |right| {
                                if right.small_button("Delete").clicked() {
                                    action = Some(RowAction::Delete(idx));
                                }
                                if right.small_button("Rename").clicked() {
                                    action =
                                        Some(RowAction::BeginRename(idx, bookmark.name.clone()));
                                }
                            });
                        }
                    });
                }
            });

        match action {
            Some(RowAction::Seek(time_ms)) => {
                if let Some(timeline) = &self.timeline {
                    let target = timeline.start_secs + time_ms as f64 / 1000.0;
                    self.seek_to(target);
                }
            }
            Some(RowAction::BeginRename(idx, current)) => {
                self.renaming = Some((idx, current));
            }
            Some(RowAction::CommitRename) => {
                if let (Some(key), Some((idx, name))) =
                    (self.media_key.clone(), self.renaming.take())
                {
                    if let Err(err) = self.store.rename(&key, idx, &name) {
                        self.err = Some(format!("Failed to rename bookmark: {err:?}"));
                    }
                    self.refresh_bookmarks();
                }
            }
            Some(RowAction::CancelRename) => {
                self.renaming = None;
            }
            Some(RowAction::Delete(idx)) => {
                if let Some(key) = self.media_key.clone() {
                    if let Err(err) = self.store.delete(&key, idx) {
                        self.err = Some(format!("Failed to delete bookmark: {err:?}"));
                    }
                    self.renaming = None;
                    self.refresh_bookmarks();
                }
            }
            None => {}
        }
    }

    fn render_settings_window(&mut self, ctx: &egui::Context) {
        let mut open = self.settings_open;
        egui::Window::new("Settings")
            .open(&mut open)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label(RichText::new("Experimental features").strong());
                for flag in FeatureFlag::iter() {
                    let mut enabled = flags::is_enabled(&self.settings, flag);
                    let dependency_met = flag
                        .depends_on()
                        .is_none_or(|dep| flags::is_enabled(&self.settings, dep));
                    let label = match flag.depends_on() {
                        Some(dep) => format!("{} (requires {})", flag.title(), dep.title()),
                        None => flag.title().to_string(),
                    };
                    let response =
                        ui.add_enabled(dependency_met, egui::Checkbox::new(&mut enabled, label));
                    if response.changed() {
                        if let Err(err) = flags::set_enabled(&mut self.settings, flag, enabled) {
                            self.err = Some(format!("Failed to save setting: {err:?}"));
                        }
                    }
                }

                ui.separator();
                let mut watch = self.store.hot_reload_enabled();
                if ui
                    .checkbox(&mut watch, "Reload bookmarks when the file changes")
                    .changed()
                {
                    if watch {
                        if let Err(err) = self.store.enable_hot_reload() {
                            self.err = Some(format!("{err:?}"));
                        }
                    } else {
                        self.store.disable_hot_reload();
                    }
                }

                if !self.store.warnings().is_empty() {
                    ui.separator();
                    for warning in self.store.warnings() {
                        ui.label(RichText::new(warning).weak().size(12.0));
                    }
                }
            });
        self.settings_open = open;
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(tx) = self.snapshot_request_tx.take() {
            let _ = tx.send(SnapshotCommand::Shutdown);
        }
    }
}

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let native_options = eframe::NativeOptions {
        viewport: ViewportBuilder::default()
            .with_inner_size([520.0, 400.0])
            .with_min_inner_size([360.0, 260.0]),
        ..Default::default()
    };
    let run_res = eframe::run_native(
        "Bookmarks",
        native_options,
        Box::new(
            |_cc| -> std::result::Result<
                Box<dyn eframe::App>,
                Box<dyn std::error::Error + Send + Sync>,
            > { Ok(Box::new(App::default())) },
        ),
    );
    if let Err(e) = run_res {
        return Err(Box::new(e));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strip_metrics_keep_content_centered() {
        let metrics = timeline_strip_metrics(400.0);
        assert!(metrics.margin >= TIMELINE_PADDING_MIN);
        assert!((metrics.content_width() + 2.0 * metrics.margin - 400.0).abs() < 0.5);
    }

    #[test]
    fn strip_metrics_shrink_padding_on_narrow_widths() {
        let metrics = timeline_strip_metrics(170.0);
        assert!(metrics.content_width() >= TIMELINE_MIN_CONTENT_WIDTH - 1.0);
    }

    #[test]
    fn timestamps_format_like_a_player() {
        assert_eq!(format_timestamp(0.0), "0:00");
        assert_eq!(format_timestamp(75.0), "1:15");
        assert_eq!(format_timestamp(3671.0), "1:01:11");
        assert_eq!(format_timestamp_ms(90_000), "1:30");
    }
}
