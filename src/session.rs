use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    sync::mpsc,
    thread,
};

pub type SnapshotResult = std::result::Result<(NowPlaying, Option<Timeline>), String>;

pub enum SnapshotCommand {
    Fetch,
    Shutdown,
}

#[derive(Clone, Default, Debug)]
pub struct NowPlaying {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub state: PlayState,
}

impl PartialEq for NowPlaying {
    fn eq(&self, other: &Self) -> bool {
        self.title == other.title && self.artist == other.artist && self.album == other.album
    }
}

impl NowPlaying {
    /// Stable key grouping persisted bookmarks per media item.
    pub fn media_key(&self) -> String {
        let mut hasher = DefaultHasher::new();
        self.title.hash(&mut hasher);
        self.artist.hash(&mut hasher);
        self.album.hash(&mut hasher);
        format!("{:016x}", hasher.finish())
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "Unknown media"
        } else {
            &self.title
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum PlayState {
    Closed,
    Opened,
    Changing,
    Stopped,
    Playing,
    Paused,
    #[default]
    Unknown,
}

pub fn playstate_to_str(state: PlayState) -> &'static str {
    match state {
        PlayState::Closed => "Closed",
        PlayState::Opened => "Opened",
        PlayState::Changing => "Changing",
        PlayState::Stopped => "Stopped",
        PlayState::Playing => "Playing",
        PlayState::Paused => "Paused",
        PlayState::Unknown => "Unknown",
    }
}

#[derive(Clone, Debug)]
pub struct Timeline {
    pub start_secs: f64,
    pub end_secs: f64,
    pub position_secs: f64,
    pub can_seek: bool,
}

impl Timeline {
    pub fn duration_secs(&self) -> f64 {
        (self.end_secs - self.start_secs).max(0.0)
    }

    /// Duration for the marker projection. Zero when the session does not
    /// report a usable span, which suppresses projection entirely.
    pub fn duration_ms(&self) -> i64 {
        (self.duration_secs() * 1000.0).round() as i64
    }

    /// Playback position relative to the timeline start.
    pub fn position_ms(&self) -> u64 {
        ((self.position_secs - self.start_secs).max(0.0) * 1000.0).round() as u64
    }
}

/// Spawns the snapshot worker and returns its command/result channels. The
/// worker owns the platform media-session handle for its whole lifetime.
pub fn spawn_snapshot_worker() -> (mpsc::Sender<SnapshotCommand>, mpsc::Receiver<SnapshotResult>) {
    let (snapshot_tx, snapshot_rx) = mpsc::channel();
    let (request_tx, request_rx) = mpsc::channel();
    thread::spawn(move || worker_loop(request_rx, snapshot_tx));
    (request_tx, snapshot_rx)
}

#[cfg(target_os = "windows")]
fn worker_loop(request_rx: mpsc::Receiver<SnapshotCommand>, snapshot_tx: mpsc::Sender<SnapshotResult>) {
    use windows::Win32::{
        Foundation::RPC_E_CHANGED_MODE,
        System::Com::{CoInitializeEx, CoUninitialize, COINIT_MULTITHREADED},
    };

    let com_initialized = unsafe {
        let hr = CoInitializeEx(None, COINIT_MULTITHREADED);
        if hr.is_ok() {
            true
        } else if hr == RPC_E_CHANGED_MODE {
            false
        } else {
            let _ = snapshot_tx.send(Err(format!("COM init failed: {hr:?}")));
            return;
        }
    };

    while let Ok(command) = request_rx.recv() {
        match command {
            SnapshotCommand::Fetch => {
                let res = win::fetch_session_snapshot().map_err(|e| format!("{e:?}"));
                let _ = snapshot_tx.send(res);
            }
            SnapshotCommand::Shutdown => break,
        }
    }

    if com_initialized {
        unsafe {
            CoUninitialize();
        }
    }
}

#[cfg(not(target_os = "windows"))]
fn worker_loop(request_rx: mpsc::Receiver<SnapshotCommand>, snapshot_tx: mpsc::Sender<SnapshotResult>) {
    while let Ok(command) = request_rx.recv() {
        match command {
            SnapshotCommand::Fetch => {
                let _ = snapshot_tx.send(Err(
                    "Media session integration is only available on Windows".to_string(),
                ));
            }
            SnapshotCommand::Shutdown => break,
        }
    }
}

/// Asks the current media session to jump to `target_secs`. Returns whether
/// the session accepted the command.
#[cfg(target_os = "windows")]
pub fn seek(target_secs: f64) -> std::result::Result<bool, String> {
    win::seek(target_secs).map_err(|e| format!("{e:?}"))
}

#[cfg(not(target_os = "windows"))]
pub fn seek(_target_secs: f64) -> std::result::Result<bool, String> {
    Err("Media session integration is only available on Windows".to_string())
}

#[cfg(target_os = "windows")]
mod win {
    use super::{NowPlaying, PlayState, Timeline};
    use futures::executor::block_on;
    use std::future::IntoFuture;
    use windows::{
        core::Result as WinResult,
        Foundation::TimeSpan,
        Media::Control::{
            GlobalSystemMediaTransportControlsSession,
            GlobalSystemMediaTransportControlsSessionManager,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus,
        },
    };

    const TICKS_PER_SECOND: f64 = 10_000_000.0;

    fn time_span_to_secs(span: TimeSpan) -> f64 {
        span.Duration as f64 / TICKS_PER_SECOND
    }

    fn secs_to_ticks(seconds: f64) -> i64 {
        if !seconds.is_finite() {
            return if seconds.is_sign_positive() {
                i64::MAX
            } else {
                i64::MIN
            };
        }

        let ticks_f = seconds * TICKS_PER_SECOND;
        if ticks_f >= i64::MAX as f64 {
            return i64::MAX;
        }
        if ticks_f <= i64::MIN as f64 {
            return i64::MIN;
        }

        ticks_f.round() as i64
    }

    fn block_on_operation<O, T>(operation: O) -> WinResult<T>
    where
        O: IntoFuture<Output = WinResult<T>>,
    {
        block_on(operation.into_future())
    }

    fn current_session() -> WinResult<GlobalSystemMediaTransportControlsSession> {
        let manager =
            block_on_operation(GlobalSystemMediaTransportControlsSessionManager::RequestAsync()?)?;
        manager.GetCurrentSession()
    }

    pub fn fetch_session_snapshot() -> WinResult<(NowPlaying, Option<Timeline>)> {
        let session = current_session()?;

        let props = block_on_operation(session.TryGetMediaPropertiesAsync()?)?;
        let playback_info = session.GetPlaybackInfo()?;
        let status = playback_info.PlaybackStatus()?;

        let state = match status {
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Closed => PlayState::Closed,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Opened => PlayState::Opened,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Changing => PlayState::Changing,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Stopped => PlayState::Stopped,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Playing => PlayState::Playing,
            GlobalSystemMediaTransportControlsSessionPlaybackStatus::Paused => PlayState::Paused,
            _ => PlayState::Unknown,
        };

        let now = NowPlaying {
            title: props.Title()?.to_string_lossy(),
            artist: props.Artist()?.to_string_lossy(),
            album: props.AlbumTitle()?.to_string_lossy(),
            state,
        };

        let timeline_props = session.GetTimelineProperties()?;
        let mut start_secs = time_span_to_secs(timeline_props.StartTime()?);
        let mut end_secs = time_span_to_secs(timeline_props.EndTime()?);
        let mut position_secs = time_span_to_secs(timeline_props.Position()?);

        if end_secs < start_secs {
            std::mem::swap(&mut start_secs, &mut end_secs);
        }
        if !position_secs.is_finite() {
            position_secs = start_secs;
        }
        position_secs = position_secs.clamp(start_secs, end_secs.max(start_secs));

        let can_seek = (end_secs - start_secs).abs() > f64::EPSILON;

        let timeline = Timeline {
            start_secs,
            end_secs,
            position_secs,
            can_seek,
        };

        let timeline = if timeline.duration_secs() <= f64::EPSILON && !can_seek {
            None
        } else {
            Some(timeline)
        };

        Ok((now, timeline))
    }

    pub fn seek(target_secs: f64) -> WinResult<bool> {
        let session = current_session()?;
        block_on_operation(session.TryChangePlaybackPositionAsync(secs_to_ticks(target_secs))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn timeline(start: f64, end: f64, position: f64) -> Timeline {
        Timeline {
            start_secs: start,
            end_secs: end,
            position_secs: position,
            can_seek: true,
        }
    }

    #[test]
    fn media_key_is_stable_per_track() {
        let a = NowPlaying {
            title: "Track".into(),
            artist: "Artist".into(),
            album: "Album".into(),
            state: PlayState::Playing,
        };
        let mut b = a.clone();
        b.state = PlayState::Paused;
        assert_eq!(a.media_key(), b.media_key());

        b.title = "Other Track".into();
        assert_ne!(a.media_key(), b.media_key());
    }

    #[test]
    fn duration_ms_rounds_the_reported_span() {
        assert_eq!(timeline(0.0, 120.0, 0.0).duration_ms(), 120000);
        assert_eq!(timeline(10.0, 10.0, 10.0).duration_ms(), 0);
        assert_eq!(timeline(0.0, 0.75, 0.0).duration_ms(), 750);
    }

    #[test]
    fn position_ms_is_relative_to_start() {
        assert_eq!(timeline(30.0, 150.0, 45.0).position_ms(), 15000);
        assert_eq!(timeline(30.0, 150.0, 10.0).position_ms(), 0);
    }
}
