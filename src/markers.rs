use crate::bookmark::{Bookmark, BookmarkSet};

/// One bookmark's position on the timeline, normalized against the media
/// duration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkerPosition<'a> {
    pub bookmark: &'a Bookmark,
    pub fraction: f32,
}

/// Projects every bookmark onto the timeline as `time / duration`, in set
/// order. A duration below one millisecond means the duration is unknown and
/// yields nothing at all. Fractions are not clamped here; a bookmark past the
/// end of the media projects above 1.0 and the paint code clamps it.
pub fn project(set: &BookmarkSet, duration_ms: i64) -> impl Iterator<Item = MarkerPosition<'_>> {
    let entries = if duration_ms < 1 { &[][..] } else { set.entries() };
    entries.iter().map(move |bookmark| MarkerPosition {
        bookmark,
        fraction: bookmark.time_ms as f32 / duration_ms as f32,
    })
}

/// The rendered-marker model the timeline paint code draws from. Mirrors the
/// marker surface contract: clear everything, then add one marker per
/// projected fraction.
#[derive(Debug, Default)]
pub struct MarkerLane {
    fractions: Vec<f32>,
}

impl MarkerLane {
    pub fn clear(&mut self) {
        self.fractions.clear();
    }

    pub fn add(&mut self, fraction: f32) {
        self.fractions.push(fraction);
    }

    pub fn fractions(&self) -> &[f32] {
        &self.fractions
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }
}

/// Replaces the lane's markers with a fresh projection of `set` against
/// `duration_ms`. Returns true when the set itself is empty, which is the
/// caller's cue to show the empty indicator; an unknown duration leaves the
/// lane bare but does not count as empty.
pub fn sync_lane(lane: &mut MarkerLane, set: &BookmarkSet, duration_ms: i64) -> bool {
    lane.clear();
    for marker in project(set, duration_ms) {
        log::debug!(
            "Placing marker '{}' at fraction {}",
            marker.bookmark.name,
            marker.fraction
        );
        lane.add(marker.fraction);
    }
    set.is_empty()
}
