use bookmarks_gui::bookmark::{Bookmark, BookmarkSet};
use bookmarks_gui::markers::{project, sync_lane, MarkerLane};
use pretty_assertions::assert_eq;

fn set_with_times(times: &[u64]) -> BookmarkSet {
    BookmarkSet::from_entries(
        times
            .iter()
            .enumerate()
            .map(|(idx, &time_ms)| Bookmark {
                time_ms,
                name: format!("Bookmark {}", idx + 1),
            })
            .collect(),
    )
}

#[test]
fn projection_yields_one_marker_per_bookmark() {
    let set = set_with_times(&[0, 30000, 90000]);
    let fractions: Vec<f32> = project(&set, 120000).map(|marker| marker.fraction).collect();
    assert_eq!(fractions, vec![0.0, 0.25, 0.75]);
}

#[test]
fn projection_is_recomputed_fresh_on_each_call() {
    let set = set_with_times(&[60000]);
    let first: Vec<f32> = project(&set, 120000).map(|marker| marker.fraction).collect();
    let second: Vec<f32> = project(&set, 240000).map(|marker| marker.fraction).collect();
    assert_eq!(first, vec![0.5]);
    assert_eq!(second, vec![0.25]);
}

#[test]
fn zero_or_negative_duration_suppresses_projection() {
    let set = set_with_times(&[0, 30000, 90000]);
    assert_eq!(project(&set, 0).count(), 0);
    assert_eq!(project(&set, -1).count(), 0);
}

#[test]
fn empty_set_projects_nothing_for_any_duration() {
    let set = BookmarkSet::default();
    assert_eq!(project(&set, 100000).count(), 0);
}

#[test]
fn markers_keep_the_set_order() {
    let set = set_with_times(&[90000, 0, 30000]);
    let names: Vec<&str> = project(&set, 120000)
        .map(|marker| marker.bookmark.name.as_str())
        .collect();
    assert_eq!(names, vec!["Bookmark 1", "Bookmark 2", "Bookmark 3"]);
}

#[test]
fn lane_sync_replaces_all_previous_markers() {
    let mut lane = MarkerLane::default();

    let empty = sync_lane(&mut lane, &set_with_times(&[0, 30000, 90000]), 120000);
    assert!(!empty);
    assert_eq!(lane.fractions(), &[0.0, 0.25, 0.75]);

    let empty = sync_lane(&mut lane, &set_with_times(&[60000]), 120000);
    assert!(!empty);
    assert_eq!(lane.fractions(), &[0.5]);
}

#[test]
fn empty_set_requests_the_empty_indicator() {
    let mut lane = MarkerLane::default();
    let empty = sync_lane(&mut lane, &BookmarkSet::default(), 100000);
    assert!(empty);
    assert!(lane.is_empty());
}

#[test]
fn unknown_duration_clears_markers_without_empty_indicator() {
    let mut lane = MarkerLane::default();
    sync_lane(&mut lane, &set_with_times(&[30000]), 120000);
    assert_eq!(lane.fractions().len(), 1);

    let empty = sync_lane(&mut lane, &set_with_times(&[30000]), 0);
    assert!(!empty);
    assert!(lane.is_empty());
}
