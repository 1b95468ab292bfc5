use bookmarks_gui::flags::{self, FeatureFlag};
use bookmarks_gui::settings::Settings;
use strum::IntoEnumIterator;

fn scratch_settings() -> (tempfile::TempDir, Settings) {
    let dir = tempfile::tempdir().expect("temp dir");
    let settings = Settings::open(dir.path().join("settings.toml")).expect("open settings");
    (dir, settings)
}

#[test]
fn flags_default_to_disabled() {
    let (_dir, settings) = scratch_settings();
    for flag in FeatureFlag::iter() {
        assert!(!flags::is_enabled(&settings, flag));
    }
}

#[test]
fn enable_disable_round_trip() {
    let (dir, mut settings) = scratch_settings();

    flags::set_enabled(&mut settings, FeatureFlag::MarkerPreviews, true).unwrap();
    assert!(flags::is_enabled(&settings, FeatureFlag::MarkerPreviews));

    // Persisted, not just in memory.
    let reopened = Settings::open(dir.path().join("settings.toml")).unwrap();
    assert!(flags::is_enabled(&reopened, FeatureFlag::MarkerPreviews));

    flags::set_enabled(&mut settings, FeatureFlag::MarkerPreviews, false).unwrap();
    assert!(!flags::is_enabled(&settings, FeatureFlag::MarkerPreviews));
}

#[test]
fn toggling_a_flag_does_not_cascade_to_dependents() {
    let (_dir, mut settings) = scratch_settings();

    flags::set_enabled(&mut settings, FeatureFlag::PreviewScrubbing, true).unwrap();
    assert!(flags::is_enabled(&settings, FeatureFlag::PreviewScrubbing));
    assert!(!flags::is_enabled(&settings, FeatureFlag::MarkerPreviews));

    flags::set_enabled(&mut settings, FeatureFlag::MarkerPreviews, true).unwrap();
    flags::set_enabled(&mut settings, FeatureFlag::MarkerPreviews, false).unwrap();
    // The dependent flag keeps its own persisted state.
    assert!(flags::is_enabled(&settings, FeatureFlag::PreviewScrubbing));
}

#[test]
fn by_key_round_trips_every_flag() {
    for flag in FeatureFlag::iter() {
        assert_eq!(flags::by_key(&flag.key()), Some(flag));
    }
}

#[test]
fn by_key_rejects_unknown_keys() {
    assert_eq!(flags::by_key("ff_unknown_feature"), None);
    assert_eq!(flags::by_key(""), None);
    assert_eq!(flags::by_key("FF_MARKER_PREVIEWS"), None);
}

#[test]
fn flag_state_is_independent_per_key() {
    let (_dir, mut settings) = scratch_settings();
    flags::set_enabled(&mut settings, FeatureFlag::SharedBookmarks, true).unwrap();
    assert!(flags::is_enabled(&settings, FeatureFlag::SharedBookmarks));
    assert!(!flags::is_enabled(&settings, FeatureFlag::MarkerPreviews));
    assert!(!flags::is_enabled(&settings, FeatureFlag::PreviewScrubbing));
}
