use bookmarks_gui::bookmark::BookmarkStore;
use pretty_assertions::assert_eq;

fn scratch_store() -> (tempfile::TempDir, BookmarkStore) {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = BookmarkStore::load(dir.path().join("bookmarks.toml")).expect("load store");
    (dir, store)
}

#[test]
fn added_bookmarks_come_back_ordered_by_time() {
    let (_dir, mut store) = scratch_store();

    store.add("abc", "Some Film", 90000).unwrap();
    store.add("abc", "Some Film", 30000).unwrap();
    store.add("abc", "Some Film", 60000).unwrap();

    let set = store.set_for("abc");
    let times: Vec<u64> = set.entries().iter().map(|b| b.time_ms).collect();
    assert_eq!(times, vec![30000, 60000, 90000]);
}

#[test]
fn mutations_survive_a_reload() {
    let (dir, mut store) = scratch_store();
    let path = dir.path().join("bookmarks.toml");

    store.add("abc", "Some Film", 30000).unwrap();
    store.add("abc", "Some Film", 90000).unwrap();
    store.rename("abc", 0, "Opening scene").unwrap();

    let reloaded = BookmarkStore::load(&path).unwrap();
    let set = reloaded.set_for("abc");
    assert_eq!(set.len(), 2);
    assert_eq!(set.entries()[0].name, "Opening scene");
    assert_eq!(set.entries()[0].time_ms, 30000);
}

#[test]
fn deleting_the_last_bookmark_drops_the_media_entry() {
    let (dir, mut store) = scratch_store();
    let path = dir.path().join("bookmarks.toml");

    store.add("abc", "Some Film", 30000).unwrap();
    store.delete("abc", 0).unwrap();

    assert!(store.set_for("abc").is_empty());
    let data = std::fs::read_to_string(&path).unwrap();
    assert!(!data.contains("abc"));
}

#[test]
fn delete_out_of_range_is_an_error() {
    let (_dir, mut store) = scratch_store();
    store.add("abc", "Some Film", 30000).unwrap();
    assert!(store.delete("abc", 5).is_err());
    assert!(store.delete("missing", 0).is_err());
    assert_eq!(store.set_for("abc").len(), 1);
}

#[test]
fn rename_unknown_media_is_an_error() {
    let (_dir, mut store) = scratch_store();
    assert!(store.rename("missing", 0, "Name").is_err());
}

#[test]
fn media_items_are_kept_separate() {
    let (_dir, mut store) = scratch_store();
    store.add("abc", "Some Film", 30000).unwrap();
    store.add("def", "Other Film", 45000).unwrap();

    assert_eq!(store.set_for("abc").len(), 1);
    assert_eq!(store.set_for("def").len(), 1);
    assert_eq!(store.set_for("abc").entries()[0].time_ms, 30000);
    assert_eq!(store.set_for("def").entries()[0].time_ms, 45000);
}
