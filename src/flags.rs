use anyhow::Result;
use strum::IntoEnumIterator;
use strum_macros::EnumIter;

use crate::settings::Settings;

const FLAG_KEY_PREFIX: &str = "ff_";

/// An experimental capability the user can toggle independently. The set is
/// fixed at compile time; persisted state is a boolean per derived key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter)]
pub enum FeatureFlag {
    MarkerPreviews,
    PreviewScrubbing,
    SharedBookmarks,
}

impl FeatureFlag {
    fn slug(self) -> &'static str {
        match self {
            FeatureFlag::MarkerPreviews => "marker_previews",
            FeatureFlag::PreviewScrubbing => "preview_scrubbing",
            FeatureFlag::SharedBookmarks => "shared_bookmarks",
        }
    }

    pub fn key(self) -> String {
        format!("{FLAG_KEY_PREFIX}{}", self.slug())
    }

    pub fn title(self) -> &'static str {
        match self {
            FeatureFlag::MarkerPreviews => "Marker previews",
            FeatureFlag::PreviewScrubbing => "Preview scrubbing",
            FeatureFlag::SharedBookmarks => "Shared bookmarks",
        }
    }

    /// The flag this flag requires, if any. Toggling never cascades; callers
    /// check the prerequisite before acting on this flag's effective state.
    pub fn depends_on(self) -> Option<FeatureFlag> {
        match self {
            FeatureFlag::PreviewScrubbing => Some(FeatureFlag::MarkerPreviews),
            FeatureFlag::MarkerPreviews | FeatureFlag::SharedBookmarks => None,
        }
    }
}

pub fn is_enabled(settings: &Settings, flag: FeatureFlag) -> bool {
    settings.get_bool(&flag.key(), false)
}

pub fn set_enabled(settings: &mut Settings, flag: FeatureFlag, enabled: bool) -> Result<()> {
    settings.set_bool(&flag.key(), enabled)
}

pub fn by_key(key: &str) -> Option<FeatureFlag> {
    FeatureFlag::iter().find(|flag| flag.key() == key)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_are_namespaced_and_lowercased() {
        assert_eq!(FeatureFlag::MarkerPreviews.key(), "ff_marker_previews");
        assert_eq!(FeatureFlag::PreviewScrubbing.key(), "ff_preview_scrubbing");
        assert_eq!(FeatureFlag::SharedBookmarks.key(), "ff_shared_bookmarks");
    }

    #[test]
    fn by_key_resolves_own_keys_only() {
        for flag in FeatureFlag::iter() {
            assert_eq!(by_key(&flag.key()), Some(flag));
        }
        assert_eq!(by_key("ff_nonexistent"), None);
        assert_eq!(by_key("marker_previews"), None);
    }

    #[test]
    fn dependency_chains_terminate() {
        let flag_count = FeatureFlag::iter().count();
        for flag in FeatureFlag::iter() {
            let mut cursor = Some(flag);
            let mut hops = 0;
            while let Some(current) = cursor {
                cursor = current.depends_on();
                hops += 1;
                assert!(hops <= flag_count, "dependency cycle through {current:?}");
            }
        }
    }
}
