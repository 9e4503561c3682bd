//! Maps tracked items onto configured genres.

use std::path::Path;

use stevedore_config::{GenreProfile, Settings};

/// Resolve the genre of an item from its category label or save location.
///
/// The category label wins when it names a genre key directly; otherwise the
/// parent of the save path is compared against each genre's target
/// directory. Items matching neither are not ours to touch.
pub(crate) fn resolve<'a>(
    settings: &'a Settings,
    category: &str,
    save_path: &Path,
) -> Option<(&'a str, &'a GenreProfile)> {
    if let Some((key, profile)) = settings.genres.get_key_value(category) {
        return Some((key.as_str(), profile));
    }
    let parent = save_path.parent()?;
    settings
        .genres
        .iter()
        .find(|(_, profile)| profile.target_dir == parent)
        .map(|(key, profile)| (key.as_str(), profile))
}
