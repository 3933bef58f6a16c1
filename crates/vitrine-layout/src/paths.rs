//! Storage path resolution for layouts and views.

use std::path::PathBuf;

use vitrine_common::LayoutError;

/// Platform default directory for layout and view files.
///
/// On macOS: `~/Library/Application Support/vitrine/layouts`
/// On Linux: `~/.config/vitrine/layouts`
pub fn default_layouts_dir() -> Result<PathBuf, LayoutError> {
    let config_dir = dirs::config_dir().ok_or_else(|| {
        LayoutError::Malformed("could not determine config directory".into())
    })?;
    Ok(config_dir.join("vitrine").join("layouts"))
}

/// Ensure the layouts directory exists.
pub fn ensure_layouts_dir(dir: &std::path::Path) -> Result<(), LayoutError> {
    std::fs::create_dir_all(dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dir_ends_with_expected_components() {
        let dir = default_layouts_dir().unwrap();
        assert!(dir.ends_with("vitrine/layouts"));
    }

    #[test]
    fn ensure_creates_nested_dirs() {
        let tmp = tempfile::tempdir().unwrap();
        let target = tmp.path().join("a").join("b");
        ensure_layouts_dir(&target).unwrap();
        assert!(target.is_dir());
    }
}
