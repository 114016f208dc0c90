//! Content digest of a history directory, used to skip unchanged imports

use crate::error::{PlaysiftError, Result};
use sha2::{Digest, Sha256};
use std::path::Path;
use walkdir::WalkDir;

/// SHA-256 over the names and contents of everything under `dir`
///
/// Entries are visited depth-first, siblings ordered by lower-cased path.
/// Each entry contributes its file name; files also contribute their bytes.
/// Renaming, adding, removing, or editing any file changes the digest.
pub fn directory_digest(dir: &Path) -> Result<String> {
    if !dir.is_dir() {
        return Err(PlaysiftError::History(format!("{} is not a directory", dir.display())).into());
    }

    let mut hasher = Sha256::new();
    let walker = WalkDir::new(dir)
        .min_depth(1)
        .sort_by(|a, b| {
            a.path()
                .to_string_lossy()
                .to_lowercase()
                .cmp(&b.path().to_string_lossy().to_lowercase())
        });

    for entry in walker {
        let entry = entry.map_err(|e| PlaysiftError::History(e.to_string()))?;
        hasher.update(entry.file_name().to_string_lossy().as_bytes());
        if entry.file_type().is_file() {
            let mut file = std::fs::File::open(entry.path())?;
            std::io::copy(&mut file, &mut hasher)?;
        }
    }

    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_file, temp_dir};

    #[test]
    fn test_digest_is_stable() {
        let dir = temp_dir();
        create_test_file(&dir, "a.json", "[]");
        create_test_file(&dir, "sub/b.json", "[1]");

        let first = directory_digest(dir.path()).unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(directory_digest(dir.path()).unwrap(), first);
    }

    #[test]
    fn test_digest_changes_on_content_edit() {
        let dir = temp_dir();
        create_test_file(&dir, "a.json", "[]");
        let before = directory_digest(dir.path()).unwrap();

        create_test_file(&dir, "a.json", "[ ]");
        assert_ne!(directory_digest(dir.path()).unwrap(), before);
    }

    #[test]
    fn test_digest_changes_on_rename() {
        let dir = temp_dir();
        create_test_file(&dir, "a.json", "[]");
        let before = directory_digest(dir.path()).unwrap();

        std::fs::rename(dir.path().join("a.json"), dir.path().join("b.json")).unwrap();
        assert_ne!(directory_digest(dir.path()).unwrap(), before);
    }

    #[test]
    fn test_digest_covers_nested_files() {
        let dir = temp_dir();
        create_test_file(&dir, "sub/a.json", "[]");
        let before = directory_digest(dir.path()).unwrap();

        create_test_file(&dir, "sub/a.json", "[2]");
        assert_ne!(directory_digest(dir.path()).unwrap(), before);
    }

    #[test]
    fn test_digest_of_identical_trees_match() {
        let one = temp_dir();
        let two = temp_dir();
        for dir in [&one, &two] {
            create_test_file(dir, "Z.json", "z");
            create_test_file(dir, "a.json", "a");
        }
        assert_eq!(
            directory_digest(one.path()).unwrap(),
            directory_digest(two.path()).unwrap()
        );
    }

    #[test]
    fn test_digest_rejects_missing_dir() {
        let dir = temp_dir();
        assert!(directory_digest(&dir.path().join("missing")).is_err());
    }
}
