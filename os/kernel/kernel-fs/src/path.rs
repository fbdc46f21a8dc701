//! Path splitting helpers. Resolution against the inode table lives in the
//! filesystem itself; these functions only look at the text.

use crate::FsError;
use kernel_info::storage::FS_MAX_PATH_LENGTH;

/// One step of a path walk.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) enum Component<'a> {
    /// `.`
    Current,
    /// `..`
    Parent,
    Named(&'a str),
}

/// Whether `path` starts at the root rather than the current directory.
pub(crate) fn is_absolute(path: &str) -> bool {
    path.starts_with('/')
}

/// Iterate the components of `path`, skipping empty ones from repeated or
/// trailing slashes.
pub(crate) fn components(path: &str) -> impl Iterator<Item = Component<'_>> {
    path.split('/').filter(|c| !c.is_empty()).map(|c| match c {
        "." => Component::Current,
        ".." => Component::Parent,
        name => Component::Named(name),
    })
}

/// Reject paths over the length limit.
pub(crate) const fn check_length(path: &str) -> Result<(), FsError> {
    if path.len() > FS_MAX_PATH_LENGTH {
        Err(FsError::PathTooLong {
            max: FS_MAX_PATH_LENGTH,
        })
    } else {
        Ok(())
    }
}

/// Split `path` into the path of its parent directory and the leaf name.
///
/// Trailing slashes are ignored. The parent of a top-level absolute entry is
/// `/`; a bare name has an empty parent, meaning the current directory.
///
/// ```text
/// "/usr/bin/"  -> ("/usr", "bin")
/// "/tmp"       -> ("/", "tmp")
/// "notes.txt"  -> ("", "notes.txt")
/// ```
pub(crate) fn split_parent(path: &str) -> (&str, &str) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) => ("/", &trimmed[1..]),
        Some(i) => (&trimmed[..i], &trimmed[i + 1..]),
        None if is_absolute(path) => ("/", ""),
        None => ("", trimmed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_parent_and_leaf() {
        assert_eq!(split_parent("/usr/bin"), ("/usr", "bin"));
        assert_eq!(split_parent("/usr/bin/"), ("/usr", "bin"));
        assert_eq!(split_parent("/tmp"), ("/", "tmp"));
        assert_eq!(split_parent("notes.txt"), ("", "notes.txt"));
        assert_eq!(split_parent("docs/a.txt"), ("docs", "a.txt"));
        assert_eq!(split_parent("/"), ("/", ""));
        assert_eq!(split_parent("//"), ("/", ""));
    }

    #[test]
    fn components_skip_empty_segments() {
        let parts: Vec<_> = components("/a//./b/../c/").collect();
        assert_eq!(
            parts,
            [
                Component::Named("a"),
                Component::Current,
                Component::Named("b"),
                Component::Parent,
                Component::Named("c"),
            ]
        );
    }

    #[test]
    fn length_limit_is_inclusive() {
        let max = "a".repeat(FS_MAX_PATH_LENGTH);
        assert_eq!(check_length(&max), Ok(()));
        assert!(matches!(
            check_length(&format!("{max}a")),
            Err(FsError::PathTooLong { .. })
        ));
    }
}
