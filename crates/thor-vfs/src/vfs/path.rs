//! Component paths.
//!
//! A [`Path`] is a list of names plus an absolute marker. The root is the
//! absolute path with no names. The default, non-absolute, empty path is
//! the "unbound" path and is rejected by the dispatch layer.

use std::fmt;
use std::ops::Index;

/// Immutable, component-wise path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Path {
    absolute: bool,
    names: Vec<String>,
}

impl Path {
    /// The root path `/`.
    pub fn root() -> Self {
        Self {
            absolute: true,
            names: Vec::new(),
        }
    }

    /// Parse a path string. Absolute when it starts with `/`.
    ///
    /// Empty components and `.` are dropped, `..` removes the previous
    /// component and never climbs above the root.
    pub fn new(path: &str) -> Self {
        let mut result = Self {
            absolute: path.starts_with('/'),
            names: Vec::new(),
        };
        result.push_all(path);
        result
    }

    /// Resolve `path` against `base`: absolute strings stand alone,
    /// relative ones are appended to `base`.
    pub fn join(base: &Path, path: &str) -> Self {
        if path.starts_with('/') {
            return Self::new(path);
        }
        let mut result = base.clone();
        result.push_all(path);
        result
    }

    /// Absolute path made of the given names, taken verbatim.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            absolute: true,
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    fn push_all(&mut self, path: &str) {
        for name in path.split('/') {
            match name {
                "" | "." => {}
                ".." => {
                    self.names.pop();
                }
                name => self.names.push(name.to_string()),
            }
        }
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// True for the unbound path: no components and not absolute.
    pub fn is_empty(&self) -> bool {
        !self.absolute && self.names.is_empty()
    }

    /// True for `/`.
    pub fn is_root(&self) -> bool {
        self.absolute && self.names.is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        self.absolute
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.names.iter()
    }

    /// Last component, if any.
    pub fn base_name(&self) -> Option<&str> {
        self.names.last().map(String::as_str)
    }

    /// Path without its last component. The parent of the root is the root.
    pub fn parent(&self) -> Path {
        let mut names = self.names.clone();
        names.pop();
        Self {
            absolute: self.absolute,
            names,
        }
    }

    /// The path with its first `start` components removed.
    ///
    /// The absolute marker is kept, so dropping every component of an
    /// absolute path yields the root.
    pub fn sub_path(&self, start: usize) -> Path {
        let start = start.min(self.names.len());
        Self {
            absolute: self.absolute,
            names: self.names[start..].to_vec(),
        }
    }

    /// True when `prefix`'s names are a leading run of this path's names.
    pub fn starts_with(&self, prefix: &[String]) -> bool {
        prefix.len() <= self.names.len() && self.names.iter().zip(prefix).all(|(a, b)| a == b)
    }
}

impl Index<usize> for Path {
    type Output = str;

    fn index(&self, index: usize) -> &str {
        &self.names[index]
    }
}

impl<'a> IntoIterator for &'a Path {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.names.iter()
    }
}

impl From<&str> for Path {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return f.write_str("/");
        }
        for (i, name) in self.names.iter().enumerate() {
            if i > 0 || self.absolute {
                f.write_str("/")?;
            }
            f.write_str(name)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_absolute() {
        let path = Path::new("/sys/foo/");
        assert!(path.is_absolute());
        assert_eq!(path.len(), 2);
        assert_eq!(&path[0], "sys");
        assert_eq!(path.get(1), Some("foo"));
        assert_eq!(path.get(2), None);
        assert_eq!(path.to_string(), "/sys/foo");
    }

    #[test]
    fn test_root_and_empty() {
        let root = Path::new("/");
        assert!(root.is_root());
        assert!(!root.is_empty());
        assert_eq!(root, Path::root());
        assert_eq!(root.to_string(), "/");

        let empty = Path::default();
        assert!(empty.is_empty());
        assert!(!empty.is_root());
        assert_eq!(Path::new(""), empty);
    }

    #[test]
    fn test_join_relative() {
        let cwd = Path::new("/home/user");
        assert_eq!(Path::join(&cwd, "docs/a.txt"), Path::new("/home/user/docs/a.txt"));
        assert_eq!(Path::join(&cwd, "/etc/passwd"), Path::new("/etc/passwd"));
        assert_eq!(Path::join(&cwd, "../other"), Path::new("/home/other"));
        assert_eq!(Path::join(&Path::root(), "./x"), Path::new("/x"));
    }

    #[test]
    fn test_dot_dot_stops_at_root() {
        assert!(Path::new("/../..").is_root());
        assert_eq!(Path::new("/a/../../b"), Path::new("/b"));
    }

    #[test]
    fn test_sub_path() {
        let path = Path::new("/dev/null");
        assert_eq!(path.sub_path(1), Path::new("/null"));
        assert!(path.sub_path(2).is_root());
        // Past the end clamps to the root
        assert!(path.sub_path(5).is_root());
        assert_eq!(path.sub_path(0), path);
    }

    #[test]
    fn test_starts_with() {
        let path = Path::new("/sys/foo");
        assert!(path.starts_with(&[]));
        assert!(path.starts_with(&["sys".to_string()]));
        assert!(!path.starts_with(&["dev".to_string()]));
        assert!(!Path::new("/sys").starts_with(&["sys".to_string(), "foo".to_string()]));
    }

    #[test]
    fn test_parent_and_base_name() {
        let path = Path::new("/a/b/c.txt");
        assert_eq!(path.base_name(), Some("c.txt"));
        assert_eq!(path.parent(), Path::new("/a/b"));
        assert!(Path::root().parent().is_root());
        assert_eq!(Path::root().base_name(), None);
    }
}
