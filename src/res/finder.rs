//! Resolution of relative resource paths against an ordered list of search
//! directories. First mounted directory wins.

use std::path::{Path, PathBuf};

use super::errors::{Error, Result};

/// An ordered list of absolute search directories for one resource type.
#[derive(Debug, Default, Clone)]
pub struct SearchPaths {
    dirs: Vec<PathBuf>,
}

impl SearchPaths {
    pub fn new() -> Self {
        Default::default()
    }

    /// Appends a search directory. The path must be absolute and point at an
    /// existing directory at registration time.
    pub fn mount<P: Into<PathBuf>>(&mut self, dir: P) -> Result<()> {
        let dir = dir.into();
        if !dir.is_absolute() || !dir.is_dir() {
            return Err(Error::SearchPathInvalid(dir));
        }

        info!("Mounts search directory {:?}.", dir);
        self.dirs.push(dir);
        Ok(())
    }

    /// Returns the first `dir/relative` combination that exists on the
    /// filesystem, in mount order. Never errors.
    pub fn find<P: AsRef<Path>>(&self, relative: P) -> Option<PathBuf> {
        let relative = relative.as_ref();
        for dir in &self.dirs {
            let candidate = dir.join(relative);
            if candidate.exists() {
                return Some(candidate);
            }
        }

        None
    }

    /// Like [`find`](SearchPaths::find), but a miss is an error naming the
    /// requested path.
    pub fn locate<P: AsRef<Path>>(&self, relative: P) -> Result<PathBuf> {
        let relative = relative.as_ref();
        self.find(relative)
            .ok_or_else(|| Error::NotFound(relative.into()))
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dirs.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::fs;

    fn testbed(label: &str) -> PathBuf {
        let dir = ::std::env::temp_dir()
            .join("glint-finder-tests")
            .join(format!("{}-{}", label, rand::random::<u32>()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn precedence() {
        let root = testbed("precedence");
        let first = root.join("first");
        let second = root.join("second");
        fs::create_dir_all(&first).unwrap();
        fs::create_dir_all(&second).unwrap();
        fs::write(first.join("crate.txt"), b"first").unwrap();
        fs::write(second.join("crate.txt"), b"second").unwrap();

        let mut paths = SearchPaths::new();
        paths.mount(&first).unwrap();
        paths.mount(&second).unwrap();

        assert_eq!(paths.find("crate.txt"), Some(first.join("crate.txt")));
        fs::remove_file(first.join("crate.txt")).unwrap();
        assert_eq!(paths.find("crate.txt"), Some(second.join("crate.txt")));
    }

    #[test]
    fn rejects_bad_directories() {
        let mut paths = SearchPaths::new();
        assert!(paths.mount("relative/dir").is_err());
        assert!(paths
            .mount(::std::env::temp_dir().join("glint-does-not-exist"))
            .is_err());

        let root = testbed("not-a-dir");
        let file = root.join("file.txt");
        fs::write(&file, b"").unwrap();
        assert!(paths.mount(&file).is_err());
        assert!(paths.is_empty());
    }

    #[test]
    fn miss_is_none() {
        let root = testbed("miss");
        let mut paths = SearchPaths::new();
        paths.mount(&root).unwrap();
        assert_eq!(paths.find("absent.bin"), None);
        assert!(paths.locate("absent.bin").is_err());
    }
}
