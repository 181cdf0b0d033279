//! Resolution of logical icon identifiers to vector sources.
//!
//! An identifier is a plain name (`delete`), a namespaced name
//! (`spinners:dots`), or an absolute path to an SVG file. Resolvers turn it
//! into an [`ImageSource`] or fail with [`Error::ImageNotFound`]. Failures
//! are never memoized, so adding a directory later lets the same identifier
//! resolve.

use std::cell::RefCell;
use std::collections::HashMap;
use std::env;
use std::path::{Component, Path, PathBuf};
use std::rc::Rc;

use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::error::{Error, Result};

// ============================================================================
// ImageSource
// ============================================================================

/// A resolved vector image: a stable identity plus its SVG markup.
///
/// The identity (for files, the absolute path) is what pixmap cache keys
/// use, so two identifiers that resolve to the same file share cache entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    identity: Rc<str>,
    svg: Rc<str>,
}

impl ImageSource {
    pub fn new(identity: impl Into<Rc<str>>, svg: impl Into<Rc<str>>) -> Self {
        Self {
            identity: identity.into(),
            svg: svg.into(),
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn svg(&self) -> &str {
        &self.svg
    }
}

/// Turns a logical icon identifier into a concrete source.
pub trait ImageResolver {
    fn resolve(&self, name: &str) -> Result<ImageSource>;
}

// ============================================================================
// SearchPath
// ============================================================================

/// Resolves identifiers against an ordered list of icon directories.
///
/// `spinners:dots` resolves to `<dir>/spinners/dots.svg` in the first
/// directory that contains it.
#[derive(Debug, Default)]
pub struct SearchPath {
    dirs: RefCell<Vec<PathBuf>>,
}

impl SearchPath {
    /// Environment variable holding the default search directories.
    pub const ENV_VAR: &'static str = "ANIMICON_PATH";

    pub fn new(dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        Self {
            dirs: RefCell::new(dirs.into_iter().collect()),
        }
    }

    /// Reads directories from [`ENV_VAR`](Self::ENV_VAR), falling back to
    /// the current working directory.
    pub fn from_env() -> Self {
        match env::var_os(Self::ENV_VAR) {
            Some(value) => Self::new(env::split_paths(&value)),
            None => Self::new(env::current_dir().ok()),
        }
    }

    /// Appends a directory, searched after the existing ones.
    pub fn add_directory(&self, dir: impl Into<PathBuf>) {
        self.dirs.borrow_mut().push(dir.into());
    }

    pub fn directories(&self) -> Vec<PathBuf> {
        self.dirs.borrow().clone()
    }

    /// Finds the file an identifier refers to.
    pub fn locate(&self, name: &str) -> Result<PathBuf> {
        let not_found = || Error::ImageNotFound {
            name: name.to_string(),
        };

        let path = Path::new(name);
        if path.is_absolute() {
            return if path.is_file() {
                Ok(path.to_path_buf())
            } else {
                Err(not_found())
            };
        }

        // Segments must stay inside the search directories
        let mut relative = PathBuf::new();
        for segment in name.split(':') {
            let segment = Path::new(segment);
            let mut components = segment.components().peekable();
            if components.peek().is_none()
                || !components.all(|c| matches!(c, Component::Normal(_)))
            {
                return Err(not_found());
            }
            relative.push(segment);
        }
        if relative.extension().is_none_or(|ext| ext != "svg") {
            let mut file = relative.into_os_string();
            file.push(".svg");
            relative = PathBuf::from(file);
        }

        self.dirs
            .borrow()
            .iter()
            .map(|dir| dir.join(&relative))
            .find(|candidate| candidate.is_file())
            .ok_or_else(not_found)
    }

    /// Lists every icon below the search directories as `collection:name`.
    pub fn list_icons(&self) -> Vec<String> {
        let mut names = Vec::new();

        for dir in self.dirs.borrow().iter() {
            if !dir.is_dir() {
                warn!(dir = %dir.display(), "icon search directory does not exist");
                continue;
            }

            for entry in WalkDir::new(dir) {
                let entry = match entry {
                    Ok(entry) => entry,
                    Err(err) => {
                        warn!(
                            dir = %dir.display(),
                            error = %err,
                            "failed to read icon directory entry"
                        );
                        continue;
                    }
                };
                let path = entry.path();
                if !entry.file_type().is_file() || path.extension().is_none_or(|ext| ext != "svg") {
                    continue;
                }
                let Ok(relative) = path.strip_prefix(dir) else {
                    continue;
                };
                let name = relative
                    .with_extension("")
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join(":");
                names.push(name);
            }
        }

        names.sort();
        names.dedup();
        names
    }
}

impl ImageResolver for SearchPath {
    fn resolve(&self, name: &str) -> Result<ImageSource> {
        let path = self.locate(name)?;
        let svg = std::fs::read_to_string(&path).map_err(|source| Error::Io {
            path: path.clone(),
            source,
        })?;
        debug!(name, path = %path.display(), "resolved icon");
        Ok(ImageSource::new(path.display().to_string(), svg))
    }
}

// ============================================================================
// MemoryResolver
// ============================================================================

/// Resolves identifiers from SVG markup registered in memory.
///
/// Useful for icons embedded with `include_str!` and for tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryResolver {
    icons: HashMap<String, Rc<str>>,
}

impl MemoryResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `svg` under `name`, replacing any previous entry.
    pub fn insert(&mut self, name: impl Into<String>, svg: impl Into<Rc<str>>) {
        self.icons.insert(name.into(), svg.into());
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, name: impl Into<String>, svg: impl Into<Rc<str>>) -> Self {
        self.insert(name, svg);
        self
    }

    pub fn len(&self) -> usize {
        self.icons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

impl ImageResolver for MemoryResolver {
    fn resolve(&self, name: &str) -> Result<ImageSource> {
        self.icons
            .get(name)
            .map(|svg| ImageSource::new(format!("memory:{name}"), Rc::clone(svg)))
            .ok_or_else(|| Error::ImageNotFound {
                name: name.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"/>"#;

    fn icon_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("delete.svg"), SVG).unwrap();
        fs::create_dir(dir.path().join("spinners")).unwrap();
        fs::write(dir.path().join("spinners").join("dots.svg"), SVG).unwrap();
        fs::write(dir.path().join("notes.txt"), "not an icon").unwrap();
        dir
    }

    #[test]
    fn resolves_plain_and_namespaced_names() {
        let dir = icon_dir();
        let search = SearchPath::new([dir.path().to_path_buf()]);

        let plain = search.resolve("delete").unwrap();
        assert_eq!(plain.svg(), SVG);
        assert!(plain.identity().ends_with("delete.svg"));

        let nested = search.locate("spinners:dots").unwrap();
        assert_eq!(nested, dir.path().join("spinners").join("dots.svg"));

        assert!(search.locate("delete.svg").is_ok());
    }

    #[test]
    fn unknown_names_fail() {
        let dir = icon_dir();
        let search = SearchPath::new([dir.path().to_path_buf()]);
        assert!(matches!(
            search.resolve("invalid:icon:path"),
            Err(Error::ImageNotFound { name }) if name == "invalid:icon:path"
        ));
    }

    #[test]
    fn segments_cannot_leave_search_directories() {
        let root = icon_dir();
        let inner = root.path().join("spinners");
        let search = SearchPath::new([inner.clone()]);
        assert!(search.locate("dots").is_ok());

        for name in ["..:delete", "spinners:..:..:delete", "x:/etc/passwd", "::dots", "dots:"] {
            assert!(
                matches!(search.locate(name), Err(Error::ImageNotFound { .. })),
                "{name} should not resolve"
            );
        }

        let absolute = root.path().join("delete");
        let smuggled = format!("x:{}", absolute.display());
        assert!(search.locate(&smuggled).is_err());
    }

    #[test]
    fn absolute_paths_must_exist() {
        let dir = icon_dir();
        let search = SearchPath::new(Vec::new());

        let file = dir.path().join("delete.svg");
        assert_eq!(search.locate(file.to_str().unwrap()).unwrap(), file);

        let missing = dir.path().join("missing.svg");
        assert!(search.locate(missing.to_str().unwrap()).is_err());
    }

    #[test]
    fn failure_is_not_cached() {
        let dir = icon_dir();
        let search = SearchPath::new(Vec::new());
        assert!(search.resolve("delete").is_err());

        search.add_directory(dir.path());
        assert!(search.resolve("delete").is_ok());
    }

    #[test]
    fn first_directory_wins() {
        let first = icon_dir();
        let second = tempfile::tempdir().unwrap();
        fs::write(second.path().join("delete.svg"), "<svg/>").unwrap();

        let search = SearchPath::new([second.path().to_path_buf(), first.path().to_path_buf()]);
        assert_eq!(search.resolve("delete").unwrap().svg(), "<svg/>");
    }

    #[test]
    fn lists_every_svg() {
        let dir = icon_dir();
        let search = SearchPath::new([dir.path().to_path_buf(), dir.path().join("nowhere")]);

        let names = search.list_icons();
        assert_eq!(names, vec!["delete".to_string(), "spinners:dots".to_string()]);
        for name in names {
            assert!(search.resolve(&name).is_ok());
        }
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directories_do_not_stop_listing() {
        use std::os::unix::fs::PermissionsExt;

        let dir = icon_dir();
        let locked = dir.path().join("locked");
        fs::create_dir(&locked).unwrap();
        fs::write(locked.join("hidden.svg"), SVG).unwrap();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let names = SearchPath::new([dir.path().to_path_buf()]).list_icons();
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        assert!(names.contains(&"delete".to_string()));
        assert!(names.contains(&"spinners:dots".to_string()));
    }

    #[test]
    fn memory_resolver() {
        let resolver = MemoryResolver::new().with("square", SVG);
        assert_eq!(resolver.len(), 1);
        assert_eq!(resolver.resolve("square").unwrap().identity(), "memory:square");
        assert!(matches!(
            resolver.resolve("circle"),
            Err(Error::ImageNotFound { .. })
        ));
    }
}
