//! Loading statements from strings, files and directory trees.
//!
//! The [`Loader`] ties the [`Segmenter`] and the [`binder`](crate::binder) to the
//! file system. Directory trees are walked in lexical file-name order, and
//! when two sources declare the same statement name the one visited last
//! wins.
//!
//! How the sources are combined is controlled by [`Aggregation`]:
//!
//! * [`Aggregation::Concatenate`] joins every source with a newline and
//!   segments the result once. Text that precedes the first marker of a
//!   source is therefore appended to the last statement of the previous one.
//! * [`Aggregation::PerSource`] segments each source on its own and merges
//!   the results, so errors name the offending file and preludes are always
//!   discarded.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::binder::{QueryTarget, bind_new};
use crate::errors::{Error, LoadError, ParseError};
use crate::segmenter::Segmenter;
use crate::statements::Statements;

/// The extension of the files collected by [`Loader::statements_from_dir`] by default.
pub const DEFAULT_EXTENSION: &str = "sql";

/// How multiple sources are combined into one set of statements.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Aggregation {
    /// Join the sources with `\n` and segment the result once.
    #[default]
    Concatenate,
    /// Segment every source separately and merge in discovery order.
    PerSource,
}

/// Reads the whole source at `path`.
///
/// # Errors
///
/// Returns [`LoadError::Io`] if the file cannot be read or is not valid UTF-8.
pub fn read_source(path: &Path) -> Result<String, LoadError> {
    fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Recursively collects the files under `root` whose extension is `extension`,
/// compared case-insensitively and with or without its leading dot.
///
/// Entries are visited in lexical file-name order.
///
/// # Errors
///
/// Returns [`LoadError::Walk`] if `root` or one of its descendants cannot be read.
pub fn find_files_with_ext(root: &Path, extension: &str) -> Result<Vec<PathBuf>, LoadError> {
    let extension = extension.trim_start_matches('.');
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|source| LoadError::Walk {
            path: source.path().unwrap_or(root).to_path_buf(),
            source,
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let matches = entry
            .path()
            .extension()
            .and_then(OsStr::to_str)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            trace!(path = %entry.path().display(), "found query file");
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Loads statements from text sources, following the configured
/// [`Segmenter`] and [`Aggregation`].
#[derive(Debug, Clone)]
pub struct Loader {
    segmenter: Segmenter,
    extension: String,
    aggregation: Aggregation,
}

impl Default for Loader {
    fn default() -> Self {
        Self {
            segmenter: Segmenter::default(),
            extension: DEFAULT_EXTENSION.to_owned(),
            aggregation: Aggregation::default(),
        }
    }
}

impl Loader {
    /// Creates a loader with the default marker, extension and aggregation.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Uses `segmenter` to split the sources.
    #[must_use]
    pub fn with_segmenter(mut self, segmenter: Segmenter) -> Self {
        self.segmenter = segmenter;
        self
    }

    /// Collects files with `extension` instead of [`DEFAULT_EXTENSION`].
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Combines multiple sources according to `aggregation`.
    #[must_use]
    pub const fn with_aggregation(mut self, aggregation: Aggregation) -> Self {
        self.aggregation = aggregation;
        self
    }

    /// The segmenter in use.
    #[must_use]
    pub const fn segmenter(&self) -> &Segmenter {
        &self.segmenter
    }

    /// How multiple sources are combined.
    #[must_use]
    pub const fn aggregation(&self) -> Aggregation {
        self.aggregation
    }

    /// Splits `text` into statements.
    ///
    /// # Errors
    ///
    /// See [`Segmenter::segment`].
    pub fn statements_from_str(&self, text: &str) -> Result<Statements, ParseError> {
        self.segmenter.segment(text)
    }

    /// Combines `(path, text)` sources in iteration order.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] when concatenating, or [`LoadError::Parse`]
    /// naming the source when segmenting per source. In strict mode a name
    /// shared by two sources is an error as well.
    pub fn statements_from_sources<I, P, S>(&self, sources: I) -> Result<Statements, Error>
    where
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        match self.aggregation {
            Aggregation::Concatenate => {
                let text = sources
                    .into_iter()
                    .map(|(_, text)| text.as_ref().to_owned())
                    .collect::<Vec<_>>()
                    .join("\n");
                Ok(self.segmenter.segment(&text)?)
            }
            Aggregation::PerSource => {
                let mut statements = Statements::new();
                for (path, text) in sources {
                    let path = path.as_ref();
                    let parse_error = |source: ParseError| LoadError::Parse {
                        path: path.to_path_buf(),
                        source,
                    };
                    let found = self.segmenter.segment(text.as_ref()).map_err(parse_error)?;
                    trace!(path = %path.display(), statements = found.len(), "segmented source");
                    if self.segmenter.is_strict() {
                        statements.merge_strict(found).map_err(parse_error)?;
                    } else {
                        statements.merge(found);
                    }
                }
                Ok(statements)
            }
        }
    }

    /// Reads and segments the file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains malformed statements.
    pub fn statements_from_file(&self, path: impl AsRef<Path>) -> Result<Statements, Error> {
        let path = path.as_ref();
        let text = read_source(path)?;
        let statements = self.statements_from_sources([(path, text)])?;
        debug!(path = %path.display(), statements = statements.len(), "loaded query file");
        Ok(statements)
    }

    /// Reads and segments every file under `root` with the configured extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked, a file cannot be read, or
    /// the sources contain malformed statements.
    pub fn statements_from_dir(&self, root: impl AsRef<Path>) -> Result<Statements, Error> {
        let root = root.as_ref();
        let files = find_files_with_ext(root, &self.extension)?;
        let sources = files
            .into_iter()
            .map(|path| read_source(&path).map(|text| (path, text)))
            .collect::<Result<Vec<_>, _>>()?;
        let statements = self.statements_from_sources(sources)?;
        debug!(
            root = %root.display(),
            statements = statements.len(),
            aggregation = ?self.aggregation,
            "loaded query directory"
        );
        Ok(statements)
    }

    /// Combines `(path, text)` sources, typically embedded with `include_str!`,
    /// and binds them into a new `T`.
    ///
    /// # Errors
    ///
    /// See [`Loader::statements_from_sources`] and [`bind`](crate::bind).
    pub fn load_from_sources<T, I, P, S>(&self, sources: I) -> Result<T, Error>
    where
        T: QueryTarget + Default,
        I: IntoIterator<Item = (P, S)>,
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        Ok(bind_new(&self.statements_from_sources(sources)?)?)
    }

    /// Segments `text` and binds it into a new `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if segmentation or binding fails.
    pub fn load_from_str<T: QueryTarget + Default>(&self, text: &str) -> Result<T, Error> {
        Ok(bind_new(&self.statements_from_str(text)?)?)
    }

    /// Loads the file at `path` into a new `T`.
    ///
    /// # Errors
    ///
    /// See [`Loader::statements_from_file`] and [`bind`](crate::bind).
    pub fn load_from_file<T: QueryTarget + Default>(
        &self,
        path: impl AsRef<Path>,
    ) -> Result<T, Error> {
        Ok(bind_new(&self.statements_from_file(path)?)?)
    }

    /// Loads every matching file under `root` into a new `T`.
    ///
    /// # Errors
    ///
    /// See [`Loader::statements_from_dir`] and [`bind`](crate::bind).
    pub fn load_from_dir<T: QueryTarget + Default>(
        &self,
        root: impl AsRef<Path>,
    ) -> Result<T, Error> {
        Ok(bind_new(&self.statements_from_dir(root)?)?)
    }
}

/// Combines `(path, text)` sources with the default segmenter and the given
/// `aggregation`.
///
/// # Errors
///
/// See [`Loader::statements_from_sources`].
pub fn extract_from_sources<I, P, S>(
    sources: I,
    aggregation: Aggregation,
) -> Result<Statements, Error>
where
    I: IntoIterator<Item = (P, S)>,
    P: AsRef<Path>,
    S: AsRef<str>,
{
    Loader::new()
        .with_aggregation(aggregation)
        .statements_from_sources(sources)
}

/// Loads `(path, text)` sources with the default [`Loader`] into a new `T`.
///
/// # Errors
///
/// Returns an error if a source contains malformed statements or a tagged
/// field cannot be resolved.
pub fn load_from_sources<T, I, P, S>(sources: I) -> Result<T, Error>
where
    T: QueryTarget + Default,
    I: IntoIterator<Item = (P, S)>,
    P: AsRef<Path>,
    S: AsRef<str>,
{
    Loader::default().load_from_sources(sources)
}

/// Segments `text` with the default [`Loader`] and binds it into a new `T`.
///
/// # Errors
///
/// Returns an error if a statement name is invalid or a tagged field cannot
/// be resolved.
pub fn load_from_str<T: QueryTarget + Default>(text: &str) -> Result<T, Error> {
    Loader::default().load_from_str(text)
}

/// Loads the file at `path` with the default [`Loader`] into a new `T`.
///
/// # Errors
///
/// Returns an error if the file cannot be read, or see [`load_from_str`].
pub fn load_from_file<T: QueryTarget + Default>(path: impl AsRef<Path>) -> Result<T, Error> {
    Loader::default().load_from_file(path)
}

/// Loads every `.sql` file under `root` with the default [`Loader`] into a new `T`.
///
/// # Errors
///
/// Returns an error if the tree or one of its files cannot be read, or see
/// [`load_from_str`].
pub fn load_from_dir<T: QueryTarget + Default>(root: impl AsRef<Path>) -> Result<T, Error> {
    Loader::default().load_from_dir(root)
}

/// Like [`load_from_str`], but panics on error.
///
/// Meant for initialising statics, e.g. with `include_str!`.
///
/// # Panics
///
/// Panics if [`load_from_str`] fails.
#[must_use]
pub fn must_load_from_str<T: QueryTarget + Default>(text: &str) -> T {
    load_from_str(text).unwrap_or_else(|error| panic!("{error}"))
}

/// Like [`load_from_file`], but panics on error.
///
/// # Panics
///
/// Panics if [`load_from_file`] fails.
#[must_use]
pub fn must_load_from_file<T: QueryTarget + Default>(path: impl AsRef<Path>) -> T {
    load_from_file(path).unwrap_or_else(|error| panic!("{error}"))
}

/// Like [`load_from_sources`], but panics on error.
///
/// # Panics
///
/// Panics if [`load_from_sources`] fails.
#[must_use]
pub fn must_load_from_sources<T, I, P, S>(sources: I) -> T
where
    T: QueryTarget + Default,
    I: IntoIterator<Item = (P, S)>,
    P: AsRef<Path>,
    S: AsRef<str>,
{
    load_from_sources(sources).unwrap_or_else(|error| panic!("{error}"))
}

/// Like [`load_from_dir`], but panics on error.
///
/// # Panics
///
/// Panics if [`load_from_dir`] fails.
#[must_use]
pub fn must_load_from_dir<T: QueryTarget + Default>(root: impl AsRef<Path>) -> T {
    load_from_dir(root).unwrap_or_else(|error| panic!("{error}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concatenate_and_per_source_agree_without_conflicts() {
        let sources = [
            ("cats.sql", "-- query: CreatePsychoCat\nINSERT INTO cat VALUES ('Puca');\n"),
            ("users.sql", "-- query: DeleteUserById\nDELETE FROM user WHERE id = :id;"),
        ];
        let concatenated = Loader::new().statements_from_sources(sources).unwrap();
        let per_source = Loader::new()
            .with_aggregation(Aggregation::PerSource)
            .statements_from_sources(sources)
            .unwrap();
        assert_eq!(concatenated, per_source);
        assert_eq!(concatenated.len(), 2);
    }

    #[test]
    fn test_last_source_wins() {
        let sources = [("file1.sql", "-- query: A\n1"), ("file2.sql", "-- query: A\n2")];
        for aggregation in [Aggregation::Concatenate, Aggregation::PerSource] {
            let statements = Loader::new()
                .with_aggregation(aggregation)
                .statements_from_sources(sources)
                .unwrap();
            assert_eq!(statements, Statements::from_iter([("A", "2")]));
        }
    }

    #[test]
    fn test_concatenated_prelude_leaks_into_previous_source() {
        let sources = [("a.sql", "-- query: A\nSELECT 1;"), ("b.sql", "VACUUM;\n-- query: B\nSELECT 2;")];
        let concatenated = Loader::new().statements_from_sources(sources).unwrap();
        assert_eq!(concatenated.get("A"), Some("SELECT 1;\nVACUUM;"));

        let per_source = Loader::new()
            .with_aggregation(Aggregation::PerSource)
            .statements_from_sources(sources)
            .unwrap();
        assert_eq!(per_source.get("A"), Some("SELECT 1;"));
    }

    #[test]
    fn test_per_source_errors_name_the_source() {
        let sources = [("good.sql", "-- query: A\n1"), ("bad.sql", "-- query: B C\n2")];
        let error = Loader::new()
            .with_aggregation(Aggregation::PerSource)
            .statements_from_sources(sources)
            .unwrap_err();
        match error {
            Error::Load(LoadError::Parse { path, source }) => {
                assert_eq!(path, Path::new("bad.sql"));
                assert_eq!(source, ParseError::InvalidStatementName("B C".to_owned()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_strict_per_source_rejects_shared_names() {
        let sources = [("file1.sql", "-- query: A\n1"), ("file2.sql", "-- query: A\n2")];
        let error = Loader::new()
            .with_segmenter(Segmenter::new().strict(true))
            .with_aggregation(Aggregation::PerSource)
            .statements_from_sources(sources)
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Load(LoadError::Parse {
                source: ParseError::DuplicateStatementName(_),
                ..
            })
        ));
    }

    #[test]
    fn test_extract_from_sources() {
        let sources = [
            ("a.sql", "-- query: A\nSELECT 1;\nVACUUM;"),
            ("b.sql", "VACUUM;\n-- query: B\n2"),
        ];
        let concatenated = extract_from_sources(sources, Aggregation::Concatenate).unwrap();
        assert_eq!(concatenated.get("A"), Some("SELECT 1;\nVACUUM;\nVACUUM;"));
        let per_source = extract_from_sources(sources, Aggregation::PerSource).unwrap();
        assert_eq!(
            per_source,
            Statements::from_iter([("A", "SELECT 1;\nVACUUM;"), ("B", "2")])
        );
        let nothing: [(&str, &str); 0] = [];
        assert!(extract_from_sources(nothing, Aggregation::PerSource).unwrap().is_empty());
    }

    #[derive(Debug, Default)]
    struct Pair {
        first: String,
        second: Option<String>,
    }

    impl QueryTarget for Pair {
        fn bindings(&mut self) -> Vec<crate::Binding<'_>> {
            vec![
                crate::Binding::text("first", "First", &mut self.first),
                crate::Binding::text("second", "Second", &mut self.second),
            ]
        }
    }

    const EMBEDDED: [(&str, &str); 2] = [
        ("first.sql", "-- query: First\nSELECT 1;\n"),
        ("second.sql", "-- query: Second\nSELECT 2;\n"),
    ];

    #[test]
    fn test_load_from_sources() {
        let pair: Pair = load_from_sources(EMBEDDED).unwrap();
        assert_eq!(pair.first, "SELECT 1;");
        assert_eq!(pair.second.as_deref(), Some("SELECT 2;"));

        let error = Loader::new()
            .with_aggregation(Aggregation::PerSource)
            .load_from_sources::<Pair, _, _, _>([EMBEDDED[0]])
            .unwrap_err();
        assert!(matches!(
            error,
            Error::Bind(crate::BindError::QueryNotFound(ref name)) if name == "Second"
        ));
    }

    #[test]
    fn test_must_load_from_sources() {
        let pair: Pair = must_load_from_sources(EMBEDDED);
        assert_eq!(pair.first, "SELECT 1;");
    }

    #[test]
    #[should_panic(expected = "could not find query Second")]
    fn test_must_load_from_sources_panics() {
        let _: Pair = must_load_from_sources([EMBEDDED[0]]);
    }

    #[test]
    fn test_accessors() {
        let loader = Loader::new().with_aggregation(Aggregation::PerSource);
        assert_eq!(loader.aggregation(), Aggregation::PerSource);
        assert!(!loader.segmenter().is_strict());
        assert_eq!(Loader::new().aggregation(), Aggregation::Concatenate);
    }

    #[test]
    fn test_missing_file() {
        let error = Loader::new()
            .statements_from_file("this/file/does/not/exist.sql")
            .unwrap_err();
        assert!(matches!(error, Error::Load(LoadError::Io { .. })));
        assert!(error.to_string().starts_with("cannot load queries: cannot read this/file/does/not/exist.sql"));
    }

    #[test]
    fn test_missing_directory() {
        let error = find_files_with_ext(Path::new("this/dir/does/not/exist"), "sql").unwrap_err();
        assert!(matches!(error, LoadError::Walk { .. }));
    }
}
