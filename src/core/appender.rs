//! Near-duplicate admission into an append-only corpus.
//!
//! A [`UniqueLineAppender`] owns one corpus file, one threshold and an
//! in-memory mirror of the file's lines. The mirror is filled lazily on first
//! use and kept in file order, so the first entry reaching the threshold is
//! always the earliest admitted one.
//!
//! All state sits behind a single mutex; the similarity check and the append
//! happen under the same lock, so concurrent callers can never both admit
//! two lines that are similar to each other.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::core::similarity::{similarity, similarity_upper_bound};
use crate::error::{CullError, Result};
use crate::infra::io::{append_record, peek_lines, read_lines};

/// Threshold used when none is configured
pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Where the cache is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase
{
    Uninitialized,
    Initializing,
    Ready,
}

/// Why a candidate was not admitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason
{
    EmptyLine,
    SimilarLineExists,
    IoError,
}

impl std::fmt::Display for RejectReason
{
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result
    {
        let s = match self
        {
            RejectReason::EmptyLine => "empty line",
            RejectReason::SimilarLineExists => "similar line exists",
            RejectReason::IoError => "I/O error",
        };
        f.write_str(s)
    }
}

/// Outcome of one admission attempt
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdmissionResult
{
    pub accepted: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub matched_line: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AdmissionResult
{
    fn accepted() -> Self
    {
        Self { accepted: true, reason: None, similarity: None, matched_line: None, error: None }
    }

    pub fn rejected(reason: RejectReason) -> Self
    {
        Self { accepted: false, reason: Some(reason), similarity: None, matched_line: None, error: None }
    }

    fn similar(found: SimilarMatch) -> Self
    {
        Self {
            similarity: Some(found.similarity),
            matched_line: Some(found.line),
            ..Self::rejected(RejectReason::SimilarLineExists)
        }
    }

    fn io_failure(err: &CullError) -> Self
    {
        Self { error: Some(err.to_string()), ..Self::rejected(RejectReason::IoError) }
    }
}

/// An existing corpus line at or above the threshold
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimilarMatch
{
    pub line: String,
    pub similarity: f64,
}

/// Appender settings, usually read from `[append]` in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppenderConfig
{
    pub file: PathBuf,
    pub threshold: f64,
}

impl Default for AppenderConfig
{
    fn default() -> Self
    {
        Self { file: PathBuf::from("corpus.txt"), threshold: DEFAULT_THRESHOLD }
    }
}

#[derive(Debug)]
struct State
{
    phase: Phase,
    cache: IndexSet<String>,
}

/// Admits lines that are not near-duplicates of anything already in the file
#[derive(Debug)]
pub struct UniqueLineAppender
{
    path: PathBuf,
    threshold: f64,
    create_missing: bool,
    state: Mutex<State>,
}

impl UniqueLineAppender
{
    /// New appender over `path`; nothing is read until first use.
    pub fn new(
        path: impl Into<PathBuf>,
        threshold: f64,
    ) -> Result<Self>
    {
        if !(threshold > 0.0 && threshold <= 1.0)
        {
            return Err(CullError::InvalidThreshold(threshold));
        }

        Ok(Self {
            path: path.into(),
            threshold,
            create_missing: true,
            state: Mutex::new(State { phase: Phase::Uninitialized, cache: IndexSet::new() }),
        })
    }

    pub fn with_default_threshold(path: impl Into<PathBuf>) -> Result<Self>
    {
        Self::new(path, DEFAULT_THRESHOLD)
    }

    pub fn from_config(config: &AppenderConfig) -> Result<Self>
    {
        Self::new(&config.file, config.threshold)
    }

    /// Whether loading the cache may create a missing corpus file.
    ///
    /// With `false` a missing file loads as an empty cache and the
    /// filesystem is left alone until something is actually appended.
    pub fn with_create_missing(
        mut self,
        create: bool,
    ) -> Self
    {
        self.create_missing = create;
        self
    }

    pub fn path(&self) -> &Path
    {
        &self.path
    }

    pub fn threshold(&self) -> f64
    {
        self.threshold
    }

    pub fn phase(&self) -> Result<Phase>
    {
        Ok(self
            .lock()?
            .phase)
    }

    /// Number of cached lines
    pub fn line_count(&self) -> Result<usize>
    {
        Ok(self
            .lock()?
            .cache
            .len())
    }

    /// Load the corpus into the cache. No-op once ready.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn initialize(&self) -> Result<()>
    {
        let mut state = self.lock()?;
        self.ensure_ready(&mut state)
    }

    /// Drop the cache and reload it from the file.
    ///
    /// Needed whenever something other than this appender wrote the file.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn refresh(&self) -> Result<()>
    {
        let mut state = self.lock()?;
        state
            .cache
            .clear();
        state.phase = Phase::Uninitialized;
        self.ensure_ready(&mut state)
    }

    /// First cached line (in file order) whose similarity reaches the threshold.
    pub fn is_similar_to_existing(
        &self,
        line: &str,
    ) -> Result<Option<SimilarMatch>>
    {
        let mut state = self.lock()?;
        self.ensure_ready(&mut state)?;
        Ok(self.first_match(&state.cache, line.trim()))
    }

    /// Most similar cached line at or above the threshold.
    ///
    /// Diagnostic only; admission uses first-match.
    pub fn best_match(
        &self,
        line: &str,
    ) -> Result<Option<SimilarMatch>>
    {
        let mut state = self.lock()?;
        self.ensure_ready(&mut state)?;

        let line = line.trim();
        let best = state
            .cache
            .iter()
            .map(|existing| (existing, similarity(line, existing)))
            .filter(|(_, score)| *score >= self.threshold)
            .fold(None::<(&String, f64)>, |best, (existing, score)| match best
            {
                Some((_, top)) if top >= score => best,
                _ => Some((existing, score)),
            });

        Ok(best.map(|(existing, score)| SimilarMatch { line: existing.clone(), similarity: score }))
    }

    /// Admit `line` unless it is blank or near-duplicates a cached line.
    ///
    /// Never fails: I/O problems come back as an `IoError` rejection and
    /// leave the cache untouched.
    #[instrument(skip(self, line), fields(path = %self.path.display()))]
    pub fn append_line(
        &self,
        line: &str,
    ) -> AdmissionResult
    {
        let line = line.trim();
        if line.is_empty()
        {
            return AdmissionResult::rejected(RejectReason::EmptyLine);
        }

        let mut state = match self.lock()
        {
            Ok(s) => s,
            Err(e) => return AdmissionResult::io_failure(&e),
        };

        if let Err(e) = self.ensure_ready(&mut state)
        {
            warn!(error = %e, "could not load corpus");
            return AdmissionResult::io_failure(&e);
        }

        if let Some(found) = self.first_match(&state.cache, line)
        {
            debug!(similarity = found.similarity, matched = %found.line, "rejecting near-duplicate");
            return AdmissionResult::similar(found);
        }

        // File first: the cache only ever holds what made it to disk
        if let Err(e) = append_record(&self.path, line)
        {
            warn!(error = %e, "append failed");
            return AdmissionResult::io_failure(&e);
        }

        state
            .cache
            .insert(line.to_string());
        debug!(lines = state.cache.len(), "line admitted");

        AdmissionResult::accepted()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>>
    {
        self.state
            .lock()
            .map_err(|_| CullError::Poisoned)
    }

    /// Fill the cache from disk unless already ready.
    ///
    /// On failure the phase falls back to `Uninitialized` with an empty cache
    /// so the next call retries from scratch.
    fn ensure_ready(
        &self,
        state: &mut State,
    ) -> Result<()>
    {
        if state.phase == Phase::Ready
        {
            return Ok(());
        }

        state.phase = Phase::Initializing;
        let mut loaded = IndexSet::new();

        let stream = if self.create_missing
        {
            read_lines(&self.path)
        }
        else
        {
            peek_lines(&self.path)
        };

        let outcome = stream.and_then(|lines| {
            for line in lines
            {
                loaded.insert(line?);
            }
            Ok(())
        });

        match outcome
        {
            Ok(()) =>
            {
                state.cache = loaded;
                state.phase = Phase::Ready;
                info!(lines = state.cache.len(), "initialized corpus cache");
                Ok(())
            }
            Err(e) =>
            {
                state
                    .cache
                    .clear();
                state.phase = Phase::Uninitialized;
                Err(e)
            }
        }
    }

    fn first_match(
        &self,
        cache: &IndexSet<String>,
        line: &str,
    ) -> Option<SimilarMatch>
    {
        let len = line
            .chars()
            .count();

        cache
            .iter()
            // Length alone rules these out; skipping them cannot change the first hit
            .filter(|existing| {
                similarity_upper_bound(
                    len,
                    existing
                        .chars()
                        .count(),
                ) >= self.threshold
            })
            .map(|existing| (existing, similarity(line, existing)))
            .find(|(_, score)| *score >= self.threshold)
            .map(|(existing, score)| SimilarMatch { line: existing.clone(), similarity: score })
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use std::fs;
    use std::sync::Arc;
    use tempfile::TempDir;

    const ID1: &str = "select * from foo where id=1";
    const ID2: &str = "select * from foo where id=2";
    const WEATHER: &str = "totally unrelated sentence about weather";

    fn corpus(dir: &TempDir) -> PathBuf
    {
        dir.path()
            .join("corpus.txt")
    }

    #[test]
    fn test_threshold_validation()
    {
        let dir = TempDir::new().unwrap();
        for bad in [0.0, -0.1, 1.01, f64::NAN]
        {
            assert!(matches!(
                UniqueLineAppender::new(corpus(&dir), bad),
                Err(CullError::InvalidThreshold(_))
            ));
        }
        assert!(UniqueLineAppender::new(corpus(&dir), 1.0).is_ok());
        assert_eq!(
            UniqueLineAppender::with_default_threshold(corpus(&dir))
                .unwrap()
                .threshold(),
            0.8
        );
    }

    #[test]
    fn test_empty_line_rejected_without_init()
    {
        let dir = TempDir::new().unwrap();
        let app = UniqueLineAppender::with_default_threshold(corpus(&dir)).unwrap();

        let res = app.append_line("   \t ");
        assert!(!res.accepted);
        assert_eq!(res.reason, Some(RejectReason::EmptyLine));
        assert_eq!(app.phase().unwrap(), Phase::Uninitialized);
        assert!(!corpus(&dir).exists());
    }

    #[test]
    fn test_identical_line_twice_at_full_threshold()
    {
        let dir = TempDir::new().unwrap();
        let app = UniqueLineAppender::new(corpus(&dir), 1.0).unwrap();

        assert!(
            app.append_line("hello")
                .accepted
        );
        let second = app.append_line("  hello ");
        assert_eq!(second.reason, Some(RejectReason::SimilarLineExists));
        assert_eq!(second.similarity, Some(1.0));
        assert_eq!(
            second
                .matched_line
                .as_deref(),
            Some("hello")
        );
    }

    #[test]
    fn test_near_duplicate_then_unrelated()
    {
        let dir = TempDir::new().unwrap();
        let app = UniqueLineAppender::new(corpus(&dir), 0.8).unwrap();

        assert!(
            app.append_line(ID1)
                .accepted
        );

        let res = app.append_line(ID2);
        assert!(!res.accepted);
        assert_eq!(res.reason, Some(RejectReason::SimilarLineExists));
        assert!(
            res.similarity
                .unwrap()
                > 0.95
        );
        assert_eq!(
            res.matched_line
                .as_deref(),
            Some(ID1)
        );

        assert!(
            app.append_line(WEATHER)
                .accepted
        );
        assert_eq!(app.line_count().unwrap(), 2);
        assert_eq!(fs::read_to_string(corpus(&dir)).unwrap(), format!("{ID1}\n{WEATHER}\n"));
    }

    #[test]
    fn test_lazy_init_reads_existing_file()
    {
        let dir = TempDir::new().unwrap();
        fs::write(corpus(&dir), format!("  {ID1}  \n\n{ID1}\n")).unwrap();

        let app = UniqueLineAppender::new(corpus(&dir), 0.8).unwrap();
        assert_eq!(app.phase().unwrap(), Phase::Uninitialized);
        assert_eq!(app.line_count().unwrap(), 0);

        let res = app.append_line(ID2);
        assert_eq!(res.reason, Some(RejectReason::SimilarLineExists));
        assert_eq!(app.phase().unwrap(), Phase::Ready);
        // Duplicate file lines collapse into one cache entry
        assert_eq!(app.line_count().unwrap(), 1);
    }

    #[test]
    fn test_initialize_is_idempotent_and_creates_file()
    {
        let dir = TempDir::new().unwrap();
        let app = UniqueLineAppender::with_default_threshold(corpus(&dir)).unwrap();

        app.initialize().unwrap();
        assert!(corpus(&dir).exists());
        assert!(
            app.append_line("first")
                .accepted
        );

        // Already ready: an external write is not picked up
        fs::write(corpus(&dir), "first\nsecond\n").unwrap();
        app.initialize().unwrap();
        assert_eq!(app.line_count().unwrap(), 1);
    }

    #[test]
    fn test_refresh_picks_up_external_writes()
    {
        let dir = TempDir::new().unwrap();
        let app = UniqueLineAppender::new(corpus(&dir), 0.8).unwrap();
        assert!(
            app.append_line(WEATHER)
                .accepted
        );

        let mut content = fs::read_to_string(corpus(&dir)).unwrap();
        content.push_str(ID1);
        content.push('\n');
        fs::write(corpus(&dir), content).unwrap();

        assert!(
            app.is_similar_to_existing(ID2)
                .unwrap()
                .is_none()
        );

        app.refresh().unwrap();
        assert_eq!(app.line_count().unwrap(), 2);

        let res = app.append_line(ID2);
        assert_eq!(res.reason, Some(RejectReason::SimilarLineExists));
        assert_eq!(
            res.matched_line
                .as_deref(),
            Some(ID1)
        );
    }

    #[test]
    fn test_first_match_is_earliest_not_best()
    {
        let dir = TempDir::new().unwrap();
        fs::write(corpus(&dir), "abcdefghiX\nabcdefghij\n").unwrap();
        let app = UniqueLineAppender::new(corpus(&dir), 0.8).unwrap();

        let first = app
            .is_similar_to_existing("abcdefghij")
            .unwrap()
            .unwrap();
        assert_eq!(first.line, "abcdefghiX");
        assert!((first.similarity - 0.9).abs() < 1e-12);

        let best = app
            .best_match("abcdefghij")
            .unwrap()
            .unwrap();
        assert_eq!(best.line, "abcdefghij");
        assert_eq!(best.similarity, 1.0);
    }

    #[test]
    fn test_length_pruning_keeps_short_matches()
    {
        let dir = TempDir::new().unwrap();
        let app = UniqueLineAppender::new(corpus(&dir), 0.5).unwrap();

        assert!(
            app.append_line("abcd")
                .accepted
        );
        // Length bound 4/8 = 0.5 reaches the threshold, so it must still be compared
        let res = app.append_line("abcdwxyz");
        assert_eq!(res.reason, Some(RejectReason::SimilarLineExists));
        assert_eq!(res.similarity, Some(0.5));
    }

    #[cfg(unix)]
    #[test]
    fn test_io_failure_leaves_cache_untouched()
    {
        let dir = TempDir::new().unwrap();
        // A directory where the corpus file should be cannot be read or appended
        let path = dir
            .path()
            .join("corpus.txt");
        fs::create_dir(&path).unwrap();

        let app = UniqueLineAppender::new(&path, 0.8).unwrap();
        let res = app.append_line("anything");

        assert!(!res.accepted);
        assert_eq!(res.reason, Some(RejectReason::IoError));
        assert!(
            res.error
                .is_some()
        );
        assert_eq!(app.line_count().unwrap(), 0);
        assert_eq!(app.phase().unwrap(), Phase::Uninitialized);
    }

    #[cfg(unix)]
    #[test]
    fn test_failed_append_after_ready_keeps_cache()
    {
        let dir = TempDir::new().unwrap();
        let app = UniqueLineAppender::new(corpus(&dir), 0.8).unwrap();

        app.initialize().unwrap();
        assert!(
            app.append_line(ID1)
                .accepted
        );

        // Corpus becomes unwritable while the cache is live
        fs::remove_file(corpus(&dir)).unwrap();
        fs::create_dir(corpus(&dir)).unwrap();

        let res = app.append_line(WEATHER);
        assert!(!res.accepted);
        assert_eq!(res.reason, Some(RejectReason::IoError));
        assert!(
            res.error
                .is_some()
        );
        assert_eq!(app.line_count().unwrap(), 1);
        assert_eq!(app.phase().unwrap(), Phase::Ready);

        // The rejected line never reached the cache
        assert!(
            app.is_similar_to_existing(WEATHER)
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_no_create_mode_leaves_missing_corpus_alone()
    {
        let dir = TempDir::new().unwrap();
        let path = dir
            .path()
            .join("sub/corpus.txt");
        let app = UniqueLineAppender::new(&path, 0.8)
            .unwrap()
            .with_create_missing(false);

        assert!(
            app.is_similar_to_existing(ID1)
                .unwrap()
                .is_none()
        );
        assert_eq!(app.phase().unwrap(), Phase::Ready);
        assert_eq!(app.line_count().unwrap(), 0);
        assert!(
            !dir.path()
                .join("sub")
                .exists()
        );
    }

    #[test]
    fn test_concurrent_appends_admit_once()
    {
        let dir = TempDir::new().unwrap();
        let app = Arc::new(UniqueLineAppender::new(corpus(&dir), 0.9).unwrap());

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let app = Arc::clone(&app);
                std::thread::spawn(move || {
                    app.append_line(&format!("select * from t where id={}", i % 2))
                        .accepted
                })
            })
            .collect();

        let accepted = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|a| *a)
            .count();

        assert_eq!(accepted, 1);
        assert_eq!(app.line_count().unwrap(), 1);
        assert_eq!(
            fs::read_to_string(corpus(&dir))
                .unwrap()
                .lines()
                .count(),
            1
        );
    }
}
