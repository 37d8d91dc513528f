//! Corpus file I/O: streaming reader, locked append, atomic rewrite.
//!
//! Corpus files are UTF-8, one record per line, `\n`-terminated. Records are
//! trimmed on read so CRLF files behave like LF ones.

use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Lines, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, trace};

use crate::error::{CullError, IoPathExt, Result};

/// Create `path` (and its parent directories) if it does not exist yet.
///
/// Opening in append mode never truncates, so this is safe on a live corpus.
pub fn ensure_file(path: &Path) -> Result<()>
{
    if let Some(dir) = path
        .parent()
        .filter(|d| !d.as_os_str().is_empty())
    {
        fs::create_dir_all(dir).at_path(dir)?;
    }

    if !path.exists()
    {
        debug!(path = %path.display(), "creating empty corpus file");
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .at_path(path)?;

    Ok(())
}

/// Lazy stream of trimmed, non-blank lines from a corpus file.
///
/// Finite and single-pass: open a new stream to read the file again. After
/// the first read error the stream yields that error once and then ends.
pub struct CorpusLines
{
    path: PathBuf,
    inner: Option<Lines<BufReader<File>>>,
    failed: bool,
}

impl Iterator for CorpusLines
{
    type Item = Result<String>;

    fn next(&mut self) -> Option<Self::Item>
    {
        if self.failed
        {
            return None;
        }

        let inner = self
            .inner
            .as_mut()?;

        for raw in inner.by_ref()
        {
            match raw
            {
                Ok(line) =>
                {
                    let trimmed = line.trim();
                    if trimmed.is_empty()
                    {
                        continue;
                    }
                    return Some(Ok(trimmed.to_string()));
                }
                Err(e) =>
                {
                    self.failed = true;
                    return Some(Err(CullError::io(&self.path, e)));
                }
            }
        }

        None
    }
}

/// Open a streaming reader over `path`, creating an empty file if missing.
pub fn read_lines<P: AsRef<Path>>(path: P) -> Result<CorpusLines>
{
    let path = path.as_ref();
    ensure_file(path)?;

    let file = File::open(path).at_path(path)?;
    trace!(path = %path.display(), "opened corpus stream");

    Ok(CorpusLines { path: path.to_path_buf(), inner: Some(BufReader::new(file).lines()), failed: false })
}

/// Like [`read_lines`] but never touches the filesystem: a missing file
/// reads as empty. Used by dry runs.
pub fn peek_lines<P: AsRef<Path>>(path: P) -> Result<CorpusLines>
{
    let path = path.as_ref();
    let inner = if path.exists()
    {
        let file = File::open(path).at_path(path)?;
        Some(BufReader::new(file).lines())
    }
    else
    {
        trace!(path = %path.display(), "corpus missing, reading as empty");
        None
    };

    Ok(CorpusLines { path: path.to_path_buf(), inner, failed: false })
}

/// Append one record under an exclusive advisory lock.
///
/// The record and its newline go out in a single write so cooperating
/// writers never interleave partial lines.
pub fn append_record(
    path: &Path,
    record: &str,
) -> Result<()>
{
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .at_path(path)?;

    let mut lock = fd_lock::RwLock::new(file);
    let mut guard = lock
        .write()
        .at_path(path)?;

    let mut buf = String::with_capacity(record.len() + 1);
    buf.push_str(record);
    buf.push('\n');

    guard
        .write_all(buf.as_bytes())
        .at_path(path)?;
    guard
        .flush()
        .at_path(path)?;

    Ok(())
}

/// Replace `path` with `lines`, one per line, via a same-dir temp file.
///
/// Either the old content or the complete new content is visible; a failed
/// write leaves the target untouched. An existing target keeps its
/// permissions; a new one gets 0644 on Unix.
pub fn write_lines_atomic<I, S>(
    path: &Path,
    lines: I,
) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let dir = match path.parent()
    {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).at_path(dir)?;

    // NamedTempFile is 0600; carry the target's mode over instead
    #[cfg(unix)]
    let perms = fs::metadata(path)
        .map(|m| m.permissions())
        .unwrap_or_else(|_| std::os::unix::fs::PermissionsExt::from_mode(0o644));
    #[cfg(not(unix))]
    let perms = fs::metadata(path)
        .map(|m| m.permissions())
        .ok();

    let tmp = tempfile::NamedTempFile::new_in(dir).at_path(dir)?;

    {
        let mut out = BufWriter::new(tmp.as_file());
        for line in lines
        {
            out.write_all(
                line.as_ref()
                    .as_bytes(),
            )
            .at_path(tmp.path())?;
            out.write_all(b"\n")
                .at_path(tmp.path())?;
        }
        out.flush()
            .at_path(tmp.path())?;
    }

    tmp.as_file()
        .sync_all()
        .at_path(tmp.path())?;

    #[cfg(unix)]
    fs::set_permissions(tmp.path(), perms).at_path(tmp.path())?;
    #[cfg(not(unix))]
    if let Some(perms) = perms
    {
        fs::set_permissions(tmp.path(), perms).at_path(tmp.path())?;
    }

    tmp.persist(path)
        .map_err(|e| CullError::io(path, e.error))?;

    Ok(())
}
