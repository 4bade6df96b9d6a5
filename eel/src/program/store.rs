use std::{
    collections::HashSet,
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write},
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use fs4::fs_std::FileExt;

use super::{ExpressionKey, Program};
use crate::{EelError, EelResult};

const LOG_TARGET: &str = "eel::store";

/// Durable, append only mirror of compiled programs.
pub trait ExpressionStore: Send + Sync {
    /// Every program currently stored.
    fn load(&self) -> EelResult<Vec<Program>>;

    /// Adds the programs whose key is not stored yet, returning how many were added.
    fn merge(&self, programs: &[Arc<Program>]) -> EelResult<usize>;
}

impl<T: ExpressionStore + ?Sized> ExpressionStore for Arc<T> {
    fn load(&self) -> EelResult<Vec<Program>> {
        (**self).load()
    }

    fn merge(&self, programs: &[Arc<Program>]) -> EelResult<usize> {
        (**self).merge(programs)
    }
}

/// Programs as JSON lines in a single file.
///
/// `merge` holds an exclusive lock on the file while it re-reads the stored keys and
/// appends the missing programs, so concurrent writers only ever add to each other.
#[derive(Debug, Clone)]
pub struct FileExpressionStore {
    path: PathBuf,
}

impl FileExpressionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> FileExpressionStore {
        FileExpressionStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn parse_lines<R: BufRead>(&self, reader: R) -> EelResult<Vec<Program>> {
        let mut programs = Vec::new();

        for (lineno, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<Program>(&line) {
                Ok(program) => programs.push(program),
                Err(err) => log::warn!(
                    target: LOG_TARGET,
                    "Skipping malformed entry on line {} of {}: {}",
                    lineno + 1,
                    self.path.display(),
                    err
                ),
            }
        }

        Ok(programs)
    }

    fn append_missing(&self, file: &mut File, programs: &[Arc<Program>]) -> EelResult<usize> {
        let mut content = String::new();
        file.seek(SeekFrom::Start(0))?;
        file.read_to_string(&mut content)?;

        let mut known: HashSet<ExpressionKey> = self
            .parse_lines(content.as_bytes())?
            .iter()
            .map(Program::key)
            .collect();

        let mut out = String::new();
        if !content.is_empty() && !content.ends_with('\n') {
            out.push('\n');
        }

        let mut added = 0;
        for program in programs {
            if known.insert(program.key()) {
                out.push_str(&serde_json::to_string(program.as_ref())?);
                out.push('\n');
                added += 1;
            }
        }

        if added > 0 {
            file.seek(SeekFrom::End(0))?;
            file.write_all(out.as_bytes())?;
            file.sync_data()?;
        }

        Ok(added)
    }
}

impl ExpressionStore for FileExpressionStore {
    fn load(&self) -> EelResult<Vec<Program>> {
        match File::open(&self.path) {
            Ok(file) => self.parse_lines(BufReader::new(file)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(err) => Err(err.into()),
        }
    }

    fn merge(&self, programs: &[Arc<Program>]) -> EelResult<usize> {
        if programs.is_empty() {
            return Ok(0);
        }

        let mut file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.path)
            .map_err(|err| {
                EelError::Store(format!("Failed to open {}: {}", self.path.display(), err))
            })?;

        file.lock_exclusive().map_err(|err| {
            EelError::Store(format!("Failed to lock {}: {}", self.path.display(), err))
        })?;

        let res = self.append_missing(&mut file, programs);

        if let Err(err) = FileExt::unlock(&file) {
            log::warn!(target: LOG_TARGET, "Failed to unlock {}: {}", self.path.display(), err);
        }

        let added = res?;
        log::debug!(
            target: LOG_TARGET,
            "Merged {} of {} programs into {}",
            added,
            programs.len(),
            self.path.display()
        );

        Ok(added)
    }
}

/// Store kept in memory, for tests and short lived processes.
#[derive(Debug, Default)]
pub struct MemoryExpressionStore {
    programs: Mutex<Vec<Program>>,
}

impl MemoryExpressionStore {
    pub fn new() -> MemoryExpressionStore {
        MemoryExpressionStore::default()
    }

    pub fn len(&self) -> usize {
        self.programs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ExpressionStore for MemoryExpressionStore {
    fn load(&self) -> EelResult<Vec<Program>> {
        Ok(self
            .programs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone())
    }

    fn merge(&self, programs: &[Arc<Program>]) -> EelResult<usize> {
        let mut stored = self
            .programs
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let mut known: HashSet<ExpressionKey> = stored.iter().map(Program::key).collect();

        let mut added = 0;
        for program in programs {
            if known.insert(program.key()) {
                stored.push(program.as_ref().clone());
                added += 1;
            }
        }

        Ok(added)
    }
}
