//! SYSVOL file layer
//!
//! GPT.INI reading/rewriting, SYSVOL path synthesis, and the backup-copy
//! transaction that keeps the file and the directory record consistent.
//! File access goes through [`FileStore`] so the transaction semantics are
//! testable without a network share.

use crate::error::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Build the UNC path to a GPO's GPT.INI.
///
/// `folder` is the GPO's braced-GUID directory name under Policies.
pub fn gpt_ini_path(server: &str, dns_domain: &str, folder: &str) -> PathBuf {
    PathBuf::from(format!(
        r"\\{}\SYSVOL\{}\Policies\{}\GPT.INI",
        server, dns_domain, folder
    ))
}

/// A parsed GPT.INI.
///
/// Only the `Version=` line is interpreted; every other line (section
/// headers, extension GUID lists) is preserved verbatim on rewrite.
#[derive(Debug, Clone)]
pub struct GptIni {
    lines: Vec<String>,
    crlf: bool,
    trailing_newline: bool,
}

impl GptIni {
    pub fn parse(text: &str) -> Self {
        let crlf = text.contains("\r\n");
        let trailing_newline = text.ends_with('\n');
        let lines = text
            .lines()
            .map(|l| l.trim_end_matches('\r').to_string())
            .collect();
        Self {
            lines,
            crlf,
            trailing_newline,
        }
    }

    /// The current Version value, if the file has one
    pub fn version(&self) -> Option<u32> {
        self.lines.iter().find_map(|line| {
            let rest = line.trim().strip_prefix("Version=")?;
            rest.trim().parse::<u32>().ok()
        })
    }

    /// Replace the Version line, or add one under [General]
    pub fn set_version(&mut self, version: u32) {
        let new_line = format!("Version={}", version);

        if let Some(line) = self
            .lines
            .iter_mut()
            .find(|l| l.trim().starts_with("Version="))
        {
            *line = new_line;
            return;
        }

        if let Some(pos) = self.lines.iter().position(|l| l.trim() == "[General]") {
            self.lines.insert(pos + 1, new_line);
        } else {
            self.lines.push("[General]".to_string());
            self.lines.push(new_line);
        }
    }

    pub fn render(&self) -> String {
        let sep = if self.crlf { "\r\n" } else { "\n" };
        let mut out = self.lines.join(sep);
        if self.trailing_newline {
            out.push_str(sep);
        }
        out
    }
}

/// Storage abstraction for the GPT.INI transaction
pub trait FileStore {
    fn read(&self, path: &Path) -> AppResult<Vec<u8>>;
    fn write(&self, path: &Path, data: &[u8]) -> AppResult<()>;
    fn copy(&self, from: &Path, to: &Path) -> AppResult<()>;
    fn remove(&self, path: &Path) -> AppResult<()>;
    fn exists(&self, path: &Path) -> bool;
}

/// Real filesystem store
#[derive(Debug, Default)]
pub struct OsFileStore;

impl FileStore for OsFileStore {
    fn read(&self, path: &Path) -> AppResult<Vec<u8>> {
        std::fs::read(path)
            .map_err(|e| AppError::FileAccess(format!("{}: {}", path.display(), e)))
    }

    fn write(&self, path: &Path, data: &[u8]) -> AppResult<()> {
        std::fs::write(path, data)
            .map_err(|e| AppError::FileAccess(format!("{}: {}", path.display(), e)))
    }

    fn copy(&self, from: &Path, to: &Path) -> AppResult<()> {
        std::fs::copy(from, to)
            .map(|_| ())
            .map_err(|e| AppError::FileAccess(format!("{}: {}", from.display(), e)))
    }

    fn remove(&self, path: &Path) -> AppResult<()> {
        std::fs::remove_file(path)
            .map_err(|e| AppError::FileAccess(format!("{}: {}", path.display(), e)))
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

/// A single-file transaction guarded by a backup copy.
///
/// `begin` copies the target aside; `commit` discards the copy; `rollback`
/// restores the target from the copy and then discards it. Either way no
/// backup file outlives the transaction.
pub struct FileTransaction<'a> {
    store: &'a dyn FileStore,
    path: PathBuf,
    backup_path: PathBuf,
}

impl<'a> FileTransaction<'a> {
    pub fn begin(store: &'a dyn FileStore, path: &Path) -> AppResult<Self> {
        if !store.exists(path) {
            return Err(AppError::FileAccess(format!(
                "{}: file not found",
                path.display()
            )));
        }

        let mut backup_name = path.as_os_str().to_owned();
        backup_name.push(".bak");
        let backup_path = PathBuf::from(backup_name);

        store.copy(path, &backup_path)?;
        tracing::debug!(path = %path.display(), backup = %backup_path.display(), "Backup created");

        Ok(Self {
            store,
            path: path.to_path_buf(),
            backup_path,
        })
    }

    /// Overwrite the guarded file. On failure the file is restored from the
    /// backup before the error is returned, so callers see pre-transaction
    /// state.
    pub fn write(&self, data: &[u8]) -> AppResult<()> {
        if let Err(e) = self.store.write(&self.path, data) {
            tracing::warn!(path = %self.path.display(), error = %e, "Write failed, restoring backup");
            let _ = self.store.copy(&self.backup_path, &self.path);
            let _ = self.store.remove(&self.backup_path);
            return Err(e);
        }
        Ok(())
    }

    pub fn commit(self) -> AppResult<()> {
        self.store.remove(&self.backup_path)?;
        tracing::debug!(path = %self.path.display(), "Transaction committed");
        Ok(())
    }

    pub fn rollback(self) -> AppResult<()> {
        self.store.copy(&self.backup_path, &self.path)?;
        self.store.remove(&self.backup_path)?;
        tracing::info!(path = %self.path.display(), "Transaction rolled back");
        Ok(())
    }
}
