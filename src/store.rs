//! Token persistence.
//!
//! The client saves the access token it obtains and looks it up again at
//! construction, so an application authorizes once per user.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use crate::{Result, Token};

/// Persists one token across process runs.
pub trait TokenStore {
    fn save(&self, token: &Token) -> Result<()>;

    fn lookup(&self) -> Result<Option<Token>>;

    fn delete(&self) -> Result<()>;
}

impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    fn save(&self, token: &Token) -> Result<()> {
        (**self).save(token)
    }

    fn lookup(&self) -> Result<Option<Token>> {
        (**self).lookup()
    }

    fn delete(&self) -> Result<()> {
        (**self).delete()
    }
}

/// Keeps the token in memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<Token>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn with_token(token: Token) -> Self {
        MemoryTokenStore {
            token: Mutex::new(Some(token)),
        }
    }

    fn slot(&self) -> std::sync::MutexGuard<'_, Option<Token>> {
        // a panic while holding the lock cannot leave the Option half-written
        self.token.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TokenStore for MemoryTokenStore {
    fn save(&self, token: &Token) -> Result<()> {
        *self.slot() = Some(token.clone());
        Ok(())
    }

    fn lookup(&self) -> Result<Option<Token>> {
        Ok(self.slot().clone())
    }

    fn delete(&self) -> Result<()> {
        *self.slot() = None;
        Ok(())
    }
}

/// Stores the token as JSON in a single file.
///
/// Writes go to a temporary file in the same directory which is then renamed
/// over the target, and the file is only readable by its owner on unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        FileTokenStore { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn save(&self, token: &Token) -> Result<()> {
        let json = serde_json::to_string_pretty(token)?;
        write_atomic(&self.path, json.as_bytes())?;
        debug!(path = %self.path.display(), kind = ?token.kind, "persisted token");
        Ok(())
    }

    fn lookup(&self) -> Result<Option<Token>> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        let token = serde_json::from_str(&contents)?;
        debug!(path = %self.path.display(), "loaded token");
        Ok(Some(token))
    }

    fn delete(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "deleted token");
                Ok(())
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Sibling of `path` named after it, so stores in one directory never share
/// a temporary file.
fn temp_path_for(path: &Path) -> PathBuf {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "token".to_string());
    dir.join(format!(".{}.tmp.{}", name, std::process::id()))
}

fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let tmp_path = temp_path_for(path);
    fs::write(&tmp_path, data)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600))?;
    }

    fs::rename(&tmp_path, path)
}
