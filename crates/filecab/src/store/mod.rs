//! Per-user store provisioning and file placement.
//!
//! Each username owns an isolated directory tree plus one catalog file,
//! created together: `<base>/<user>_folder/{image,video,json,text,audio,
//! pdf,other}/` and `<base>/<user>_database`. Placement is the only path
//! that writes into the category folders, so folder contents and catalog
//! rows can be cross-validated.

use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use crate::catalog::Database;
use crate::classify::Category;
use crate::error::{FilecabError, StorageError};

/// Content handed to `place_file`: a source file on disk (streamed copy)
/// or an in-memory buffer (pasted JSON).
pub enum PlacementSource<'a> {
    Path(&'a Path),
    Bytes(&'a [u8]),
}

/// Handle to one user's store: root directory tree + catalog.
///
/// Cloning is cheap; the catalog handle is shared. No cross-user state
/// exists anywhere; isolation is structural.
#[derive(Clone)]
pub struct UserStore {
    username: String,
    root: PathBuf,
    db: Database,
}

impl std::fmt::Debug for UserStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserStore")
            .field("username", &self.username)
            .field("root", &self.root)
            .finish_non_exhaustive()
    }
}

/// Default base directory for stores: `~/.filecab`.
pub fn default_base_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|h| h.join(".filecab"))
}

/// Resolves the root directory and catalog path for a username.
pub fn user_store_paths(base: &Path, username: &str) -> (PathBuf, PathBuf) {
    (
        base.join(format!("{username}_folder")),
        base.join(format!("{username}_database")),
    )
}

/// Creates (or reopens) a user's store. Idempotent: the root, all seven
/// category folders and the catalog file are ensured on every call.
///
/// The caller passes a username already validated by the authentication
/// layer; this function never re-validates credentials.
pub fn ensure_user_store(base: &Path, username: &str) -> Result<UserStore, FilecabError> {
    let (root, db_path) = user_store_paths(base, username);

    for dir in std::iter::once(root.clone())
        .chain(Category::ALL.iter().map(|c| root.join(c.as_str())))
    {
        std::fs::create_dir_all(&dir).map_err(|e| StorageError::Provision {
            path: dir.clone(),
            source: e,
        })?;
    }

    let db = Database::open(&db_path)?;

    log::debug!("Store ready for '{}' at {}", username, root.display());

    Ok(UserStore {
        username: username.to_string(),
        root,
        db,
    })
}

impl UserStore {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Root of the user's directory tree. Exposed for the UI shell
    /// ("open folder" actions); the core never hands out anything livelier.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The physical folder for a category.
    pub fn category_dir(&self, category: Category) -> PathBuf {
        self.root.join(category.as_str())
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    /// Writes content into `<root>/<category>/<unique_name>`.
    ///
    /// Creation is exclusive (`create_new`): the unique-name contract
    /// makes collisions a bug, so an existing file is an error, never an
    /// overwrite. A partially written destination is removed on failure.
    /// No catalog mutation happens here.
    pub fn place_file(
        &self,
        category: Category,
        unique_name: &str,
        source: PlacementSource<'_>,
    ) -> Result<PathBuf, StorageError> {
        let dest = self.category_dir(category).join(unique_name);

        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&dest)
            .map_err(|e| StorageError::Write {
                path: dest.clone(),
                source: e,
            })?;

        let result = match source {
            PlacementSource::Path(src) => File::open(src)
                .map_err(|e| StorageError::ReadSource {
                    path: src.to_path_buf(),
                    source: e,
                })
                .and_then(|mut f| {
                    io::copy(&mut f, &mut out).map_err(|e| StorageError::Write {
                        path: dest.clone(),
                        source: e,
                    })
                })
                .map(|_| ()),
            PlacementSource::Bytes(bytes) => {
                io::Write::write_all(&mut out, bytes).map_err(|e| StorageError::Write {
                    path: dest.clone(),
                    source: e,
                })
            }
        };

        if let Err(e) = result {
            drop(out);
            let _ = std::fs::remove_file(&dest);
            return Err(e);
        }

        Ok(dest)
    }
}
