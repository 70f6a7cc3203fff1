//! JSON-file-backed game library.
//!
//! [`GameStore`] keeps the whole [`Library`] in memory and rewrites
//! `library.json` after every mutation. Writes are atomic (temp file +
//! fsync + rename) so a crash never leaves a truncated library behind.
//!
//! Games are addressed by their uuid or by any unique prefix of it, which
//! keeps CLI usage short (`gameshelf rate 3f2a 5`).

use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use gameshelf_search::orchestrator::similarity::normalize_title;
use gameshelf_search::Candidate;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ShelfError};

/// On-disk format version written by this build.
pub const LIBRARY_VERSION: u32 = 1;

/// Where a game sits in the user's play queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayStatus {
    #[default]
    Backlog,
    Playing,
    Completed,
    Abandoned,
    Wishlist,
}

impl PlayStatus {
    /// Lowercase name used in the library file and on the command line.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Backlog => "backlog",
            Self::Playing => "playing",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
            Self::Wishlist => "wishlist",
        }
    }
}

impl fmt::Display for PlayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayStatus {
    type Err = ShelfError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "backlog" => Ok(Self::Backlog),
            "playing" => Ok(Self::Playing),
            "completed" => Ok(Self::Completed),
            "abandoned" => Ok(Self::Abandoned),
            "wishlist" => Ok(Self::Wishlist),
            other => Err(ShelfError::Invalid(format!("unknown status: {other}"))),
        }
    }
}

/// Personal data the user attaches to a game.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserData {
    /// Rating from 1 to 5.
    pub rating: Option<u8>,
    pub notes: Option<String>,
    /// Lowercased, sorted.
    pub tags: BTreeSet<String>,
    pub status: PlayStatus,
}

/// A stored game: the search result as returned plus user data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameEntry {
    pub id: String,
    pub added_at: DateTime<Utc>,
    pub candidate: Candidate,
    #[serde(default)]
    pub user: UserData,
}

impl GameEntry {
    /// Display title.
    pub fn title(&self) -> &str {
        &self.candidate.title
    }

    fn is_same_game(&self, candidate: &Candidate) -> bool {
        let stored = &self.candidate;
        if stored.source() == candidate.source()
            && stored.source_id.is_some()
            && stored.source_id == candidate.source_id
        {
            return true;
        }
        normalize_title(&stored.title) == normalize_title(&candidate.title)
            && stored.release_date == candidate.release_date
    }
}

/// A user-defined, ordered group of games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub game_ids: Vec<String>,
}

/// Everything persisted in `library.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Library {
    pub version: u32,
    #[serde(default)]
    pub games: Vec<GameEntry>,
    #[serde(default)]
    pub collections: Vec<Collection>,
}

impl Default for Library {
    fn default() -> Self {
        Self {
            version: LIBRARY_VERSION,
            games: Vec::new(),
            collections: Vec::new(),
        }
    }
}

/// File-backed library with game and collection CRUD.
#[derive(Debug)]
pub struct GameStore {
    path: PathBuf,
    library: Library,
}

impl GameStore {
    /// Open the library at `path`. A missing file yields an empty library;
    /// nothing is written until the first mutation.
    ///
    /// # Errors
    ///
    /// Returns [`ShelfError::Store`] if the file exists but cannot be read or
    /// parsed, or was written by a newer version.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let library = if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| {
                ShelfError::Store(format!("failed to read library {}: {e}", path.display()))
            })?;
            let library: Library = serde_json::from_str(&content).map_err(|e| {
                ShelfError::Store(format!("failed to parse library {}: {e}", path.display()))
            })?;
            if library.version > LIBRARY_VERSION {
                return Err(ShelfError::Store(format!(
                    "library {} has version {}, this build supports up to {LIBRARY_VERSION}",
                    path.display(),
                    library.version
                )));
            }
            library
        } else {
            Library::default()
        };
        tracing::debug!(
            path = %path.display(),
            games = library.games.len(),
            collections = library.collections.len(),
            "library opened"
        );
        Ok(Self { path, library })
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The in-memory library.
    pub fn library(&self) -> &Library {
        &self.library
    }

    // ---- games ----

    /// Store a search result and return its id. If the same game is already
    /// in the library the existing id is returned and nothing changes.
    ///
    /// # Errors
    ///
    /// Returns an error if the library cannot be saved.
    pub fn add_game(&mut self, candidate: Candidate) -> Result<String> {
        if let Some(existing) = self
            .library
            .games
            .iter()
            .find(|g| g.is_same_game(&candidate))
        {
            tracing::debug!(id = %existing.id, "game already in library");
            return Ok(existing.id.clone());
        }
        let entry = GameEntry {
            id: uuid::Uuid::new_v4().to_string(),
            added_at: Utc::now(),
            candidate,
            user: UserData::default(),
        };
        let id = entry.id.clone();
        let source = entry.candidate.source();
        self.commit(|library| {
            library.games.push(entry);
            Ok(())
        })?;
        tracing::info!(id = %id, source = %source, "game added");
        Ok(id)
    }

    /// Look up a game by exact id.
    pub fn get_game(&self, id: &str) -> Option<&GameEntry> {
        self.library.games.iter().find(|g| g.id == id)
    }

    /// All games in insertion order.
    pub fn list_games(&self) -> &[GameEntry] {
        &self.library.games
    }

    /// Look up a game by id or unique id prefix.
    ///
    /// # Errors
    ///
    /// [`ShelfError::NotFound`] if nothing matches, [`ShelfError::Invalid`]
    /// if the prefix is ambiguous.
    pub fn resolve_game(&self, id_or_prefix: &str) -> Result<&GameEntry> {
        let index = self.game_index(id_or_prefix)?;
        Ok(&self.library.games[index])
    }

    /// Remove a game from the library and from every collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the game does not resolve or the library cannot be saved.
    pub fn remove_game(&mut self, id_or_prefix: &str) -> Result<GameEntry> {
        let index = self.game_index(id_or_prefix)?;
        let removed = self.commit(|library| {
            let removed = library.games.remove(index);
            for collection in &mut library.collections {
                collection.game_ids.retain(|id| id != &removed.id);
            }
            Ok(removed)
        })?;
        tracing::info!(id = %removed.id, "game removed");
        Ok(removed)
    }

    /// Set a 1-5 rating.
    ///
    /// # Errors
    ///
    /// [`ShelfError::Invalid`] for ratings outside 1..=5.
    pub fn set_rating(&mut self, id_or_prefix: &str, rating: u8) -> Result<()> {
        if !(1..=5).contains(&rating) {
            return Err(ShelfError::Invalid(format!(
                "rating must be between 1 and 5, got {rating}"
            )));
        }
        self.update_user(id_or_prefix, |user| user.rating = Some(rating))
    }

    /// Replace the notes. Blank text clears them.
    ///
    /// # Errors
    ///
    /// Returns an error if the game does not resolve or the library cannot be saved.
    pub fn set_notes(&mut self, id_or_prefix: &str, notes: &str) -> Result<()> {
        let notes = notes.trim();
        let notes = (!notes.is_empty()).then(|| notes.to_owned());
        self.update_user(id_or_prefix, |user| user.notes = notes)
    }

    /// Add a tag. Tags are case-insensitive; adding an existing tag is a no-op.
    ///
    /// # Errors
    ///
    /// [`ShelfError::Invalid`] for a blank tag.
    pub fn add_tag(&mut self, id_or_prefix: &str, tag: &str) -> Result<()> {
        let tag = normalize_tag(tag)?;
        self.update_user(id_or_prefix, |user| {
            user.tags.insert(tag);
        })
    }

    /// Remove a tag. Removing a tag the game does not carry is a no-op.
    ///
    /// # Errors
    ///
    /// [`ShelfError::Invalid`] for a blank tag.
    pub fn remove_tag(&mut self, id_or_prefix: &str, tag: &str) -> Result<()> {
        let tag = normalize_tag(tag)?;
        self.update_user(id_or_prefix, |user| {
            user.tags.remove(&tag);
        })
    }

    /// Set the play status.
    ///
    /// # Errors
    ///
    /// Returns an error if the game does not resolve or the library cannot be saved.
    pub fn set_status(&mut self, id_or_prefix: &str, status: PlayStatus) -> Result<()> {
        self.update_user(id_or_prefix, |user| user.status = status)
    }

    /// Games carrying `tag`.
    pub fn games_with_tag(&self, tag: &str) -> Vec<&GameEntry> {
        let tag = tag.trim().to_lowercase();
        self.library
            .games
            .iter()
            .filter(|g| g.user.tags.contains(&tag))
            .collect()
    }

    // ---- collections ----

    /// Create an empty collection and return its id.
    ///
    /// # Errors
    ///
    /// [`ShelfError::Invalid`] for a blank name or a name already in use.
    pub fn create_collection(&mut self, name: &str, description: Option<&str>) -> Result<String> {
        let name = self.available_name(name, None)?;
        let collection = Collection {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_owned),
            created_at: Utc::now(),
            game_ids: Vec::new(),
        };
        let id = collection.id.clone();
        let name = collection.name.clone();
        self.commit(|library| {
            library.collections.push(collection);
            Ok(())
        })?;
        tracing::info!(id = %id, name = %name, "collection created");
        Ok(id)
    }

    /// Rename a collection.
    ///
    /// # Errors
    ///
    /// [`ShelfError::NotFound`] if `name` does not exist, [`ShelfError::Invalid`]
    /// if `new_name` is blank or taken by another collection.
    pub fn rename_collection(&mut self, name: &str, new_name: &str) -> Result<()> {
        let index = self.collection_index(name)?;
        let new_name = self.available_name(new_name, Some(index))?;
        self.commit(|library| {
            library.collections[index].name = new_name;
            Ok(())
        })
    }

    /// Delete a collection. The games themselves stay in the library.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist or the library cannot be saved.
    pub fn delete_collection(&mut self, name: &str) -> Result<Collection> {
        let index = self.collection_index(name)?;
        let removed = self.commit(|library| Ok(library.collections.remove(index)))?;
        tracing::info!(id = %removed.id, name = %removed.name, "collection deleted");
        Ok(removed)
    }

    /// All collections in creation order.
    pub fn list_collections(&self) -> &[Collection] {
        &self.library.collections
    }

    /// Find a collection by name, case-insensitively.
    pub fn find_collection(&self, name: &str) -> Option<&Collection> {
        let index = self.collection_index(name).ok()?;
        self.library.collections.get(index)
    }

    /// Append a game to a collection. Adding a game twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection or game does not resolve, or the
    /// library cannot be saved.
    pub fn add_to_collection(&mut self, name: &str, game_id_or_prefix: &str) -> Result<()> {
        let index = self.collection_index(name)?;
        let game_id = self.resolve_game(game_id_or_prefix)?.id.clone();
        if self.library.collections[index].game_ids.contains(&game_id) {
            return Ok(());
        }
        self.commit(|library| {
            library.collections[index].game_ids.push(game_id);
            Ok(())
        })
    }

    /// Remove a game from a collection.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection or game does not resolve, or the
    /// library cannot be saved.
    pub fn remove_from_collection(&mut self, name: &str, game_id_or_prefix: &str) -> Result<()> {
        let index = self.collection_index(name)?;
        let game_id = self.resolve_game(game_id_or_prefix)?.id.clone();
        if !self.library.collections[index].game_ids.contains(&game_id) {
            return Ok(());
        }
        self.commit(|library| {
            library.collections[index]
                .game_ids
                .retain(|id| id != &game_id);
            Ok(())
        })
    }

    /// Games in a collection, in collection order.
    ///
    /// # Errors
    ///
    /// [`ShelfError::NotFound`] if the collection does not exist.
    pub fn collection_games(&self, name: &str) -> Result<Vec<&GameEntry>> {
        let index = self.collection_index(name)?;
        Ok(self.library.collections[index]
            .game_ids
            .iter()
            .filter_map(|id| self.get_game(id))
            .collect())
    }

    // ---- internals ----

    fn game_index(&self, id_or_prefix: &str) -> Result<usize> {
        let needle = id_or_prefix.trim();
        if needle.is_empty() {
            return Err(ShelfError::Invalid("game id must not be empty".into()));
        }
        if let Some(index) = self.library.games.iter().position(|g| g.id == needle) {
            return Ok(index);
        }
        let mut matches = self
            .library
            .games
            .iter()
            .enumerate()
            .filter(|(_, g)| g.id.starts_with(needle))
            .map(|(i, _)| i);
        match (matches.next(), matches.next()) {
            (Some(index), None) => Ok(index),
            (Some(_), Some(_)) => Err(ShelfError::Invalid(format!(
                "game id prefix {needle} is ambiguous"
            ))),
            (None, _) => Err(ShelfError::NotFound(format!("game {needle}"))),
        }
    }

    fn collection_index(&self, name: &str) -> Result<usize> {
        let wanted = name.trim().to_lowercase();
        self.library
            .collections
            .iter()
            .position(|c| c.name.to_lowercase() == wanted)
            .ok_or_else(|| ShelfError::NotFound(format!("collection {}", name.trim())))
    }

    /// Validate a collection name. `except` is the index of a collection
    /// allowed to hold the name already (for renames).
    fn available_name(&self, name: &str, except: Option<usize>) -> Result<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ShelfError::Invalid("collection name must not be empty".into()));
        }
        let lowered = name.to_lowercase();
        let taken = self
            .library
            .collections
            .iter()
            .enumerate()
            .any(|(i, c)| Some(i) != except && c.name.to_lowercase() == lowered);
        if taken {
            return Err(ShelfError::Invalid(format!(
                "a collection named {name} already exists"
            )));
        }
        Ok(name.to_owned())
    }

    fn update_user(&mut self, id_or_prefix: &str, apply: impl FnOnce(&mut UserData)) -> Result<()> {
        let index = self.game_index(id_or_prefix)?;
        self.commit(|library| {
            apply(&mut library.games[index].user);
            Ok(())
        })?;
        tracing::debug!(id = %self.library.games[index].id, "user data updated");
        Ok(())
    }

    /// Apply `change` to a copy of the library, write the copy, and only
    /// then make it current. A failed write leaves memory as it was.
    fn commit<T>(&mut self, change: impl FnOnce(&mut Library) -> Result<T>) -> Result<T> {
        let mut next = self.library.clone();
        let value = change(&mut next)?;
        write_library(&self.path, &next)?;
        self.library = next;
        Ok(value)
    }
}

/// Atomically write `library` to `path` (temp file, fsync, rename).
fn write_library(path: &Path, library: &Library) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ShelfError::Store(format!(
                    "failed to create library directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    let json = serde_json::to_string_pretty(library)
        .map_err(|e| ShelfError::Store(format!("failed to serialize library: {e}")))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "library.json".to_owned());
    let tmp_path = path.with_file_name(format!(".{file_name}.tmp"));
    std::fs::write(&tmp_path, json.as_bytes()).map_err(|e| {
        ShelfError::Store(format!(
            "failed to write temp file {}: {e}",
            tmp_path.display()
        ))
    })?;

    if let Ok(file) = std::fs::File::open(&tmp_path) {
        let _ = file.sync_all();
    }

    std::fs::rename(&tmp_path, path).map_err(|e| {
        ShelfError::Store(format!(
            "failed to rename temp file to {}: {e}",
            path.display()
        ))
    })?;
    tracing::trace!(path = %path.display(), "library saved");
    Ok(())
}

fn normalize_tag(tag: &str) -> Result<String> {
    let tag = tag.trim().to_lowercase();
    if tag.is_empty() {
        return Err(ShelfError::Invalid("tag must not be empty".into()));
    }
    Ok(tag)
}
