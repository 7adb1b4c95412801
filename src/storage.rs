use std::fmt::{Display, Formatter};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use tracing::{error, warn};

use crate::domain::{AppData, seed_data};

pub const DATA_FILE: &str = "data.json";
const SHARE_URL_FILE: &str = "share_url.txt";

#[derive(Debug)]
pub enum StorageError {
    Io(std::io::Error),
    JsonDecode(serde_json::Error),
    JsonEncode(serde_json::Error),
}

impl Display for StorageError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(err) => write!(f, "io error: {err}"),
            StorageError::JsonDecode(err) => write!(f, "failed to parse data file: {err}"),
            StorageError::JsonEncode(err) => write!(f, "failed to encode data: {err}"),
        }
    }
}

impl std::error::Error for StorageError {}

// Read failures of any kind fall back to the seeded defaults; the caller
// never sees an error from loading.
pub fn load_data(path: &Path) -> AppData {
    match read_data(path) {
        Ok(Some(data)) => {
            if data.users.is_empty() {
                warn!("data file {} holds no users, reseeding", path.display());
                seed_data()
            } else {
                data
            }
        }
        Ok(None) => seed_data(),
        Err(err) => {
            warn!("failed to load {}: {err}, using defaults", path.display());
            seed_data()
        }
    }
}

fn read_data(path: &Path) -> Result<Option<AppData>, StorageError> {
    let raw = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(StorageError::Io(err)),
    };

    if raw.trim().is_empty() {
        return Ok(None);
    }

    serde_json::from_str(&raw)
        .map(Some)
        .map_err(StorageError::JsonDecode)
}

pub fn save_data(path: &Path, data: &AppData) -> Result<(), StorageError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }
    }

    let encoded = serde_json::to_string(data).map_err(StorageError::JsonEncode)?;
    fs::write(path, encoded).map_err(StorageError::Io)
}

pub fn export_data(
    data: &AppData,
    out_dir: &Path,
    today: NaiveDate,
) -> Result<PathBuf, StorageError> {
    let path = out_dir.join(format!("dev-rating-backup-{}.json", today.format("%Y-%m-%d")));
    let encoded = serde_json::to_string_pretty(data).map_err(StorageError::JsonEncode)?;
    fs::write(&path, encoded).map_err(StorageError::Io)?;
    Ok(path)
}

pub fn load_share_url(data_dir: &Path) -> Option<String> {
    let raw = match fs::read_to_string(data_dir.join(SHARE_URL_FILE)) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return None,
        Err(err) => {
            warn!("failed to read share url: {err}");
            return None;
        }
    };

    let url = raw.trim().to_string();
    if url.is_empty() { None } else { Some(url) }
}

pub fn save_share_url(data_dir: &Path, url: &str) -> Result<(), StorageError> {
    fs::create_dir_all(data_dir).map_err(StorageError::Io)?;
    fs::write(data_dir.join(SHARE_URL_FILE), url).map_err(StorageError::Io)
}

// Every mutation goes through update(), which persists the whole tree
// afterwards. Write failures are logged and swallowed: the in-memory tree
// stays the source of truth for the running process.
pub struct Store {
    path: PathBuf,
    data: AppData,
}

impl Store {
    pub fn open(path: PathBuf) -> Self {
        let data = load_data(&path);
        Self { path, data }
    }

    pub fn data(&self) -> &AppData {
        &self.data
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn update<T>(&mut self, apply: impl FnOnce(&mut AppData) -> T) -> T {
        let result = apply(&mut self.data);
        if let Err(err) = save_data(&self.path, &self.data) {
            error!("failed to save {}: {err}", self.path.display());
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};
    use tempfile::TempDir;

    use crate::domain::{AppData, Session, seed_data};

    use super::{
        Store, export_data, load_data, load_share_url, save_data, save_share_url,
    };

    fn sample_session() -> Session {
        Session {
            id: "sess_1".to_string(),
            subject_id: "sub_1".to_string(),
            date: NaiveDate::from_ymd_opt(2026, 3, 1).unwrap(),
            duration_seconds: 1500,
            goal_id: None,
            notes: Some("reading".to_string()),
            timestamp: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[test]
    fn missing_file_seeds_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let data = load_data(&dir.path().join("data.json"));
        assert_eq!(data.users.len(), 2);
        assert_eq!(data.current_user_id, "user_1");
    }

    #[test]
    fn corrupt_file_seeds_defaults() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");
        std::fs::write(&path, "{not json").expect("write");
        let data = load_data(&path);
        assert_eq!(data.users.len(), 2);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("nested").join("data.json");

        let mut data = seed_data();
        data.add_session(sample_session());
        data.switch_user("user_2");
        save_data(&path, &data).expect("save");

        let loaded = load_data(&path);
        assert_eq!(loaded.current_user_id, "user_2");
        assert_eq!(loaded.users[0].sessions.len(), 1);
        assert_eq!(loaded.users[0].sessions[0].notes.as_deref(), Some("reading"));
    }

    #[test]
    fn export_writes_a_date_stamped_backup() {
        let dir = TempDir::new().expect("temp dir");
        let data = seed_data();
        let today = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();

        let path = export_data(&data, dir.path(), today).expect("export");
        assert_eq!(
            path.file_name().and_then(|name| name.to_str()),
            Some("dev-rating-backup-2026-03-05.json")
        );

        let raw = std::fs::read_to_string(&path).expect("read");
        let decoded: AppData = serde_json::from_str(&raw).expect("decode");
        assert_eq!(decoded.users.len(), 2);
        assert!(raw.contains('\n'));
    }

    #[test]
    fn share_url_round_trips() {
        let dir = TempDir::new().expect("temp dir");
        assert_eq!(load_share_url(dir.path()), None);

        save_share_url(dir.path(), "https://example.test/app").expect("save");
        assert_eq!(
            load_share_url(dir.path()),
            Some("https://example.test/app".to_string())
        );
    }

    #[test]
    fn store_persists_after_every_update() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("data.json");

        let mut store = Store::open(path.clone());
        let id = store.update(|data| data.add_subject("Music".to_string()));

        let reloaded = load_data(&path);
        assert!(reloaded.current_user().subject(&id).is_some());
    }

    #[test]
    fn store_survives_unwritable_paths() {
        let dir = TempDir::new().expect("temp dir");
        // A directory at the data path makes every save fail.
        let path = dir.path().join("data.json");
        std::fs::create_dir_all(&path).expect("block path");

        let mut store = Store::open(path);
        store.update(|data| data.add_subject("Music".to_string()));
        assert_eq!(store.data().current_user().subjects.len(), 4);
    }
}
