//! File-based storage backend.
//!
//! One file per key under a base directory. Each file starts with a fixed
//! 64-byte header carrying a magic, a format version, and an expiration
//! timestamp so TTL survives restarts. Keys are hex-encoded into file names,
//! which keeps arbitrary key characters safe on every filesystem and makes
//! the mapping reversible for prefix listing.

use crate::{StorageError, StorageInterface};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::fs;
use tokio::sync::Mutex;

/// Fixed-size file header for TTL support.
///
/// Binary layout (64 bytes total):
/// - [0-3]: Magic bytes "SHOP"
/// - [4-5]: Version (u16, little-endian)
/// - [6-13]: Expiration timestamp (u64, little-endian, Unix seconds, 0 = never)
/// - [14-63]: Reserved
#[derive(Debug, Clone)]
struct FileHeader {
	expires_at: u64,
}

impl FileHeader {
	const MAGIC: &'static [u8; 4] = b"SHOP";
	const VERSION: u16 = 1;
	const SIZE: usize = 64;

	fn new(ttl: Option<Duration>) -> Self {
		let expires_at = match ttl {
			None => 0,
			Some(ttl) => now_unix().saturating_add(ttl.as_secs()),
		};
		Self { expires_at }
	}

	fn serialize(&self) -> [u8; Self::SIZE] {
		let mut bytes = [0u8; Self::SIZE];
		bytes[0..4].copy_from_slice(Self::MAGIC);
		bytes[4..6].copy_from_slice(&Self::VERSION.to_le_bytes());
		bytes[6..14].copy_from_slice(&self.expires_at.to_le_bytes());
		bytes
	}

	fn deserialize(bytes: &[u8]) -> Result<Self, StorageError> {
		if bytes.len() < Self::SIZE {
			return Err(StorageError::Backend("File too small for header".into()));
		}
		if &bytes[0..4] != Self::MAGIC {
			return Err(StorageError::Backend("Unrecognized file format".into()));
		}
		let version = u16::from_le_bytes([bytes[4], bytes[5]]);
		if version > Self::VERSION {
			return Err(StorageError::Backend(format!(
				"Unsupported file version: {}",
				version
			)));
		}
		let mut expires_bytes = [0u8; 8];
		expires_bytes.copy_from_slice(&bytes[6..14]);
		Ok(Self {
			expires_at: u64::from_le_bytes(expires_bytes),
		})
	}

	fn is_expired(&self) -> bool {
		self.expires_at != 0 && now_unix() >= self.expires_at
	}
}

fn now_unix() -> u64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.unwrap_or_default()
		.as_secs()
}

/// File-based storage implementation.
pub struct FileStorage {
	base_path: PathBuf,
	// Serializes read-compare-write sequences; a single-writer process is
	// the deployment model for this backend.
	write_lock: Mutex<()>,
}

impl FileStorage {
	/// Creates a new FileStorage rooted at `base_path`.
	pub fn new(base_path: impl Into<PathBuf>) -> Self {
		Self {
			base_path: base_path.into(),
			write_lock: Mutex::new(()),
		}
	}

	fn file_path(&self, key: &str) -> PathBuf {
		self.base_path.join(format!("{}.bin", hex::encode(key)))
	}

	fn key_from_path(path: &Path) -> Option<String> {
		let stem = path.file_stem()?.to_str()?;
		let bytes = hex::decode(stem).ok()?;
		String::from_utf8(bytes).ok()
	}

	async fn ensure_base_dir(&self) -> Result<(), StorageError> {
		fs::create_dir_all(&self.base_path)
			.await
			.map_err(|e| StorageError::Backend(format!("Cannot create base dir: {}", e)))
	}

	async fn read_entry(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
		let path = self.file_path(key);
		let contents = match fs::read(&path).await {
			Ok(contents) => contents,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
			Err(err) => return Err(StorageError::Backend(err.to_string())),
		};

		let header = FileHeader::deserialize(&contents)?;
		if header.is_expired() {
			// Reap lazily; a stale file must never serve reads.
			let _ = fs::remove_file(&path).await;
			return Ok(None);
		}
		Ok(Some(contents[FileHeader::SIZE..].to_vec()))
	}

	async fn write_entry(
		&self,
		key: &str,
		value: &[u8],
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		self.ensure_base_dir().await?;
		let header = FileHeader::new(ttl);
		let mut contents = Vec::with_capacity(FileHeader::SIZE + value.len());
		contents.extend_from_slice(&header.serialize());
		contents.extend_from_slice(value);

		let path = self.file_path(key);
		let tmp = path.with_extension("tmp");
		fs::write(&tmp, &contents)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;
		fs::rename(&tmp, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		self.read_entry(key).await?.ok_or(StorageError::NotFound)
	}

	async fn set_bytes(
		&self,
		key: &str,
		value: Vec<u8>,
		ttl: Option<Duration>,
	) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		self.write_entry(key, &value, ttl).await
	}

	async fn compare_and_swap(
		&self,
		key: &str,
		expected: Option<Vec<u8>>,
		value: Vec<u8>,
	) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		let current = self.read_entry(key).await?;
		match (&current, &expected) {
			(None, None) => {}
			(Some(current), Some(expected)) if current == expected => {}
			_ => return Err(StorageError::PreconditionFailed),
		}
		self.write_entry(key, &value, None).await
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let _guard = self.write_lock.lock().await;
		match fs::remove_file(self.file_path(key)).await {
			Ok(()) => Ok(()),
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(err) => Err(StorageError::Backend(err.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		Ok(self.read_entry(key).await?.is_some())
	}

	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(err) => return Err(StorageError::Backend(err.to_string())),
		};

		let mut keys = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension().and_then(|ext| ext.to_str()) != Some("bin") {
				continue;
			}
			if let Some(key) = Self::key_from_path(&path) {
				if key.starts_with(prefix) && self.exists(&key).await? {
					keys.push(key);
				}
			}
		}
		keys.sort();
		Ok(keys)
	}

	async fn cleanup_expired(&self) -> Result<usize, StorageError> {
		let _guard = self.write_lock.lock().await;
		let mut entries = match fs::read_dir(&self.base_path).await {
			Ok(entries) => entries,
			Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(0),
			Err(err) => return Err(StorageError::Backend(err.to_string())),
		};

		let mut removed = 0;
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension().and_then(|ext| ext.to_str()) != Some("bin") {
				continue;
			}
			let Ok(contents) = fs::read(&path).await else {
				continue;
			};
			if let Ok(header) = FileHeader::deserialize(&contents) {
				if header.is_expired() && fs::remove_file(&path).await.is_ok() {
					removed += 1;
				}
			}
		}
		Ok(removed)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn storage() -> (tempfile::TempDir, FileStorage) {
		let dir = tempfile::tempdir().unwrap();
		let storage = FileStorage::new(dir.path());
		(dir, storage)
	}

	#[tokio::test]
	async fn test_round_trip_and_delete() {
		let (_dir, storage) = storage();

		storage
			.set_bytes("orders:o1", b"payload".to_vec(), None)
			.await
			.unwrap();
		assert_eq!(
			storage.get_bytes("orders:o1").await.unwrap(),
			b"payload".to_vec()
		);

		storage.delete("orders:o1").await.unwrap();
		assert!(matches!(
			storage.get_bytes("orders:o1").await,
			Err(StorageError::NotFound)
		));

		// Deleting a missing key is not an error.
		storage.delete("orders:o1").await.unwrap();
	}

	#[tokio::test]
	async fn test_expired_entries_are_invisible() {
		let (_dir, storage) = storage();

		storage
			.set_bytes("denylist:t1", b"1".to_vec(), Some(Duration::ZERO))
			.await
			.unwrap();

		// TTL of zero expires immediately.
		assert!(!storage.exists("denylist:t1").await.unwrap());
		assert!(storage.list_keys("denylist:").await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_compare_and_swap_on_disk() {
		let (_dir, storage) = storage();

		storage
			.compare_and_swap("k", None, b"v1".to_vec())
			.await
			.unwrap();
		let result = storage
			.compare_and_swap("k", Some(b"nope".to_vec()), b"v2".to_vec())
			.await;
		assert!(matches!(result, Err(StorageError::PreconditionFailed)));

		storage
			.compare_and_swap("k", Some(b"v1".to_vec()), b"v2".to_vec())
			.await
			.unwrap();
		assert_eq!(storage.get_bytes("k").await.unwrap(), b"v2".to_vec());
	}

	#[tokio::test]
	async fn test_list_keys_round_trips_arbitrary_characters() {
		let (_dir, storage) = storage();

		for key in ["orders:id-1", "orders:id/2", "carts:user 3"] {
			storage.set_bytes(key, b"v".to_vec(), None).await.unwrap();
		}

		let keys = storage.list_keys("orders:").await.unwrap();
		assert_eq!(
			keys,
			vec!["orders:id-1".to_string(), "orders:id/2".to_string()]
		);
	}
}
