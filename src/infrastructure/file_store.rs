// File-backed generation store
use crate::application::errors::StoreError;
use crate::application::generation_store::GenerationStore;
use crate::domain::generation::GenerationId;
use crate::domain::sample::Window;
use crate::infrastructure::thrift_codec::{decode_window, encode_window};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;

/// One Thrift-encoded window per file, named `<base_name>-<index>` inside
/// `directory`.
#[derive(Debug, Clone)]
pub struct FileGenerationStore {
    directory: PathBuf,
}

impl FileGenerationStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn path_for(&self, generation: &GenerationId) -> PathBuf {
        self.directory.join(generation.to_string())
    }

    fn temp_path_for(&self, generation: &GenerationId) -> PathBuf {
        self.directory.join(format!(".{}.tmp", generation))
    }

    async fn write_temp(&self, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(path).await?;
        file.write_all(bytes).await?;
        file.sync_all().await
    }
}

fn io_error(generation: &GenerationId, source: std::io::Error) -> StoreError {
    StoreError::Io {
        generation: generation.to_string(),
        source,
    }
}

#[async_trait]
impl GenerationStore for FileGenerationStore {
    async fn load(&self, generation: &GenerationId) -> Result<Window, StoreError> {
        let path = self.path_for(generation);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "Generation file not found, using empty window");
                return Ok(Window::default());
            }
            Err(e) => return Err(io_error(generation, e)),
        };

        let window = decode_window(&bytes).map_err(|e| StoreError::CorruptStore {
            generation: generation.to_string(),
            reason: e.to_string(),
        })?;

        tracing::debug!(generation = %generation, samples = window.len(), "Loaded generation");
        Ok(window)
    }

    async fn save(&self, generation: &GenerationId, window: &Window) -> Result<(), StoreError> {
        let path = self.path_for(generation);
        let bytes = encode_window(window).map_err(|e| {
            io_error(generation, std::io::Error::new(ErrorKind::InvalidData, e))
        })?;

        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|e| io_error(generation, e))?;

        // Readers only ever see a fully written file. Linking the temp file
        // into place fails if the generation exists, unlike rename.
        let temp_path = self.temp_path_for(generation);
        let published = match self.write_temp(&temp_path, &bytes).await {
            Ok(()) => tokio::fs::hard_link(&temp_path, &path).await,
            Err(e) => Err(e),
        };
        let _ = tokio::fs::remove_file(&temp_path).await;

        match published {
            Ok(()) => {
                tracing::debug!(path = %path.display(), bytes = bytes.len(), "Wrote generation file");
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Err(StoreError::AlreadyExists {
                generation: generation.to_string(),
            }),
            Err(e) => Err(io_error(generation, e)),
        }
    }

    async fn latest(&self, base_name: &str) -> Result<Option<GenerationId>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.directory).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(StoreError::Io {
                    generation: format!("{}-*", base_name),
                    source: e,
                });
            }
        };

        let mut latest: Option<GenerationId> = None;
        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    return Err(StoreError::Io {
                        generation: format!("{}-*", base_name),
                        source: e,
                    });
                }
            };

            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(found) = GenerationId::parse(base_name, file_name) {
                if latest.as_ref().is_none_or(|l| found.index() > l.index()) {
                    latest = Some(found);
                }
            }
        }

        Ok(latest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::sample::Sample;

    fn window() -> Window {
        Window::new(vec![
            Sample::new("1700000000", "10:00 PM", 12.5),
            Sample::new("1700000480", "10:08 PM", 64.0),
        ])
    }

    #[tokio::test]
    async fn test_missing_generation_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGenerationStore::new(dir.path());

        let loaded = store.load(&GenerationId::first("trend")).await.unwrap();
        assert!(loaded.is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGenerationStore::new(dir.path());
        let generation = GenerationId::new("trend", 3);

        store.save(&generation, &window()).await.unwrap();

        assert!(dir.path().join("trend-3").exists());
        assert!(!dir.path().join(".trend-3.tmp").exists());
        assert_eq!(store.load(&generation).await.unwrap(), window());
    }

    #[tokio::test]
    async fn test_save_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGenerationStore::new(dir.path());
        let generation = GenerationId::first("trend");

        store.save(&generation, &window()).await.unwrap();
        let err = store.save(&generation, &Window::default()).await.unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(store.load(&generation).await.unwrap(), window());
    }

    #[tokio::test]
    async fn test_save_keeps_file_from_another_writer() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGenerationStore::new(dir.path());
        let target = dir.path().join("trend-1");
        std::fs::write(&target, b"written elsewhere").unwrap();

        let err = store
            .save(&GenerationId::new("trend", 1), &window())
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::AlreadyExists { .. }));
        assert_eq!(std::fs::read(&target).unwrap(), b"written elsewhere");
        assert!(!dir.path().join(".trend-1.tmp").exists());
    }

    #[tokio::test]
    async fn test_negative_string_length_is_corrupt() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGenerationStore::new(dir.path());
        std::fs::write(
            dir.path().join("trend-0"),
            [0x0f, 0, 1, 0x0c, 0, 0, 0, 1, 0x0b, 0, 1, 0xff, 0xff, 0xff, 0xff],
        )
        .unwrap();

        let err = store.load(&GenerationId::first("trend")).await.unwrap_err();
        assert!(matches!(err, StoreError::CorruptStore { .. }));
    }

    #[tokio::test]
    async fn test_save_creates_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGenerationStore::new(dir.path().join("nested").join("chain"));

        store.save(&GenerationId::first("trend"), &window()).await.unwrap();
        assert!(dir.path().join("nested/chain/trend-0").exists());
    }

    #[tokio::test]
    async fn test_corrupt_generation_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGenerationStore::new(dir.path());
        std::fs::write(dir.path().join("trend-0"), b"not a thrift window").unwrap();

        let err = store.load(&GenerationId::first("trend")).await.unwrap_err();
        assert!(matches!(err, StoreError::CorruptStore { .. }));
    }

    #[tokio::test]
    async fn test_unreadable_generation_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGenerationStore::new(dir.path());
        std::fs::create_dir(dir.path().join("trend-0")).unwrap();

        let err = store.load(&GenerationId::first("trend")).await.unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }

    #[tokio::test]
    async fn test_latest_picks_highest_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGenerationStore::new(dir.path());
        for index in [0, 2, 10, 9] {
            store
                .save(&GenerationId::new("trend", index), &window())
                .await
                .unwrap();
        }
        std::fs::write(dir.path().join("trend-99.bak"), b"").unwrap();
        std::fs::write(dir.path().join("other-50"), b"").unwrap();

        let latest = store.latest("trend").await.unwrap();
        assert_eq!(latest, Some(GenerationId::new("trend", 10)));
        assert_eq!(store.latest("missing").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_latest_on_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileGenerationStore::new(dir.path().join("absent"));
        assert_eq!(store.latest("trend").await.unwrap(), None);
    }
}
