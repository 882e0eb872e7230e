use etl_config::shared::CheckpointConfig;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::checkpoint::CheckpointStore;
use crate::error::{ErrorKind, EtlResult};
use crate::{bail, etl_error};
use crate::types::Position;

/// Name of the checkpoint file inside the data directory.
const CHECKPOINT_FILE_NAME: &str = "checkpoint.json";

/// Name of the file written before atomically replacing the checkpoint file.
const CHECKPOINT_TEMP_FILE_NAME: &str = "checkpoint.json.tmp";

/// Checkpoint store persisting the position as JSON in a data directory.
///
/// Saves write a temporary file, sync it, and rename it over `checkpoint.json`, so a crash leaves
/// either the previous or the new checkpoint on disk.
#[derive(Debug, Clone)]
pub struct FileCheckpointStore {
    path: PathBuf,
    temp_path: PathBuf,
    position: Arc<Mutex<Position>>,
}

impl FileCheckpointStore {
    /// Opens the store in the configured `data_dir`, see [`FileCheckpointStore::open`].
    ///
    /// Fails with [`ErrorKind::ConfigError`] when no data directory is configured.
    pub async fn from_config(
        config: &CheckpointConfig,
        initial_position: Position,
    ) -> EtlResult<Self> {
        let Some(data_dir) = &config.data_dir else {
            bail!(
                ErrorKind::ConfigError,
                "File checkpoint store requires a data directory",
                "checkpoint.data_dir is not set"
            );
        };

        Self::open(data_dir, initial_position).await
    }

    /// Opens the store in `data_dir`, creating the directory when missing.
    ///
    /// The persisted position is loaded when present, otherwise the store starts at
    /// `initial_position`.
    pub async fn open(data_dir: impl AsRef<Path>, initial_position: Position) -> EtlResult<Self> {
        let data_dir = data_dir.as_ref();
        tokio::fs::create_dir_all(data_dir).await?;

        let path = data_dir.join(CHECKPOINT_FILE_NAME);
        let temp_path = data_dir.join(CHECKPOINT_TEMP_FILE_NAME);

        let position = match tokio::fs::read(&path).await {
            Ok(content) => {
                let position: Position = serde_json::from_slice(&content).map_err(|err| {
                    etl_error!(
                        ErrorKind::CheckpointLoadFailed,
                        "Checkpoint file is corrupted",
                        path.display(),
                        source: err
                    )
                })?;

                info!(%position, path = %path.display(), "loaded checkpoint");

                position
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(position = %initial_position, "no checkpoint found, starting from initial position");

                initial_position
            }
            Err(err) => {
                return Err(etl_error!(
                    ErrorKind::CheckpointLoadFailed,
                    "Checkpoint file could not be read",
                    path.display(),
                    source: err
                ));
            }
        };

        Ok(Self {
            path,
            temp_path,
            position: Arc::new(Mutex::new(position)),
        })
    }

    /// Returns the path of the checkpoint file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn write_atomically(&self, content: &[u8]) -> std::io::Result<()> {
        let mut file = tokio::fs::File::create(&self.temp_path).await?;
        file.write_all(content).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&self.temp_path, &self.path).await
    }
}

impl CheckpointStore for FileCheckpointStore {
    async fn update_position(&self, position: Position) -> EtlResult<()> {
        *self.position.lock().await = position;

        Ok(())
    }

    async fn save(&self) -> EtlResult<()> {
        let position = self.position.lock().await.clone();
        let content = serde_json::to_vec(&position).map_err(|err| {
            etl_error!(
                ErrorKind::CheckpointSaveFailed,
                "Checkpoint could not be serialized",
                position,
                source: err
            )
        })?;

        self.write_atomically(&content).await.map_err(|err| {
            etl_error!(
                ErrorKind::CheckpointSaveFailed,
                "Checkpoint could not be written",
                self.path.display(),
                source: err
            )
        })?;

        debug!(%position, "saved checkpoint");

        Ok(())
    }

    async fn current_position(&self) -> EtlResult<Position> {
        Ok(self.position.lock().await.clone())
    }
}
