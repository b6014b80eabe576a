use crate::error::AppError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::fs;

/// Where uploaded proof-of-payment files end up. The order only keeps
/// the returned path string.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn store(&self, key: &str, data: Vec<u8>) -> Result<String, AppError>;
}

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub async fn new(base_path: impl Into<PathBuf>) -> Result<Self, AppError> {
        let base_path = base_path.into();
        if !base_path.exists() {
            fs::create_dir_all(&base_path).await?;
        }
        Ok(Self { base_path })
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(&self, key: &str, data: Vec<u8>) -> Result<String, AppError> {
        let path = self.base_path.join(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, data).await?;
        Ok(path.to_string_lossy().into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stores_file_and_returns_path() {
        let dir = std::env::temp_dir().join(format!("storage-test-{}", uuid::Uuid::new_v4()));
        let storage = LocalStorage::new(&dir).await.unwrap();

        let path = storage
            .store("proofs/receipt.png", vec![1, 2, 3])
            .await
            .unwrap();

        let data = fs::read(&path).await.unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }
}
