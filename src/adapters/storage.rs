use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::path::Path;
use tokio::fs;

/// Files rooted at the configured data directory.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let full_path = Path::new(&self.base_path).join(path);
        let data = fs::read(full_path).await?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = Path::new(&self.base_path).join(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        fs::write(full_path, data).await?;
        Ok(())
    }

    async fn exists(&self, path: &str) -> bool {
        fs::try_exists(Path::new(&self.base_path).join(path))
            .await
            .unwrap_or(false)
    }

    async fn list(&self, dir: &str) -> Result<Vec<(String, u64)>> {
        let full_path = Path::new(&self.base_path).join(dir);
        let mut entries = match fs::read_dir(&full_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if metadata.is_file() {
                files.push((entry.file_name().to_string_lossy().into_owned(), metadata.len()));
            }
        }
        files.sort();
        Ok(files)
    }

    fn full_path(&self, path: &str) -> String {
        Path::new(&self.base_path)
            .join(path)
            .to_string_lossy()
            .into_owned()
    }
}

#[cfg(test)]
pub mod memory {
    //! In-memory storage for pipeline tests.

    use crate::domain::ports::Storage;
    use crate::utils::error::{PipelineError, Result};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    pub struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        pub async fn put_file(&self, path: &str, data: impl Into<Vec<u8>>) {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.into());
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                PipelineError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }

        async fn exists(&self, path: &str) -> bool {
            self.files.lock().await.contains_key(path)
        }

        async fn list(&self, dir: &str) -> Result<Vec<(String, u64)>> {
            let prefix = format!("{}/", dir.trim_end_matches('/'));
            let files = self.files.lock().await;
            let mut listed: Vec<(String, u64)> = files
                .iter()
                .filter_map(|(path, data)| {
                    let name = path.strip_prefix(&prefix)?;
                    (!name.contains('/')).then(|| (name.to_string(), data.len() as u64))
                })
                .collect();
            listed.sort();
            Ok(listed)
        }

        fn full_path(&self, path: &str) -> String {
            format!("memory://{}", path)
        }
    }
}
