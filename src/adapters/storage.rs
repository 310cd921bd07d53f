use crate::domain::ports::Storage;
use std::fs;
use std::io;
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.resolve(path))
    }

    // 同名檔案直接覆寫，不加鎖
    async fn write_file(&self, path: &str, data: &[u8]) -> io::Result<()> {
        fs::write(self.resolve(path), data)
    }

    fn resolve(&self, path: &str) -> PathBuf {
        self.base_path.join(path)
    }
}
