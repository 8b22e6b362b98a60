// Adapters layer: concrete implementations of the domain ports (file storage, flat files, sqlite).

pub mod flat_file;
pub mod local_storage;
pub mod sqlite;

pub use flat_file::FlatFileStore;
pub use local_storage::LocalStorage;
pub use sqlite::SqliteStore;

#[cfg(test)]
pub(crate) mod test_support {
    use crate::domain::ports::Storage;
    use crate::utils::error::Result;
    use std::cell::RefCell;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct MemoryStorage {
        files: RefCell<HashMap<String, Vec<u8>>>,
    }

    impl MemoryStorage {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn put(&self, path: &str, contents: &str) {
            self.files
                .borrow_mut()
                .insert(path.to_string(), contents.as_bytes().to_vec());
        }

        pub fn text(&self, path: &str) -> Option<String> {
            self.files
                .borrow()
                .get(path)
                .map(|data| String::from_utf8_lossy(data).into_owned())
        }
    }

    impl Storage for MemoryStorage {
        fn read_file(&self, path: &str) -> Result<Option<Vec<u8>>> {
            Ok(self.files.borrow().get(path).cloned())
        }

        fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            self.files
                .borrow_mut()
                .insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }
}
