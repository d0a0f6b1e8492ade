use std::path::PathBuf;

/// Store configuration for opening an on-disk database.
#[derive(Debug, Clone)]
pub struct Config {
    pub base_path: PathBuf,
}

impl Config {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// Database file for a schema: `<base_path>/<schema_name>.redb`.
    pub fn db_path(&self, schema_name: &str) -> PathBuf {
        self.base_path.join(format!("{schema_name}.redb"))
    }
}
