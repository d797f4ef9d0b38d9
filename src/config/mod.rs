mod settings;

pub use settings::{CiConfig, MigrateConfig, ScmConfig, StorageConfig, StorageKind};
