pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod realtime;
pub mod server;
pub mod service;
pub mod storage_adapter;

pub use config::{
    ApiConfig, AppConfig, LoggingConfig, PostgresStorageConfig, RealtimeConfig, ServerConfig,
    StorageBackend, StorageConfig,
};
pub use observability::{FilterSource, apply_logging_config, init_tracing};
pub use server::{AppState, CarebaseServer, ServerBuilder, build_app};
pub use service::ResourceService;
pub use storage_adapter::{StoreHandle, create_storage};
