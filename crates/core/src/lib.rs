pub mod config;
pub mod error;
pub mod ids;
pub mod properties;

pub use config::AppConfig;
pub use error::{AudienceError, AudienceResult};
pub use ids::IdSource;
