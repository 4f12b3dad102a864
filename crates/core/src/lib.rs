pub mod error;
pub mod types;

pub use error::SourceError;
pub use types::{Link, LinkKind, ParsedEpisode, QualityTier};
