pub mod parser;
pub mod quality;
pub mod scan;
pub mod walk;

pub use parser::{ShowEpisodeTitle, extract_episode, extract_show_episode_title};
pub use quality::{classify_quality, resolve_quality};
pub use scan::{ShowFile, scan_dir};
