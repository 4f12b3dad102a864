pub mod aggregate;
pub mod broadcasthenet;
pub mod credentials;
pub mod fetch;
pub mod guess;
pub mod iplay;
pub mod site;
pub mod source;

pub use aggregate::{Aggregator, LinkCollector, SearchOutcome, SourceReport, SourceStatus};
pub use credentials::CredentialStore;
pub use fetch::{Fetch, FetchError, FetchRequest, HttpFetcher, StaticFetcher};
pub use guess::{Extent, GuessedEpisode, GuessedShow, infer_calendar, observed_extent, synthesize_calendar};
pub use site::{Download, SiteClient};
pub use source::{LinkStream, SearchContext, Source, SourceInfo, SourceRegistry, SourceSelection};
