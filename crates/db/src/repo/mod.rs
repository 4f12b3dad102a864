pub mod shows;
pub mod sources;
