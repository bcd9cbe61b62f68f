pub mod cache;
pub mod client;

pub use cache::PosterCache;
pub use client::{HttpPosterSource, PosterClientOptions, PosterSource, ScrapeError, ScrapeOutcome};
