pub mod error;
pub mod manager;
pub mod traits;
pub mod types;

pub use error::ProviderError;
pub use manager::ProviderManager;
pub use traits::{RadioSource, TrackProvider};
pub use types::{FetchedTrack, ProviderId};
