//! Filtered-resource query and stats synchronization for the admin
//! dashboard screens.

pub mod adapters;
pub mod config;
pub mod credentials;
pub mod engine;
pub mod error;
pub mod filters;
pub mod mutation;
pub mod pagination;
pub mod query;
pub mod stats;
pub mod track;
pub mod transport;

pub use adapters::{AppealsAdapter, DonationsAdapter, ResourceAdapter, UsersAdapter, WalletAdapter};
pub use config::{load_settings, AuthScheme, EngineSettings};
pub use credentials::{
    CredentialProvider, EnvCredentialProvider, MissingCredentialProvider, StaticCredentialProvider,
};
pub use engine::{EngineEvent, MutationOutcome, QueryEngine, RefreshReport, ViewSnapshot};
pub use error::{MutationError, NetworkError, StaleResponseDiscarded, TrackKind, ValidationError};
pub use filters::{FilterCriteria, FilterStore};
pub use mutation::{MutationAction, MutationRequest};
pub use pagination::Pagination;
pub use stats::{StatCard, StatValue, StatsMap};
pub use track::TrackOutcome;
pub use transport::{ApiTransport, HttpMethod, HttpTransport, MissingTransport};
