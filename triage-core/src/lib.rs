pub mod api;
pub mod config;
pub mod controller;
pub mod error;
pub mod filter;
pub mod http;
pub mod state;

pub use api::IncidentApi;
pub use config::ClientConfig;
pub use controller::{PostmortemDispatch, RefreshReport, ReloadOutcome, TriageController};
pub use error::{ConfigError, FetchFailure};
pub use filter::{FilterState, FilterUpdate, ListQuery};
pub use http::HttpIncidentApi;
pub use state::{Busy, BusyFlags, CacheProvenance, PostmortemResult, SessionState};
