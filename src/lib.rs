pub mod auth;
pub mod cli;
pub mod commands;
pub mod config;
pub mod display;
pub mod error;
pub mod logging;
pub mod opener;
pub mod remote;
pub mod requests;
pub mod session;

pub use auth::{AuthGate, UserSlot};
pub use config::Config;
pub use error::{QvaultError, Result};
pub use opener::{ClipboardOpener, NoopOpener, Opener, SystemOpener};
pub use remote::{
    CatalogClient, HttpCatalog, PaperQuery, PaperRequest, PaperRequestForm, PaperSummary,
    RequestStatus, User,
};
pub use requests::{RequestDesk, RequestOutcome};
pub use session::{
    ActionOutcome, ActionReport, FilterKey, Filters, Location, MemoryLocation, QueryState,
    RetryAction, SearchIntent, SearchSession, SessionError, SessionOptions, SessionSnapshot,
    ViewKind,
};
