//! Query/state synchronization engine for the employee directory.
//!
//! The presentation layer forwards user intents into a [`DirectoryClient`]
//! and renders [`DirectorySnapshot`]s; list and detail queries run against a
//! [`DirectoryService`] in the background and are reconciled with the state
//! when they settle.

pub mod client;
pub mod settings;
pub mod state;
pub mod transport;

pub use client::{
    classify_failure, wait_for_detail, wait_for_list, DirectoryClient, DirectoryEvent,
    DirectoryHandle, QueryKind,
};
pub use settings::{
    load_settings, load_settings_from, ClientSettings, FailureReporting, ResponseOrdering,
    SettingsError,
};
pub use state::{
    DetailTicket, DirectorySnapshot, DirectoryState, Generation, ListState, ListTicket,
    ModalState, QueryState, Settlement,
};
pub use transport::{DirectoryService, HttpDirectoryService, UnavailableDirectoryService};
