//! Shared-document presentation sync.
//!
//! Slot metadata comes from the external document service; navigation is
//! persisted there first, then broadcast as `document-navigation`.

mod http;
mod service;
mod tracker;
mod types;

pub use http::HttpDocumentService;
pub use service::{DocumentService, NoDocuments};
pub use tracker::DocumentTracker;
pub use types::{
    DocumentSlot, NavigationAction, NavigationPayload, PresentationState, SlotEventPayload,
    SlotUpload,
};
