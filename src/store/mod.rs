//! Persistence layer: JSON document store and typed repositories.
//!
//! [`DocumentStore`] owns the on-disk representation and knows nothing
//! about record shapes. [`SubscriberRepository`] and [`AlertRepository`]
//! supply the shapes for the three collections the notifier keeps.

pub mod alerts;
pub mod document_store;
pub mod subscribers;

pub use alerts::AlertRepository;
pub use document_store::DocumentStore;
pub use subscribers::SubscriberRepository;
