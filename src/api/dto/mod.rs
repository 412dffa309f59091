//! Data Transfer Objects for REST response serialization.

pub mod status_dto;

pub use status_dto::*;
