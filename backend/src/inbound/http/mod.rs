//! HTTP inbound adapter exposing REST endpoints.
//!
//! Handlers validate transport concerns (JSON shape, path ids, query strings)
//! and hand typed values to the driving ports held in [`state::HttpState`].

pub mod auth;
pub mod donations;
mod donations_dto;
pub mod error;
pub mod health;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod token_config;
pub mod users;
pub mod validation;

pub use error::ApiResult;
