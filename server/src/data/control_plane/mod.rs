//! Control plane REST client
//!
//! One immutable client is built from [`ControlPlaneConfig`](crate::core::config::ControlPlaneConfig)
//! and handed to every component. Calls come in two flavours: [`ControlPlaneClient::fetch`]
//! decodes the raw body into a typed value for internal use, while
//! [`ControlPlaneClient::present`] shapes the body for an assistant and renders it as text.

mod client;
mod error;
mod request;
mod types;

pub use client::ControlPlaneClient;
pub use error::ControlPlaneError;
pub use request::{ApiRequest, Presented, Shape};
pub use types::{ListResponse, ResourceId};
