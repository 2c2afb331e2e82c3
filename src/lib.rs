//! Folio: a typed data-access layer for a bookstore catalog HTTP API.
//!
//! The crate is organised in four layers, leaf first:
//!
//! - [`client`]: a configured HTTP transport plus one method per API
//!   endpoint, with coarse error classification and request/response logging.
//! - [`cache`]: a keyed query cache with staleness windows, request
//!   deduplication, and explicit invalidation.
//! - [`service`]: read operations backed by the cache, and mutations that
//!   invalidate the affected cache scopes and emit user-facing notifications.
//! - [`config`] / [`infra`]: layered settings and telemetry bootstrap.
//!
//! Consumers construct one [`client::ApiClient`], one [`cache::QueryCache`],
//! and one [`service::CatalogService`] per process and share them by `Arc`;
//! nothing in this crate is an ambient singleton.

pub mod cache;
pub mod client;
pub mod config;
pub mod domain;
pub mod infra;
pub mod service;
