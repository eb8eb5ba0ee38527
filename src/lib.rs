//! Administrative backend for the Wingz ride-hailing platform.
//!
//! The core is the ride query subsystem: a declarative [`query::RideQuerySet`]
//! built by pluggable [`filters`] backends, executed by a [`store::RideStore`]
//! with filtering, distance annotation and sorting pushed into the store, and
//! assembled by [`views::RideViewSet`] with paginated envelopes and a nested
//! 24-hour event view. Everything is exposed over HTTP behind bearer-token
//! authentication and an admin-only permission class.

pub mod auth;
pub mod config;
pub mod error;
pub mod events;
pub mod filters;
pub mod geo;
pub mod http;
pub mod middleware;
pub mod models;
pub mod pagination;
pub mod permissions;
pub mod query;
pub mod routes;
pub mod serializers;
pub mod server;
pub mod store;
pub mod validators;
pub mod views;
