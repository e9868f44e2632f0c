//! Pulseboard Core: dashboard records, source adapters, fallback policy.
//!
//! This crate holds everything one refresh tick needs below the aggregator:
//! - Canonical records (metric cards, chart points, campaign rows, channel
//!   slices) and the immutable `Snapshot` that bundles them
//! - Number formatting shared by every adapter
//! - The `JsonTransport` seam with a `reqwest` client and a fixture transport
//! - Adapters for CoinGecko, CoinCap, JSONPlaceholder, OpenWeatherMap and a
//!   synthetic generator
//! - The fallback policy and its substitute data

pub mod data;
pub mod domain;
pub mod fallback;
pub mod format;
pub mod rng;
