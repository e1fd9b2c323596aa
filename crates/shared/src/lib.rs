//! Core engine for the Hong Kong place-marker map.
//!
//! Everything in this crate is plain synchronous Rust with no UI or wasm
//! dependencies: the HK1980 Grid coordinate transformer, the persistent
//! marker store, the search-result merger and the cluster/spiderfication
//! layout engine. The frontend crate wires these into the browser.

pub mod cluster;
pub mod error;
pub mod models;
pub mod places;
pub mod projection;
pub mod search;
pub mod store;
