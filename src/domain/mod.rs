//! Domain modules organized as vertical slices.
//!
//! Each sub-module contains:
//! - `mod.rs`: Rich domain types (validated, interface-contract shaped)
//! - `wire.rs`: Raw serde structs matching backend responses
//! - `convert.rs`: `TryFrom`/`From` conversions with validation
//! - stateful components (`cache.rs`, `router.rs`, `reader.rs`, `gateway.rs`)
//! - `client.rs`: Sub-client exposed by `ReyaExchange`

pub mod account;
pub mod candle;
pub mod market;
pub mod order;
pub mod orderbook;
