//! HTTP layer: the Reya REST client, the fallback klines client and a
//! REST-polled depth transport.

pub mod binance;
pub mod client;
pub mod polling;

pub use binance::BinanceKlines;
pub use client::ReyaHttp;
pub use polling::RestPollingTransport;
