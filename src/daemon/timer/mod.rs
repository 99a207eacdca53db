//! Periodic event sources. Each [ticker::Ticker] fires one event per period and stops on
//! shutdown.

pub mod ticker;
