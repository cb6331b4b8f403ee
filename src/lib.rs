//! Savings Tracker - Savings goal tracking with live viewer synchronization
//!
//! Records are managed over a REST API. Every committed mutation is pushed,
//! together with recomputed goal statistics, to all viewers connected over
//! WebSocket.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
