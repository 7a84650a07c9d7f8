//! Scheduling, capacity and cancellation-fee core for a cleaning-service
//! booking platform. Route handlers, notifications and payment processors
//! live in the surrounding application; this crate owns the booking rules.

pub mod config;
pub mod db;
pub mod models;
pub mod services;
