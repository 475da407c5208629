//! Thin client for the Sunny Portal day-data services.
//!
//! Only the operations the export and upload tools consume are exposed:
//! listing plants, fetching one day of interval power measurements, and
//! fetching one day's energy balance. Session handling, request plumbing
//! and unit conversion stay behind [`Client`].

pub mod client;
pub mod models;

pub use client::{Client, PortalError};
pub use models::{DayEnergyBalance, DayOverview, Plant, PowerReading};
