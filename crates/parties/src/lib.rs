//! Manufacturer and representative addresses.
//!
//! Business rules for the contact records a product points at: who makes it, and
//! who represents it on the EU and UK markets. Pure domain logic (no IO).

pub mod address;
pub mod jurisdiction;

pub use address::{Address, AddressInput, AddressKind};
pub use jurisdiction::{CountryCode, Market};
