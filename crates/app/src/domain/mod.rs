//! Emporium Domain Concerns

pub mod caller;
pub mod customers;
pub mod orders;
pub mod products;
pub mod stock;
pub mod tenants;
