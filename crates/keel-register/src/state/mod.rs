//! # Register State
//!
//! State containers owned by the register layer.

pub mod bills;

pub use bills::{Bill, BillSlots, BillUpdate, SessionState};
