//! # keel-register: Session & Collaborator Layer for Keel POS
//!
//! The stateful and asynchronous half of the sale pricing and returns
//! engine. All pricing math lives in `keel-core`; this crate holds the
//! nine-slot bill session, the debounced tax recomputation, and the
//! checkout/returns handoffs to the backoffice collaborators.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         keel-register                                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │  SessionState (9 bill slots, one active)                        │   │
//! │  │  ┌─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┬─────┐       │   │
//! │  │  │ B0* │ B1  │ B2  │ B3  │ B4  │ B5  │ B6  │ B7  │ B8  │       │   │
//! │  │  └─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┴─────┘       │   │
//! │  └───────┬─────────────────────┬───────────────────┬─────────────┘   │
//! │          │                     │                   │                  │
//! │          ▼                     ▼                   ▼                  │
//! │  ┌──────────────┐      ┌──────────────┐    ┌──────────────┐          │
//! │  │ TaxScheduler │      │   Checkout   │    │ ReturnsDesk  │          │
//! │  │ debounce +   │      │ preconditions│    │ local checks │          │
//! │  │ stale guard  │      │ + payload    │    │ + refund calc│          │
//! │  └──────┬───────┘      └──────┬───────┘    └──────┬───────┘          │
//! │         │                     │                   │                   │
//! │         ▼                     ▼                   ▼                   │
//! │  ┌─────────────────────────────────────────────────────────┐         │
//! │  │        BackofficeClient (reqwest, one per register)     │         │
//! │  │     POST tax/quote │ POST sales │ GET sales/{id} │ …    │         │
//! │  └─────────────────────────────────────────────────────────┘         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`state`] - the nine-slot bill session store
//! - [`tax`] - tax engine adapter: debounce, staleness guard, wire DTOs
//! - [`checkout`] - checkout finalizer
//! - [`returns`] - returns desk
//! - [`sales`] - sales collaborator contract
//! - [`http`] - reqwest implementation of the collaborator traits
//! - [`config`] - register configuration
//! - [`error`] - register error types
//!
//! ## Wiring Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use keel_register::checkout::Checkout;
//! use keel_register::config::RegisterConfig;
//! use keel_register::http::BackofficeClient;
//! use keel_register::state::SessionState;
//! use keel_register::tax::TaxScheduler;
//!
//! let config = RegisterConfig::default();
//! let backoffice = Arc::new(BackofficeClient::new(&config).unwrap());
//!
//! let session = SessionState::new();
//! let tax = TaxScheduler::new(session.clone(), backoffice.clone(), &config);
//! let checkout = Checkout::new(session.clone(), backoffice);
//!
//! // Every cart mutation: edit the session, then poke the scheduler.
//! // session.with_slots_mut(|s| s.active_mut().add_line(line))?;
//! // tax.schedule();
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod config;
pub mod error;
pub mod http;
pub mod returns;
pub mod sales;
pub mod state;
pub mod tax;
pub mod wire;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use checkout::{Checkout, CheckoutReceipt};
pub use config::RegisterConfig;
pub use error::{RegisterError, RegisterResult};
pub use http::BackofficeClient;
pub use returns::{ReturnsDesk, ReturnsService};
pub use sales::SalesService;
pub use state::{Bill, BillSlots, BillUpdate, SessionState};
pub use tax::{TaxScheduler, TaxService};
