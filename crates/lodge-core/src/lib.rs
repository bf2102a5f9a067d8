//! # lodge-core: Pure Business Logic for Lodge PMS
//!
//! This crate is the **heart** of the Lodge PMS booking & room lifecycle
//! core. It contains all business rules as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Lodge PMS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          Callers (front desk, housekeeping, guest self-service) │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    lodge-ops (Workflows)                        │   │
//! │  │   booking lifecycle • room state • housekeeping • billing       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ lodge-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │  interval │  │   money   │  │ validation│  │   │
//! │  │   │  statuses │  │ half-open │  │   cents   │  │   rules   │  │   │
//! │  │   │  entities │  │  overlap  │  │  no float │  │  checks   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS • PURE FUNCTIONS       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    lodge-db (Entity Store)                      │   │
//! │  │              SQLite queries, migrations, repositories           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain entities and their state-machine edge tables
//! - [`interval`] - Half-open stay intervals and the overlap test
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`error`] - Domain error taxonomy
//! - [`validation`] - Business rule validation
//! - [`events`] - Domain events emitted at the boundary
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: every function is deterministic - same input = same output
//! 2. **No I/O**: database, network, file system access is FORBIDDEN here
//! 3. **No Clock Reads**: callers pass `now` / `today` in; time is an input
//! 4. **Integer Money**: all monetary values are in cents (i64) to avoid float errors
//! 5. **Explicit Errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod events;
pub mod interval;
pub mod money;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use lodge_core::Money` instead of
// `use lodge_core::money::Money`

pub use error::{DomainError, DomainResult, ValidationError};
pub use events::{DomainEvent, EventOutboxEntry};
pub use interval::StayInterval;
pub use money::Money;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum stay length accepted at booking intake.
///
/// ## Business Reason
/// Catches swapped-field mistakes (a year entered as the check-out date)
/// before they become a room blocked for a decade. Long-stay contracts
/// are a different product and a different workflow.
pub const MAX_STAY_NIGHTS: i64 = 365;

/// Maximum length for human-entered names and titles.
pub const MAX_NAME_LEN: usize = 120;
