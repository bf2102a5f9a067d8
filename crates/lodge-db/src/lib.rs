//! # Lodge Entity Store
//!
//! SQLite persistence layer for the Lodge PMS core.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         lodge-db                                        │
//! │                                                                         │
//! │  ┌──────────────┐       ┌──────────────────────────────────────────┐   │
//! │  │   Database   │──────►│  Repositories                            │   │
//! │  │  (pool, tx)  │       │  rooms / bookings / payments / cleaning  │   │
//! │  └──────┬───────┘       │  maintenance / orders / outbox           │   │
//! │         │               └──────────────────────────────────────────┘   │
//! │         ▼                                                               │
//! │  ┌──────────────┐                                                      │
//! │  │  Migrations  │  embedded, run on connect                            │
//! │  └──────────────┘                                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! This crate knows nothing about workflows. It stores and retrieves the
//! domain types from `lodge-core` and offers compare-and-set status
//! writes; deciding which transitions are legal is lodge-ops' job.

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

pub use error::{StoreError, StoreResult};
pub use pool::{Database, DbConfig};
pub use repository::{
    BookingRepository, CleaningRepository, MaintenanceRepository, OrderRepository,
    OutboxRepository, PaymentRepository, RoomRepository,
};
