//! # Domain Module
//!
//! Business logic of the star chart: the weekly slot grid, the rules that
//! turn stars into perfect days and perfect weeks, and the reward ledger
//! that funds prize targets from those currencies.
//!
//! ## Module Organization
//!
//! - **perfect_state**: Pure perfect-day and perfect-week predicates and reward deltas
//! - **allocation**: Funding prize targets from unspent currency
//! - **chart_week_service**: Reading, creating and writing chart weeks
//! - **child_service**: Child profile CRUD
//! - **ledger_service**: Atomic ledger mutations (deltas, settings, targets, resets)
//! - **slot_update_service**: The slot update transaction tying grid and ledger together
//!
//! ## Core Concepts
//!
//! - **Slot**: One of three daily time slots, holding empty, star or cross
//! - **Perfect day**: A day whose three slots are all stars
//! - **Perfect week**: A week whose 21 slots are all stars
//! - **Prize target**: A goal costing a number of stars, perfect days or perfect weeks
//!
//! ## Business Rules
//!
//! - Currency totals never go below zero
//! - Targets are funded in creation order, never twice from the same currency
//! - Achieved targets stay achieved until a reset or an explicit edit

pub mod allocation;
pub mod chart_week_service;
pub mod child_service;
pub mod commands;
pub mod entities;
pub mod ledger_service;
pub mod perfect_state;
pub mod slot_update_service;

pub use chart_week_service::ChartWeekService;
pub use child_service::ChildService;
pub use ledger_service::LedgerService;
pub use slot_update_service::SlotUpdateService;
