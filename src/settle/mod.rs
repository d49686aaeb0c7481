//! # The Settlement Pipeline
//!
//! Three collaborating pieces, in the order a submission meets them:
//!
//! ```text
//!   ┌────────────┐    reserve     ┌───────────────┐    verify
//!   │ submission ├───────────────►│  nonce ledger  ├──────────────┐
//!   └────────────┘  (fail fast    └───────────────┘  (fail fast   │
//!                    on replay)                       on forgery)  │
//!                                                                  ▼
//!   ┌──────────────┐   append    ┌────────────────┐   debit+credit
//!   │  audit trail │◄────────────┤    executor    │◄───────────────┘
//!   └──────────────┘             └────────────────┘  (atomic commit)
//! ```
//!
//! - [`TransferExecutor`] (`executor.rs`) — precondition checks and the
//!   atomic double-entry balance mutation, for every transfer kind.
//! - [`OfflineSettlement`] (`offline.rs`) — the per-submission pipeline:
//!   nonce, signature, execution, durable record.
//! - [`SyncCoordinator`] (`sync.rs`) — replays a batch of submissions,
//!   isolating each item's failure from the rest.
//!
//! A failed attempt anywhere in the pipeline leaves zero persisted side
//! effects: the nonce reservation is rolled back and no wallet, ledger, or
//! record write has been staged yet.

mod executor;
mod offline;
mod sync;

pub use executor::TransferExecutor;
pub use offline::{OfflineSettlement, OfflineSubmission};
pub use sync::{SyncCoordinator, SyncOutcome, SyncReport};
