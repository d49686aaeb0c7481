//! # OPAL — Offline Payment Settlement Engine
//!
//! OPAL settles payments that were created while the paying device had no
//! network. The payer signs a transfer locally; the payee submits it later
//! (or immediately) to this engine, which has exactly three jobs:
//!
//! 1. Prove the submission is authentic (ECDSA over a deterministic payload).
//! 2. Prove it has never been settled before (nonce replay protection).
//! 3. Move the money atomically (double-entry debit + credit, audit trail).
//!
//! Everything else a payment backend does — registration, login, profile
//! edits — is ordinary CRUD and lives behind thin collaborator traits.
//! The hard correctness hazards (forged transfers, replayed transfers,
//! concurrent double-spends, half-applied batches) all live here.
//!
//! ## Architecture
//!
//! The crate is split into modules that mirror the settlement pipeline:
//!
//! - **crypto** — Canonical payload construction and P-256 verification.
//! - **ledger** — Value types: accounts, wallets, amounts, audit entries.
//! - **store** — Collaborator traits plus thread-safe in-memory references.
//! - **settle** — The executor, the offline pipeline, and the batch sync.
//! - **engine** — One facade wiring the above together.
//! - **config** — The constants the signer and verifier must agree on.
//!
//! ## Design Philosophy
//!
//! 1. Verification never mutates state. You can call it speculatively.
//! 2. A rejected submission leaves zero persisted side effects.
//! 3. No floating point anywhere near money.
//! 4. If it touches money, it has tests. Plural.

pub mod config;
pub mod crypto;
pub mod engine;
pub mod error;
pub mod ledger;
pub mod settle;
pub mod store;

pub use engine::Engine;
pub use error::EngineError;
