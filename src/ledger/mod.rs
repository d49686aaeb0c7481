//! # Ledger Value Types
//!
//! Plain, eagerly-loaded value structs with no lazy object graphs.
//! Components hand these to each other by value; relationships
//! are foreign-key-style ids resolved through the [`store`](crate::store)
//! traits.

mod amount;
mod types;

pub use amount::Amount;
pub use types::{
    Account, AccountId, EntryKind, LedgerEntry, OfflineTransferRecord, TransferStatus, Wallet,
};
