//! # staffsync-store
//!
//! Record store adapter: keyed upsert-by-email, fetch-all, batch sync
//! stamping, and the append-only sync log.
//!
//! [`RecordStore`] is the seam; [`PostgrestStore`] speaks to a PostgREST
//! (Supabase) endpoint and [`MemoryStore`] backs tests.

pub mod error;
pub mod memory;
pub mod postgrest;
pub mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use postgrest::PostgrestStore;
pub use store::{EmployeeFilter, RecordStore, UpsertOutcome};
