//! Fragment storage.
//!
//! - [`MemoryFragmentStore`] keeps fragments in process memory
//! - [`LibsqlFragmentStore`] persists them in a local libsql (SQLite) file

pub mod memory;
pub mod sqlite;
pub mod traits;

pub use memory::MemoryFragmentStore;
pub use sqlite::LibsqlFragmentStore;
pub use traits::FragmentStore;
