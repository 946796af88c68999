//! Datastore Layer
//!
//! The validation core never performs storage I/O itself: committed tree
//! nodes are read and written through the [`NodeDataStore`] trait supplied
//! by the persistence collaborator.
//!
//! The [`InMemoryDataStore`] backend in this module is the candidate-copy
//! implementation used by the orchestrator tests and by deployments that
//! keep the running datastore in memory.

mod error;
mod memory_store;
mod node_store;

pub use error::DataStoreError;
pub use memory_store::InMemoryDataStore;
pub use node_store::{NodeDataStore, TransactionalDataStore};
