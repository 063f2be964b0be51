pub mod in_memory_collection;

pub use in_memory_collection::InMemoryCollection;
