pub mod vector_collection;

pub use vector_collection::VectorCollection;
