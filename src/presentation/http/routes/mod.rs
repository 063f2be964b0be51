pub mod collection_routes;
pub mod health_routes;
pub mod pdf_routes;

pub use collection_routes::*;
pub use health_routes::*;
pub use pdf_routes::*;
