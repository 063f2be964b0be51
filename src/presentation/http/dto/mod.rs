pub mod pdf_dto;
pub mod response_dto;

pub use pdf_dto::*;
pub use response_dto::*;
