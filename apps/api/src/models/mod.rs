pub mod correction;
pub mod field;
pub mod resume;
