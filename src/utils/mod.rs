pub mod money;
pub mod upload;
