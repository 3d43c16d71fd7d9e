pub mod grants;
pub mod health;
pub mod merge;
