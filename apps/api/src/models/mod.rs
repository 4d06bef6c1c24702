pub mod application;
pub mod enums;
pub mod resume;
pub mod user;
