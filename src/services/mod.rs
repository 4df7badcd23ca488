pub mod attempts;
pub mod cache;
pub mod categories;
pub mod posts;
pub mod session;
pub mod token;
pub mod users;
