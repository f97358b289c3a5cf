pub mod core;
pub mod grades;
pub mod listing;
pub mod users;
