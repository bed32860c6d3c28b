pub mod comment;
pub mod post;
pub mod session;
pub mod user;
pub mod vote;
