pub mod authentications;
pub mod users;
