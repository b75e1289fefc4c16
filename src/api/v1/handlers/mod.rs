pub mod authentications;
pub mod health;
pub mod users;
