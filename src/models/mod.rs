pub mod assignment;
pub mod evidence;
pub mod request;
pub mod user;
