pub mod assignments;
pub mod auth;
pub mod evidence;
pub mod jwt;
pub mod policy;
pub mod requests;
pub mod seed;
