pub mod crypto;
pub mod middleware;
pub mod validation;
