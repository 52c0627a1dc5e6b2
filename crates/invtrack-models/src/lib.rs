pub mod gateway;
pub mod guild;
pub mod invite;
pub mod member;
pub mod permissions;
pub mod user;
