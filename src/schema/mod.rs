pub mod character;
pub mod request;
