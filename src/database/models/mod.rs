pub mod booking;
pub mod discount;
pub mod service;
pub mod user;

pub use booking::*;
pub use discount::*;
pub use service::*;
pub use user::*;
