pub use admin::*;
pub use constraints::*;
pub use keeper::*;
pub use user::*;

mod admin;
mod constraints;
mod keeper;
mod user;
