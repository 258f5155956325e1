pub mod token;
pub mod user;

pub use token::RefreshTokenRecord;
pub use user::User;
