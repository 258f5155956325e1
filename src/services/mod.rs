pub mod session;
pub mod two_fa;

pub use session::{LoginOutcome, Principal, SessionManager, SessionTokens, TokenPair};
pub use two_fa::SecondFactorManager;
