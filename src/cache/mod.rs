pub mod temp_tokens;

pub use temp_tokens::TempTokenCache;
