//! SQLite helpers shared by the session, label and timestamp stores

pub mod init;

pub use init::*;
