pub mod history;
pub mod init;
pub mod parse;
pub mod play;
