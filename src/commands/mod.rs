pub mod fetch;
pub mod get;
pub mod init;
pub mod make;
pub mod resources;
pub mod show;
