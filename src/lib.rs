pub mod compression;
pub mod db;
pub mod error;
pub mod handlers;
pub mod response;
