// src/lib.rs

pub mod db;
pub mod eventbus;
pub mod games;
pub mod platforms;
pub mod repositories;
pub mod services;

pub use db::Database;
pub use doubloonbot_common::error::Error;
