#[macro_use] extern crate log;

pub mod client;
pub mod config;
mod connection;
pub mod demo;
pub mod discovery;
pub mod error;
pub mod executor;
pub mod fixture;
pub mod request;
pub mod response;
pub mod runner;
pub mod server;
pub mod status;

pub use error::Error;
pub use server::{start, Handler};
