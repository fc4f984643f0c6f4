//! Command implementations for the boxgate CLI

mod client;
mod serve;

pub use client::{
    close, connect, create, demo, info, start, stop, suspend, Client, ClientOpts, TokenInterceptor,
};
pub use serve::serve;
