pub mod client;
pub mod token;

pub use client::{Client, ClientDraft};
pub use token::{Token, TokenLifetimes, TokenPayload};
