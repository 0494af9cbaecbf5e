pub mod chat;
pub mod gateway;
pub mod legal;

pub use gateway::{Gateway, GatewayError, Generation, Outcome, ProviderId, ProviderSelection};
