pub mod account;
pub mod dto;
pub mod extract;
mod proxy;
pub mod response;
mod router;
mod social;
pub mod validation;

pub use account::account_router;
pub use proxy::proxy_router;
pub use router::{AppState, create_router};
pub use social::social_router;
