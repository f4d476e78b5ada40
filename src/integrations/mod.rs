//! External service integrations.

pub mod search_client {
    pub use crate::search_client::*;
}

pub mod adapter {
    pub use crate::adapter::*;
}
