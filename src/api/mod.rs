// Thin namespace wrapper for API-layer components
pub mod handlers {
    pub use crate::handlers::*;
}

pub mod csv_export {
    pub use crate::csv_export::*;
}
