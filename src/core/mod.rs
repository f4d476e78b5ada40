// Domain-layer modules and shared errors/models
pub mod list_engine {
    pub use crate::list_engine::*;
}

pub mod history_store {
    pub use crate::history_store::*;
}

pub mod orchestrator {
    pub use crate::orchestrator::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod errors {
    pub use crate::errors::*;
}
