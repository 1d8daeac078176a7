pub mod error;
pub mod prediction;
pub mod session;
pub mod state;

pub use error::AppError;
pub use state::DeskState;
