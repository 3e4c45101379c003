pub mod attribution;
pub mod models;
pub mod portfolio;

pub use attribution::{correlation_matrix, per_asset_attribution};
pub use models::*;
pub use portfolio::{align, apply_stop_loss, simulate};
