pub mod agc_settings;
pub mod models;
pub mod traits;

pub use agc_settings::*;
pub use models::*;
pub use traits::*;
