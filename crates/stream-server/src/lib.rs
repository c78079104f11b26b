pub mod chat;
pub mod control_api;
pub mod dsp;
pub mod manager;
pub mod types;

pub use chat::*;
pub use control_api::*;
pub use dsp::*;
pub use manager::*;
pub use types::*;
