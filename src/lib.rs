// Module naming follows project convention (SPSC = Single-Producer Single-Consumer)
#[allow(non_snake_case)]
pub mod SPSC;
#[allow(non_snake_case)]
pub mod Core;
#[allow(non_snake_case)]
pub mod Sink;
#[allow(non_snake_case)]
pub mod Debug {
    pub mod StructDebug;
}
pub mod error;

pub use error::LogError;
pub use Core::{GrowthFailurePolicy, LoggerStats};
pub use Sink::{Logger, LoggerBuilder};
pub use SPSC::SendOutcome;
