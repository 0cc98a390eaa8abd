pub mod config;
pub mod device;
pub mod error;

pub use config::ShowerConfig;
pub use device::BleTransport;
pub use error::Error;
