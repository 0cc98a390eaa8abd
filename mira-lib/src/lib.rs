pub mod checksum;
pub mod command;
pub mod constants;
pub mod controller;
pub mod error;
pub mod identity;
pub mod packet;
pub mod recovery;
pub mod status;
pub mod transport;

pub use command::{Action, ControlState};
pub use controller::Shower;
pub use error::MiraError;
pub use identity::{ClientId, DeviceIdentity, MacAddress};
pub use packet::{CommandPacket, Opcode, decode, encode, verify};
pub use recovery::{ClientIdCandidates, Observation, recover_client_id, recover_from_observations};
pub use status::{DeviceStatus, Mode, Notification, decode_notification, decode_status};
pub use transport::Transport;
