use crate::command::{Action, ControlState};
use crate::error::MiraError;
use crate::identity::DeviceIdentity;
use crate::status::{DeviceStatus, Mode, Notification, decode_notification};
use crate::transport::Transport;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// How long to wait for each notification after a status request
pub const STATUS_TIMEOUT: Duration = Duration::from_secs(5);

/// One paired shower behind a transport.
///
/// Every operation takes `&mut self`, so commands to one device never
/// interleave.
pub struct Shower<T: Transport> {
    transport: T,
    identity: DeviceIdentity,
    status: Option<DeviceStatus>,
    status_timeout: Duration,
}

impl<T: Transport> Shower<T> {
    pub fn new(transport: T, identity: DeviceIdentity) -> Self {
        Self {
            transport,
            identity,
            status: None,
            status_timeout: STATUS_TIMEOUT,
        }
    }

    pub fn with_status_timeout(mut self, status_timeout: Duration) -> Self {
        self.status_timeout = status_timeout;
        self
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Latest status seen, if any.
    pub fn status(&self) -> Option<&DeviceStatus> {
        self.status.as_ref()
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Requests a status notification and waits for it.
    pub async fn poll_status(&mut self) -> Result<DeviceStatus, MiraError> {
        let request = Action::RequestStatus.build(&self.identity, &ControlState::default())?;
        self.write(&request.to_bytes()).await?;

        loop {
            let raw = timeout(self.status_timeout, self.transport.next_notification())
                .await?
                .map_err(transport_error)?
                .ok_or(MiraError::NoResponse)?;

            match decode_notification(&raw) {
                Ok(Notification::Status(status)) => {
                    debug!(%status, "Status received");
                    self.status = Some(status);
                    return Ok(status);
                }
                Ok(Notification::Auxiliary(bytes)) => {
                    debug!(bytes = hex::encode(&bytes), "Skipping auxiliary notification");
                }
                Err(err) => {
                    warn!(%err, bytes = hex::encode(&raw), "Dropping notification");
                }
            }
        }
    }

    /// Reads the current state, applies `action` to it and sends the result.
    /// Returns the status reported afterwards.
    pub async fn apply(&mut self, action: Action) -> Result<DeviceStatus, MiraError> {
        // Out-of-range arguments fail before anything is sent.
        action.apply(&ControlState::default())?;

        let current = self.poll_status().await?;
        if action == Action::RequestStatus {
            return Ok(current);
        }

        let packet = action.build(&self.identity, &ControlState::from(&current))?;
        info!(?action, packet = %packet, "Sending command");
        self.write(&packet.to_bytes()).await?;

        self.poll_status().await
    }

    pub async fn set_outlet(&mut self, outlet: usize, on: bool) -> Result<DeviceStatus, MiraError> {
        self.apply(Action::SetOutlet { outlet, on }).await
    }

    pub async fn set_mode(&mut self, mode: Mode) -> Result<DeviceStatus, MiraError> {
        self.apply(Action::SetMode(mode)).await
    }

    pub async fn set_temperature(&mut self, celsius: f64) -> Result<DeviceStatus, MiraError> {
        self.apply(Action::SetTemperature(celsius)).await
    }

    pub async fn set_flow(&mut self, outlet: usize, percent: u8) -> Result<DeviceStatus, MiraError> {
        self.apply(Action::SetFlow { outlet, percent }).await
    }

    async fn write(&mut self, packet: &[u8]) -> Result<(), MiraError> {
        debug!(bytes = hex::encode(packet), "Writing packet");
        self.transport.write(packet).await.map_err(transport_error)
    }
}

fn transport_error<E: std::error::Error + Send + Sync + 'static>(err: E) -> MiraError {
    MiraError::Transport(Box::new(err))
}
