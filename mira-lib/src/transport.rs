use bytes::Bytes;

/// Byte-level link to one shower.
///
/// Implemented by the BLE adapter in the `mira-rs` crate and by in-memory
/// fakes in tests. Writes go to the command characteristic; notifications
/// come from the status characteristic in arrival order.
pub trait Transport {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Writes one complete command packet.
    fn write(&mut self, packet: &[u8]) -> impl Future<Output = Result<(), Self::Error>> + Send;

    /// Waits for the next notification. `None` once the stream has ended.
    fn next_notification(&mut self) -> impl Future<Output = Result<Option<Bytes>, Self::Error>> + Send;
}
