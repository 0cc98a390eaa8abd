//! 16-bit packet checksum.
//!
//! The firmware uses CRC-16/CCITT-FALSE (catalogued as CRC-16/IBM-3740):
//! polynomial `0x1021`, initial value `0xFFFF`, no reflection, no final XOR.
//! Every captured command reproduces under these parameters, so they are
//! frozen here.

use crate::identity::ClientId;
use crc::{CRC_16_IBM_3740, Crc};
use tracing::trace;

pub const CHECKSUM: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Checksum of an arbitrary byte sequence.
pub fn checksum(data: &[u8]) -> u16 {
    CHECKSUM.checksum(data)
}

/// Checksum of `data` followed by the client id, as the device computes it
/// for commands. The key is never transmitted.
pub fn keyed_checksum(data: &[u8], client_id: ClientId) -> u16 {
    let mut digest = CHECKSUM.digest();
    digest.update(data);
    digest.update(&client_id.checksum_bytes());
    let value = digest.finalize();

    trace!(
        data = hex::encode(data),
        client_id = client_id.value(),
        checksum = format!("0x{value:04x}"),
        "Calculated checksum"
    );

    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_catalogue_check_value() {
        assert_eq!(checksum(b"123456789"), 0x29b1);
    }

    #[test]
    fn empty_input_is_the_initial_value() {
        assert_eq!(checksum(&[]), 0xffff);
    }

    #[test]
    fn repeated_calls_agree() {
        let data = [0x01, 0x87, 0x05, 0x03, 0x01, 0x9a, 0x00, 0x00];
        let first = checksum(&data);
        let first_keyed = keyed_checksum(&data, ClientId(24829));
        for _ in 0..1000 {
            assert_eq!(checksum(&data), first);
            assert_eq!(keyed_checksum(&data, ClientId(24829)), first_keyed);
        }
        assert_eq!(first_keyed, 0xd528);
    }

    #[test]
    fn keyed_checksum_equals_checksum_of_concatenation() {
        let data = [0x02, 0x87, 0x05, 0x01, 0x01, 0xe0, 0x00, 0x64];
        let mut joined = data.to_vec();
        joined.extend_from_slice(&ClientId(32683).checksum_bytes());
        assert_eq!(keyed_checksum(&data, ClientId(32683)), checksum(&joined));
        assert_eq!(keyed_checksum(&data, ClientId(32683)), 0xd85b);
    }
}
