//! Client id recovery from sniffed commands.
//!
//! The client id is a 16-bit key mixed into every command checksum. Given one
//! observed command, every key is tried and each one that reproduces the
//! observed checksum is kept. Further observations from the same pairing
//! narrow the set by intersection.
//!
//! # Usage
//!
//! ```
//! use mira_lib::recovery::{Observation, recover_from_observations};
//!
//! let observation = Observation::from_packet(&[0x02, 0x07, 0x00, 0x45, 0x8a]).unwrap();
//! let candidates = recover_from_observations(&[observation]).unwrap();
//! assert_eq!(candidates.unique().map(|id| id.value()), Some(32683));
//! ```

use crate::checksum::keyed_checksum;
use crate::constants::CHECKSUM_SIZE;
use crate::error::MiraError;
use crate::identity::ClientId;
use bytes::Bytes;
use std::fmt;
use tracing::{debug, info, warn};

/// Number of keys tried per observation.
pub const KEY_SPACE: usize = 1 << 16;

/// All client ids consistent with the observations seen so far, in
/// increasing order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdCandidates(Vec<ClientId>);

impl ClientIdCandidates {
    pub fn as_slice(&self) -> &[ClientId] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The client id, if exactly one candidate remains.
    pub fn unique(&self) -> Option<ClientId> {
        match self.0.as_slice() {
            [only] => Some(*only),
            _ => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        self.0.len() > 1
    }

    pub fn contains(&self, client_id: ClientId) -> bool {
        self.0.binary_search(&client_id).is_ok()
    }

    /// Keeps only candidates present in both sets.
    pub fn narrow(&self, other: &ClientIdCandidates) -> ClientIdCandidates {
        ClientIdCandidates(self.0.iter().copied().filter(|id| other.contains(*id)).collect())
    }
}

impl IntoIterator for ClientIdCandidates {
    type Item = ClientId;
    type IntoIter = std::vec::IntoIter<ClientId>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for ClientIdCandidates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<String> = self.0.iter().map(|id| id.value().to_string()).collect();
        write!(f, "[{}]", ids.join(", "))
    }
}

/// One sniffed command, split into the checksum-free data and the checksum
/// the device accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Observation {
    pub data: Bytes,
    pub checksum: [u8; 2],
}

impl Observation {
    /// Pairs the checksum-free data with the full packet it was taken from.
    /// `packet` must be `data` followed by exactly the two checksum bytes.
    pub fn new(data: &[u8], packet: &[u8]) -> Result<Self, MiraError> {
        if packet.len() != data.len() + CHECKSUM_SIZE {
            return Err(MiraError::InvalidPacket(format!(
                "packet is {} bytes, expected data ({} bytes) plus a {CHECKSUM_SIZE}-byte checksum",
                packet.len(),
                data.len()
            )));
        }
        if !packet.starts_with(data) {
            return Err(MiraError::InvalidPacket(
                "packet does not start with the given data".to_string(),
            ));
        }
        Self::from_packet(packet)
    }

    /// Splits the trailing checksum off a full packet.
    pub fn from_packet(packet: &[u8]) -> Result<Self, MiraError> {
        if packet.len() <= CHECKSUM_SIZE {
            return Err(MiraError::InsufficientData {
                expected: CHECKSUM_SIZE + 1,
                actual: packet.len(),
            });
        }
        let (data, checksum) = packet.split_at(packet.len() - CHECKSUM_SIZE);
        Ok(Self {
            data: Bytes::copy_from_slice(data),
            checksum: [checksum[0], checksum[1]],
        })
    }

    pub fn recover(&self) -> Result<ClientIdCandidates, MiraError> {
        recover_client_id(&self.data, self.checksum)
    }
}

/// Tries every client id against one observation.
///
/// Always performs exactly [`KEY_SPACE`] checksum evaluations and returns all
/// matching keys. No match at all means the checksum or framing model does
/// not fit this device.
pub fn recover_client_id(data: &[u8], observed_checksum: [u8; 2]) -> Result<ClientIdCandidates, MiraError> {
    let observed = u16::from_be_bytes(observed_checksum);

    let candidates: Vec<ClientId> = (0..=u16::MAX)
        .map(ClientId)
        .filter(|&client_id| keyed_checksum(data, client_id) == observed)
        .collect();

    debug!(
        data = hex::encode(data),
        checksum = hex::encode(observed_checksum),
        candidates = candidates.len(),
        "Scanned client id space"
    );

    if candidates.is_empty() {
        return Err(MiraError::NoCandidateFound);
    }
    Ok(ClientIdCandidates(candidates))
}

/// Recovers the client id from several observations of the same pairing.
///
/// An ambiguous result is returned as-is so the caller can ask for another
/// observation; an empty intersection means the observations contradict each
/// other (different pairings, or a wrong protocol model).
pub fn recover_from_observations(observations: &[Observation]) -> Result<ClientIdCandidates, MiraError> {
    let mut narrowed: Option<ClientIdCandidates> = None;

    for observation in observations {
        let candidates = observation.recover()?;
        narrowed = Some(match narrowed {
            Some(previous) => previous.narrow(&candidates),
            None => candidates,
        });
    }

    let candidates = narrowed.ok_or_else(|| MiraError::InvalidPacket("no observations given".to_string()))?;

    match candidates.as_slice() {
        [] => {
            warn!("Observations disagree: no client id satisfies all of them");
            Err(MiraError::NoCandidateFound)
        }
        [client_id] => {
            info!(client_id = client_id.value(), observations = observations.len(), "Recovered client id");
            Ok(candidates)
        }
        _ => {
            warn!(
                candidates = %candidates,
                "Client id is ambiguous, another observation is needed"
            );
            Ok(candidates)
        }
    }
}
