//! Message header encoders
//!
//! Headers are outbound-only: the one inbound path (the discovery reply)
//! skips [`HEADER_SIZE`](super::HEADER_SIZE) bytes before interpreting the
//! rest, so no header decoder exists. The length field of both layouts is
//! always derived from the payload actually being sent, never cached.

use std::fmt;
use std::str::FromStr;

use bytes::{BufMut, BytesMut};
use serde::{Deserialize, Serialize};

use super::codec::{check_width, CodecResult};
use super::{AGENT_UUID_SIZE, DEVICE_HEADER_SIZE, HEADER_SIZE};

/// Hub routing command carried in the hub header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum HubCommand {
    /// Forward the payload to the addressed agent
    Forward = 0,
    /// Request the hub's list of known agents
    GetAgentList = 1,
    /// Push an agent list to the hub
    SetAgentList = 2,
}

/// 8-byte agent identifier, written as eight colon-separated hex octets
/// (`01:02:03:04:05:06:07:08`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AgentUuid(pub [u8; AGENT_UUID_SIZE]);

impl AgentUuid {
    pub fn as_bytes(&self) -> &[u8; AGENT_UUID_SIZE] {
        &self.0
    }
}

impl fmt::Display for AgentUuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = self
            .0
            .iter()
            .map(|b| format!("{:02x}", b))
            .collect::<Vec<_>>()
            .join(":");
        f.write_str(&text)
    }
}

impl FromStr for AgentUuid {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != AGENT_UUID_SIZE {
            return Err(format!(
                "expected {} colon-separated octets, got {}",
                AGENT_UUID_SIZE,
                parts.len()
            ));
        }
        let mut uuid = [0u8; AGENT_UUID_SIZE];
        for (i, part) in parts.iter().enumerate() {
            uuid[i] = u8::from_str_radix(part, 16)
                .map_err(|_| format!("invalid hex octet {:?}", part))?;
        }
        Ok(AgentUuid(uuid))
    }
}

impl TryFrom<String> for AgentUuid {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<AgentUuid> for String {
    fn from(uuid: AgentUuid) -> Self {
        uuid.to_string()
    }
}

/// Hub protocol header (16 bytes)
///
/// ```text
/// +-----------+----------+----------+-----------+--------------+---------
/// | version   | dst MAC  | hub cmd  | length    | agent UUID   | payload
/// | (4 bytes) | (1 byte) | (1 byte) | (2 bytes) | (8 bytes)    |
/// +-----------+----------+----------+-----------+--------------+---------
/// ```
#[derive(Debug, Clone)]
pub struct MessageHeader {
    pub version: u32,
    pub dst_mac: u8,
    pub hub_command: HubCommand,
    pub agent_uuid: AgentUuid,
}

impl MessageHeader {
    /// Serialize the header immediately followed by `payload`.
    ///
    /// The length field is computed from `payload.len()` so it can never go
    /// stale relative to the bytes actually sent.
    pub fn encode(&self, payload: &[u8]) -> CodecResult<BytesMut> {
        check_width(payload.len() as u64, u16::MAX as u64, "payload length")?;

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        buf.put_u32_le(self.version);
        buf.put_u8(self.dst_mac);
        buf.put_u8(self.hub_command as u8);
        buf.put_u16_le(payload.len() as u16);
        buf.put_slice(self.agent_uuid.as_bytes());
        buf.put_slice(payload);
        Ok(buf)
    }
}

/// Device protocol header (8 bytes), used on the panel-to-agent RFID path
///
/// ```text
/// +-----------+----------+----------+-----------+---------
/// | version   | dst MAC  | src MAC  | length    | payload
/// | (4 bytes) | (1 byte) | (1 byte) | (2 bytes) |
/// +-----------+----------+----------+-----------+---------
/// ```
#[derive(Debug, Clone)]
pub struct DeviceHeader {
    pub version: u32,
    pub dst_mac: u8,
    pub src_mac: u8,
}

impl DeviceHeader {
    /// Serialize the header immediately followed by `payload`; the length
    /// field is derived from `payload.len()`.
    pub fn encode(&self, payload: &[u8]) -> CodecResult<BytesMut> {
        check_width(payload.len() as u64, u16::MAX as u64, "payload length")?;

        let mut buf = BytesMut::with_capacity(DEVICE_HEADER_SIZE + payload.len());
        buf.put_u32_le(self.version);
        buf.put_u8(self.dst_mac);
        buf.put_u8(self.src_mac);
        buf.put_u16_le(payload.len() as u16);
        buf.put_slice(payload);
        Ok(buf)
    }
}
