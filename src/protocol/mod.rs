//! Protocol module - Defines the wire formats for PanL hub communication
//!
//! Two fixed-layout headers are used, both little-endian:
//! - Hub protocol (16 bytes): version(4) + dst MAC(1) + hub command(1) +
//!   payload length(2) + agent UUID(8), followed by the command payload.
//! - Device protocol (8 bytes): version(4) + dst MAC(1) + src MAC(1) +
//!   length(2), used on the RFID path between a panel and its agent.
//!
//! A command payload is a single opcode byte followed by an opcode-specific
//! body (see [`command`]).

pub mod codec;
pub mod command;
pub mod header;

pub use codec::*;
pub use command::*;
pub use header::*;

/// Protocol version placed in every header
pub const PROTOCOL_VERSION: u32 = 0xCAFE_CAFE;

/// Default hub port for command datagrams
pub const DEFAULT_PORT: u16 = 9999;

/// Hub protocol header size in bytes
pub const HEADER_SIZE: usize = 16;

/// Device protocol header size in bytes (RFID path)
pub const DEVICE_HEADER_SIZE: usize = 8;

/// Agent UUID size in bytes
pub const AGENT_UUID_SIZE: usize = 8;

/// Command code for an RFID card tap on the device protocol
pub const RFID_COMMAND: u8 = 221;
