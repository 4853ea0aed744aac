//! Command definitions and payload encodings
//!
//! Every command the hub understands is a variant of [`Command`], carrying
//! its typed arguments. Encoding is a total `match`, so adding an opcode
//! without a payload encoding fails to compile instead of failing at runtime.
//!
//! Where a decoder is defined, `decode(op, &encode_payload(cmd))` returns the
//! original command; the dispatcher itself never decodes command payloads
//! (the wire is outbound-only apart from the discovery reply).

use bytes::BytesMut;
use serde::{Deserialize, Serialize};

use super::codec::{self, check_width, str_len_u8, CodecError, CodecResult};

/// Single-byte command identifiers (closed set, 0-26)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    SetAddress2Agent = 0,
    SetPowerOff = 1,
    SetTimeout = 2,
    SetLocalTime = 3,
    SetTimeFormat = 4,
    SetExpectedFirmwareVersion = 5,
    WriteAsserts = 6,
    WriteFirmware = 7,
    SetLangId = 8,
    SetRoomSize = 9,
    SetRoomEquipments = 10,
    SetAccessRight = 11,
    SetHardwareFeature = 12,
    SetBacklight = 13,
    SetRoomName = 14,
    SetTimeline = 15,
    OnExtendMeeting = 16,
    OnAddMeeting = 17,
    OnDelMeeting = 18,
    OnUpdateMeeting = 19,
    SetMeetingInfo = 20,
    SetMeetingBody = 21,
    SetErrorCode = 22,
    GetUuid = 23,
    SetUnconfiguredId = 24,
    /// Reserved, not yet implemented on the panels
    SetPanelPower = 25,
    /// Reserved, not yet implemented on the panels
    CmdSetAttr = 26,
}

impl Opcode {
    pub fn from_u8(code: u8) -> CodecResult<Self> {
        use Opcode::*;
        Ok(match code {
            0 => SetAddress2Agent,
            1 => SetPowerOff,
            2 => SetTimeout,
            3 => SetLocalTime,
            4 => SetTimeFormat,
            5 => SetExpectedFirmwareVersion,
            6 => WriteAsserts,
            7 => WriteFirmware,
            8 => SetLangId,
            9 => SetRoomSize,
            10 => SetRoomEquipments,
            11 => SetAccessRight,
            12 => SetHardwareFeature,
            13 => SetBacklight,
            14 => SetRoomName,
            15 => SetTimeline,
            16 => OnExtendMeeting,
            17 => OnAddMeeting,
            18 => OnDelMeeting,
            19 => OnUpdateMeeting,
            20 => SetMeetingInfo,
            21 => SetMeetingBody,
            22 => SetErrorCode,
            23 => GetUuid,
            24 => SetUnconfiguredId,
            25 => SetPanelPower,
            26 => CmdSetAttr,
            other => return Err(CodecError::UnknownOpcode(other)),
        })
    }

    /// Reserved opcodes exist in the table but refuse to encode or decode.
    pub fn is_reserved(&self) -> bool {
        matches!(self, Opcode::SetPanelPower | Opcode::CmdSetAttr)
    }
}

/// Clock display format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum TimeFormat {
    #[default]
    Standard = 0,
    Military = 1,
}

/// Local wall-clock time, bit-packed into one 32-bit word:
/// bits 0-16 second-of-day, 17-21 day, 22-25 month, 26-31 year.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalTime {
    pub seconds_of_day: u32,
    pub day: u8,
    pub month: u8,
    pub year: u8,
}

impl LocalTime {
    pub const MAX_SECONDS: u32 = 0x1FFFF;
    pub const MAX_DAY: u8 = 0x1F;
    pub const MAX_MONTH: u8 = 0x0F;
    pub const MAX_YEAR: u8 = 0x3F;

    /// Pack into the wire word, rejecting subfields wider than their bit
    /// range instead of truncating them.
    pub fn pack(&self) -> CodecResult<u32> {
        check_width(self.seconds_of_day as u64, Self::MAX_SECONDS as u64, "seconds of day")?;
        check_width(self.day as u64, Self::MAX_DAY as u64, "day")?;
        check_width(self.month as u64, Self::MAX_MONTH as u64, "month")?;
        check_width(self.year as u64, Self::MAX_YEAR as u64, "year")?;

        Ok(self.seconds_of_day
            | (self.day as u32) << 17
            | (self.month as u32) << 22
            | (self.year as u32) << 26)
    }

    pub fn unpack(word: u32) -> Self {
        Self {
            seconds_of_day: word & 0x1FFFF,
            day: ((word >> 17) & 0x1F) as u8,
            month: ((word >> 22) & 0x0F) as u8,
            year: ((word >> 26) & 0x3F) as u8,
        }
    }
}

/// Equipment present in the room, one flag per bit
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Equipments {
    pub projector: bool,
    pub video_conference: bool,
    pub audio_conference: bool,
    pub tv: bool,
    pub laptop: bool,
    pub pc: bool,
}

impl Equipments {
    pub fn to_bits(&self) -> u8 {
        let mut bits = 0u8;
        if self.projector { bits |= 0x01; }
        if self.video_conference { bits |= 0x02; }
        if self.audio_conference { bits |= 0x04; }
        if self.tv { bits |= 0x08; }
        if self.laptop { bits |= 0x10; }
        if self.pc { bits |= 0x20; }
        bits
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            projector: bits & 0x01 != 0,
            video_conference: bits & 0x02 != 0,
            audio_conference: bits & 0x04 != 0,
            tv: bits & 0x08 != 0,
            laptop: bits & 0x10 != 0,
            pc: bits & 0x20 != 0,
        }
    }
}

/// Capabilities withheld from the panel; each set bit disables one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccessRestrictions {
    pub disable_extend_meeting: bool,
    pub disable_claim_meeting: bool,
    pub disable_cancel_meeting: bool,
    pub disable_future_booking: bool,
    pub disable_on_spot_booking: bool,
    pub disable_end_meeting: bool,
    pub disable_auth: bool,
}

impl AccessRestrictions {
    pub fn to_bits(&self) -> u8 {
        let mut bits = 0u8;
        if self.disable_extend_meeting { bits |= 0x01; }
        if self.disable_claim_meeting { bits |= 0x02; }
        if self.disable_cancel_meeting { bits |= 0x04; }
        if self.disable_future_booking { bits |= 0x08; }
        if self.disable_on_spot_booking { bits |= 0x10; }
        if self.disable_end_meeting { bits |= 0x20; }
        if self.disable_auth { bits |= 0x40; }
        bits
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            disable_extend_meeting: bits & 0x01 != 0,
            disable_claim_meeting: bits & 0x02 != 0,
            disable_cancel_meeting: bits & 0x04 != 0,
            disable_future_booking: bits & 0x08 != 0,
            disable_on_spot_booking: bits & 0x10 != 0,
            disable_end_meeting: bits & 0x20 != 0,
            disable_auth: bits & 0x40 != 0,
        }
    }
}

/// Hardware features toggled off on the panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HardwareFeatures {
    pub mute: bool,
    pub led_off: bool,
    pub rfid_off: bool,
}

impl HardwareFeatures {
    pub fn to_bits(&self) -> u8 {
        let mut bits = 0u8;
        if self.mute { bits |= 0x01; }
        if self.led_off { bits |= 0x02; }
        if self.rfid_off { bits |= 0x04; }
        bits
    }

    pub fn from_bits(bits: u8) -> Self {
        Self {
            mute: bits & 0x01 != 0,
            led_off: bits & 0x02 != 0,
            rfid_off: bits & 0x04 != 0,
        }
    }
}

/// One busy slot on the timeline, minutes since midnight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start_time: u16,
    pub end_time: u16,
}

/// All commands the hub forwards to an agent/panel
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Assign an MSTP address to the agent
    SetAddress2Agent { address: u8 },
    SetPowerOff { on: bool },
    SetTimeout { seconds: u8 },
    SetLocalTime(LocalTime),
    SetTimeFormat(TimeFormat),
    SetExpectedFirmwareVersion { version: u16 },
    /// Write an asset file to the panel
    WriteAsserts { path: String, data: String },
    /// Raw firmware image; the header length field is the only length on
    /// the wire for this command.
    WriteFirmware { data: Vec<u8> },
    SetLangId { id: u8 },
    SetRoomSize { people: u16 },
    SetRoomEquipments(Equipments),
    SetAccessRight(AccessRestrictions),
    SetHardwareFeature(HardwareFeatures),
    SetBacklight { on: bool },
    SetRoomName { name: String },
    SetTimeline {
        day_offset: u8,
        busy: Vec<BusyInterval>,
    },
    OnExtendMeeting {
        day_offset: u8,
        start_time: u16,
        new_duration: u16,
    },
    OnAddMeeting {
        day_offset: u8,
        start_time: u16,
        duration: u16,
    },
    OnDelMeeting { day_offset: u8, start_time: u16 },
    OnUpdateMeeting { day_offset: u8, start_time: u16 },
    SetMeetingInfo { subject: String, organizer: String },
    SetMeetingBody { body: String },
    SetErrorCode { code: u8 },
    /// Triggers the discovery request/response exchange
    GetUuid,
    SetUnconfiguredId { id: u16 },
}

impl Command {
    pub fn opcode(&self) -> Opcode {
        match self {
            Command::SetAddress2Agent { .. } => Opcode::SetAddress2Agent,
            Command::SetPowerOff { .. } => Opcode::SetPowerOff,
            Command::SetTimeout { .. } => Opcode::SetTimeout,
            Command::SetLocalTime(..) => Opcode::SetLocalTime,
            Command::SetTimeFormat(..) => Opcode::SetTimeFormat,
            Command::SetExpectedFirmwareVersion { .. } => Opcode::SetExpectedFirmwareVersion,
            Command::WriteAsserts { .. } => Opcode::WriteAsserts,
            Command::WriteFirmware { .. } => Opcode::WriteFirmware,
            Command::SetLangId { .. } => Opcode::SetLangId,
            Command::SetRoomSize { .. } => Opcode::SetRoomSize,
            Command::SetRoomEquipments(..) => Opcode::SetRoomEquipments,
            Command::SetAccessRight(..) => Opcode::SetAccessRight,
            Command::SetHardwareFeature(..) => Opcode::SetHardwareFeature,
            Command::SetBacklight { .. } => Opcode::SetBacklight,
            Command::SetRoomName { .. } => Opcode::SetRoomName,
            Command::SetTimeline { .. } => Opcode::SetTimeline,
            Command::OnExtendMeeting { .. } => Opcode::OnExtendMeeting,
            Command::OnAddMeeting { .. } => Opcode::OnAddMeeting,
            Command::OnDelMeeting { .. } => Opcode::OnDelMeeting,
            Command::OnUpdateMeeting { .. } => Opcode::OnUpdateMeeting,
            Command::SetMeetingInfo { .. } => Opcode::SetMeetingInfo,
            Command::SetMeetingBody { .. } => Opcode::SetMeetingBody,
            Command::SetErrorCode { .. } => Opcode::SetErrorCode,
            Command::GetUuid => Opcode::GetUuid,
            Command::SetUnconfiguredId { .. } => Opcode::SetUnconfiguredId,
        }
    }

    /// Encode the opcode-specific payload body (without the opcode byte)
    pub fn encode_payload(&self) -> CodecResult<Vec<u8>> {
        let mut buf = BytesMut::new();
        match self {
            Command::SetAddress2Agent { address } => codec::put_u8(&mut buf, *address),
            Command::SetPowerOff { on } => codec::put_u8(&mut buf, *on as u8),
            Command::SetTimeout { seconds } => codec::put_u8(&mut buf, *seconds),
            Command::SetLocalTime(time) => codec::put_u32(&mut buf, time.pack()?),
            Command::SetTimeFormat(format) => codec::put_u8(&mut buf, *format as u8),
            Command::SetExpectedFirmwareVersion { version } => codec::put_u16(&mut buf, *version),
            Command::WriteAsserts { path, data } => {
                codec::put_u8(&mut buf, str_len_u8(path, "path length")?);
                codec::put_str(&mut buf, path)?;
                codec::put_u8(&mut buf, str_len_u8(data, "data length")?);
                codec::put_str(&mut buf, data)?;
            }
            Command::WriteFirmware { data } => buf.extend_from_slice(data),
            Command::SetLangId { id } => codec::put_u8(&mut buf, *id),
            Command::SetRoomSize { people } => codec::put_u16(&mut buf, *people),
            Command::SetRoomEquipments(equipments) => codec::put_u8(&mut buf, equipments.to_bits()),
            Command::SetAccessRight(restrictions) => codec::put_u8(&mut buf, restrictions.to_bits()),
            Command::SetHardwareFeature(features) => codec::put_u8(&mut buf, features.to_bits()),
            Command::SetBacklight { on } => codec::put_u8(&mut buf, *on as u8),
            Command::SetRoomName { name } => {
                codec::put_u8(&mut buf, str_len_u8(name, "room name length")?);
                codec::put_str(&mut buf, name)?;
            }
            Command::SetTimeline { day_offset, busy } => {
                check_width(busy.len() as u64, u8::MAX as u64, "busy interval count")?;
                codec::put_u8(&mut buf, *day_offset);
                codec::put_u8(&mut buf, busy.len() as u8);
                for interval in busy {
                    codec::put_u16(&mut buf, interval.start_time);
                    codec::put_u16(&mut buf, interval.end_time);
                }
            }
            Command::OnExtendMeeting {
                day_offset,
                start_time,
                new_duration,
            } => {
                codec::put_u8(&mut buf, *day_offset);
                codec::put_u16(&mut buf, *start_time);
                codec::put_u16(&mut buf, *new_duration);
            }
            Command::OnAddMeeting {
                day_offset,
                start_time,
                duration,
            } => {
                codec::put_u8(&mut buf, *day_offset);
                codec::put_u16(&mut buf, *start_time);
                codec::put_u16(&mut buf, *duration);
            }
            Command::OnDelMeeting {
                day_offset,
                start_time,
            }
            | Command::OnUpdateMeeting {
                day_offset,
                start_time,
            } => {
                codec::put_u8(&mut buf, *day_offset);
                codec::put_u16(&mut buf, *start_time);
            }
            Command::SetMeetingInfo { subject, organizer } => {
                codec::put_u8(&mut buf, str_len_u8(subject, "subject length")?);
                codec::put_u8(&mut buf, str_len_u8(organizer, "organizer length")?);
                codec::put_str(&mut buf, subject)?;
                codec::put_str(&mut buf, organizer)?;
            }
            Command::SetMeetingBody { body } => {
                codec::put_u8(&mut buf, str_len_u8(body, "body length")?);
                codec::put_str(&mut buf, body)?;
            }
            Command::SetErrorCode { code } => codec::put_u8(&mut buf, *code),
            Command::GetUuid => {}
            Command::SetUnconfiguredId { id } => codec::put_u16(&mut buf, *id),
        }
        Ok(buf.to_vec())
    }

    /// Encode the full command: opcode byte followed by the payload body.
    /// A command is serialized once per send.
    pub fn encode(&self) -> CodecResult<Vec<u8>> {
        let mut wire = vec![self.opcode() as u8];
        wire.extend(self.encode_payload()?);
        Ok(wire)
    }

    /// Decode an opcode-specific payload body back into a command.
    pub fn decode(opcode: Opcode, payload: &[u8]) -> CodecResult<Command> {
        let mut cur = Cursor::new(payload);
        let command = match opcode {
            Opcode::SetAddress2Agent => Command::SetAddress2Agent { address: cur.u8()? },
            Opcode::SetPowerOff => Command::SetPowerOff { on: cur.u8()? != 0 },
            Opcode::SetTimeout => Command::SetTimeout { seconds: cur.u8()? },
            Opcode::SetLocalTime => Command::SetLocalTime(LocalTime::unpack(cur.u32()?)),
            Opcode::SetTimeFormat => Command::SetTimeFormat(match cur.u8()? {
                0 => TimeFormat::Standard,
                _ => TimeFormat::Military,
            }),
            Opcode::SetExpectedFirmwareVersion => {
                Command::SetExpectedFirmwareVersion { version: cur.u16()? }
            }
            Opcode::WriteAsserts => {
                let path_len = cur.u8()? as usize;
                let path = cur.str(path_len)?;
                let data_len = cur.u8()? as usize;
                let data = cur.str(data_len)?;
                Command::WriteAsserts { path, data }
            }
            Opcode::WriteFirmware => Command::WriteFirmware {
                data: cur.rest().to_vec(),
            },
            Opcode::SetLangId => Command::SetLangId { id: cur.u8()? },
            Opcode::SetRoomSize => Command::SetRoomSize { people: cur.u16()? },
            Opcode::SetRoomEquipments => {
                Command::SetRoomEquipments(Equipments::from_bits(cur.u8()?))
            }
            Opcode::SetAccessRight => {
                Command::SetAccessRight(AccessRestrictions::from_bits(cur.u8()?))
            }
            Opcode::SetHardwareFeature => {
                Command::SetHardwareFeature(HardwareFeatures::from_bits(cur.u8()?))
            }
            Opcode::SetBacklight => Command::SetBacklight { on: cur.u8()? != 0 },
            Opcode::SetRoomName => {
                let len = cur.u8()? as usize;
                Command::SetRoomName { name: cur.str(len)? }
            }
            Opcode::SetTimeline => {
                let day_offset = cur.u8()?;
                let count = cur.u8()? as usize;
                let mut busy = Vec::with_capacity(count);
                for _ in 0..count {
                    busy.push(BusyInterval {
                        start_time: cur.u16()?,
                        end_time: cur.u16()?,
                    });
                }
                Command::SetTimeline { day_offset, busy }
            }
            Opcode::OnExtendMeeting => Command::OnExtendMeeting {
                day_offset: cur.u8()?,
                start_time: cur.u16()?,
                new_duration: cur.u16()?,
            },
            Opcode::OnAddMeeting => Command::OnAddMeeting {
                day_offset: cur.u8()?,
                start_time: cur.u16()?,
                duration: cur.u16()?,
            },
            Opcode::OnDelMeeting => Command::OnDelMeeting {
                day_offset: cur.u8()?,
                start_time: cur.u16()?,
            },
            Opcode::OnUpdateMeeting => Command::OnUpdateMeeting {
                day_offset: cur.u8()?,
                start_time: cur.u16()?,
            },
            Opcode::SetMeetingInfo => {
                let subject_len = cur.u8()? as usize;
                let organizer_len = cur.u8()? as usize;
                let subject = cur.str(subject_len)?;
                let organizer = cur.str(organizer_len)?;
                Command::SetMeetingInfo { subject, organizer }
            }
            Opcode::SetMeetingBody => {
                let len = cur.u8()? as usize;
                Command::SetMeetingBody { body: cur.str(len)? }
            }
            Opcode::SetErrorCode => Command::SetErrorCode { code: cur.u8()? },
            Opcode::GetUuid => Command::GetUuid,
            Opcode::SetUnconfiguredId => Command::SetUnconfiguredId { id: cur.u16()? },
            Opcode::SetPanelPower | Opcode::CmdSetAttr => {
                return Err(CodecError::ReservedOpcode(opcode as u8))
            }
        };
        cur.finish()?;
        Ok(command)
    }
}

/// Checked reader over a payload slice
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        if self.data.len() - self.pos < len {
            return Err(CodecError::Truncated {
                expected: self.pos + len,
                actual: self.data.len(),
            });
        }
        let slice = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> CodecResult<u16> {
        let b = self.take(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    fn u32(&mut self) -> CodecResult<u32> {
        let b = self.take(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read `len` bytes as a one-byte-per-character string
    fn str(&mut self, len: usize) -> CodecResult<String> {
        Ok(self.take(len)?.iter().map(|&b| b as char).collect())
    }

    fn rest(&mut self) -> &'a [u8] {
        let slice = &self.data[self.pos..];
        self.pos = self.data.len();
        slice
    }

    fn finish(self) -> CodecResult<()> {
        if self.pos != self.data.len() {
            return Err(CodecError::TrailingBytes(self.data.len() - self.pos));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opcode_table() {
        assert_eq!(Opcode::SetAddress2Agent as u8, 0);
        assert_eq!(Opcode::SetTimeline as u8, 15);
        assert_eq!(Opcode::GetUuid as u8, 23);
        assert_eq!(Opcode::CmdSetAttr as u8, 26);
        assert_eq!(Opcode::from_u8(11).unwrap(), Opcode::SetAccessRight);
        assert!(Opcode::from_u8(27).is_err());
        assert!(Opcode::SetPanelPower.is_reserved());
        assert!(!Opcode::GetUuid.is_reserved());
    }

    #[test]
    fn test_local_time_bit_arithmetic() {
        // 100 | (10 << 17) | (12 << 22) | (17 << 26)
        let time = LocalTime {
            seconds_of_day: 100,
            day: 10,
            month: 12,
            year: 17,
        };
        assert_eq!(time.pack().unwrap(), 0x4714_0064);
        assert_eq!(LocalTime::unpack(0x4714_0064), time);

        let payload = Command::SetLocalTime(time).encode_payload().unwrap();
        assert_eq!(payload, vec![0x64, 0x00, 0x14, 0x47]);
    }

    #[test]
    fn test_local_time_subfield_overflow() {
        let too_many_seconds = LocalTime {
            seconds_of_day: 0x20000,
            ..Default::default()
        };
        assert!(too_many_seconds.pack().is_err());
        let bad_day = LocalTime { day: 32, ..Default::default() };
        assert!(bad_day.pack().is_err());
        let bad_month = LocalTime { month: 16, ..Default::default() };
        assert!(bad_month.pack().is_err());
        let bad_year = LocalTime { year: 64, ..Default::default() };
        assert!(bad_year.pack().is_err());
    }

    #[test]
    fn test_equipment_bits() {
        let bits = Equipments {
            projector: true,
            tv: true,
            ..Default::default()
        }
        .to_bits();
        assert_eq!(bits, 0b0000_1001);
    }

    #[test]
    fn test_flag_bit_independence() {
        // Each flag occupies exactly one bit and does not perturb the others.
        for bit in 0..6 {
            let eq = Equipments::from_bits(1 << bit);
            assert_eq!(eq.to_bits(), 1 << bit);
        }
        for bit in 0..7 {
            let ar = AccessRestrictions::from_bits(1 << bit);
            assert_eq!(ar.to_bits(), 1 << bit);
        }
        for bit in 0..3 {
            let hw = HardwareFeatures::from_bits(1 << bit);
            assert_eq!(hw.to_bits(), 1 << bit);
        }
    }

    #[test]
    fn test_access_right_bits() {
        let bits = AccessRestrictions {
            disable_extend_meeting: true,
            disable_auth: true,
            ..Default::default()
        }
        .to_bits();
        assert_eq!(bits, 0b0100_0001);
    }

    #[test]
    fn test_boundary_payloads() {
        let payload = Command::SetAddress2Agent { address: 255 }
            .encode_payload()
            .unwrap();
        assert_eq!(payload, vec![0xFF]);

        let payload = Command::SetRoomSize { people: 65535 }
            .encode_payload()
            .unwrap();
        assert_eq!(payload, vec![0xFF, 0xFF]);
    }

    #[test]
    fn test_room_name_length_prefix() {
        let payload = Command::SetRoomName {
            name: "Meeting room".to_string(),
        }
        .encode_payload()
        .unwrap();
        assert_eq!(payload[0], 12);
        assert_eq!(&payload[1..], b"Meeting room");
    }

    #[test]
    fn test_timeline_payload_shape() {
        let payload = Command::SetTimeline {
            day_offset: 2,
            busy: vec![
                BusyInterval { start_time: 10, end_time: 20 },
                BusyInterval { start_time: 0x1234, end_time: 0x5678 },
            ],
        }
        .encode_payload()
        .unwrap();
        assert_eq!(
            payload,
            vec![2, 2, 10, 0, 20, 0, 0x34, 0x12, 0x78, 0x56]
        );
    }

    #[test]
    fn test_full_frame_prefixes_opcode() {
        let wire = Command::SetErrorCode { code: 7 }.encode().unwrap();
        assert_eq!(wire, vec![22, 7]);

        let wire = Command::GetUuid.encode().unwrap();
        assert_eq!(wire, vec![23]);
    }

    #[test]
    fn test_roundtrip() {
        let commands = vec![
            Command::SetAddress2Agent { address: 123 },
            Command::SetPowerOff { on: true },
            Command::SetLocalTime(LocalTime {
                seconds_of_day: 100,
                day: 10,
                month: 12,
                year: 17,
            }),
            Command::SetExpectedFirmwareVersion { version: 0x1234 },
            Command::WriteAsserts {
                path: "/Document/file".to_string(),
                data: "This is assert data".to_string(),
            },
            Command::WriteFirmware {
                data: vec![0xDE, 0xAD, 0xBE, 0xEF],
            },
            Command::SetRoomEquipments(Equipments::from_bits(0b10_1010)),
            Command::SetRoomName {
                name: "Meeting room".to_string(),
            },
            Command::SetTimeline {
                day_offset: 0,
                busy: vec![BusyInterval { start_time: 10, end_time: 20 }],
            },
            Command::OnExtendMeeting {
                day_offset: 2,
                start_time: 1234,
                new_duration: 1000,
            },
            Command::SetMeetingInfo {
                subject: "Standup".to_string(),
                organizer: "Alice".to_string(),
            },
            Command::SetMeetingBody {
                body: "Agenda".to_string(),
            },
            Command::GetUuid,
            Command::SetUnconfiguredId { id: 1234 },
        ];

        for command in commands {
            let payload = command.encode_payload().unwrap();
            let decoded = Command::decode(command.opcode(), &payload).unwrap();
            assert_eq!(decoded, command);
        }
    }

    #[test]
    fn test_decode_rejects_reserved_and_trailing() {
        assert!(Command::decode(Opcode::SetPanelPower, &[]).is_err());
        assert!(Command::decode(Opcode::CmdSetAttr, &[1]).is_err());
        assert!(Command::decode(Opcode::GetUuid, &[0]).is_err());
        assert!(Command::decode(Opcode::SetErrorCode, &[1, 2]).is_err());
    }

    #[test]
    fn test_decode_rejects_truncated() {
        assert!(Command::decode(Opcode::SetRoomSize, &[0xFF]).is_err());
        assert!(Command::decode(Opcode::SetRoomName, &[5, b'a', b'b']).is_err());
    }

    #[test]
    fn test_wide_char_rejected() {
        let err = Command::SetRoomName {
            name: "caf\u{00E9}\u{4E2D}".to_string(),
        }
        .encode_payload();
        assert!(err.is_err());

        // Latin-1 range is fine.
        let payload = Command::SetRoomName {
            name: "caf\u{00E9}".to_string(),
        }
        .encode_payload()
        .unwrap();
        assert_eq!(payload, vec![4, b'c', b'a', b'f', 0xE9]);
    }
}
