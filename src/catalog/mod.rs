//! Command catalog - raw argument tokens to typed commands
//!
//! Every command follows the same invocation policy: no tokens encodes the
//! configured defaults, a first token of `help` prints usage and encodes
//! nothing, and any other malformed token list is a validation error that
//! aborts before anything is sent. Numeric tokens are range-checked against
//! their field widths here; nothing is silently truncated downstream.

use thiserror::Error;

use crate::config::CommandDefaults;
use crate::protocol::{
    AccessRestrictions, BusyInterval, Command, Equipments, HardwareFeatures, LocalTime, TimeFormat,
};

/// Validation errors raised before any encoding or transmission
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    #[error("{0} will be supported in the future")]
    NotYetSupported(&'static str),

    #[error("Invalid arguments for {command}\nUsage: {usage}")]
    BadArgumentCount {
        command: &'static str,
        usage: &'static str,
    },

    #[error("Invalid value for {command}: {message}")]
    BadValue {
        command: &'static str,
        message: String,
    },

    #[error("{command}: declared length {declared} does not match actual length {actual}")]
    LengthMismatch {
        command: &'static str,
        declared: usize,
        actual: usize,
    },
}

pub type UsageResult<T> = Result<T, UsageError>;

/// Outcome of parsing one command invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Invocation {
    /// First token was `help`: print usage, send nothing
    Help(&'static str),
    /// Tokens (or defaults) produced a command ready to encode
    Send(Command),
}

/// All invocable command names, in opcode order
pub const COMMAND_NAMES: [&str; 27] = [
    "set_address_2agent",
    "set_power_off",
    "set_timeout",
    "set_local_time",
    "set_time_format",
    "set_expected_firmware_version",
    "write_asserts",
    "write_firmware",
    "set_langid",
    "set_room_size",
    "set_room_equipments",
    "set_access_right",
    "set_hardware_feature",
    "set_backlight",
    "set_room_name",
    "set_timeline",
    "on_extend_meeting",
    "on_add_meeting",
    "on_del_meeting",
    "on_update_meeting",
    "set_meeting_info",
    "set_meeting_body",
    "set_error_code",
    "get_uuid",
    "set_unconfigured_id",
    "set_panel_power",
    "cmd_set_attr",
];

/// Parse a command name plus raw tokens into an [`Invocation`], falling back
/// to `defaults` when no tokens are given.
pub fn parse(name: &str, tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    let name = name.to_ascii_lowercase().replace('-', "_");
    match name.as_str() {
        "set_address_2agent" => set_address_2agent(tokens, defaults),
        "set_power_off" => set_power_off(tokens, defaults),
        "set_timeout" => set_timeout(tokens, defaults),
        "set_local_time" => set_local_time(tokens, defaults),
        "set_time_format" => set_time_format(tokens, defaults),
        "set_expected_firmware_version" => set_expected_firmware_version(tokens, defaults),
        "write_asserts" => write_asserts(tokens, defaults),
        "write_firmware" => write_firmware(tokens, defaults),
        "set_langid" => set_langid(tokens, defaults),
        "set_room_size" => set_room_size(tokens, defaults),
        "set_room_equipments" => set_room_equipments(tokens, defaults),
        "set_access_right" => set_access_right(tokens, defaults),
        "set_hardware_feature" => set_hardware_feature(tokens, defaults),
        "set_backlight" => set_backlight(tokens, defaults),
        "set_room_name" => set_room_name(tokens, defaults),
        "set_timeline" => set_timeline(tokens, defaults),
        "on_extend_meeting" => on_extend_meeting(tokens, defaults),
        "on_add_meeting" => on_add_meeting(tokens, defaults),
        "on_del_meeting" => on_del_meeting(tokens, defaults),
        "on_update_meeting" => on_update_meeting(tokens, defaults),
        "set_meeting_info" => set_meeting_info(tokens, defaults),
        "set_meeting_body" => set_meeting_body(tokens, defaults),
        "set_error_code" => set_error_code(tokens, defaults),
        "get_uuid" => get_uuid(tokens),
        "set_unconfigured_id" => set_unconfigured_id(tokens, defaults),
        "set_panel_power" => reserved(tokens, "set_panel_power"),
        "cmd_set_attr" => reserved(tokens, "cmd_set_attr"),
        _ => Err(UsageError::UnknownCommand(name)),
    }
}

fn wants_help(tokens: &[String]) -> bool {
    tokens.first().map(String::as_str) == Some("help")
}

fn int<T: std::str::FromStr>(token: &str, command: &'static str) -> UsageResult<T> {
    token.parse().map_err(|_| UsageError::BadValue {
        command,
        message: format!("{:?} is not a valid number for this field", token),
    })
}

fn hex_u16(token: &str, command: &'static str) -> UsageResult<u16> {
    let digits = token.strip_prefix("0x").unwrap_or(token);
    u16::from_str_radix(digits, 16).map_err(|_| UsageError::BadValue {
        command,
        message: format!("{:?} is not a valid hex version", token),
    })
}

fn flag(token: &str, command: &'static str) -> UsageResult<bool> {
    match token {
        "on" | "1" | "true" => Ok(true),
        "off" | "0" | "false" => Ok(false),
        other => Err(UsageError::BadValue {
            command,
            message: format!("expected on/off/1/0, got {:?}", other),
        }),
    }
}

/// One byte per character; wide characters are rejected here rather than
/// failing later inside the encoder.
fn byte_string(s: &str, command: &'static str) -> UsageResult<Vec<u8>> {
    s.chars()
        .map(|ch| {
            let code = ch as u32;
            if code > 0xFF {
                Err(UsageError::BadValue {
                    command,
                    message: format!("character {:?} does not fit in one byte", ch),
                })
            } else {
                Ok(code as u8)
            }
        })
        .collect()
}

/// Cross-check an explicit length token against the real data length.
fn check_declared_len(
    declared: usize,
    actual: usize,
    command: &'static str,
) -> UsageResult<()> {
    if declared != actual {
        return Err(UsageError::LengthMismatch {
            command,
            declared,
            actual,
        });
    }
    Ok(())
}

fn set_address_2agent(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_address_2agent <addr 0-255>\n  Eg: send set_address_2agent 123";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let address = match tokens {
        [] => defaults.set_address_2agent,
        [addr] => int(addr, "set_address_2agent")?,
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_address_2agent",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetAddress2Agent { address }))
}

fn set_power_off(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_power_off <on|off|1|0>\n  Eg: send set_power_off on";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let on = match tokens {
        [] => defaults.set_power_off,
        [state] => flag(state, "set_power_off")?,
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_power_off",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetPowerOff { on }))
}

fn set_timeout(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_timeout <seconds 0-255>\n  Eg: send set_timeout 100";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let seconds = match tokens {
        [] => defaults.set_timeout,
        [secs] => int(secs, "set_timeout")?,
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_timeout",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetTimeout { seconds }))
}

fn set_local_time(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str =
        "set_local_time <seconds_of_day> <day> <month> <year>\n  Eg: send set_local_time 100 10 12 17";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let time = match tokens {
        [] => defaults.set_local_time,
        [secs, day, month, year] => LocalTime {
            seconds_of_day: int(secs, "set_local_time")?,
            day: int(day, "set_local_time")?,
            month: int(month, "set_local_time")?,
            year: int(year, "set_local_time")?,
        },
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_local_time",
                usage: USAGE,
            })
        }
    };
    // Subfields must fit their bit ranges before anything is packed.
    time.pack().map_err(|e| UsageError::BadValue {
        command: "set_local_time",
        message: e.to_string(),
    })?;
    Ok(Invocation::Send(Command::SetLocalTime(time)))
}

fn set_time_format(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_time_format <standard|military|s|m>\n  Eg: send set_time_format standard";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let format = match tokens {
        [] => defaults.set_time_format,
        [fmt] => match fmt.as_str() {
            "standard" | "s" => TimeFormat::Standard,
            "military" | "m" => TimeFormat::Military,
            other => {
                return Err(UsageError::BadValue {
                    command: "set_time_format",
                    message: format!("expected standard/military/s/m, got {:?}", other),
                })
            }
        },
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_time_format",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetTimeFormat(format)))
}

fn set_expected_firmware_version(
    tokens: &[String],
    defaults: &CommandDefaults,
) -> UsageResult<Invocation> {
    const USAGE: &str =
        "set_expected_firmware_version <hex_version>\n  Eg: send set_expected_firmware_version 0x1234";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let version = match tokens {
        [] => defaults.set_expected_firmware_version,
        [ver] => hex_u16(ver, "set_expected_firmware_version")?,
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_expected_firmware_version",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetExpectedFirmwareVersion {
        version,
    }))
}

fn write_asserts(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "write_asserts [<path_len> <path> <data_len> <data> | <path> <data>]\n  \
                         Eg: send write_asserts /Document/file 'This is assert data'";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let (path, data) = match tokens {
        [] => (
            defaults.write_asserts.path.clone(),
            defaults.write_asserts.data.clone(),
        ),
        [path, data] => (path.clone(), data.clone()),
        [path_len, path, data_len, data] => {
            check_declared_len(
                int(path_len, "write_asserts")?,
                path.chars().count(),
                "write_asserts",
            )?;
            check_declared_len(
                int(data_len, "write_asserts")?,
                data.chars().count(),
                "write_asserts",
            )?;
            (path.clone(), data.clone())
        }
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "write_asserts",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::WriteAsserts { path, data }))
}

fn write_firmware(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "write_firmware [<data_len> <data> | <data>]\n  Eg: send write_firmware 4 ABCD";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let data = match tokens {
        [] => byte_string(&defaults.write_firmware.data, "write_firmware")?,
        [data] => byte_string(data, "write_firmware")?,
        [data_len, data] => {
            check_declared_len(
                int(data_len, "write_firmware")?,
                data.chars().count(),
                "write_firmware",
            )?;
            byte_string(data, "write_firmware")?
        }
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "write_firmware",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::WriteFirmware { data }))
}

fn set_langid(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_langid <id 0-255>\n  Eg: send set_langid 1";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let id = match tokens {
        [] => defaults.set_langid,
        [id] => int(id, "set_langid")?,
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_langid",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetLangId { id }))
}

fn set_room_size(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_room_size <people 0-65535>\n  Eg: send set_room_size 100";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let people = match tokens {
        [] => defaults.set_room_size,
        [people] => int(people, "set_room_size")?,
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_room_size",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetRoomSize { people }))
}

fn set_room_equipments(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_room_equipments [pr] [vi] [au] [tv] [la] [pc]\n  \
                         pr projector, vi video conference, au audio conference, tv, la laptop, pc\n  \
                         Eg: send set_room_equipments pr tv";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let equipments = if tokens.is_empty() {
        defaults.set_room_equipments
    } else {
        if tokens.len() > 6 {
            return Err(UsageError::BadArgumentCount {
                command: "set_room_equipments",
                usage: USAGE,
            });
        }
        let mut eq = Equipments::default();
        for token in tokens {
            match token.as_str() {
                "pr" => eq.projector = true,
                "vi" => eq.video_conference = true,
                "au" => eq.audio_conference = true,
                "tv" => eq.tv = true,
                "la" => eq.laptop = true,
                "pc" => eq.pc = true,
                other => {
                    return Err(UsageError::BadValue {
                        command: "set_room_equipments",
                        message: format!("unknown equipment {:?}", other),
                    })
                }
            }
        }
        eq
    };
    Ok(Invocation::Send(Command::SetRoomEquipments(equipments)))
}

fn set_access_right(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_access_right [ex] [cl] [ca] [fu] [os] [en] [au]\n  \
                         each flag disables a capability: ex extend, cl claim, ca cancel,\n  \
                         fu future booking, os on-spot booking, en end meeting, au authenticate\n  \
                         Eg: send set_access_right ex au";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let restrictions = if tokens.is_empty() {
        defaults.set_access_right
    } else {
        if tokens.len() > 7 {
            return Err(UsageError::BadArgumentCount {
                command: "set_access_right",
                usage: USAGE,
            });
        }
        let mut ar = AccessRestrictions::default();
        for token in tokens {
            match token.as_str() {
                "ex" => ar.disable_extend_meeting = true,
                "cl" => ar.disable_claim_meeting = true,
                "ca" => ar.disable_cancel_meeting = true,
                "fu" => ar.disable_future_booking = true,
                "os" => ar.disable_on_spot_booking = true,
                "en" => ar.disable_end_meeting = true,
                "au" => ar.disable_auth = true,
                other => {
                    return Err(UsageError::BadValue {
                        command: "set_access_right",
                        message: format!("unknown access flag {:?}", other),
                    })
                }
            }
        }
        ar
    };
    Ok(Invocation::Send(Command::SetAccessRight(restrictions)))
}

fn set_hardware_feature(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_hardware_feature [mute] [led_off] [rfid_off]\n  \
                         Eg: send set_hardware_feature mute";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let features = if tokens.is_empty() {
        defaults.set_hardware_feature
    } else {
        if tokens.len() > 3 {
            return Err(UsageError::BadArgumentCount {
                command: "set_hardware_feature",
                usage: USAGE,
            });
        }
        let mut hw = HardwareFeatures::default();
        for token in tokens {
            match token.as_str() {
                "mute" => hw.mute = true,
                "led_off" => hw.led_off = true,
                "rfid_off" => hw.rfid_off = true,
                other => {
                    return Err(UsageError::BadValue {
                        command: "set_hardware_feature",
                        message: format!("unknown hardware feature {:?}", other),
                    })
                }
            }
        }
        hw
    };
    Ok(Invocation::Send(Command::SetHardwareFeature(features)))
}

fn set_backlight(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_backlight <on|off|1|0>\n  Eg: send set_backlight on";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let on = match tokens {
        [] => defaults.set_backlight,
        [state] => flag(state, "set_backlight")?,
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_backlight",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetBacklight { on }))
}

fn set_room_name(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_room_name [<len>] <name>\n  Eg: send set_room_name 'Meeting room'";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let name = match tokens {
        [] => defaults.set_room_name.clone(),
        [name] => name.clone(),
        [len, name] => {
            check_declared_len(
                int(len, "set_room_name")?,
                name.chars().count(),
                "set_room_name",
            )?;
            name.clone()
        }
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_room_name",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetRoomName { name }))
}

fn set_timeline(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_timeline <day_offset> <count> <start end>...\n  \
                         Eg: send set_timeline 0 1 10 20";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let (day_offset, busy) = if tokens.is_empty() {
        (
            defaults.set_timeline.day_offset,
            defaults.set_timeline.busy.clone(),
        )
    } else {
        if tokens.len() < 4 || (tokens.len() - 2) % 2 != 0 {
            return Err(UsageError::BadArgumentCount {
                command: "set_timeline",
                usage: USAGE,
            });
        }
        let day_offset = int(&tokens[0], "set_timeline")?;
        let count: usize = int(&tokens[1], "set_timeline")?;
        check_declared_len(count, (tokens.len() - 2) / 2, "set_timeline")?;
        let mut busy = Vec::with_capacity(count);
        for pair in tokens[2..].chunks(2) {
            busy.push(BusyInterval {
                start_time: int(&pair[0], "set_timeline")?,
                end_time: int(&pair[1], "set_timeline")?,
            });
        }
        (day_offset, busy)
    };
    Ok(Invocation::Send(Command::SetTimeline { day_offset, busy }))
}

fn on_extend_meeting(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "on_extend_meeting <day_offset> <start_time> <new_duration>\n  \
                         Eg: send on_extend_meeting 2 1234 1000";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let command = match tokens {
        [] => Command::OnExtendMeeting {
            day_offset: defaults.on_extend_meeting.day_offset,
            start_time: defaults.on_extend_meeting.start_time,
            new_duration: defaults.on_extend_meeting.new_duration,
        },
        [day, start, duration] => Command::OnExtendMeeting {
            day_offset: int(day, "on_extend_meeting")?,
            start_time: int(start, "on_extend_meeting")?,
            new_duration: int(duration, "on_extend_meeting")?,
        },
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "on_extend_meeting",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(command))
}

fn on_add_meeting(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "on_add_meeting <day_offset> <start_time> <duration>\n  \
                         Eg: send on_add_meeting 2 1234 1000";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let command = match tokens {
        [] => Command::OnAddMeeting {
            day_offset: defaults.on_add_meeting.day_offset,
            start_time: defaults.on_add_meeting.start_time,
            duration: defaults.on_add_meeting.duration,
        },
        [day, start, duration] => Command::OnAddMeeting {
            day_offset: int(day, "on_add_meeting")?,
            start_time: int(start, "on_add_meeting")?,
            duration: int(duration, "on_add_meeting")?,
        },
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "on_add_meeting",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(command))
}

fn on_del_meeting(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "on_del_meeting <day_offset> <start_time>\n  Eg: send on_del_meeting 12 1234";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let command = match tokens {
        [] => Command::OnDelMeeting {
            day_offset: defaults.on_del_meeting.day_offset,
            start_time: defaults.on_del_meeting.start_time,
        },
        [day, start] => Command::OnDelMeeting {
            day_offset: int(day, "on_del_meeting")?,
            start_time: int(start, "on_del_meeting")?,
        },
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "on_del_meeting",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(command))
}

fn on_update_meeting(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str =
        "on_update_meeting <day_offset> <start_time>\n  Eg: send on_update_meeting 12 1234";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let command = match tokens {
        [] => Command::OnUpdateMeeting {
            day_offset: defaults.on_update_meeting.day_offset,
            start_time: defaults.on_update_meeting.start_time,
        },
        [day, start] => Command::OnUpdateMeeting {
            day_offset: int(day, "on_update_meeting")?,
            start_time: int(start, "on_update_meeting")?,
        },
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "on_update_meeting",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(command))
}

fn set_meeting_info(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_meeting_info [<subject> <organizer> | <subject_len> <organizer_len> <text>]\n  \
                         Eg: send set_meeting_info 'Weekly sync' Facilities";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let (subject, organizer) = match tokens {
        [] => (
            defaults.set_meeting_info.subject.clone(),
            defaults.set_meeting_info.organizer.clone(),
        ),
        [subject, organizer] => (subject.clone(), organizer.clone()),
        [subject_len, organizer_len, text] => {
            let subject_len: usize = int(subject_len, "set_meeting_info")?;
            let organizer_len: usize = int(organizer_len, "set_meeting_info")?;
            let chars: Vec<char> = text.chars().collect();
            check_declared_len(subject_len + organizer_len, chars.len(), "set_meeting_info")?;
            (
                chars[..subject_len].iter().collect(),
                chars[subject_len..].iter().collect(),
            )
        }
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_meeting_info",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetMeetingInfo {
        subject,
        organizer,
    }))
}

fn set_meeting_body(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str =
        "set_meeting_body [<len>] <text>\n  Eg: send set_meeting_body 'Cafe is good for programmer'";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let body = match tokens {
        [] => defaults.set_meeting_body.clone(),
        [body] => body.clone(),
        [len, body] => {
            check_declared_len(
                int(len, "set_meeting_body")?,
                body.chars().count(),
                "set_meeting_body",
            )?;
            body.clone()
        }
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_meeting_body",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetMeetingBody { body }))
}

fn set_error_code(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_error_code <code 0-255>\n  Eg: send set_error_code 255";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let code = match tokens {
        [] => defaults.set_error_code,
        [code] => int(code, "set_error_code")?,
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_error_code",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetErrorCode { code }))
}

fn get_uuid(tokens: &[String]) -> UsageResult<Invocation> {
    const USAGE: &str = "get_uuid\n  Requests the agent UUID list from the hub and stores it";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    if !tokens.is_empty() {
        return Err(UsageError::BadArgumentCount {
            command: "get_uuid",
            usage: USAGE,
        });
    }
    Ok(Invocation::Send(Command::GetUuid))
}

fn set_unconfigured_id(tokens: &[String], defaults: &CommandDefaults) -> UsageResult<Invocation> {
    const USAGE: &str = "set_unconfigured_id <id 0-65535>\n  Eg: send set_unconfigured_id 1234";
    if wants_help(tokens) {
        return Ok(Invocation::Help(USAGE));
    }
    let id = match tokens {
        [] => defaults.set_unconfigured_id,
        [id] => int(id, "set_unconfigured_id")?,
        _ => {
            return Err(UsageError::BadArgumentCount {
                command: "set_unconfigured_id",
                usage: USAGE,
            })
        }
    };
    Ok(Invocation::Send(Command::SetUnconfiguredId { id }))
}

fn reserved(tokens: &[String], name: &'static str) -> UsageResult<Invocation> {
    if wants_help(tokens) {
        return Ok(Invocation::Help("Will be supported in the future"));
    }
    Err(UsageError::NotYetSupported(name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toks(tokens: &[&str]) -> Vec<String> {
        tokens.iter().map(|s| s.to_string()).collect()
    }

    fn send(name: &str, tokens: &[&str]) -> UsageResult<Command> {
        match parse(name, &toks(tokens), &CommandDefaults::default())? {
            Invocation::Send(cmd) => Ok(cmd),
            Invocation::Help(_) => panic!("unexpected help"),
        }
    }

    #[test]
    fn test_help_token_short_circuits() {
        for name in COMMAND_NAMES {
            let parsed = parse(name, &toks(&["help"]), &CommandDefaults::default()).unwrap();
            assert!(matches!(parsed, Invocation::Help(_)), "{}", name);
        }
    }

    #[test]
    fn test_no_tokens_uses_defaults() {
        let defaults = CommandDefaults::default();
        let cmd = send("set_timeout", &[]).unwrap();
        assert_eq!(
            cmd,
            Command::SetTimeout {
                seconds: defaults.set_timeout
            }
        );

        let cmd = send("set_room_name", &[]).unwrap();
        let encoded = cmd.encode_payload().unwrap();
        let from_defaults = Command::SetRoomName {
            name: defaults.set_room_name.clone(),
        }
        .encode_payload()
        .unwrap();
        assert_eq!(encoded, from_defaults);
    }

    #[test]
    fn test_every_command_encodes_from_defaults() {
        let defaults = CommandDefaults::default();
        for name in COMMAND_NAMES {
            match parse(name, &[], &defaults) {
                Ok(Invocation::Send(cmd)) => {
                    cmd.encode_payload().unwrap();
                }
                Err(UsageError::NotYetSupported(_)) => {
                    assert!(name == "set_panel_power" || name == "cmd_set_attr");
                }
                other => panic!("{}: unexpected {:?}", name, other),
            }
        }
    }

    #[test]
    fn test_address_boundaries() {
        assert_eq!(
            send("set_address_2agent", &["255"]).unwrap(),
            Command::SetAddress2Agent { address: 255 }
        );
        assert!(send("set_address_2agent", &["256"]).is_err());
    }

    #[test]
    fn test_room_size_boundaries() {
        assert_eq!(
            send("set_room_size", &["65535"]).unwrap(),
            Command::SetRoomSize { people: 65535 }
        );
        assert!(send("set_room_size", &["65536"]).is_err());
    }

    #[test]
    fn test_local_time_range_checked_at_parse() {
        assert!(send("set_local_time", &["100", "10", "12", "17"]).is_ok());
        assert!(send("set_local_time", &["131072", "1", "1", "1"]).is_err());
        assert!(send("set_local_time", &["0", "32", "1", "1"]).is_err());
        assert!(send("set_local_time", &["0", "1", "16", "1"]).is_err());
        assert!(send("set_local_time", &["0", "1", "1", "64"]).is_err());
    }

    #[test]
    fn test_equipment_tokens() {
        let cmd = send("set_room_equipments", &["pr", "tv"]).unwrap();
        assert_eq!(cmd.encode_payload().unwrap(), vec![0b0000_1001]);
        assert!(send("set_room_equipments", &["xx"]).is_err());
    }

    #[test]
    fn test_declared_length_cross_checks() {
        assert!(send("set_room_name", &["12", "Meeting room"]).is_ok());
        assert!(send("set_room_name", &["11", "Meeting room"]).is_err());
        assert!(send("set_meeting_body", &["4", "text"]).is_ok());
        assert!(send("set_meeting_body", &["5", "text"]).is_err());
        assert!(send("write_firmware", &["3", "ABCD"]).is_err());
    }

    #[test]
    fn test_meeting_info_split() {
        let cmd = send("set_meeting_info", &["4", "3", "subjorg"]).unwrap();
        assert_eq!(
            cmd,
            Command::SetMeetingInfo {
                subject: "subj".to_string(),
                organizer: "org".to_string(),
            }
        );
        assert!(send("set_meeting_info", &["4", "4", "subjorg"]).is_err());
    }

    #[test]
    fn test_timeline_count_cross_check() {
        let cmd = send("set_timeline", &["0", "1", "10", "20"]).unwrap();
        assert_eq!(
            cmd,
            Command::SetTimeline {
                day_offset: 0,
                busy: vec![BusyInterval {
                    start_time: 10,
                    end_time: 20
                }],
            }
        );
        // count says 2 but only one pair given
        assert!(send("set_timeline", &["0", "2", "10", "20"]).is_err());
        // odd number of interval tokens
        assert!(send("set_timeline", &["0", "1", "10", "20", "30"]).is_err());
    }

    #[test]
    fn test_firmware_version_hex() {
        assert_eq!(
            send("set_expected_firmware_version", &["0x1234"]).unwrap(),
            Command::SetExpectedFirmwareVersion { version: 0x1234 }
        );
        assert_eq!(
            send("set_expected_firmware_version", &["beef"]).unwrap(),
            Command::SetExpectedFirmwareVersion { version: 0xBEEF }
        );
    }

    #[test]
    fn test_reserved_commands() {
        assert!(matches!(
            send("set_panel_power", &[]),
            Err(UsageError::NotYetSupported(_))
        ));
        assert!(matches!(
            send("cmd_set_attr", &["1"]),
            Err(UsageError::NotYetSupported(_))
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            send("set_warp_drive", &[]),
            Err(UsageError::UnknownCommand(_))
        ));
    }

    #[test]
    fn test_name_normalization() {
        assert!(send("SET-ROOM-SIZE", &["10"]).is_ok());
    }

    #[test]
    fn test_get_uuid_takes_no_tokens() {
        assert_eq!(send("get_uuid", &[]).unwrap(), Command::GetUuid);
        assert!(send("get_uuid", &["1"]).is_err());
    }
}
