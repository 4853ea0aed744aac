//! Configuration module
//!
//! Loads the immutable panlctl configuration: hub peer address, local device
//! identity, per-command default arguments, agent-list location, RFID
//! defaults, and the emulator launch topology. The configuration is built
//! once at startup and passed by reference; nothing mutates it afterwards.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocol::{
    AccessRestrictions, AgentUuid, BusyInterval, Equipments, HardwareFeatures, LocalTime,
    TimeFormat, DEFAULT_PORT, PROTOCOL_VERSION,
};

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Hub peer address
    #[serde(default)]
    pub hub: HubConfig,

    /// Local device identity placed in every header
    #[serde(default)]
    pub device: DeviceConfig,

    /// Persisted agent list location
    #[serde(default)]
    pub agents: AgentsConfig,

    /// RFID injection peer and card defaults
    #[serde(default)]
    pub rfid: RfidConfig,

    /// Per-command default arguments
    #[serde(default)]
    pub defaults: CommandDefaults,

    /// Emulator/agent/hub launch topology
    #[serde(default)]
    pub launch: LaunchConfig,
}

/// Hub peer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HubConfig {
    /// Hub host name or IP
    #[serde(default = "default_host")]
    pub host: String,
    /// Hub UDP port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Local device identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Protocol version word sent in every header
    #[serde(default = "default_version")]
    pub version: u32,
    /// Destination panel MAC
    #[serde(default = "default_panel_mac")]
    pub panel_mac: u8,
    /// Agent UUID used when none is selected from the discovered list
    #[serde(default)]
    pub agent_uuid: AgentUuid,
}

fn default_version() -> u32 {
    PROTOCOL_VERSION
}

fn default_panel_mac() -> u8 {
    255
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            version: default_version(),
            panel_mac: default_panel_mac(),
            agent_uuid: AgentUuid::default(),
        }
    }
}

/// Agent list persistence configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentsConfig {
    /// Where discovery writes the agent UUID list
    #[serde(default = "default_agent_list_path")]
    pub list_path: PathBuf,
}

fn default_agent_list_path() -> PathBuf {
    PathBuf::from("agent_uuid_list.json")
}

impl Default for AgentsConfig {
    fn default() -> Self {
        Self {
            list_path: default_agent_list_path(),
        }
    }
}

/// RFID injection defaults (device protocol, sent straight to an agent)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RfidConfig {
    #[serde(default = "default_host")]
    pub agent_host: String,
    #[serde(default = "default_port")]
    pub agent_port: u16,
    /// Destination agent MAC
    #[serde(default = "default_rfid_mac")]
    pub agent_mac: u8,
    /// Source panel MAC
    #[serde(default = "default_rfid_mac")]
    pub panel_mac: u8,
    /// Card id injected when none is given
    #[serde(default = "default_card_id")]
    pub card_id: String,
}

fn default_rfid_mac() -> u8 {
    16
}

fn default_card_id() -> String {
    "0123456789".to_string()
}

impl Default for RfidConfig {
    fn default() -> Self {
        Self {
            agent_host: default_host(),
            agent_port: default_port(),
            agent_mac: default_rfid_mac(),
            panel_mac: default_rfid_mac(),
            card_id: default_card_id(),
        }
    }
}

/// Default arguments per command, used whenever a command is invoked with no
/// tokens. Read-only for the process lifetime.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandDefaults {
    pub set_address_2agent: u8,
    pub set_power_off: bool,
    pub set_timeout: u8,
    pub set_local_time: LocalTime,
    pub set_time_format: TimeFormat,
    pub set_expected_firmware_version: u16,
    pub write_asserts: WriteAssertsDefaults,
    pub write_firmware: WriteFirmwareDefaults,
    pub set_langid: u8,
    pub set_room_size: u16,
    pub set_room_equipments: Equipments,
    pub set_access_right: AccessRestrictions,
    pub set_hardware_feature: HardwareFeatures,
    pub set_backlight: bool,
    pub set_room_name: String,
    pub set_timeline: TimelineDefaults,
    pub on_extend_meeting: ExtendMeetingDefaults,
    pub on_add_meeting: AddMeetingDefaults,
    pub on_del_meeting: MeetingKeyDefaults,
    pub on_update_meeting: MeetingKeyDefaults,
    pub set_meeting_info: MeetingInfoDefaults,
    pub set_meeting_body: String,
    pub set_error_code: u8,
    pub set_unconfigured_id: u16,
}

impl Default for CommandDefaults {
    fn default() -> Self {
        Self {
            set_address_2agent: 1,
            set_power_off: false,
            set_timeout: 60,
            set_local_time: LocalTime {
                seconds_of_day: 0,
                day: 1,
                month: 1,
                year: 17,
            },
            set_time_format: TimeFormat::Standard,
            set_expected_firmware_version: 0x0100,
            write_asserts: WriteAssertsDefaults::default(),
            write_firmware: WriteFirmwareDefaults::default(),
            set_langid: 0,
            set_room_size: 10,
            set_room_equipments: Equipments::default(),
            set_access_right: AccessRestrictions::default(),
            set_hardware_feature: HardwareFeatures::default(),
            set_backlight: true,
            set_room_name: "Meeting room".to_string(),
            set_timeline: TimelineDefaults::default(),
            on_extend_meeting: ExtendMeetingDefaults::default(),
            on_add_meeting: AddMeetingDefaults::default(),
            on_del_meeting: MeetingKeyDefaults::default(),
            on_update_meeting: MeetingKeyDefaults::default(),
            set_meeting_info: MeetingInfoDefaults::default(),
            set_meeting_body: "No agenda".to_string(),
            set_error_code: 0,
            set_unconfigured_id: 1234,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteAssertsDefaults {
    pub path: String,
    pub data: String,
}

impl Default for WriteAssertsDefaults {
    fn default() -> Self {
        Self {
            path: "/Document/file".to_string(),
            data: "This is assert data".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WriteFirmwareDefaults {
    /// Firmware bytes given as a plain string, matching the emulator's test
    /// payloads
    pub data: String,
}

impl Default for WriteFirmwareDefaults {
    fn default() -> Self {
        Self {
            data: "firmware".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimelineDefaults {
    pub day_offset: u8,
    pub busy: Vec<BusyInterval>,
}

impl Default for TimelineDefaults {
    fn default() -> Self {
        Self {
            day_offset: 0,
            busy: vec![BusyInterval {
                start_time: 540,
                end_time: 600,
            }],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtendMeetingDefaults {
    pub day_offset: u8,
    pub start_time: u16,
    pub new_duration: u16,
}

impl Default for ExtendMeetingDefaults {
    fn default() -> Self {
        Self {
            day_offset: 0,
            start_time: 540,
            new_duration: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AddMeetingDefaults {
    pub day_offset: u8,
    pub start_time: u16,
    pub duration: u16,
}

impl Default for AddMeetingDefaults {
    fn default() -> Self {
        Self {
            day_offset: 0,
            start_time: 540,
            duration: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingKeyDefaults {
    pub day_offset: u8,
    pub start_time: u16,
}

impl Default for MeetingKeyDefaults {
    fn default() -> Self {
        Self {
            day_offset: 0,
            start_time: 540,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MeetingInfoDefaults {
    pub subject: String,
    pub organizer: String,
}

impl Default for MeetingInfoDefaults {
    fn default() -> Self {
        Self {
            subject: "Weekly sync".to_string(),
            organizer: "Facilities".to_string(),
        }
    }
}

/// Launch topology: which binaries to start and how to wire them together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// PanL70 emulator binary
    pub emulator_bin: Option<PathBuf>,
    /// Agent binary
    pub agent_bin: Option<PathBuf>,
    /// Hub binary
    pub hub_bin: Option<PathBuf>,
    /// Agents (and their panels) to start
    pub agents: Vec<LaunchAgent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchAgent {
    pub mac: u8,
    pub hub_host: String,
    pub hub_port: u16,
    pub bacnet_port: u16,
    #[serde(default)]
    pub panels: Vec<LaunchPanel>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchPanel {
    pub mac: u8,
    pub uuid: AgentUuid,
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from the default location
    pub fn load_default() -> ConfigResult<Self> {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("panlctl/config.toml")),
            Some(PathBuf::from("./panlctl.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path in config_paths.iter().flatten() {
            if path.exists() {
                return Self::load(path);
            }
        }

        // Compiled-in defaults if no file found
        Ok(Self::default())
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let contents = toml::to_string_pretty(self)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Generate a sample configuration file
pub fn generate_sample_config() -> String {
    let config = Config {
        hub: HubConfig {
            host: "192.168.1.10".to_string(),
            port: DEFAULT_PORT,
        },
        device: DeviceConfig {
            version: PROTOCOL_VERSION,
            panel_mac: 16,
            agent_uuid: "01:02:03:04:05:06:07:08".parse().unwrap(),
        },
        launch: LaunchConfig {
            emulator_bin: Some(PathBuf::from("/opt/panl/panl70_emulator")),
            agents: vec![LaunchAgent {
                mac: 1,
                hub_host: "192.168.1.10".to_string(),
                hub_port: DEFAULT_PORT,
                bacnet_port: 47808,
                panels: vec![LaunchPanel {
                    mac: 16,
                    uuid: "01:02:03:04:05:06:07:08".parse().unwrap(),
                }],
            }],
            ..Default::default()
        },
        ..Default::default()
    };

    toml::to_string_pretty(&config).unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.hub.port, DEFAULT_PORT);
        assert_eq!(config.device.version, PROTOCOL_VERSION);
        assert_eq!(config.defaults.set_room_name, "Meeting room");
    }

    #[test]
    fn test_save_and_load() {
        let config = Config::default();
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");

        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert_eq!(loaded.hub.port, config.hub.port);
        assert_eq!(loaded.defaults.set_timeout, config.defaults.set_timeout);
    }

    #[test]
    fn test_malformed_config_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[hub]\nport = \"not a port\"\n").unwrap();

        // A file that exists but does not parse must fail loudly, never fall
        // back to compiled-in defaults.
        assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_partial_config() {
        // Omitted sections and fields fall back to defaults.
        let config: Config = toml::from_str("[hub]\nhost = \"10.0.0.2\"\n").unwrap();
        assert_eq!(config.hub.host, "10.0.0.2");
        assert_eq!(config.hub.port, DEFAULT_PORT);
        assert_eq!(config.device.panel_mac, 255);
    }

    #[test]
    fn test_sample_config() {
        let sample = generate_sample_config();
        let parsed: Config = toml::from_str(&sample).unwrap();
        assert_eq!(parsed.device.panel_mac, 16);
        assert_eq!(
            parsed.launch.agents[0].panels[0].uuid.to_string(),
            "01:02:03:04:05:06:07:08"
        );
    }
}
