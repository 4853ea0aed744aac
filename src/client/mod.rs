//! UDP dispatcher
//!
//! One invocation, one socket: the dispatcher binds an ephemeral port and
//! sends a single datagram to the hub (or, on the RFID path, to an agent).
//! Commands are fire-and-forget: a successful send is terminal. Discovery is
//! the one request/response exchange, with a longer wait and a decoded,
//! persisted result.

use std::time::Duration;

use bytes::BufMut;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::agents::{AgentError, AgentList, AgentStore};
use crate::config::{DeviceConfig, RfidConfig};
use crate::protocol::{
    hex_dump, AgentUuid, CodecError, Command, DeviceHeader, HubCommand, MessageHeader,
    AGENT_UUID_SIZE, HEADER_SIZE, RFID_COMMAND,
};

/// Bound on a single datagram send
const SEND_TIMEOUT: Duration = Duration::from_secs(1);
/// Wait for the hub's agent list reply
const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Receive buffer size; a reply that fills it completely is treated as
/// malformed rather than silently truncated.
const MAX_DATAGRAM: usize = 4096;

/// Dispatch errors
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Encoding error: {0}")]
    Codec(#[from] CodecError),

    #[error("Timed out after {0:?}")]
    Timeout(Duration),

    #[error("Malformed agent list reply: {0}")]
    BadAgentReply(String),

    #[error(transparent)]
    Agents(#[from] AgentError),
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Sends encoded commands to one hub on behalf of one panel identity
pub struct Dispatcher {
    socket: UdpSocket,
    version: u32,
    dst_mac: u8,
    agent_uuid: AgentUuid,
}

impl Dispatcher {
    /// Bind an ephemeral local port and associate it with the hub address.
    pub async fn connect(host: &str, port: u16, device: &DeviceConfig) -> ClientResult<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0").await?;
        socket.connect((host, port)).await?;
        debug!(peer = %format!("{}:{}", host, port), "Dispatcher socket ready");
        Ok(Self {
            socket,
            version: device.version,
            dst_mac: device.panel_mac,
            agent_uuid: device.agent_uuid,
        })
    }

    /// Override the agent UUID carried in the hub header.
    pub fn set_agent_uuid(&mut self, uuid: AgentUuid) {
        self.agent_uuid = uuid;
    }

    fn header(&self, hub_command: HubCommand) -> MessageHeader {
        MessageHeader {
            version: self.version,
            dst_mac: self.dst_mac,
            hub_command,
            agent_uuid: self.agent_uuid,
        }
    }

    /// Forward one encoded command to the hub. Fire-and-forget: a successful
    /// send is terminal, no reply is expected for forwarded commands.
    pub async fn send_command(&self, command: &Command) -> ClientResult<()> {
        let frame = command.encode()?;
        let datagram = self.header(HubCommand::Forward).encode(&frame)?;

        info!(opcode = command.opcode() as u8, bytes = datagram.len(), "Sending command");
        debug!(wire = %hex_dump(&datagram), "Datagram");
        send_bounded(&self.socket, &datagram).await
    }

    /// Run the agent discovery exchange and persist the decoded list.
    ///
    /// A timeout or a malformed reply fails the exchange and leaves any
    /// previously persisted list untouched.
    pub async fn discover_agents(&self, store: &AgentStore) -> ClientResult<AgentList> {
        let frame = Command::GetUuid.encode()?;
        let datagram = self.header(HubCommand::GetAgentList).encode(&frame)?;

        info!(bytes = datagram.len(), "Requesting agent list");
        debug!(wire = %hex_dump(&datagram), "Datagram");
        send_bounded(&self.socket, &datagram).await?;

        let mut buf = [0u8; MAX_DATAGRAM];
        let n = match timeout(DISCOVERY_TIMEOUT, self.socket.recv(&mut buf)).await {
            Ok(received) => received?,
            Err(_) => return Err(ClientError::Timeout(DISCOVERY_TIMEOUT)),
        };
        debug!(bytes = n, reply = %hex_dump(&buf[..n]), "Discovery reply");
        if n == MAX_DATAGRAM {
            return Err(ClientError::BadAgentReply(format!(
                "reply filled the {}-byte receive buffer and may be truncated",
                MAX_DATAGRAM
            )));
        }

        let uuids = parse_agent_list_reply(&buf[..n])?;
        let list = AgentList::new(uuids);
        store.save(&list)?;
        for (i, uuid) in list.iter().enumerate() {
            info!(index = i + 1, uuid = %uuid, "Discovered agent");
        }
        Ok(list)
    }
}

/// Decode a GET_AGENT_LIST reply datagram into agent UUIDs.
///
/// The reply carries a hub header followed by zero-padded 8-byte UUID
/// groups; the header is skipped, the remainder must be a positive multiple
/// of the UUID size.
pub fn parse_agent_list_reply(datagram: &[u8]) -> ClientResult<Vec<AgentUuid>> {
    if datagram.len() < HEADER_SIZE {
        return Err(ClientError::BadAgentReply(format!(
            "reply of {} bytes is shorter than the {}-byte header",
            datagram.len(),
            HEADER_SIZE
        )));
    }
    let body = &datagram[HEADER_SIZE..];
    if body.is_empty() || body.len() % AGENT_UUID_SIZE != 0 {
        return Err(ClientError::BadAgentReply(format!(
            "body of {} bytes is not a positive multiple of {}",
            body.len(),
            AGENT_UUID_SIZE
        )));
    }

    let uuids = body
        .chunks_exact(AGENT_UUID_SIZE)
        .map(|chunk| {
            let mut uuid = [0u8; AGENT_UUID_SIZE];
            uuid.copy_from_slice(chunk);
            AgentUuid(uuid)
        })
        .collect();
    Ok(uuids)
}

/// Inject a simulated RFID card tap directly at an agent.
///
/// This path speaks the device protocol (8-byte header), not the hub
/// protocol: the payload is the RFID command byte followed by the card id
/// characters.
pub async fn inject_rfid(rfid: &RfidConfig, version: u32) -> ClientResult<()> {
    let mut payload = bytes::BytesMut::with_capacity(1 + rfid.card_id.len());
    payload.put_u8(RFID_COMMAND);
    crate::protocol::put_str(&mut payload, &rfid.card_id)?;

    let header = DeviceHeader {
        version,
        dst_mac: rfid.agent_mac,
        src_mac: rfid.panel_mac,
    };
    let datagram = header.encode(&payload)?;

    let socket = UdpSocket::bind("0.0.0.0:0").await?;
    socket.connect((rfid.agent_host.as_str(), rfid.agent_port)).await?;
    info!(
        card = %rfid.card_id,
        peer = %format!("{}:{}", rfid.agent_host, rfid.agent_port),
        "Injecting RFID tap"
    );
    debug!(wire = %hex_dump(&datagram), "Datagram");
    send_bounded(&socket, &datagram).await
}

/// Send one datagram with the send-side timeout applied.
async fn send_bounded(socket: &UdpSocket, datagram: &[u8]) -> ClientResult<()> {
    match timeout(SEND_TIMEOUT, socket.send(datagram)).await {
        Ok(sent) => {
            sent?;
            Ok(())
        }
        Err(_) => Err(ClientError::Timeout(SEND_TIMEOUT)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DeviceConfig;
    use crate::protocol::PROTOCOL_VERSION;
    use tempfile::TempDir;

    fn reply_with_body(body: &[u8]) -> Vec<u8> {
        let header = MessageHeader {
            version: PROTOCOL_VERSION,
            dst_mac: 255,
            hub_command: HubCommand::GetAgentList,
            agent_uuid: AgentUuid::default(),
        };
        header.encode(body).unwrap().to_vec()
    }

    #[test]
    fn test_parse_agent_list_reply() {
        let mut body = Vec::new();
        body.extend(1u8..=8);
        body.extend(9u8..=16);
        let uuids = parse_agent_list_reply(&reply_with_body(&body)).unwrap();
        assert_eq!(
            uuids,
            vec![
                AgentUuid([1, 2, 3, 4, 5, 6, 7, 8]),
                AgentUuid([9, 10, 11, 12, 13, 14, 15, 16]),
            ]
        );
    }

    #[test]
    fn test_parse_rejects_short_datagram() {
        assert!(matches!(
            parse_agent_list_reply(&[0u8; 10]),
            Err(ClientError::BadAgentReply(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_body() {
        assert!(matches!(
            parse_agent_list_reply(&reply_with_body(&[])),
            Err(ClientError::BadAgentReply(_))
        ));
    }

    #[test]
    fn test_parse_rejects_ragged_body() {
        assert!(matches!(
            parse_agent_list_reply(&reply_with_body(&[0u8; 15])),
            Err(ClientError::BadAgentReply(_))
        ));
    }

    async fn fake_hub() -> (UdpSocket, std::net::SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    #[tokio::test]
    async fn test_send_command_frames_datagram() {
        let (hub, addr) = fake_hub().await;
        let dispatcher = Dispatcher::connect(
            "127.0.0.1",
            addr.port(),
            &DeviceConfig::default(),
        )
        .await
        .unwrap();

        let hub_task = tokio::spawn(async move {
            let mut buf = [0u8; MAX_DATAGRAM];
            let (n, _) = hub.recv_from(&mut buf).await.unwrap();
            buf[..n].to_vec()
        });

        dispatcher
            .send_command(&Command::SetTimeout { seconds: 100 })
            .await
            .unwrap();

        let datagram = hub_task.await.unwrap();
        assert_eq!(datagram.len(), HEADER_SIZE + 2);
        assert_eq!(&datagram[0..4], &[0xFE, 0xCA, 0xFE, 0xCA]);
        // hubCommand FORWARD, derived length, then opcode + value
        assert_eq!(datagram[5], 0);
        assert_eq!(&datagram[6..8], &[2, 0]);
        assert_eq!(&datagram[16..], &[2, 100]);
    }

    #[tokio::test]
    async fn test_send_command_returns_without_awaiting_reply() {
        let (hub, addr) = fake_hub().await;
        let dispatcher = Dispatcher::connect(
            "127.0.0.1",
            addr.port(),
            &DeviceConfig::default(),
        )
        .await
        .unwrap();

        // The hub receives but never replies.
        tokio::spawn(async move {
            let mut buf = [0u8; MAX_DATAGRAM];
            let _ = hub.recv_from(&mut buf).await;
        });

        let started = std::time::Instant::now();
        dispatcher
            .send_command(&Command::SetBacklight { on: true })
            .await
            .unwrap();
        assert!(
            started.elapsed() < Duration::from_millis(500),
            "send blocked for {:?}",
            started.elapsed()
        );
    }

    #[tokio::test]
    async fn test_discover_agents_persists_list() {
        let (hub, addr) = fake_hub().await;
        let dispatcher = Dispatcher::connect(
            "127.0.0.1",
            addr.port(),
            &DeviceConfig::default(),
        )
        .await
        .unwrap();

        let hub_task = tokio::spawn(async move {
            let mut buf = [0u8; MAX_DATAGRAM];
            let (n, from) = hub.recv_from(&mut buf).await.unwrap();
            let request = buf[..n].to_vec();

            let mut body = Vec::new();
            body.extend(1u8..=8);
            body.extend(9u8..=16);
            let reply = reply_with_body(&body);
            hub.send_to(&reply, from).await.unwrap();
            request
        });

        let dir = TempDir::new().unwrap();
        let store = AgentStore::new(dir.path().join("agent_uuid_list.json"));
        let list = dispatcher.discover_agents(&store).await.unwrap();

        assert_eq!(list.len(), 2);
        assert_eq!(list.get(1).unwrap().to_string(), "01:02:03:04:05:06:07:08");
        assert_eq!(list.get(2).unwrap().to_string(), "09:0a:0b:0c:0d:0e:0f:10");
        // Persisted for later invocations
        assert_eq!(store.load().unwrap(), list);

        let request = hub_task.await.unwrap();
        // hubCommand GET_AGENT_LIST with the GET_UUID opcode as payload
        assert_eq!(request[5], 1);
        assert_eq!(&request[16..], &[23]);
    }

    #[tokio::test]
    async fn test_discover_agents_rejects_ragged_reply() {
        let (hub, addr) = fake_hub().await;
        let dispatcher = Dispatcher::connect(
            "127.0.0.1",
            addr.port(),
            &DeviceConfig::default(),
        )
        .await
        .unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; MAX_DATAGRAM];
            let (_, from) = hub.recv_from(&mut buf).await.unwrap();
            hub.send_to(&reply_with_body(&[0u8; 15]), from).await.unwrap();
        });

        let dir = TempDir::new().unwrap();
        let store = AgentStore::new(dir.path().join("agent_uuid_list.json"));
        let err = dispatcher.discover_agents(&store).await.unwrap_err();
        assert!(matches!(err, ClientError::BadAgentReply(_)));
        // Failed discovery must not create or clobber the store.
        assert!(store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discover_agents_rejects_buffer_filling_reply() {
        let (hub, addr) = fake_hub().await;
        let dispatcher = Dispatcher::connect(
            "127.0.0.1",
            addr.port(),
            &DeviceConfig::default(),
        )
        .await
        .unwrap();

        tokio::spawn(async move {
            let mut buf = [0u8; MAX_DATAGRAM];
            let (_, from) = hub.recv_from(&mut buf).await.unwrap();
            // Valid UUID groups, but exactly the receive buffer size: a
            // larger list would have been truncated to the same bytes.
            let reply = reply_with_body(&vec![0u8; MAX_DATAGRAM - HEADER_SIZE]);
            hub.send_to(&reply, from).await.unwrap();
        });

        let dir = TempDir::new().unwrap();
        let store = AgentStore::new(dir.path().join("agent_uuid_list.json"));
        let err = dispatcher.discover_agents(&store).await.unwrap_err();
        assert!(matches!(err, ClientError::BadAgentReply(_)));
        assert!(store.load().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_inject_rfid_device_frame() {
        let agent = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = agent.local_addr().unwrap();

        let agent_task = tokio::spawn(async move {
            let mut buf = [0u8; MAX_DATAGRAM];
            let (n, _) = agent.recv_from(&mut buf).await.unwrap();
            buf[..n].to_vec()
        });

        let rfid = RfidConfig {
            agent_host: "127.0.0.1".to_string(),
            agent_port: addr.port(),
            agent_mac: 16,
            panel_mac: 16,
            card_id: "0123456789".to_string(),
        };
        inject_rfid(&rfid, PROTOCOL_VERSION).await.unwrap();

        let datagram = agent_task.await.unwrap();
        assert_eq!(datagram.len(), 8 + 11);
        assert_eq!(&datagram[0..4], &[0xFE, 0xCA, 0xFE, 0xCA]);
        assert_eq!(datagram[4], 16);
        assert_eq!(datagram[5], 16);
        assert_eq!(&datagram[6..8], &[11, 0]);
        assert_eq!(datagram[8], RFID_COMMAND);
        assert_eq!(&datagram[9..], b"0123456789");
    }
}
