//! Shared fixtures for application-layer unit tests.

use std::sync::{Arc, Mutex};

use kmnet_core::{protocol::HEADER_SIZE, DeviceId};

use super::session::{DeviceSession, MockDeviceTransport};

pub(crate) const DEVICE: DeviceId = DeviceId::new(0x0B50_E466);

pub(crate) type SentFrames = Arc<Mutex<Vec<Vec<u8>>>>;

/// A mock transport that records every frame and echoes its header back.
pub(crate) fn recording_transport() -> (MockDeviceTransport, SentFrames) {
    let sent: SentFrames = Arc::new(Mutex::new(Vec::new()));
    let log = Arc::clone(&sent);

    let mut transport = MockDeviceTransport::new();
    transport.expect_transact().returning(move |frame: &[u8]| {
        log.lock().unwrap().push(frame.to_vec());
        Ok(frame[..HEADER_SIZE.min(frame.len())].to_vec())
    });

    (transport, sent)
}

/// A session that has completed its handshake over a recording transport.
pub(crate) fn connected_session() -> (DeviceSession<MockDeviceTransport>, SentFrames) {
    let (transport, sent) = recording_transport();
    let session = DeviceSession::connect(transport, DEVICE).expect("handshake");
    (session, sent)
}
