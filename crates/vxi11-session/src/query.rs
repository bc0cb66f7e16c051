//! Composed send-then-receive helpers: data blocks, query cycles and
//! numeric replies.

use bytes::BytesMut;
use tracing::{debug, warn};

use vxi11_frame::{decode_block, encode_block, MAX_HEADER_SIZE};
use vxi11_transport::CoreConnector;

use crate::error::{Result, SessionError};
use crate::session::{Link, NumericMode, Session};

/// Buffer size for numeric query replies; generous for one ASCII number.
pub const NUMERIC_REPLY_CAPACITY: usize = 50;

impl<T: CoreConnector> Session<T> {
    /// Send a command followed by a definite-length block payload.
    ///
    /// Used for bulk writes such as loading arbitrary waveform data:
    /// `send_data_block(&link, "DATA:DAC VOLATILE, ", &samples)`.
    pub fn send_data_block(&mut self, link: &Link, cmd: &str, payload: &[u8]) -> Result<()> {
        let mut framed = BytesMut::new();
        encode_block(cmd, payload, &mut framed)?;
        self.send(link, &framed)
    }

    /// Receive a definite-length block reply into `buf`.
    ///
    /// Returns the payload length. An instrument that failed to acquire
    /// the requested data replies `#0`, which yields 0 bytes, not an
    /// error.
    pub fn receive_data_block(&mut self, link: &Link, buf: &mut [u8]) -> Result<usize> {
        self.receive_data_block_timeout(link, buf, self.config.read_timeout_ms)
    }

    /// [`receive_data_block`](Self::receive_data_block) with an explicit
    /// timeout.
    pub fn receive_data_block_timeout(
        &mut self,
        link: &Link,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize> {
        // The raw reply is the payload plus the block header.
        let mut framed = vec![0u8; buf.len() + MAX_HEADER_SIZE];
        let n = self.receive_timeout(link, &mut framed, timeout_ms)?;

        let payload = decode_block(&framed[..n])?;
        let out = buf
            .get_mut(..payload.len())
            .ok_or(SessionError::BufferTooSmall {
                read: payload.len(),
            })?;
        out.copy_from_slice(payload);
        Ok(payload.len())
    }

    /// Send a query and read its reply, retrying the whole cycle while
    /// the instrument drops either side.
    pub fn send_and_receive(&mut self, link: &Link, cmd: &str, buf: &mut [u8]) -> Result<usize> {
        self.send_and_receive_timeout(link, cmd, buf, self.config.read_timeout_ms)
    }

    /// [`send_and_receive`](Self::send_and_receive) with an explicit read
    /// timeout.
    ///
    /// Dropped writes and reads are transient non-responses (a busy
    /// instrument), so the cycle restarts from the send. Every other
    /// error propagates immediately. There is no internal retry cap;
    /// callers needing bounded total latency must impose their own.
    pub fn send_and_receive_timeout(
        &mut self,
        link: &Link,
        cmd: &str,
        buf: &mut [u8],
        timeout_ms: u32,
    ) -> Result<usize> {
        loop {
            match self.send(link, cmd.as_bytes()) {
                Ok(()) => {}
                Err(err) if err.is_dropped() => {
                    debug!(cmd, "write dropped, resending query");
                    continue;
                }
                Err(err) => return Err(err),
            }

            match self.receive_timeout(link, buf, timeout_ms) {
                Ok(n) => return Ok(n),
                Err(err) if err.is_dropped() => {
                    debug!(cmd, "read dropped, resending query");
                }
                Err(err) => return Err(err),
            }
        }
    }

    /// Query an integer value, e.g. `obtain_long_value(&link, "HOR:RECO?")`.
    pub fn obtain_long_value(&mut self, link: &Link, cmd: &str) -> Result<i64> {
        self.obtain_long_value_timeout(link, cmd, self.config.read_timeout_ms)
    }

    /// [`obtain_long_value`](Self::obtain_long_value) with an explicit
    /// timeout.
    pub fn obtain_long_value_timeout(
        &mut self,
        link: &Link,
        cmd: &str,
        timeout_ms: u32,
    ) -> Result<i64> {
        self.obtain_value(link, cmd, timeout_ms, 0, |text| text.parse::<i64>().ok())
    }

    /// Query a floating point value, e.g.
    /// `obtain_double_value(&link, "CH1:SCALE?")`.
    pub fn obtain_double_value(&mut self, link: &Link, cmd: &str) -> Result<f64> {
        self.obtain_double_value_timeout(link, cmd, self.config.read_timeout_ms)
    }

    /// [`obtain_double_value`](Self::obtain_double_value) with an explicit
    /// timeout.
    pub fn obtain_double_value_timeout(
        &mut self,
        link: &Link,
        cmd: &str,
        timeout_ms: u32,
    ) -> Result<f64> {
        self.obtain_value(link, cmd, timeout_ms, 0.0, |text| text.parse::<f64>().ok())
    }

    /// Shared numeric query plumbing.
    ///
    /// In [`NumericMode::Strict`] every failure propagates; in
    /// [`NumericMode::Lenient`] failures are logged and `zero` is
    /// reported instead, reproducing the lossy legacy behavior.
    fn obtain_value<V: Copy>(
        &mut self,
        link: &Link,
        cmd: &str,
        timeout_ms: u32,
        zero: V,
        parse: impl Fn(&str) -> Option<V>,
    ) -> Result<V> {
        let lenient = self.config.numeric_mode == NumericMode::Lenient;

        let mut buf = [0u8; NUMERIC_REPLY_CAPACITY];
        let reply = match self.send_and_receive_timeout(link, cmd, &mut buf, timeout_ms) {
            Ok(n) => String::from_utf8_lossy(&buf[..n]).trim().to_string(),
            Err(err) if lenient => {
                warn!(cmd, %err, "numeric query failed, reporting zero");
                return Ok(zero);
            }
            Err(err) => return Err(err),
        };

        match parse(&reply) {
            Some(value) => Ok(value),
            None if lenient => {
                warn!(cmd, reply, "unparseable numeric reply, reporting zero");
                Ok(zero)
            }
            None => Err(SessionError::NumericParse { reply }),
        }
    }
}

#[cfg(test)]
mod tests {
    use vxi11_transport::{REASON_END, REASON_REQCNT};

    use super::*;
    use crate::session::SessionConfig;
    use crate::testing::{rpc_failure, MockChannel, MockConnector};

    fn session_with(channel: MockChannel) -> Session<MockConnector> {
        let mut connector = MockConnector::new();
        connector.prepare(channel);
        Session::new(connector)
    }

    #[test]
    fn send_data_block_frames_the_payload() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("awg").unwrap();

        session
            .send_data_block(&link, "DATA:DAC VOLATILE, ", b"\x01\x02\x03")
            .unwrap();

        let state = state.lock().unwrap();
        assert_eq!(state.writes.len(), 1);
        assert_eq!(
            state.writes[0].data,
            b"DATA:DAC VOLATILE, #800000003\x01\x02\x03"
        );
    }

    #[test]
    fn receive_data_block_unwraps_the_payload() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("scope").unwrap();

        state
            .lock()
            .unwrap()
            .read_replies
            .push_back(Ok(MockChannel::read_reply(b"#3009waveforms", REASON_END)));

        let mut buf = [0u8; 32];
        let n = session.receive_data_block(&link, &mut buf).unwrap();
        assert_eq!(&buf[..n], b"waveforms");
    }

    #[test]
    fn receive_data_block_failure_to_acquire_yields_zero_bytes() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("scope").unwrap();

        state
            .lock()
            .unwrap()
            .read_replies
            .push_back(Ok(MockChannel::read_reply(b"#0", REASON_END)));

        let mut buf = [0u8; 32];
        assert_eq!(session.receive_data_block(&link, &mut buf).unwrap(), 0);
    }

    #[test]
    fn receive_data_block_rejects_non_block_reply() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("scope").unwrap();

        state
            .lock()
            .unwrap()
            .read_replies
            .push_back(Ok(MockChannel::read_reply(b"ERR -113\n", REASON_END)));

        let mut buf = [0u8; 32];
        let err = session.receive_data_block(&link, &mut buf).unwrap_err();
        assert!(matches!(err, SessionError::Block(_)));
    }

    #[test]
    fn send_and_receive_retries_dropped_reads() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("scope").unwrap();

        {
            let mut state = state.lock().unwrap();
            state.read_replies.push_back(Err(rpc_failure()));
            state.read_replies.push_back(Err(rpc_failure()));
            state
                .read_replies
                .push_back(Ok(MockChannel::read_reply(b"42\n", REASON_END)));
        }

        let mut buf = [0u8; 16];
        let n = session.send_and_receive(&link, "MEAS:VOLT?", &mut buf).unwrap();
        assert_eq!(&buf[..n], b"42\n");

        // Each dropped read restarted the whole cycle from the send.
        assert_eq!(state.lock().unwrap().writes.len(), 3);
    }

    #[test]
    fn send_and_receive_retries_dropped_writes() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("scope").unwrap();

        {
            let mut state = state.lock().unwrap();
            state.write_replies.push_back(Err(rpc_failure()));
            state
                .read_replies
                .push_back(Ok(MockChannel::read_reply(b"ok", REASON_END)));
        }

        let mut buf = [0u8; 16];
        let n = session.send_and_receive(&link, "*OPC?", &mut buf).unwrap();
        assert_eq!(&buf[..n], b"ok");
        // The dropped attempt and its retry are both visible on the wire.
        assert_eq!(state.lock().unwrap().writes.len(), 2);
    }

    #[test]
    fn send_and_receive_propagates_real_errors() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("scope").unwrap();

        state.lock().unwrap().read_replies.push_back(Ok(
            vxi11_transport::ReadReply {
                error: 11,
                reason: 0,
                data: bytes::Bytes::new(),
            },
        ));

        let mut buf = [0u8; 16];
        let err = session
            .send_and_receive(&link, "*IDN?", &mut buf)
            .unwrap_err();
        assert!(matches!(err, SessionError::DeviceRead { code: 11 }));
    }

    #[test]
    fn obtain_long_value_parses_reply() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("scope").unwrap();

        state
            .lock()
            .unwrap()
            .read_replies
            .push_back(Ok(MockChannel::read_reply(b"+500\n", REASON_END)));

        assert_eq!(session.obtain_long_value(&link, "HOR:RECO?").unwrap(), 500);
    }

    #[test]
    fn obtain_double_value_parses_scientific_notation() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("scope").unwrap();

        state
            .lock()
            .unwrap()
            .read_replies
            .push_back(Ok(MockChannel::read_reply(b"2.5E-3\n", REASON_END)));

        let value = session.obtain_double_value(&link, "CH1:SCALE?").unwrap();
        assert!((value - 2.5e-3).abs() < f64::EPSILON);
    }

    #[test]
    fn strict_mode_propagates_parse_failures() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("scope").unwrap();

        state
            .lock()
            .unwrap()
            .read_replies
            .push_back(Ok(MockChannel::read_reply(b"nonsense-reply", REASON_END)));

        let err = session.obtain_long_value(&link, "HOR:RECO?").unwrap_err();
        assert!(matches!(err, SessionError::NumericParse { reply } if reply == "nonsense-reply"));
    }

    #[test]
    fn lenient_mode_reports_zero_for_nonsense() {
        let (channel, state) = MockChannel::new();
        let mut connector = MockConnector::new();
        connector.prepare(channel);
        let mut session = Session::with_config(
            connector,
            SessionConfig {
                numeric_mode: NumericMode::Lenient,
                ..SessionConfig::default()
            },
        );
        let link = session.open("scope").unwrap();

        state
            .lock()
            .unwrap()
            .read_replies
            .push_back(Ok(MockChannel::read_reply(b"nonsense-reply", REASON_END)));

        assert_eq!(session.obtain_long_value(&link, "HOR:RECO?").unwrap(), 0);
    }

    #[test]
    fn lenient_mode_reports_zero_for_failed_queries() {
        let (channel, state) = MockChannel::new();
        let mut connector = MockConnector::new();
        connector.prepare(channel);
        let mut session = Session::with_config(
            connector,
            SessionConfig {
                numeric_mode: NumericMode::Lenient,
                ..SessionConfig::default()
            },
        );
        let link = session.open("scope").unwrap();

        state.lock().unwrap().read_replies.push_back(Ok(
            vxi11_transport::ReadReply {
                error: 15,
                reason: 0,
                data: bytes::Bytes::new(),
            },
        ));

        let value = session.obtain_double_value(&link, "CH1:SCALE?").unwrap();
        assert_eq!(value, 0.0);
    }

    #[test]
    fn numeric_reply_longer_than_capacity_needs_terminator() {
        let (channel, state) = MockChannel::new();
        let mut session = session_with(channel);
        let link = session.open("scope").unwrap();

        // 50 bytes with no END reason: the fixed reply buffer fills up.
        state.lock().unwrap().read_replies.push_back(Ok(
            MockChannel::read_reply(&[b'9'; NUMERIC_REPLY_CAPACITY], REASON_REQCNT),
        ));

        let err = session.obtain_long_value(&link, "CURVE?").unwrap_err();
        assert!(matches!(err, SessionError::BufferTooSmall { .. }));
    }
}
