//! Command server: registry ownership and the request/response poll loop
//!
//! One poll cycle reads at most one frame from the link, routes it through
//! the registry, and writes exactly one reply (or none, for malformed
//! frames whose token cannot be recovered). The loop keeps no state across
//! cycles; every frame is an independent request/response pair.

use heapless::Vec;
use log::{error, trace, warn};

use cairn_protocol::{ErrorCode, Request, Response, MAX_FRAME_LEN};

use crate::config::ConfigPages;
use crate::registry::{Handler, Node, Registry, RegistryError};
use crate::sys::{self, SysView};
use crate::traits::{Clock, Link};

pub use crate::registry::HandlerError;

/// What one poll cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PollOutcome {
    /// No frame was pending
    Idle,
    /// A frame was received and a reply transmitted (including error replies)
    Answered,
    /// A malformed frame was received and dropped without a reply
    Dropped,
}

/// The node registry, dispatcher, and built-in SYS node.
///
/// Registration must complete before polling begins; both take `&mut self`,
/// so a registration can never overlap a poll cycle.
pub struct CommandServer<'n, L, C> {
    link: L,
    clock: C,
    registry: Registry<'n>,
    config: Option<ConfigPages<'n>>,
}

impl<'n, L, C> CommandServer<'n, L, C>
where
    L: Link,
    C: Clock,
{
    /// Create a server with an empty registry (SYS installed at index 0)
    pub fn new(link: L, clock: C) -> Self {
        Self {
            link,
            clock,
            registry: Registry::new(),
            config: None,
        }
    }

    /// Register an external node
    pub fn register(&mut self, node: Node<'n>) -> Result<(), RegistryError> {
        self.registry.register(node)
    }

    /// Install the config blob served by `SYS/CONF`.
    ///
    /// The content is externally owned and must outlive the server. An empty
    /// blob uninstalls the config (page count drops back to 0).
    pub fn set_config(&mut self, content: &'n [u8]) {
        self.config = ConfigPages::new(content);
        match &self.config {
            Some(config) => trace!(
                "installed config: {}B, {} pages",
                config.len(),
                config.page_count()
            ),
            None => trace!("config uninstalled"),
        }
    }

    /// The node registry, for diagnostics
    pub fn registry(&self) -> &Registry<'n> {
        &self.registry
    }

    /// The underlying link, for out-of-band transmissions such as
    /// unsolicited altitude updates
    pub fn link_mut(&mut self) -> &mut L {
        &mut self.link
    }

    /// Run one poll cycle.
    ///
    /// Waits up to `timeout_ms` for an inbound frame, dispatches it, and
    /// transmits the reply. Transport failures are returned to the caller
    /// and never retried here; the next call is a fresh attempt.
    pub fn poll_once(&mut self, timeout_ms: u32) -> Result<PollOutcome, L::Error> {
        self.link.wait(timeout_ms)?;

        // The receive buffer is scoped to this cycle; the decoded request
        // borrows it and is released before the cycle ends.
        let mut buf = [0u8; MAX_FRAME_LEN];
        let len = self.link.read(&mut buf)?;
        if len == 0 {
            return Ok(PollOutcome::Idle);
        }
        trace!("rx {} bytes", len);
        let started = self.clock.now_ms();

        let request = match Request::decode(&buf[..len]) {
            Ok(request) => request,
            Err(err) => {
                // The token may be unrecoverable, so nothing is sent back
                warn!("dropping malformed frame: {:?}", err);
                return Ok(PollOutcome::Dropped);
            }
        };

        let Some(index) = self.registry.find(request.node) else {
            error!("no matching node for '{}'", request.node);
            self.link
                .write(&error_frame(request.token, ErrorCode::UnkNode))?;
            return Ok(PollOutcome::Answered);
        };

        let infos = self.registry.infos();
        let view = SysView {
            nodes: &infos,
            config: self.config.as_ref(),
        };
        let reply = match self.registry.handler_mut(index) {
            Some(Handler::Sys) => Ok(sys::handle(&request, &view)),
            Some(Handler::Node(handler)) => handler.handle(&request),
            // find() returned the index, the entry exists
            None => Err(HandlerError::Failed),
        };

        let frame = match reply {
            Ok(response) => match response.encode(request.token) {
                Ok(frame) => frame,
                Err(_) => {
                    error!("response for '{}' exceeds the frame budget", request.node);
                    error_frame(request.token, ErrorCode::UnkError)
                }
            },
            Err(err) => {
                error!("node '{}' failed to process request: {:?}", request.node, err);
                error_frame(request.token, ErrorCode::UnkError)
            }
        };

        self.link.write(&frame)?;
        let elapsed = self.clock.now_ms().wrapping_sub(started);
        trace!("request completed in {} ms", elapsed);
        Ok(PollOutcome::Answered)
    }
}

/// Compose a `token/e/<code>` frame; the fixed error codes always fit
fn error_frame(token: u8, code: ErrorCode) -> Vec<u8, MAX_FRAME_LEN> {
    Response::Error(code).encode(token).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RequestHandler;

    #[derive(Debug, PartialEq, Eq)]
    enum MockError {
        Write,
    }

    #[derive(Default)]
    struct MockLink {
        inbound: Option<Vec<u8, MAX_FRAME_LEN>>,
        outbound: Vec<u8, MAX_FRAME_LEN>,
        writes: usize,
        fail_write: bool,
    }

    impl Link for MockLink {
        type Error = MockError;

        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
            match self.inbound.take() {
                Some(frame) => {
                    buf[..frame.len()].copy_from_slice(&frame);
                    Ok(frame.len())
                }
                None => Ok(0),
            }
        }

        fn write(&mut self, frame: &[u8]) -> Result<(), Self::Error> {
            if self.fail_write {
                return Err(MockError::Write);
            }
            self.outbound.clear();
            self.outbound.extend_from_slice(frame).unwrap();
            self.writes += 1;
            Ok(())
        }

        fn wait(&mut self, _timeout_ms: u32) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct MockClock;

    impl Clock for MockClock {
        fn now_ms(&self) -> u32 {
            0
        }
    }

    /// Answers every request with a fixed response
    struct Fixed(Response<'static>);

    impl RequestHandler for Fixed {
        fn handle<'s>(&'s mut self, _request: &Request<'_>) -> Result<Response<'s>, HandlerError> {
            Ok(self.0)
        }
    }

    /// Fails every request
    struct Failing;

    impl RequestHandler for Failing {
        fn handle<'s>(&'s mut self, _request: &Request<'_>) -> Result<Response<'s>, HandlerError> {
            Err(HandlerError::Failed)
        }
    }

    fn poll_with(
        server: &mut CommandServer<'_, MockLink, MockClock>,
        frame: &[u8],
    ) -> PollOutcome {
        server.link_mut().inbound = Some(Vec::from_slice(frame).unwrap());
        server.poll_once(10).unwrap()
    }

    fn sent(server: &mut CommandServer<'_, MockLink, MockClock>) -> Vec<u8, MAX_FRAME_LEN> {
        server.link_mut().outbound.clone()
    }

    #[test]
    fn test_idle_cycle_has_no_side_effects() {
        let mut server = CommandServer::new(MockLink::default(), MockClock);
        assert_eq!(server.poll_once(10).unwrap(), PollOutcome::Idle);
        assert_eq!(server.link_mut().writes, 0);
    }

    #[test]
    fn test_reply_echoes_request_token() {
        let mut ev = Fixed(Response::Integer(42));
        let mut server = CommandServer::new(MockLink::default(), MockClock);
        server
            .register(Node {
                name: "EV",
                caps: 0x1,
                handler: &mut ev,
            })
            .unwrap();

        assert_eq!(poll_with(&mut server, b"5/EV/P"), PollOutcome::Answered);
        assert_eq!(sent(&mut server).as_slice(), b"5/i/42");
        assert_eq!(server.link_mut().writes, 1);

        // A different token comes back on the next request
        poll_with(&mut server, b"z/EV/P");
        assert_eq!(sent(&mut server).as_slice(), b"z/i/42");
    }

    #[test]
    fn test_unknown_node() {
        let mut server = CommandServer::new(MockLink::default(), MockClock);
        assert_eq!(poll_with(&mut server, b"5/XX/P"), PollOutcome::Answered);
        assert_eq!(sent(&mut server).as_slice(), b"5/e/UNK_NODE");
    }

    #[test]
    fn test_malformed_frame_dropped_silently() {
        let mut server = CommandServer::new(MockLink::default(), MockClock);
        assert_eq!(poll_with(&mut server, b"55/EV/P"), PollOutcome::Dropped);
        assert_eq!(server.link_mut().writes, 0);
    }

    #[test]
    fn test_handler_failure_answers_unk_error() {
        let mut bad = Failing;
        let mut server = CommandServer::new(MockLink::default(), MockClock);
        server
            .register(Node {
                name: "BAD",
                caps: 0,
                handler: &mut bad,
            })
            .unwrap();

        poll_with(&mut server, b"5/BAD/P");
        assert_eq!(sent(&mut server).as_slice(), b"5/e/UNK_ERROR");
    }

    #[test]
    fn test_oversized_response_answers_unk_error() {
        let mut chatty = Fixed(Response::Name("THIS_NAME_IS_FAR_TOO_LONG"));
        let mut server = CommandServer::new(MockLink::default(), MockClock);
        server
            .register(Node {
                name: "BIG",
                caps: 0,
                handler: &mut chatty,
            })
            .unwrap();

        poll_with(&mut server, b"5/BIG/P");
        assert_eq!(sent(&mut server).as_slice(), b"5/e/UNK_ERROR");
    }

    #[test]
    fn test_write_failure_surfaces_to_caller() {
        let mut ev = Fixed(Response::Integer(1));
        let mut server = CommandServer::new(MockLink::default(), MockClock);
        server
            .register(Node {
                name: "EV",
                caps: 0,
                handler: &mut ev,
            })
            .unwrap();

        server.link_mut().fail_write = true;
        server.link_mut().inbound = Some(Vec::from_slice(b"5/EV/P").unwrap());
        assert_eq!(server.poll_once(10), Err(MockError::Write));
    }

    #[test]
    fn test_sys_conf_paging_over_the_wire() {
        let mut server = CommandServer::new(MockLink::default(), MockClock);

        // No config installed yet
        poll_with(&mut server, b"7/SYS/CONF");
        assert_eq!(sent(&mut server).as_slice(), b"7/i/0");
        poll_with(&mut server, b"7/SYS/CONF/0");
        assert_eq!(sent(&mut server).as_slice(), b"7/e/NO_CONF");

        server.set_config(b"0123456789ABCDEFsecond page here tail");
        poll_with(&mut server, b"7/SYS/CONF");
        assert_eq!(sent(&mut server).as_slice(), b"7/i/3");
        poll_with(&mut server, b"7/SYS/CONF/1");
        assert_eq!(sent(&mut server).as_slice(), b"7/t/second page here");
        poll_with(&mut server, b"7/SYS/CONF/2");
        assert_eq!(sent(&mut server).as_slice(), b"7/t/ tail");
        poll_with(&mut server, b"7/SYS/CONF/3");
        assert_eq!(sent(&mut server).as_slice(), b"7/e/INV_INDEX");

        // Empty blob uninstalls
        server.set_config(b"");
        poll_with(&mut server, b"7/SYS/CONF");
        assert_eq!(sent(&mut server).as_slice(), b"7/i/0");
    }

    #[test]
    fn test_sys_avail_and_node_enumeration() {
        let mut ev = Fixed(Response::Integer(0));
        let mut imu = Fixed(Response::Integer(0));
        let mut server = CommandServer::new(MockLink::default(), MockClock);
        server
            .register(Node {
                name: "EV",
                caps: 0x1,
                handler: &mut ev,
            })
            .unwrap();
        server
            .register(Node {
                name: "IMU",
                caps: 0x4,
                handler: &mut imu,
            })
            .unwrap();

        poll_with(&mut server, b"2/SYS/AVAIL");
        assert_eq!(sent(&mut server).as_slice(), b"2/h/5");

        poll_with(&mut server, b"3/SYS/NODE");
        assert_eq!(sent(&mut server).as_slice(), b"3/i/2");

        poll_with(&mut server, b"4/SYS/NODE0");
        assert_eq!(sent(&mut server).as_slice(), b"4/n/EV");
        poll_with(&mut server, b"4/SYS/NODE1");
        assert_eq!(sent(&mut server).as_slice(), b"4/n/IMU");

        // Fewer than 4 non-SYS nodes: NODE3 must not yield a name
        poll_with(&mut server, b"4/SYS/NODE3");
        assert_eq!(sent(&mut server).as_slice(), b"4/e/INV_INDEX");
    }

    #[test]
    fn test_sys_rejects_writes_and_unknown_properties() {
        let mut server = CommandServer::new(MockLink::default(), MockClock);

        poll_with(&mut server, b"5/SYS/AVAIL/1");
        assert_eq!(sent(&mut server).as_slice(), b"5/e/ACCESS");
        poll_with(&mut server, b"5/SYS/NODE/1");
        assert_eq!(sent(&mut server).as_slice(), b"5/e/ACCESS");
        poll_with(&mut server, b"5/SYS/BOGUS");
        assert_eq!(sent(&mut server).as_slice(), b"5/e/UNK_PROP");
    }
}
