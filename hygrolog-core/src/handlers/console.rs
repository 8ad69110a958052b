//! Console handler: mirrors firmware activity to a serial terminal
//!
//! Output is line-oriented and strictly best-effort. Producers submit lines
//! through [`ConsolePort`], which renders them (timestamp prefix for the
//! timestamped kind) and appends them atomically to a circular byte queue.
//! The handler's `step` then feeds the transport a bounded chunk per pass,
//! so a burst of lines never stalls the loop waiting on a slow serial port.
//!
//! Console lines are an event log, not latest-value telemetry: three
//! submissions mean three lines. That is why submissions land in the byte
//! queue directly instead of a coalescing inbox — overwriting the second of
//! three measurement lines with the third would garble the mirror.

extern crate alloc;

use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt::Write as _;

use heapless::String;

use crate::handler::Handler;
use crate::queue::ByteQueue;
use crate::text::bounded;
use crate::time::{write_timestamp, WallClock, TIMESTAMP_FIELD_LEN};
use crate::traits::TransportDriver;

/// Maximum submitted line length, prefix excluded
pub const CONSOLE_LINE_MAX: usize = 80;

/// Outbound buffer capacity
pub const CONSOLE_TX_BUF: usize = 256;

/// Largest chunk handed to the transport in one step
pub const CONSOLE_TX_CHUNK: usize = 64;

/// Rendered-line scratch capacity: prefix + line + CRLF
const CONSOLE_RENDER_MAX: usize = TIMESTAMP_FIELD_LEN + 2 + CONSOLE_LINE_MAX + 2;

/// A line submitted for console output
pub type ConsoleLine = String<CONSOLE_LINE_MAX>;

/// Requests understood by the console handler
#[derive(Debug, Clone)]
pub enum ConsoleRequest {
    /// Emit the line as-is
    EmitRaw(ConsoleLine),
    /// Emit the line behind a fixed-width `YYYYMMDD HHMMSS: ` prefix
    EmitTimestamped(ConsoleLine),
}

struct ConsoleShared {
    out: ByteQueue<CONSOLE_TX_BUF>,
    dropped: u32,
}

/// Shared submission handle for console output
///
/// Cloned to every producer at construction time. Submission renders the
/// line and appends it whole to the outbound queue; if the queue cannot take
/// the whole line the drop is counted and the line discarded — the console
/// never applies back-pressure to the rest of the firmware.
pub struct ConsolePort {
    shared: Rc<RefCell<ConsoleShared>>,
    clock: Rc<dyn WallClock>,
}

impl ConsolePort {
    /// Create a port with an empty outbound queue
    pub fn new(clock: Rc<dyn WallClock>) -> Self {
        Self {
            shared: Rc::new(RefCell::new(ConsoleShared {
                out: ByteQueue::new(),
                dropped: 0,
            })),
            clock,
        }
    }

    /// Submit a request; returns immediately
    pub fn submit(&self, req: ConsoleRequest) {
        let mut rendered: String<CONSOLE_RENDER_MAX> = String::new();
        match req {
            ConsoleRequest::EmitRaw(line) => {
                let _ = rendered.push_str(&line);
            }
            ConsoleRequest::EmitTimestamped(line) => {
                let _ = write_timestamp(&mut rendered, self.clock.now());
                let _ = rendered.push_str(": ");
                let _ = rendered.push_str(&line);
            }
        }
        let _ = rendered.push_str("\r\n");

        let mut shared = self.shared.borrow_mut();
        if shared.out.enqueue(rendered.as_bytes()).is_err() {
            shared.dropped = shared.dropped.wrapping_add(1);
        }
    }

    /// Convenience: submit an `EmitRaw` for `line`
    pub fn print(&self, line: &str) {
        self.submit(ConsoleRequest::EmitRaw(bounded(line)));
    }

    /// Convenience: submit an `EmitTimestamped` for `line`
    pub fn print_timestamped(&self, line: &str) {
        self.submit(ConsoleRequest::EmitTimestamped(bounded(line)));
    }

    /// Lines discarded because the outbound queue was full
    pub fn dropped(&self) -> u32 {
        self.shared.borrow().dropped
    }

    /// Bytes currently awaiting transmission
    pub fn pending(&self) -> usize {
        self.shared.borrow().out.len()
    }
}

impl Clone for ConsolePort {
    fn clone(&self) -> Self {
        Self {
            shared: Rc::clone(&self.shared),
            clock: Rc::clone(&self.clock),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ConsoleState {
    /// Poll the transport for an input byte
    CheckInput,
    /// Move one bounded chunk from the queue to the transport
    CheckOutput,
}

/// Console I/O handler
pub struct ConsoleHandler<T: TransportDriver> {
    transport: T,
    port: ConsolePort,
    state: ConsoleState,
}

impl<T: TransportDriver> ConsoleHandler<T> {
    /// Take ownership of the transport and the draining side of `port`
    pub fn new(transport: T, port: ConsolePort) -> Self {
        Self {
            transport,
            port,
            state: ConsoleState::CheckInput,
        }
    }
}

impl<T: TransportDriver> Handler for ConsoleHandler<T> {
    fn step(&mut self) {
        match self.state {
            ConsoleState::CheckInput => {
                if self.transport.readable() {
                    // TODO: feed input bytes into a command parser once the
                    // serial configuration protocol exists
                    let _ = self.transport.read_byte();
                }
                self.state = ConsoleState::CheckOutput;
            }
            ConsoleState::CheckOutput => {
                let mut shared = self.port.shared.borrow_mut();
                if !shared.out.is_empty() && self.transport.writable() {
                    let mut chunk = [0u8; CONSOLE_TX_CHUNK];
                    let n = shared.out.drain(&mut chunk);
                    let written = self.transport.write(&chunk[..n]);
                    if written < n {
                        // A conforming transport accepts the whole chunk when
                        // writable; a shortfall is a drop, not a retry
                        shared.dropped = shared.dropped.wrapping_add(1);
                    }
                }
                self.state = ConsoleState::CheckInput;
            }
        }
    }

    fn name(&self) -> &'static str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockTransport;
    use crate::time::FixedClock;

    fn port_at(secs: i64) -> ConsolePort {
        ConsolePort::new(Rc::new(FixedClock::new(secs)))
    }

    #[test]
    fn timestamped_line_gets_fixed_prefix() {
        // 2016-01-01 00:00:00 UTC
        let port = port_at(1451606400);
        let transport = MockTransport::new();
        let mut handler = ConsoleHandler::new(transport.clone(), port.clone());

        port.print_timestamped("Temperature is 21.50 degC");

        handler.step(); // input poll
        handler.step(); // output drain

        assert_eq!(
            transport.tx_string(),
            "20160101 000000: Temperature is 21.50 degC\r\n"
        );
    }

    #[test]
    fn raw_line_is_unprefixed() {
        let port = port_at(0);
        let transport = MockTransport::new();
        let mut handler = ConsoleHandler::new(transport.clone(), port.clone());

        port.print("hello");
        handler.step();
        handler.step();

        assert_eq!(transport.tx_string(), "hello\r\n");
    }

    #[test]
    fn output_is_chunked_per_step() {
        let port = port_at(0);
        let transport = MockTransport::new();
        let mut handler = ConsoleHandler::new(transport.clone(), port.clone());

        // Two long raw lines: 71 + 2 bytes each, 146 bytes queued
        let long = "x".repeat(71);
        port.print(&long);
        port.print(&long);

        handler.step(); // input
        handler.step(); // first chunk
        assert_eq!(transport.tx_bytes().len(), CONSOLE_TX_CHUNK);

        handler.step();
        handler.step();
        handler.step();
        handler.step();
        assert_eq!(transport.tx_bytes().len(), 146);
    }

    #[test]
    fn full_queue_drops_whole_lines_and_counts() {
        let port = port_at(0);
        let transport = MockTransport::new();
        transport.set_writable(false);
        let mut handler = ConsoleHandler::new(transport.clone(), port.clone());

        // 82 bytes per line; the fourth cannot fit in 256
        let line = "y".repeat(80);
        for _ in 0..4 {
            port.print(&line);
        }
        assert_eq!(port.dropped(), 1);

        // Transport refuses output; queue contents stay put
        handler.step();
        handler.step();
        assert!(transport.tx_bytes().is_empty());
    }

    #[test]
    fn input_byte_is_drained() {
        let port = port_at(0);
        let transport = MockTransport::new();
        transport.push_rx(b's');
        let mut handler = ConsoleHandler::new(transport.clone(), port);

        handler.step();
        assert!(!transport.readable());
    }
}
