//! The firmware's handler variants
//!
//! Each submodule is one cooperative state machine implementing
//! [`crate::handler::Handler`]: sensing, routing, console I/O, storage
//! logging and modem I/O. They know each other only through mailboxes and
//! ports handed out at construction.

pub mod console;
pub mod logger;
pub mod modem;
pub mod router;
pub mod sampler;

pub use console::{ConsoleHandler, ConsolePort, ConsoleRequest};
pub use logger::{LogPort, LogRequest, LoggerHandler};
pub use modem::{AlertMessage, ModemHandler, ModemRequest, Recipient};
pub use router::{AlertConfig, RouterHandler, RouterRequest, ROUTER_SLOTS};
pub use sampler::SamplerHandler;
