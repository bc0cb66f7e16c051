//! Client library for controlling lab instruments over the VXI-11 protocol.
//!
//! VXI-11 is the session-oriented RPC protocol spoken by networked lab
//! instruments — oscilloscopes, multimeters, signal generators. This
//! workspace implements the client side: shared transport channels per
//! instrument address, any number of logical links multiplexed over them,
//! transparent write/read fragmentation, definite-length block framing for
//! bulk data, and query helpers for the common send-then-parse patterns.
//!
//! # Crate Structure
//!
//! - [`transport`] — the four core-channel procedures as a capability
//!   trait, wire types, flags and the device error code table
//! - [`frame`] — definite-length binary block framing
//! - [`session`] — link management, chunked I/O and query helpers
//!
//! # Basic Usage
//!
//! ```ignore
//! use vxi11::session::Session;
//!
//! let mut session = Session::new(connector);
//! let scope = session.open("192.168.0.62")?;
//!
//! session.send(&scope, b"ACQUIRE:STATE RUN\n")?;
//! let record_length = session.obtain_long_value(&scope, "HOR:RECO?")?;
//!
//! let mut waveform = vec![0u8; record_length as usize];
//! session.send(&scope, b"CURVE?\n")?;
//! let n = session.receive_data_block(&scope, &mut waveform)?;
//!
//! session.close(scope)?;
//! ```
//!
//! # Backends
//!
//! The session is generic over a
//! [`CoreConnector`](transport::CoreConnector): plug in a native ONC RPC
//! transport, a vendor instrumentation driver, or a scripted double for
//! tests. The protocol engine is identical over all of them.

/// Re-export transport types.
pub mod transport {
    pub use vxi11_transport::*;
}

/// Re-export block framing types.
pub mod frame {
    pub use vxi11_frame::*;
}

/// Re-export session types.
pub mod session {
    pub use vxi11_session::*;
}
