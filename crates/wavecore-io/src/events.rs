//! Fire-and-forget event payloads produced toward the application façade.

use crate::config::DeviceDescriptor;
use crate::config::DeviceState;

/// Strongly-typed event emitted by the buffer controller or the engine.
///
/// Events are delivered through a bounded channel ([`crate::Engine::try_recv_event`]);
/// handlers must drain it promptly and must never call back into the engine
/// from inside the same synchronous turn that produced the event.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The producer wrote fewer samples than requested because the output
    /// ring was full, or the device callback read fewer than requested
    /// because the ring was empty.
    BufferUnderrun {
        /// Frames (not samples) that were dropped or padded with silence.
        missed_frames: u64,
        /// Approximate frame position in the overall stream when this occurred.
        position: u64,
    },
    /// The active output device changed.
    OutputDeviceChanged {
        old_id: Option<String>,
        new_id: String,
        descriptor: DeviceDescriptor,
    },
    /// The active input device changed.
    InputDeviceChanged {
        old_id: Option<String>,
        new_id: String,
        descriptor: DeviceDescriptor,
    },
    /// A device's lifecycle state changed (e.g. unplugged).
    DeviceStateChanged {
        id: String,
        new_state: DeviceState,
        descriptor: DeviceDescriptor,
    },
}
