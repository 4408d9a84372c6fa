//! The protocol module contains the wire-level side of the service port:
//! commands, the fixed-point codec, the three frame layouts and the
//! operating-state derivation.

pub mod codec;
pub mod command;
pub mod flags;
pub mod frame;
pub mod state;

pub use codec::{decode_signed_100, decode_u32_le};
pub use command::Command;
pub use flags::{OperationFlags, StatusFlags};
pub use frame::{
    parse_frame, DecodedFrame, FaultRecord, PrimaryStatus, SecondaryStatus, Statistics,
    StatusTail,
};
pub use state::{derive_state, BoilerState, StateReading, StatusCode};
