//! Protocol Module
//!
//! Defines the wire protocol between the shell and the server.
//!
//! ## Protocol Format (fixed header + opcode body)
//!
//! ```text
//! ┌────────────┬────────────┬─────────────────────────────┐
//! │ Opcode (4) │ Length (4) │         Body                │
//! └────────────┴────────────┴─────────────────────────────┘
//! ```
//!
//! ### Requests
//! - 1: QUERY_SUPPORT  - Body: empty
//! - 2: EXECUTE        - Body: cmd_id + option_count + options
//! - 3: EXECUTE_PLUGIN - Body: cmd_id + name[100] + option_count + options
//!
//! ### Responses
//! - 1: QUERY_SUPPORT  - Body: count + ids
//! - 2: EXECUTE        - Body: error_code + data_len + data
//!
//! ### Exchange
//! Negotiate any number of times, then exactly one execute; the server closes
//! the connection after answering it.

mod request;
mod response;
mod codec;
pub mod options;

/// Identifier of a command in the known command table
pub type CommandId = u32;

pub use request::{Request, RequestOpcode};
pub use response::{ErrorCode, ExecutionResult, Response, ResponseOpcode};
pub use options::OptionList;
pub use codec::{
    encode_request, decode_request, encode_response, decode_response,
    read_frame, read_request, write_request, read_response, write_response,
    HEADER_SIZE, MAX_FRAME_SIZE, PLUGIN_NAME_SIZE, EMPTY_OPTIONS_PADDING,
    EXECUTE_MIN_SIZE, EXECUTE_PLUGIN_MIN_SIZE,
    SUPPORT_RESPONSE_MIN_SIZE, EXECUTE_RESPONSE_MIN_SIZE,
};
