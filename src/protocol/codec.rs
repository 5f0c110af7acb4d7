//! Protocol codec
//!
//! Encoding and decoding functions for the wire protocol.
//!
//! ## Wire Format
//!
//! Every frame starts with the same header. Integers are little-endian.
//! ```text
//! ┌────────────┬────────────┬─────────────────────────────┐
//! │ Opcode (4) │ Length (4) │         Body                │
//! └────────────┴────────────┴─────────────────────────────┘
//! ```
//! `Length` is the size of the whole frame, header included.
//!
//! ### Request Bodies
//! - QUERY_SUPPORT:  empty
//! - EXECUTE:        cmd_id (4) + option_count (4) + option blob
//! - EXECUTE_PLUGIN: cmd_id (4) + name (100, zero padded) + option_count (4) + option blob
//!
//! A request without options still reserves 8 zero bytes where the option
//! list head used to live, so both peers agree on the frame length.
//!
//! ### Response Bodies
//! - QUERY_SUPPORT: count (4) + count × cmd_id (4)
//! - EXECUTE:       error_code (4) + data_len (4) + data (data_len, NUL terminated)

use std::io::{Read, Write};

use bytes::{Buf, BufMut, Bytes, BytesMut};

use super::options::{self, OptionList};
use super::{ErrorCode, ExecutionResult, Request, RequestOpcode, Response, ResponseOpcode};
use crate::error::{Result, SrpcfError};
use crate::network::channel;

/// Header size: 4 bytes opcode + 4 bytes length
pub const HEADER_SIZE: usize = 8;

/// Maximum frame size; one read must be able to carry a whole frame
pub const MAX_FRAME_SIZE: usize = 4096;

/// Fixed width of the plugin name field
pub const PLUGIN_NAME_SIZE: usize = 100;

/// Padding written in place of an empty option list
pub const EMPTY_OPTIONS_PADDING: usize = 8;

/// Minimum EXECUTE request length: header + cmd_id + option_count
pub const EXECUTE_MIN_SIZE: usize = HEADER_SIZE + 8;

/// Minimum EXECUTE_PLUGIN request length: header + cmd_id + name + option_count
pub const EXECUTE_PLUGIN_MIN_SIZE: usize = HEADER_SIZE + 4 + PLUGIN_NAME_SIZE + 4;

/// Minimum QUERY_SUPPORT response length: header + count
pub const SUPPORT_RESPONSE_MIN_SIZE: usize = HEADER_SIZE + 4;

/// Minimum EXECUTE response length: header + error_code + data_len
pub const EXECUTE_RESPONSE_MIN_SIZE: usize = HEADER_SIZE + 8;

// =============================================================================
// Header Handling
// =============================================================================

/// Validate the header and return the opcode and the frame slice it declares
fn split_frame(bytes: &[u8]) -> Result<(u32, &[u8])> {
    if bytes.len() < HEADER_SIZE {
        return Err(SrpcfError::Truncated(format!(
            "incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    let mut header = &bytes[..HEADER_SIZE];
    let opcode = header.get_u32_le();
    let length = header.get_u32_le() as usize;

    if length < HEADER_SIZE {
        return Err(SrpcfError::FrameTooShort {
            opcode,
            length,
            minimum: HEADER_SIZE,
        });
    }

    if length > MAX_FRAME_SIZE {
        return Err(SrpcfError::FrameTooLarge {
            size: length,
            max: MAX_FRAME_SIZE,
        });
    }

    if length > bytes.len() {
        return Err(SrpcfError::Truncated(format!(
            "frame declares {} bytes, got {}",
            length,
            bytes.len()
        )));
    }

    Ok((opcode, &bytes[..length]))
}

fn require_length(opcode: u32, frame: &[u8], minimum: usize) -> Result<()> {
    if frame.len() < minimum {
        return Err(SrpcfError::FrameTooShort {
            opcode,
            length: frame.len(),
            minimum,
        });
    }
    Ok(())
}

fn check_size(size: usize) -> Result<()> {
    if size > MAX_FRAME_SIZE {
        return Err(SrpcfError::FrameTooLarge {
            size,
            max: MAX_FRAME_SIZE,
        });
    }
    Ok(())
}

fn put_header(buf: &mut BytesMut, opcode: u32, length: usize) {
    buf.put_u32_le(opcode);
    buf.put_u32_le(length as u32);
}

// =============================================================================
// Request Encoding/Decoding
// =============================================================================

/// Encode a request to bytes
pub fn encode_request(request: &Request) -> Result<Bytes> {
    let opcode = request.opcode() as u32;

    match request {
        Request::QuerySupport => {
            let mut buf = BytesMut::with_capacity(HEADER_SIZE);
            put_header(&mut buf, opcode, HEADER_SIZE);
            Ok(buf.freeze())
        }
        Request::Execute {
            command_id,
            options,
        } => {
            let mut blob = BytesMut::new();
            let blob_size = options::serialize(options, &mut blob);
            let length = EXECUTE_MIN_SIZE + blob_size + empty_padding(options);
            check_size(length)?;

            let mut buf = BytesMut::with_capacity(length);
            put_header(&mut buf, opcode, length);
            buf.put_u32_le(*command_id);
            buf.put_u32_le(options.len() as u32);
            buf.put(blob);
            buf.put_bytes(0, empty_padding(options));
            Ok(buf.freeze())
        }
        Request::ExecutePlugin {
            command_id,
            name,
            options,
        } => {
            if name.is_empty() || name.len() >= PLUGIN_NAME_SIZE || name.contains('\0') {
                return Err(SrpcfError::InvalidName(format!(
                    "plugin name must be 1..{} bytes without NUL: {:?}",
                    PLUGIN_NAME_SIZE - 1,
                    name
                )));
            }

            let mut blob = BytesMut::new();
            let blob_size = options::serialize(options, &mut blob);
            let length = EXECUTE_PLUGIN_MIN_SIZE + blob_size + empty_padding(options);
            check_size(length)?;

            let mut buf = BytesMut::with_capacity(length);
            put_header(&mut buf, opcode, length);
            buf.put_u32_le(*command_id);
            buf.put_slice(name.as_bytes());
            buf.put_bytes(0, PLUGIN_NAME_SIZE - name.len());
            buf.put_u32_le(options.len() as u32);
            buf.put(blob);
            buf.put_bytes(0, empty_padding(options));
            Ok(buf.freeze())
        }
    }
}

fn empty_padding(options: &OptionList) -> usize {
    if options.is_empty() {
        EMPTY_OPTIONS_PADDING
    } else {
        0
    }
}

/// Decode a request from bytes
///
/// Rejects the frame as a whole on any inconsistency; nothing is dispatched
/// from a partially valid frame.
pub fn decode_request(bytes: &[u8]) -> Result<Request> {
    let (opcode, frame) = split_frame(bytes)?;

    match RequestOpcode::try_from(opcode).map_err(SrpcfError::UnknownOpcode)? {
        RequestOpcode::QuerySupport => Ok(Request::QuerySupport),
        RequestOpcode::Execute => {
            require_length(opcode, frame, EXECUTE_MIN_SIZE)?;
            let mut body = &frame[HEADER_SIZE..];
            let command_id = body.get_u32_le();
            let count = body.get_u32_le();
            let options = options::deserialize(body, count)?;

            Ok(Request::Execute {
                command_id,
                options,
            })
        }
        RequestOpcode::ExecutePlugin => {
            require_length(opcode, frame, EXECUTE_PLUGIN_MIN_SIZE)?;
            let mut body = &frame[HEADER_SIZE..];
            let command_id = body.get_u32_le();
            let name = decode_name(&body[..PLUGIN_NAME_SIZE])?;
            body.advance(PLUGIN_NAME_SIZE);
            let count = body.get_u32_le();
            let options = options::deserialize(body, count)?;

            Ok(Request::ExecutePlugin {
                command_id,
                name,
                options,
            })
        }
    }
}

/// Decode the fixed-width, zero-padded plugin name field
fn decode_name(field: &[u8]) -> Result<String> {
    let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
    let name = std::str::from_utf8(&field[..end])
        .map_err(|e| SrpcfError::InvalidName(format!("plugin name is not UTF-8: {}", e)))?;
    Ok(name.to_string())
}

// =============================================================================
// Response Encoding/Decoding
// =============================================================================

/// Encode a response to bytes
///
/// Fails with `FrameTooLarge` when the result does not fit in one frame.
pub fn encode_response(response: &Response) -> Result<Bytes> {
    let opcode = response.opcode() as u32;

    match response {
        Response::QuerySupport { ids } => {
            let length = SUPPORT_RESPONSE_MIN_SIZE + 4 * ids.len();
            check_size(length)?;

            let mut buf = BytesMut::with_capacity(length);
            put_header(&mut buf, opcode, length);
            buf.put_u32_le(ids.len() as u32);
            for id in ids {
                buf.put_u32_le(*id);
            }
            Ok(buf.freeze())
        }
        Response::Execute(result) => {
            // Data is sent as a C string: the terminator is part of data_len
            let data_len = result.data.as_ref().map(|d| d.len() + 1).unwrap_or(0);
            let length = EXECUTE_RESPONSE_MIN_SIZE + data_len;
            check_size(length)?;

            let mut buf = BytesMut::with_capacity(length);
            put_header(&mut buf, opcode, length);
            buf.put_u32_le(result.error_code.code());
            buf.put_u32_le(data_len as u32);
            if let Some(data) = &result.data {
                buf.put_slice(data);
                buf.put_u8(0);
            }
            Ok(buf.freeze())
        }
    }
}

/// Decode a response from bytes
pub fn decode_response(bytes: &[u8]) -> Result<Response> {
    let (opcode, frame) = split_frame(bytes)?;

    match ResponseOpcode::try_from(opcode).map_err(SrpcfError::UnknownOpcode)? {
        ResponseOpcode::QuerySupport => {
            require_length(opcode, frame, SUPPORT_RESPONSE_MIN_SIZE)?;
            let mut body = &frame[HEADER_SIZE..];
            let count = body.get_u32_le() as usize;

            if body.remaining() < count * 4 {
                return Err(SrpcfError::Truncated(format!(
                    "support list declares {} ids, frame holds {}",
                    count,
                    body.remaining() / 4
                )));
            }

            let ids = (0..count).map(|_| body.get_u32_le()).collect();
            Ok(Response::QuerySupport { ids })
        }
        ResponseOpcode::Execute => {
            require_length(opcode, frame, EXECUTE_RESPONSE_MIN_SIZE)?;
            let mut body = &frame[HEADER_SIZE..];
            let error_code = ErrorCode(body.get_u32_le());
            let data_len = body.get_u32_le() as usize;

            if body.remaining() < data_len {
                return Err(SrpcfError::Truncated(format!(
                    "result declares {} data bytes, frame holds {}",
                    data_len,
                    body.remaining()
                )));
            }

            let data = if data_len > 0 {
                let raw = &body[..data_len];
                let end = raw.iter().position(|b| *b == 0).unwrap_or(raw.len());
                Some(raw[..end].to_vec())
            } else {
                None
            };

            Ok(Response::Execute(ExecutionResult { error_code, data }))
        }
    }
}

// =============================================================================
// Stream-based I/O helpers
// =============================================================================

/// Receive one frame with a single read
///
/// The frame must arrive whole in that read: its declared length has to be
/// covered by the bytes received. Trailing bytes beyond the declared length
/// are discarded.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Bytes> {
    let received = channel::receive_once(reader, MAX_FRAME_SIZE)?;
    let (_, frame) = split_frame(&received)?;
    Ok(Bytes::copy_from_slice(frame))
}

/// Read a complete request from a stream
pub fn read_request<R: Read>(reader: &mut R) -> Result<Request> {
    let frame = read_frame(reader)?;
    decode_request(&frame)
}

/// Write a request to a stream
pub fn write_request<W: Write>(writer: &mut W, request: &Request) -> Result<()> {
    let bytes = encode_request(request)?;
    channel::send_exact(writer, &bytes)
}

/// Read a complete response from a stream
pub fn read_response<R: Read>(reader: &mut R) -> Result<Response> {
    let frame = read_frame(reader)?;
    decode_response(&frame)
}

/// Write a response to a stream
pub fn write_response<W: Write>(writer: &mut W, response: &Response) -> Result<()> {
    let bytes = encode_response(response)?;
    channel::send_exact(writer, &bytes)
}
