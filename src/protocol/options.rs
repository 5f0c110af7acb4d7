//! Option list serialization
//!
//! Positional command arguments travel as a contiguous blob placed right after
//! a request's fixed fields:
//!
//! ```text
//! ┌──────────┬──────────────────┬──────────┬──────────────────┬─────
//! │ Len (8)  │ Bytes + NUL      │ Len (8)  │ Bytes + NUL      │ ...
//! └──────────┴──────────────────┴──────────┴──────────────────┴─────
//! ```
//!
//! `Len` counts the option bytes plus the terminator. The number of entries is
//! carried separately in the request (`optionCount`).

use std::ops::Range;

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{Result, SrpcfError};

/// Width of an entry's length prefix
pub const LENGTH_PREFIX_SIZE: usize = 8;

/// Ordered positional arguments of one command invocation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionList {
    values: Vec<String>,
}

impl OptionList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode shell arguments into options
    ///
    /// Every argument is a cell of comma-delimited values. Empty pieces,
    /// including cells made only of commas, are skipped.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values = args
            .into_iter()
            .flat_map(|cell| {
                cell.as_ref()
                    .split(',')
                    .filter(|piece| !piece.is_empty())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { values }
    }

    pub fn push(&mut self, value: impl Into<String>) {
        self.values.push(value.into());
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.values.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.values
    }

    pub fn into_vec(self) -> Vec<String> {
        self.values
    }

    /// Bytes this list occupies once serialized
    pub fn serialized_size(&self) -> usize {
        self.values
            .iter()
            .map(|v| LENGTH_PREFIX_SIZE + v.len() + 1)
            .sum()
    }
}

impl From<Vec<String>> for OptionList {
    fn from(values: Vec<String>) -> Self {
        Self { values }
    }
}

impl<S: Into<String>> FromIterator<S> for OptionList {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<'a> IntoIterator for &'a OptionList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

// =============================================================================
// Serialization
// =============================================================================

/// Append the serialized form of `options` to `out`
///
/// Returns the number of bytes written, which the caller adds to the frame
/// length.
pub fn serialize(options: &OptionList, out: &mut BytesMut) -> usize {
    let start = out.len();
    out.reserve(options.serialized_size());

    for value in options.iter() {
        out.put_u64_le((value.len() + 1) as u64);
        out.put_slice(value.as_bytes());
        out.put_u8(0);
    }

    out.len() - start
}

/// Rebuild `count` options from a serialized blob
///
/// The entry boundaries are resolved first into an offset table, then each
/// entry is copied out. Bytes after the last entry are ignored.
pub fn deserialize(blob: &[u8], count: u32) -> Result<OptionList> {
    if count == 0 {
        return Ok(OptionList::new());
    }

    let table = index_entries(blob, count)?;

    let mut values = Vec::with_capacity(table.len());
    for (index, range) in table.into_iter().enumerate() {
        let value = std::str::from_utf8(&blob[range]).map_err(|e| {
            SrpcfError::InvalidOption(format!("entry {} is not valid UTF-8: {}", index, e))
        })?;
        values.push(value.to_string());
    }

    Ok(OptionList { values })
}

/// Compute the byte range of each entry's value (terminator excluded)
///
/// Entry k starts where entry k-1 ended: at the sum of the prefix and data
/// sizes of every earlier entry.
fn index_entries(blob: &[u8], count: u32) -> Result<Vec<Range<usize>>> {
    let max_entries = blob.len() / (LENGTH_PREFIX_SIZE + 1);
    let mut table = Vec::with_capacity((count as usize).min(max_entries));
    let mut offset = 0usize;

    for index in 0..count {
        let mut prefix = blob.get(offset..).unwrap_or_default();
        if prefix.len() < LENGTH_PREFIX_SIZE {
            return Err(SrpcfError::InvalidOption(format!(
                "entry {} of {}: missing length prefix at offset {}",
                index, count, offset
            )));
        }

        let declared = prefix.get_u64_le();
        if declared == 0 {
            return Err(SrpcfError::InvalidOption(format!(
                "entry {} of {}: zero length",
                index, count
            )));
        }

        let data_start = offset + LENGTH_PREFIX_SIZE;
        let data_end = usize::try_from(declared)
            .ok()
            .and_then(|len| data_start.checked_add(len))
            .filter(|end| *end <= blob.len())
            .ok_or_else(|| {
                SrpcfError::InvalidOption(format!(
                    "entry {} of {}: length {} runs past the blob ({} bytes)",
                    index,
                    count,
                    declared,
                    blob.len()
                ))
            })?;

        if blob[data_end - 1] != 0 {
            return Err(SrpcfError::InvalidOption(format!(
                "entry {} of {}: missing terminator",
                index, count
            )));
        }

        if blob[data_start..data_end - 1].contains(&0) {
            return Err(SrpcfError::InvalidOption(format!(
                "entry {} of {}: embedded NUL",
                index, count
            )));
        }

        table.push(data_start..data_end - 1);
        offset = data_end;
    }

    Ok(table)
}
