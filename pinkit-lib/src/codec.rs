//! Payload codec: the bit-exact data-output script layout.
//!
//! A pin is embedded in a provably-unspendable output whose script is
//! `OP_FALSE OP_RETURN` followed by minimal pushes of the protocol flag,
//! operation, path, encoding tag, content type and payload, in that
//! order. This layout is what ledger indexers parse; it is a
//! compatibility surface, not a design choice. [`decode`] exists to
//! verify the round trip against known sample encodings.

use bitcoin::opcodes::all::OP_RETURN;
use bitcoin::opcodes::OP_FALSE;
use bitcoin::script::{Builder, Instruction, PushBytesBuf};
use bitcoin::Script;

use crate::record::{ContentEncoding, Operation, ProtocolRecord};
use crate::{PinkitError, Result};

/// Practical ceiling on an embedded payload, in bytes.
///
/// 90% of 1 MiB, matching the ledger's working output-script limit.
/// Composers reject larger payloads; override via [`DataLimits`].
pub const DEFAULT_MAX_PAYLOAD_BYTES: usize = 943_718;

/// Configurable size policy applied by composers before encoding.
#[derive(Clone, Copy, Debug)]
pub struct DataLimits {
    /// Maximum payload size accepted into a data output.
    pub max_payload_bytes: usize,
}

impl Default for DataLimits {
    fn default() -> Self {
        Self {
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

impl DataLimits {
    /// Reject a record whose payload exceeds the configured ceiling.
    pub fn check(&self, record: &ProtocolRecord) -> Result<()> {
        if record.payload().len() > self.max_payload_bytes {
            return Err(PinkitError::invalid_input(
                "body",
                format!(
                    "payload is {} bytes, ceiling is {}",
                    record.payload().len(),
                    self.max_payload_bytes
                ),
            ));
        }
        Ok(())
    }
}

fn push(builder: Builder, data: &[u8]) -> Builder {
    // Record constructors cap the payload below the push limit, and every
    // other field is a short tag.
    let bytes = PushBytesBuf::try_from(data.to_vec())
        .expect("record fields are validated below the script push limit");
    builder.push_slice(bytes)
}

/// Encode a record into the complete data-output script.
///
/// Pure and deterministic: the same record always yields identical bytes.
pub fn encode(record: &ProtocolRecord) -> Vec<u8> {
    let mut builder = Builder::new().push_opcode(OP_FALSE).push_opcode(OP_RETURN);
    builder = push(builder, record.flag().as_bytes());
    builder = push(builder, record.operation().as_str().as_bytes());
    builder = push(builder, record.path().as_bytes());
    builder = push(builder, record.encoding().as_str().as_bytes());
    builder = push(builder, record.content_type().as_bytes());
    builder = push(builder, record.payload());
    builder.into_script().into_bytes()
}

fn utf8_field(field: &'static str, bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|_| PinkitError::invalid_input(field, "not valid UTF-8"))
}

/// Decode a data-output script back into a record.
///
/// Inverse of [`encode`] for any script it produced.
pub fn decode(script_bytes: &[u8]) -> Result<ProtocolRecord> {
    let script = Script::from_bytes(script_bytes);
    let mut pushes: Vec<Vec<u8>> = Vec::with_capacity(7);
    let mut saw_return = false;
    for instruction in script.instructions() {
        match instruction {
            Ok(Instruction::PushBytes(data)) => pushes.push(data.as_bytes().to_vec()),
            Ok(Instruction::Op(op)) if op == OP_RETURN => saw_return = true,
            Ok(Instruction::Op(op)) => {
                return Err(PinkitError::invalid_input(
                    "script",
                    format!("unexpected opcode {op}"),
                ));
            }
            Err(e) => {
                return Err(PinkitError::invalid_input(
                    "script",
                    format!("malformed script: {e}"),
                ));
            }
        }
    }
    // Leading OP_FALSE parses as an empty push, so the layout is one
    // empty marker push plus the six protocol fields.
    if !saw_return || pushes.len() != 7 || !pushes[0].is_empty() {
        return Err(PinkitError::invalid_input(
            "script",
            "not a pin data output",
        ));
    }

    let flag = utf8_field("flag", &pushes[1])?;
    let operation = Operation::from_tag(&utf8_field("operation", &pushes[2])?)?;
    let path = utf8_field("path", &pushes[3])?;
    let encoding = ContentEncoding::from_tag(&utf8_field("encoding", &pushes[4])?)?;
    let content_type = utf8_field("content_type", &pushes[5])?;
    let payload = pushes.pop().unwrap_or_default();

    Ok(ProtocolRecord::from_parts(
        operation,
        path,
        payload,
        encoding,
        content_type,
        flag,
    ))
}
