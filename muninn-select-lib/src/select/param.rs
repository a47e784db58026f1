//! Selection parameters: the key identifying a class of requests.

use std::fmt;

use serde::Deserialize;

/// Operation id of a request class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    AmSend,
    TagSend,
    Put,
    Get,
}

impl Op {
    pub fn name(&self) -> &'static str {
        match self {
            Op::AmSend => "am_send",
            Op::TagSend => "tag_send",
            Op::Put => "put",
            Op::Get => "get",
        }
    }

    fn from_u8(v: u8) -> Option<Op> {
        match v {
            0 => Some(Op::AmSend),
            1 => Some(Op::TagSend),
            2 => Some(Op::Put),
            3 => Some(Op::Get),
            _ => None,
        }
    }
}

/// Datatype class of the request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DtClass {
    #[default]
    Contig,
    Iov,
    Generic,
}

impl DtClass {
    pub fn name(&self) -> &'static str {
        match self {
            DtClass::Contig => "contig",
            DtClass::Iov => "iov",
            DtClass::Generic => "generic",
        }
    }

    fn from_u8(v: u8) -> Option<DtClass> {
        match v {
            0 => Some(DtClass::Contig),
            1 => Some(DtClass::Iov),
            2 => Some(DtClass::Generic),
            _ => None,
        }
    }
}

/// Memory type holding the request payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemType {
    #[default]
    Host,
    Device,
    Managed,
}

impl MemType {
    pub fn name(&self) -> &'static str {
        match self {
            MemType::Host => "host",
            MemType::Device => "device",
            MemType::Managed => "managed",
        }
    }

    fn from_u8(v: u8) -> Option<MemType> {
        match v {
            0 => Some(MemType::Host),
            1 => Some(MemType::Device),
            2 => Some(MemType::Managed),
            _ => None,
        }
    }
}

/// Compressed per-request flags, one byte of the selector key.
pub mod op_flags {
    /// Request favors completion latency over bandwidth.
    pub const FAST_CMPL: u8 = 1 << 0;
}

/// Operation attribute bit corresponding to [`op_flags::FAST_CMPL`].
pub const OP_ATTR_FLAG_FAST_CMPL: u32 = 1 << 8;

const OP_ATTR_SHIFT: u32 = 8;

/// Expand the compressed flag byte into the public attribute mask.
pub fn op_attr_from_flags(flags: u8) -> u32 {
    (flags as u32) << OP_ATTR_SHIFT
}

/// Selector key for one class of requests. Two values compare equal exactly
/// when all fields are equal; [`SelectParam::pack`] produces the equivalent
/// 64-bit hash key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectParam {
    pub op: Op,
    pub op_flags: u8,
    pub dt_class: DtClass,
    pub sg_count: u8,
    pub mem_type: MemType,
}

impl SelectParam {
    /// Pack into a single 64-bit key, one byte per field.
    pub fn pack(&self) -> u64 {
        (self.op as u64)
            | ((self.op_flags as u64) << 8)
            | ((self.dt_class as u64) << 16)
            | ((self.sg_count as u64) << 24)
            | ((self.mem_type as u64) << 32)
    }

    /// Restore a parameter tuple from its packed key.
    pub fn unpack(key: u64) -> Option<SelectParam> {
        Some(SelectParam {
            op: Op::from_u8((key & 0xff) as u8)?,
            op_flags: ((key >> 8) & 0xff) as u8,
            dt_class: DtClass::from_u8(((key >> 16) & 0xff) as u8)?,
            sg_count: ((key >> 24) & 0xff) as u8,
            mem_type: MemType::from_u8(((key >> 32) & 0xff) as u8)?,
        })
    }
}

impl fmt::Display for SelectParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}()", self.op.name())?;
        write!(f, " on a {} data-type", self.dt_class.name())?;
        if self.sg_count > 1 {
            write!(f, " with {} scatter-gather entries", self.sg_count)?;
        }
        write!(f, " in {} memory", self.mem_type.name())?;
        let attr = op_attr_from_flags(self.op_flags);
        if attr & OP_ATTR_FLAG_FAST_CMPL != 0 {
            write!(f, " and fast completion")?;
        }
        Ok(())
    }
}
