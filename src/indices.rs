use std::sync::Arc;

use bytemuck::pod_read_unaligned;

use crate::buffer::BufferAsset;
use crate::error::ModelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IndexDatatype {
    U8,
    U16,
    U32,
}

impl IndexDatatype {
    pub fn size_in_bytes(self) -> usize {
        match self {
            IndexDatatype::U8 => 1,
            IndexDatatype::U16 => 2,
            IndexDatatype::U32 => 4,
        }
    }
}

/// A view of vertex indices in a shared buffer. Indices are tightly
/// packed little-endian integers starting at `byte_offset`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Indices {
    pub index_datatype: IndexDatatype,
    pub count: usize,
    pub buffer: Arc<BufferAsset>,
    pub byte_offset: usize,
}

impl Indices {
    pub fn new(index_datatype: IndexDatatype, count: usize, buffer: Arc<BufferAsset>) -> Self {
        Self {
            index_datatype,
            count,
            buffer,
            byte_offset: 0,
        }
    }

    /// The vertex index at position `i`, widened to `u32`.
    pub fn index_at(&self, i: usize) -> Result<u32, ModelError> {
        if i >= self.count {
            return Err(ModelError::OutOfBounds {
                entity: "Indices",
                index: i,
                count: self.count,
            });
        }
        let size = self.index_datatype.size_in_bytes();
        let start = self.byte_offset + i * size;
        let end = start + size;
        let bytes = self
            .buffer
            .data
            .get(start..end)
            .ok_or(ModelError::BufferTooShort {
                entity: "Indices",
                needed: end,
                actual: self.buffer.len(),
            })?;
        Ok(match self.index_datatype {
            IndexDatatype::U8 => pod_read_unaligned::<u8>(bytes) as u32,
            IndexDatatype::U16 => pod_read_unaligned::<u16>(bytes) as u32,
            IndexDatatype::U32 => pod_read_unaligned::<u32>(bytes),
        })
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        let needed = self.byte_offset + self.count * self.index_datatype.size_in_bytes();
        if needed > self.buffer.len() {
            return Err(ModelError::BufferTooShort {
                entity: "Indices",
                needed,
                actual: self.buffer.len(),
            });
        }
        Ok(())
    }
}
