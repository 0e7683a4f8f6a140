/// Raw little-endian bytes shared by attributes and indices. Buffers are
/// held behind `Arc` so views over the same data do not copy it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BufferAsset {
    pub name: Option<String>,
    pub data: Vec<u8>,
}

impl BufferAsset {
    pub fn new(data: Vec<u8>) -> Self {
        Self { name: None, data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl From<Vec<u8>> for BufferAsset {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}
