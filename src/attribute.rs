use std::fmt::{self, Display, Formatter};
use std::sync::Arc;

use crate::buffer::BufferAsset;
use crate::compression;
use crate::error::ModelError;
use crate::value::{integer_from_float, AttributeType, ComponentDatatype, Value};

/// What an attribute means to a consumer. Indexed semantics carry their
/// set index, everything unrecognized is preserved as `Custom`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeSemantic {
    Position,
    Normal,
    Tangent,
    TexCoord(u32),
    Color(u32),
    Joints(u32),
    Weights(u32),
    FeatureId(u32),
    Translation,
    Rotation,
    Scale,
    Custom(String),
}

impl AttributeSemantic {
    pub fn from_name(name: &str) -> Self {
        fn set_index(name: &str, prefix: &str) -> Option<u32> {
            name.strip_prefix(prefix)?.parse().ok()
        }
        match name {
            "POSITION" => AttributeSemantic::Position,
            "NORMAL" => AttributeSemantic::Normal,
            "TANGENT" => AttributeSemantic::Tangent,
            "TRANSLATION" => AttributeSemantic::Translation,
            "ROTATION" => AttributeSemantic::Rotation,
            "SCALE" => AttributeSemantic::Scale,
            _ => {
                if let Some(index) = set_index(name, "TEXCOORD_") {
                    AttributeSemantic::TexCoord(index)
                } else if let Some(index) = set_index(name, "COLOR_") {
                    AttributeSemantic::Color(index)
                } else if let Some(index) = set_index(name, "JOINTS_") {
                    AttributeSemantic::Joints(index)
                } else if let Some(index) = set_index(name, "WEIGHTS_") {
                    AttributeSemantic::Weights(index)
                } else if let Some(index) = set_index(name, "_FEATURE_ID_") {
                    AttributeSemantic::FeatureId(index)
                } else {
                    AttributeSemantic::Custom(name.to_string())
                }
            }
        }
    }
}

impl Display for AttributeSemantic {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            AttributeSemantic::Position => write!(f, "POSITION"),
            AttributeSemantic::Normal => write!(f, "NORMAL"),
            AttributeSemantic::Tangent => write!(f, "TANGENT"),
            AttributeSemantic::TexCoord(index) => write!(f, "TEXCOORD_{index}"),
            AttributeSemantic::Color(index) => write!(f, "COLOR_{index}"),
            AttributeSemantic::Joints(index) => write!(f, "JOINTS_{index}"),
            AttributeSemantic::Weights(index) => write!(f, "WEIGHTS_{index}"),
            AttributeSemantic::FeatureId(index) => write!(f, "_FEATURE_ID_{index}"),
            AttributeSemantic::Translation => write!(f, "TRANSLATION"),
            AttributeSemantic::Rotation => write!(f, "ROTATION"),
            AttributeSemantic::Scale => write!(f, "SCALE"),
            AttributeSemantic::Custom(name) => write!(f, "{name}"),
        }
    }
}

/// How quantized storage maps back to logical values.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QuantizationMode {
    /// Unit vectors packed onto an octahedron. Storage is two components,
    /// the decoded value is a normalized `Vec3`.
    OctEncoded,
    /// Values normalized into a box: `offset + stored / range * dimensions`.
    Volume { offset: Value, dimensions: Value },
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Quantization {
    pub mode: QuantizationMode,
    /// Divisor that maps raw storage onto [0, 1] (or [0, range] for
    /// octahedron packing). Scalar, or the storage shape for volumes.
    pub normalization_range: Value,
    /// Datatype of the stored components, usually narrower than the
    /// attribute's logical datatype.
    pub component_datatype: ComponentDatatype,
    pub storage_type: AttributeType,
}

/// Where an attribute's elements live.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeData {
    /// Every element has this value. No buffer is allocated.
    Constant(Value),
    /// Tightly packed elements owned by the attribute itself.
    TypedArray(Vec<u8>),
    /// A strided view into a shared buffer.
    Buffer {
        buffer: Arc<BufferAsset>,
        byte_offset: usize,
        byte_stride: Option<usize>,
    },
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Attribute {
    pub semantic: AttributeSemantic,
    /// Datatype of the logical components. Quantized storage reads use
    /// the quantization's own datatype instead.
    pub component_datatype: ComponentDatatype,
    /// The logical element shape after decode. Quantized storage may
    /// differ, see [`Attribute::storage_type`].
    pub ty: AttributeType,
    /// Integer components map to [0, 1] or [-1, 1] on decode. Ignored
    /// when `quantization` is set, which carries its own range.
    pub normalized: bool,
    pub count: usize,
    /// Advisory componentwise bounds. Not enforced on decode.
    pub min: Option<Value>,
    pub max: Option<Value>,
    pub quantization: Option<Quantization>,
    pub data: AttributeData,
}

impl Attribute {
    pub fn new(
        semantic: AttributeSemantic,
        component_datatype: ComponentDatatype,
        ty: AttributeType,
        count: usize,
        data: AttributeData,
    ) -> Self {
        Self {
            semantic,
            component_datatype,
            ty,
            normalized: false,
            count,
            min: None,
            max: None,
            quantization: None,
            data,
        }
    }

    /// The shape of one element as stored, before any decode.
    pub fn storage_type(&self) -> AttributeType {
        match &self.quantization {
            Some(quantization) => quantization.storage_type,
            None => self.ty,
        }
    }

    /// The datatype of one component as stored, before any decode.
    pub fn storage_datatype(&self) -> ComponentDatatype {
        match &self.quantization {
            Some(quantization) => quantization.component_datatype,
            None => self.component_datatype,
        }
    }

    /// Bytes from one element's start to its end, excluding padding.
    pub fn element_size(&self) -> usize {
        self.storage_type().component_count() * self.storage_datatype().size_in_bytes()
    }

    /// Bytes from one element's start to the next. The explicit stride
    /// when the view has one, otherwise tightly packed.
    pub fn byte_stride(&self) -> usize {
        match &self.data {
            AttributeData::Buffer {
                byte_stride: Some(stride),
                ..
            } => *stride,
            _ => self.element_size(),
        }
    }

    /// The backing bytes and base offset, or the constant when the data
    /// has no backing storage, in `binary_search` style.
    fn raw_parts(&self) -> Result<(&[u8], usize), &Value> {
        match &self.data {
            AttributeData::Constant(value) => Err(value),
            AttributeData::TypedArray(data) => Ok((data, 0)),
            AttributeData::Buffer {
                buffer,
                byte_offset,
                ..
            } => Ok((&buffer.data, *byte_offset)),
        }
    }

    fn element_slice<'a>(&self, bytes: &'a [u8], base: usize, index: usize) -> Result<&'a [u8], ModelError> {
        let start = base + index * self.byte_stride();
        let end = start + self.element_size();
        bytes.get(start..end).ok_or(ModelError::BufferTooShort {
            entity: "Attribute",
            needed: end,
            actual: bytes.len(),
        })
    }

    /// The fully decoded element at `index`: dequantized, denormalized,
    /// in the logical shape `ty`.
    pub fn value_at(&self, index: usize) -> Result<Value, ModelError> {
        if index >= self.count {
            return Err(ModelError::OutOfBounds {
                entity: "Attribute",
                index,
                count: self.count,
            });
        }
        let (bytes, base) = match self.raw_parts() {
            Ok(parts) => parts,
            Err(value) => {
                if value.ty() != self.ty {
                    return Err(ModelError::ShapeMismatch {
                        entity: "Attribute",
                        field: "constant",
                        expected: self.ty,
                        actual: value.ty(),
                    });
                }
                return Ok(*value);
            }
        };
        let element = self.element_slice(bytes, base, index)?;
        let storage = self.storage_type();
        let datatype = self.storage_datatype();
        let component_size = datatype.size_in_bytes();
        let component_count = storage.component_count();
        let mut components = [0.0f32; 16];
        for (i, component) in components[..component_count].iter_mut().enumerate() {
            let offset = i * component_size;
            *component = datatype.read_f32(&element[offset..offset + component_size]);
        }
        self.decode(Value::from_components(storage, &components[..component_count]))
    }

    fn decode(&self, raw: Value) -> Result<Value, ModelError> {
        let Some(quantization) = &self.quantization else {
            if self.normalized {
                return Ok(raw.map(|component| self.component_datatype.normalize(component)));
            }
            return Ok(raw);
        };
        match &quantization.mode {
            QuantizationMode::OctEncoded => {
                let Value::Vec2(encoded) = raw else {
                    return Err(ModelError::ShapeMismatch {
                        entity: "Quantization",
                        field: "storage_type",
                        expected: AttributeType::Vec2,
                        actual: raw.ty(),
                    });
                };
                let Value::Scalar(range) = quantization.normalization_range else {
                    return Err(ModelError::ShapeMismatch {
                        entity: "Quantization",
                        field: "normalization_range",
                        expected: AttributeType::Scalar,
                        actual: quantization.normalization_range.ty(),
                    });
                };
                Ok(Value::Vec3(compression::oct_decode(encoded, range)))
            }
            QuantizationMode::Volume { offset, dimensions } => {
                let mismatch = |field: &'static str, actual: AttributeType| ModelError::ShapeMismatch {
                    entity: "Quantization",
                    field,
                    expected: raw.ty(),
                    actual,
                };
                let normalized = raw
                    .zip(&quantization.normalization_range, |value, range| value / range)
                    .ok_or_else(|| {
                        mismatch("normalization_range", quantization.normalization_range.ty())
                    })?;
                let scaled = normalized
                    .zip(dimensions, |value, size| value * size)
                    .ok_or_else(|| mismatch("dimensions", dimensions.ty()))?;
                offset
                    .zip(&scaled, |base, value| base + value)
                    .ok_or_else(|| mismatch("offset", offset.ty()))
            }
        }
    }

    /// The element at `index` as a raw non-negative integer. Reads the
    /// stored value directly, skipping normalization and quantization.
    pub fn integer_at(&self, index: usize) -> Result<u64, ModelError> {
        if index >= self.count {
            return Err(ModelError::OutOfBounds {
                entity: "Attribute",
                index,
                count: self.count,
            });
        }
        if self.ty != AttributeType::Scalar {
            return Err(ModelError::ShapeMismatch {
                entity: "Attribute",
                field: "type",
                expected: AttributeType::Scalar,
                actual: self.ty,
            });
        }
        let raw = match self.raw_parts() {
            Ok((bytes, base)) => {
                let element = self.element_slice(bytes, base, index)?;
                let datatype = self.storage_datatype();
                datatype.read_integer(&element[..datatype.size_in_bytes()])
            }
            Err(value) => {
                let Value::Scalar(constant) = value else {
                    return Err(ModelError::ShapeMismatch {
                        entity: "Attribute",
                        field: "constant",
                        expected: AttributeType::Scalar,
                        actual: value.ty(),
                    });
                };
                integer_from_float(*constant as f64)
            }
        };
        let value = raw.ok_or_else(|| ModelError::NonIntegralFeatureId {
            semantic: self.semantic.clone(),
            index,
        })?;
        if value < 0 {
            return Err(ModelError::NegativeFeatureId {
                semantic: self.semantic.clone(),
                index,
                value,
            });
        }
        Ok(value as u64)
    }

    /// Structural checks that do not require decoding: shape agreement
    /// of constants, bounds and quantization parameters, and that the
    /// backing bytes cover `count` elements.
    pub fn validate(&self, entity: &'static str) -> Result<(), ModelError> {
        if self.normalized && !self.component_datatype.is_integer() {
            return Err(ModelError::NormalizedFloat {
                semantic: self.semantic.clone(),
            });
        }
        let expect_shape = |field: &'static str, expected: AttributeType, actual: AttributeType| {
            if expected == actual {
                Ok(())
            } else {
                Err(ModelError::ShapeMismatch {
                    entity,
                    field,
                    expected,
                    actual,
                })
            }
        };
        if let Some(min) = &self.min {
            expect_shape("min", self.ty, min.ty())?;
        }
        if let Some(max) = &self.max {
            expect_shape("max", self.ty, max.ty())?;
        }
        if let Some(quantization) = &self.quantization {
            match &quantization.mode {
                QuantizationMode::OctEncoded => {
                    expect_shape("quantization storage", AttributeType::Vec2, quantization.storage_type)?;
                    expect_shape("type", AttributeType::Vec3, self.ty)?;
                    expect_shape(
                        "normalization range",
                        AttributeType::Scalar,
                        quantization.normalization_range.ty(),
                    )?;
                }
                QuantizationMode::Volume { offset, dimensions } => {
                    expect_shape("quantization storage", self.ty, quantization.storage_type)?;
                    for (field, value) in [
                        ("quantization offset", offset),
                        ("quantization dimensions", dimensions),
                        ("normalization range", &quantization.normalization_range),
                    ] {
                        if value.ty() != AttributeType::Scalar {
                            expect_shape(field, quantization.storage_type, value.ty())?;
                        }
                    }
                }
            }
        }
        match self.raw_parts() {
            Err(value) => expect_shape("constant", self.ty, value.ty())?,
            Ok((bytes, base)) => {
                if self.count > 0 {
                    let needed = base + (self.count - 1) * self.byte_stride() + self.element_size();
                    if needed > bytes.len() {
                        return Err(ModelError::BufferTooShort {
                            entity,
                            needed,
                            actual: bytes.len(),
                        });
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::sync::Arc;

    use glam::Vec3;

    use crate::buffer::BufferAsset;
    use crate::compression::oct_encode;
    use crate::error::ModelError;
    use crate::value::{AttributeType, ComponentDatatype, Value};

    use super::{Attribute, AttributeData, AttributeSemantic, Quantization, QuantizationMode};

    fn f32_bytes(values: &[f32]) -> Vec<u8> {
        values.iter().flat_map(|value| value.to_le_bytes()).collect()
    }

    #[test]
    fn semantic_names_round_trip() {
        for name in [
            "POSITION",
            "NORMAL",
            "TEXCOORD_1",
            "COLOR_0",
            "JOINTS_0",
            "WEIGHTS_2",
            "_FEATURE_ID_3",
            "TRANSLATION",
            "ROTATION",
            "_CUSTOM_THING",
        ] {
            assert_eq!(AttributeSemantic::from_name(name).to_string(), name);
        }
        assert_eq!(
            AttributeSemantic::from_name("TEXCOORD_x"),
            AttributeSemantic::Custom("TEXCOORD_x".to_string())
        );
    }

    #[test]
    fn reads_strided_buffer_elements() {
        // Two interleaved position/texcoord vertices, positions first.
        let data = f32_bytes(&[1.0, 2.0, 3.0, 0.5, 0.5, 4.0, 5.0, 6.0, 0.25, 0.75]);
        let buffer = Arc::new(BufferAsset::new(data));
        let attribute = Attribute::new(
            AttributeSemantic::Position,
            ComponentDatatype::F32,
            AttributeType::Vec3,
            2,
            AttributeData::Buffer {
                buffer,
                byte_offset: 0,
                byte_stride: Some(20),
            },
        );
        assert!(attribute.validate("Primitive.attributes").is_ok());
        assert_eq!(
            attribute.value_at(1),
            Ok(Value::Vec3(Vec3::new(4.0, 5.0, 6.0)))
        );
    }

    #[test]
    fn bounds_are_reported() {
        let attribute = Attribute::new(
            AttributeSemantic::Position,
            ComponentDatatype::F32,
            AttributeType::Vec3,
            2,
            AttributeData::TypedArray(f32_bytes(&[0.0; 6])),
        );
        assert_eq!(
            attribute.value_at(2),
            Err(ModelError::OutOfBounds {
                entity: "Attribute",
                index: 2,
                count: 2,
            })
        );
    }

    #[test]
    fn short_buffers_are_reported() {
        let mut attribute = Attribute::new(
            AttributeSemantic::Position,
            ComponentDatatype::F32,
            AttributeType::Vec3,
            3,
            AttributeData::TypedArray(f32_bytes(&[0.0; 6])),
        );
        assert_eq!(
            attribute.validate("Primitive.attributes"),
            Err(ModelError::BufferTooShort {
                entity: "Primitive.attributes",
                needed: 36,
                actual: 24,
            })
        );
        attribute.count = 2;
        assert!(attribute.validate("Primitive.attributes").is_ok());
    }

    #[test]
    fn normalized_unsigned_decode() {
        let mut attribute = Attribute::new(
            AttributeSemantic::Color(0),
            ComponentDatatype::U8,
            AttributeType::Vec3,
            1,
            AttributeData::TypedArray(vec![0, 127, 255]),
        );
        attribute.normalized = true;
        let Value::Vec3(color) = attribute.value_at(0).unwrap() else {
            panic!("expected a Vec3");
        };
        assert_eq!(color.x, 0.0);
        assert!((color.y - 127.0 / 255.0).abs() < 1e-6);
        assert_eq!(color.z, 1.0);
    }

    #[test]
    fn normalized_signed_decode_clamps() {
        let mut attribute = Attribute::new(
            AttributeSemantic::Custom("_DELTA".to_string()),
            ComponentDatatype::I8,
            AttributeType::Scalar,
            2,
            AttributeData::TypedArray(vec![(-128i8) as u8, 127]),
        );
        attribute.normalized = true;
        assert_eq!(attribute.value_at(0), Ok(Value::Scalar(-1.0)));
        assert_eq!(attribute.value_at(1), Ok(Value::Scalar(1.0)));
    }

    #[test]
    fn normalized_float_is_malformed() {
        let mut attribute = Attribute::new(
            AttributeSemantic::Position,
            ComponentDatatype::F32,
            AttributeType::Vec3,
            0,
            AttributeData::TypedArray(Vec::new()),
        );
        attribute.normalized = true;
        assert_eq!(
            attribute.validate("Primitive.attributes"),
            Err(ModelError::NormalizedFloat {
                semantic: AttributeSemantic::Position,
            })
        );
    }

    #[test]
    fn constant_elements_decode_without_a_buffer() {
        let attribute = Attribute::new(
            AttributeSemantic::Color(0),
            ComponentDatatype::F32,
            AttributeType::Vec3,
            4,
            AttributeData::Constant(Value::Vec3(Vec3::splat(0.5))),
        );
        assert!(attribute.validate("Primitive.attributes").is_ok());
        assert_eq!(attribute.value_at(3), Ok(Value::Vec3(Vec3::splat(0.5))));
        assert!(matches!(
            attribute.value_at(4),
            Err(ModelError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn constant_shape_must_match() {
        let attribute = Attribute::new(
            AttributeSemantic::Color(0),
            ComponentDatatype::F32,
            AttributeType::Vec4,
            1,
            AttributeData::Constant(Value::Vec3(Vec3::ONE)),
        );
        assert_eq!(
            attribute.validate("Primitive.attributes"),
            Err(ModelError::ShapeMismatch {
                entity: "Primitive.attributes",
                field: "constant",
                expected: AttributeType::Vec4,
                actual: AttributeType::Vec3,
            })
        );
    }

    #[test]
    fn oct_encoded_normals_decode_to_unit_vectors() {
        let direction = Vec3::new(1.0, 2.0, 3.0).normalize();
        let encoded = oct_encode(direction, 255.0);
        let mut attribute = Attribute::new(
            AttributeSemantic::Normal,
            ComponentDatatype::F32,
            AttributeType::Vec3,
            1,
            AttributeData::TypedArray(vec![encoded.x as u8, encoded.y as u8]),
        );
        attribute.quantization = Some(Quantization {
            mode: QuantizationMode::OctEncoded,
            normalization_range: Value::Scalar(255.0),
            component_datatype: ComponentDatatype::U8,
            storage_type: AttributeType::Vec2,
        });
        assert_eq!(attribute.element_size(), 2);
        assert!(attribute.validate("Primitive.attributes").is_ok());
        let Value::Vec3(decoded) = attribute.value_at(0).unwrap() else {
            panic!("expected a Vec3");
        };
        assert!((decoded - direction).length() < 4.0 / 255.0);
        assert!((decoded.length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn volume_quantized_positions_decode() {
        let raw: Vec<u8> = [65535u16, 0, 32767]
            .iter()
            .flat_map(|value| value.to_le_bytes())
            .collect();
        let mut attribute = Attribute::new(
            AttributeSemantic::Position,
            ComponentDatatype::F32,
            AttributeType::Vec3,
            1,
            AttributeData::TypedArray(raw),
        );
        attribute.quantization = Some(Quantization {
            mode: QuantizationMode::Volume {
                offset: Value::Vec3(Vec3::new(10.0, 0.0, -1.0)),
                dimensions: Value::Vec3(Vec3::splat(2.0)),
            },
            normalization_range: Value::Scalar(65535.0),
            component_datatype: ComponentDatatype::U16,
            storage_type: AttributeType::Vec3,
        });
        assert!(attribute.validate("Primitive.attributes").is_ok());
        let Value::Vec3(decoded) = attribute.value_at(0).unwrap() else {
            panic!("expected a Vec3");
        };
        assert!((decoded - Vec3::new(12.0, 0.0, 0.0)).length() < 1e-3);
    }

    #[test]
    fn oct_quantization_requires_vec2_storage() {
        let mut attribute = Attribute::new(
            AttributeSemantic::Normal,
            ComponentDatatype::F32,
            AttributeType::Vec3,
            0,
            AttributeData::TypedArray(Vec::new()),
        );
        attribute.quantization = Some(Quantization {
            mode: QuantizationMode::OctEncoded,
            normalization_range: Value::Scalar(255.0),
            component_datatype: ComponentDatatype::U8,
            storage_type: AttributeType::Vec3,
        });
        assert!(matches!(
            attribute.validate("Primitive.attributes"),
            Err(ModelError::ShapeMismatch { field: "quantization storage", .. })
        ));
    }

    #[test]
    fn integer_elements_read_raw() {
        let attribute = Attribute::new(
            AttributeSemantic::FeatureId(0),
            ComponentDatatype::U16,
            AttributeType::Scalar,
            3,
            AttributeData::TypedArray(vec![7, 0, 8, 0, 9, 0]),
        );
        assert_eq!(attribute.integer_at(0), Ok(7));
        assert_eq!(attribute.integer_at(2), Ok(9));
    }

    #[test]
    fn integer_elements_accept_whole_floats_only() {
        let attribute = Attribute::new(
            AttributeSemantic::FeatureId(0),
            ComponentDatatype::F32,
            AttributeType::Scalar,
            2,
            AttributeData::TypedArray(f32_bytes(&[10.0, 10.5])),
        );
        assert_eq!(attribute.integer_at(0), Ok(10));
        assert_eq!(
            attribute.integer_at(1),
            Err(ModelError::NonIntegralFeatureId {
                semantic: AttributeSemantic::FeatureId(0),
                index: 1,
            })
        );
    }

    #[test]
    fn negative_integers_are_rejected() {
        let attribute = Attribute::new(
            AttributeSemantic::FeatureId(1),
            ComponentDatatype::I8,
            AttributeType::Scalar,
            1,
            AttributeData::TypedArray(vec![(-3i8) as u8]),
        );
        assert_eq!(
            attribute.integer_at(0),
            Err(ModelError::NegativeFeatureId {
                semantic: AttributeSemantic::FeatureId(1),
                index: 0,
                value: -3,
            })
        );
    }
}
