use bytemuck::pod_read_unaligned;
use glam::{Mat2, Mat3, Mat4, Vec2, Vec3, Vec4};

/// The logical shape of one attribute element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttributeType {
    Scalar,
    Vec2,
    Vec3,
    Vec4,
    Mat2,
    Mat3,
    Mat4,
}

impl AttributeType {
    pub fn component_count(self) -> usize {
        match self {
            AttributeType::Scalar => 1,
            AttributeType::Vec2 => 2,
            AttributeType::Vec3 => 3,
            AttributeType::Vec4 => 4,
            AttributeType::Mat2 => 4,
            AttributeType::Mat3 => 9,
            AttributeType::Mat4 => 16,
        }
    }
}

/// The storage type of a single component, as it sits in a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComponentDatatype {
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    F32,
    F64,
}

impl ComponentDatatype {
    pub fn size_in_bytes(self) -> usize {
        match self {
            ComponentDatatype::I8 | ComponentDatatype::U8 => 1,
            ComponentDatatype::I16 | ComponentDatatype::U16 => 2,
            ComponentDatatype::I32 | ComponentDatatype::U32 | ComponentDatatype::F32 => 4,
            ComponentDatatype::F64 => 8,
        }
    }

    pub fn is_integer(self) -> bool {
        !matches!(self, ComponentDatatype::F32 | ComponentDatatype::F64)
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ComponentDatatype::I8
                | ComponentDatatype::I16
                | ComponentDatatype::I32
                | ComponentDatatype::F32
                | ComponentDatatype::F64
        )
    }

    /// Reads one little-endian component. `bytes` must be exactly
    /// `size_in_bytes` long.
    pub(crate) fn read_f32(self, bytes: &[u8]) -> f32 {
        match self {
            ComponentDatatype::I8 => pod_read_unaligned::<i8>(bytes) as f32,
            ComponentDatatype::U8 => pod_read_unaligned::<u8>(bytes) as f32,
            ComponentDatatype::I16 => pod_read_unaligned::<i16>(bytes) as f32,
            ComponentDatatype::U16 => pod_read_unaligned::<u16>(bytes) as f32,
            ComponentDatatype::I32 => pod_read_unaligned::<i32>(bytes) as f32,
            ComponentDatatype::U32 => pod_read_unaligned::<u32>(bytes) as f32,
            ComponentDatatype::F32 => pod_read_unaligned::<f32>(bytes),
            ComponentDatatype::F64 => pod_read_unaligned::<f64>(bytes) as f32,
        }
    }

    /// Reads one component as an integer. Float components are accepted
    /// when they hold a whole finite value, otherwise `None`.
    pub(crate) fn read_integer(self, bytes: &[u8]) -> Option<i64> {
        match self {
            ComponentDatatype::I8 => Some(pod_read_unaligned::<i8>(bytes) as i64),
            ComponentDatatype::U8 => Some(pod_read_unaligned::<u8>(bytes) as i64),
            ComponentDatatype::I16 => Some(pod_read_unaligned::<i16>(bytes) as i64),
            ComponentDatatype::U16 => Some(pod_read_unaligned::<u16>(bytes) as i64),
            ComponentDatatype::I32 => Some(pod_read_unaligned::<i32>(bytes) as i64),
            ComponentDatatype::U32 => Some(pod_read_unaligned::<u32>(bytes) as i64),
            ComponentDatatype::F32 => integer_from_float(pod_read_unaligned::<f32>(bytes) as f64),
            ComponentDatatype::F64 => integer_from_float(pod_read_unaligned::<f64>(bytes)),
        }
    }

    /// Maps a raw integer component into [0, 1] (unsigned) or [-1, 1]
    /// (signed). Float components pass through unchanged.
    pub(crate) fn normalize(self, value: f32) -> f32 {
        let max = match self {
            ComponentDatatype::I8 => i8::MAX as f32,
            ComponentDatatype::U8 => u8::MAX as f32,
            ComponentDatatype::I16 => i16::MAX as f32,
            ComponentDatatype::U16 => u16::MAX as f32,
            ComponentDatatype::I32 => i32::MAX as f32,
            ComponentDatatype::U32 => u32::MAX as f32,
            ComponentDatatype::F32 | ComponentDatatype::F64 => return value,
        };
        if self.is_signed() {
            // The two's-complement minimum undershoots, clamp to -1.
            (value / max).max(-1.0)
        } else {
            value / max
        }
    }
}

pub(crate) fn integer_from_float(value: f64) -> Option<i64> {
    if value.is_finite() && value.fract() == 0.0 {
        Some(value as i64)
    } else {
        None
    }
}

/// A single value of any attribute shape. Used for constants, advisory
/// bounds, quantization volumes and decoded elements.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Scalar(f32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat2(Mat2),
    Mat3(Mat3),
    Mat4(Mat4),
}

impl Value {
    pub fn ty(&self) -> AttributeType {
        match self {
            Value::Scalar(_) => AttributeType::Scalar,
            Value::Vec2(_) => AttributeType::Vec2,
            Value::Vec3(_) => AttributeType::Vec3,
            Value::Vec4(_) => AttributeType::Vec4,
            Value::Mat2(_) => AttributeType::Mat2,
            Value::Mat3(_) => AttributeType::Mat3,
            Value::Mat4(_) => AttributeType::Mat4,
        }
    }

    pub fn zero(ty: AttributeType) -> Value {
        match ty {
            AttributeType::Scalar => Value::Scalar(0.0),
            AttributeType::Vec2 => Value::Vec2(Vec2::ZERO),
            AttributeType::Vec3 => Value::Vec3(Vec3::ZERO),
            AttributeType::Vec4 => Value::Vec4(Vec4::ZERO),
            AttributeType::Mat2 => Value::Mat2(Mat2::ZERO),
            AttributeType::Mat3 => Value::Mat3(Mat3::ZERO),
            AttributeType::Mat4 => Value::Mat4(Mat4::ZERO),
        }
    }

    pub fn component_count(&self) -> usize {
        self.ty().component_count()
    }

    /// Matrices are column-major, matching their buffer layout.
    pub fn from_components(ty: AttributeType, components: &[f32]) -> Value {
        match ty {
            AttributeType::Scalar => Value::Scalar(components[0]),
            AttributeType::Vec2 => Value::Vec2(Vec2::from_slice(components)),
            AttributeType::Vec3 => Value::Vec3(Vec3::from_slice(components)),
            AttributeType::Vec4 => Value::Vec4(Vec4::from_slice(components)),
            AttributeType::Mat2 => Value::Mat2(Mat2::from_cols_slice(components)),
            AttributeType::Mat3 => Value::Mat3(Mat3::from_cols_slice(components)),
            AttributeType::Mat4 => Value::Mat4(Mat4::from_cols_slice(components)),
        }
    }

    pub fn to_components(&self) -> ([f32; 16], usize) {
        let mut components = [0.0; 16];
        match self {
            Value::Scalar(value) => components[0] = *value,
            Value::Vec2(value) => value.write_to_slice(&mut components[..2]),
            Value::Vec3(value) => value.write_to_slice(&mut components[..3]),
            Value::Vec4(value) => value.write_to_slice(&mut components[..4]),
            Value::Mat2(value) => value.write_cols_to_slice(&mut components[..4]),
            Value::Mat3(value) => value.write_cols_to_slice(&mut components[..9]),
            Value::Mat4(value) => value.write_cols_to_slice(&mut components[..16]),
        }
        (components, self.component_count())
    }

    pub fn map(&self, f: impl Fn(f32) -> f32) -> Value {
        let (mut components, count) = self.to_components();
        for component in &mut components[..count] {
            *component = f(*component);
        }
        Value::from_components(self.ty(), &components[..count])
    }

    /// Componentwise combination. Scalars broadcast against any shape;
    /// otherwise the shapes must match. `None` when they don't.
    pub fn zip(&self, other: &Value, f: impl Fn(f32, f32) -> f32) -> Option<Value> {
        let (lhs, lhs_count) = self.to_components();
        let (rhs, rhs_count) = other.to_components();
        let (ty, count) = if self.ty() == other.ty() {
            (self.ty(), lhs_count)
        } else if other.ty() == AttributeType::Scalar {
            (self.ty(), lhs_count)
        } else if self.ty() == AttributeType::Scalar {
            (other.ty(), rhs_count)
        } else {
            return None;
        };
        let mut components = [0.0; 16];
        for (index, component) in components[..count].iter_mut().enumerate() {
            let a = if self.ty() == AttributeType::Scalar {
                lhs[0]
            } else {
                lhs[index]
            };
            let b = if other.ty() == AttributeType::Scalar {
                rhs[0]
            } else {
                rhs[index]
            };
            *component = f(a, b);
        }
        Some(Value::from_components(ty, &components[..count]))
    }
}

#[cfg(test)]
mod test {
    use glam::{Vec2, Vec3};

    use super::{AttributeType, ComponentDatatype, Value};

    #[test]
    fn component_sizes() {
        assert_eq!(ComponentDatatype::U8.size_in_bytes(), 1);
        assert_eq!(ComponentDatatype::I16.size_in_bytes(), 2);
        assert_eq!(ComponentDatatype::F32.size_in_bytes(), 4);
        assert_eq!(ComponentDatatype::F64.size_in_bytes(), 8);
        assert_eq!(AttributeType::Mat3.component_count(), 9);
    }

    #[test]
    fn component_classification() {
        assert!(ComponentDatatype::I16.is_signed());
        assert!(ComponentDatatype::F64.is_signed());
        assert!(!ComponentDatatype::U32.is_signed());
        assert!(ComponentDatatype::U8.is_integer());
        assert!(!ComponentDatatype::F32.is_integer());
    }

    #[test]
    fn zero_carries_the_requested_shape() {
        assert_eq!(Value::zero(AttributeType::Scalar), Value::Scalar(0.0));
        assert_eq!(Value::zero(AttributeType::Vec3), Value::Vec3(Vec3::ZERO));
        assert_eq!(Value::zero(AttributeType::Mat4).ty(), AttributeType::Mat4);
    }

    #[test]
    fn read_little_endian_components() {
        let bytes = 513u16.to_le_bytes();
        assert_eq!(ComponentDatatype::U16.read_f32(&bytes), 513.0);
        let bytes = (-2i8 as u8).to_le_bytes();
        assert_eq!(ComponentDatatype::I8.read_f32(&bytes), -2.0);
        let bytes = 1.5f32.to_le_bytes();
        assert_eq!(ComponentDatatype::F32.read_f32(&bytes), 1.5);
    }

    #[test]
    fn read_integer_rejects_fractional_floats() {
        let bytes = 7.0f32.to_le_bytes();
        assert_eq!(ComponentDatatype::F32.read_integer(&bytes), Some(7));
        let bytes = 7.25f32.to_le_bytes();
        assert_eq!(ComponentDatatype::F32.read_integer(&bytes), None);
        let bytes = (-3i16).to_le_bytes();
        assert_eq!(ComponentDatatype::I16.read_integer(&bytes), Some(-3));
    }

    #[test]
    fn normalize_unsigned_and_signed() {
        assert_eq!(ComponentDatatype::U8.normalize(255.0), 1.0);
        assert_eq!(ComponentDatatype::U8.normalize(0.0), 0.0);
        assert_eq!(ComponentDatatype::I8.normalize(127.0), 1.0);
        assert_eq!(ComponentDatatype::I8.normalize(-128.0), -1.0);
        assert_eq!(ComponentDatatype::I16.normalize(-32768.0), -1.0);
    }

    #[test]
    fn component_round_trip() {
        let value = Value::Vec3(Vec3::new(1.0, 2.0, 3.0));
        let (components, count) = value.to_components();
        assert_eq!(count, 3);
        assert_eq!(Value::from_components(AttributeType::Vec3, &components[..count]), value);
    }

    #[test]
    fn zip_matching_shapes() {
        let a = Value::Vec2(Vec2::new(1.0, 2.0));
        let b = Value::Vec2(Vec2::new(10.0, 20.0));
        assert_eq!(
            a.zip(&b, |a, b| a + b),
            Some(Value::Vec2(Vec2::new(11.0, 22.0)))
        );
    }

    #[test]
    fn zip_broadcasts_scalars() {
        let a = Value::Vec3(Vec3::new(2.0, 4.0, 8.0));
        let b = Value::Scalar(2.0);
        assert_eq!(
            a.zip(&b, |a, b| a / b),
            Some(Value::Vec3(Vec3::new(1.0, 2.0, 4.0)))
        );
        assert_eq!(
            b.zip(&a, |a, b| a * b),
            Some(Value::Vec3(Vec3::new(4.0, 8.0, 16.0)))
        );
    }

    #[test]
    fn zip_rejects_mismatched_shapes() {
        let a = Value::Vec2(Vec2::ONE);
        let b = Value::Vec3(Vec3::ONE);
        assert_eq!(a.zip(&b, |a, _| a), None);
    }
}
