use glam::{Vec2, Vec3};

fn sign_not_zero(value: f32) -> f32 {
    if value < 0.0 {
        -1.0
    } else {
        1.0
    }
}

fn from_snorm(value: f32, range: f32) -> f32 {
    (value.clamp(0.0, range) / range) * 2.0 - 1.0
}

fn to_snorm(value: f32, range: f32) -> f32 {
    ((value.clamp(-1.0, 1.0) * 0.5 + 0.5) * range).round()
}

/// Decodes an octahedron-packed unit vector. Both stored components lie
/// in [0, range]. The result is normalized.
pub fn oct_decode(encoded: Vec2, range: f32) -> Vec3 {
    let mut x = from_snorm(encoded.x, range);
    let mut y = from_snorm(encoded.y, range);
    let z = 1.0 - (x.abs() + y.abs());
    if z < 0.0 {
        let old_x = x;
        x = (1.0 - y.abs()) * sign_not_zero(old_x);
        y = (1.0 - old_x.abs()) * sign_not_zero(y);
    }
    Vec3::new(x, y, z).normalize()
}

/// Packs a unit vector onto an octahedron, storing two components in
/// [0, range]. `vector` must already be normalized.
pub fn oct_encode(vector: Vec3, range: f32) -> Vec2 {
    let scale = 1.0 / (vector.x.abs() + vector.y.abs() + vector.z.abs());
    let mut x = vector.x * scale;
    let mut y = vector.y * scale;
    if vector.z < 0.0 {
        let old_x = x;
        x = (1.0 - y.abs()) * sign_not_zero(old_x);
        y = (1.0 - old_x.abs()) * sign_not_zero(y);
    }
    Vec2::new(to_snorm(x, range), to_snorm(y, range))
}
