//! In-memory component graph for loaded 3D models.
//!
//! This library provides a normalized, renderer-agnostic representation
//! of a model: a node hierarchy with primitives, materials, skins,
//! GPU instancing, morph targets and feature ID bindings into external
//! metadata. Format loaders populate the graph bottom-up and hand it to
//! consumers that upload buffers and issue draws without knowing the
//! source format. Attribute storage stays in its packed form, decode
//! happens per element on demand.
//!
pub mod attribute;
pub mod buffer;
/// Octahedral packing of unit vectors
pub mod compression;
pub mod error;
pub mod feature_id;
pub mod indices;
pub mod instances;
pub mod material;
pub mod model;
pub mod node;
pub mod primitive;
pub mod scene;
pub mod skin;
pub mod texture;
pub mod value;
