//! Named-parameter uniform layouts.
//!
//! A program's uniform block is described once as an ordered list of members.
//! Offsets follow WGSL uniform address-space rules so the CPU staging bytes match
//! the shader's struct exactly:
//! - scalars align to 4, `vec2` to 8, `vec3`/`vec4`/`mat4` to 16
//! - arrays and structs inside arrays align to 16 and stride to a multiple of 16
//!
//! Parameters are looked up with GL-style names: `projection`, `samples[12]`,
//! `lights[3].Position`.

use std::collections::HashMap;

use glam::{Mat4, Vec2, Vec3, Vec4};

/// Type of a single uniform parameter.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformKind {
    Float,
    Int,
    Vec2,
    Vec3,
    Vec4,
    Mat4,
}

impl UniformKind {
    pub const fn size(self) -> u32 {
        match self {
            UniformKind::Float | UniformKind::Int => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 => 12,
            UniformKind::Vec4 => 16,
            UniformKind::Mat4 => 64,
        }
    }

    pub const fn align(self) -> u32 {
        match self {
            UniformKind::Float | UniformKind::Int => 4,
            UniformKind::Vec2 => 8,
            UniformKind::Vec3 | UniformKind::Vec4 | UniformKind::Mat4 => 16,
        }
    }
}

/// Value bound to a named parameter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum UniformValue {
    Float(f32),
    Int(i32),
    Vec2(Vec2),
    Vec3(Vec3),
    Vec4(Vec4),
    Mat4(Mat4),
}

impl UniformValue {
    pub fn kind(&self) -> UniformKind {
        match self {
            UniformValue::Float(_) => UniformKind::Float,
            UniformValue::Int(_) => UniformKind::Int,
            UniformValue::Vec2(_) => UniformKind::Vec2,
            UniformValue::Vec3(_) => UniformKind::Vec3,
            UniformValue::Vec4(_) => UniformKind::Vec4,
            UniformValue::Mat4(_) => UniformKind::Mat4,
        }
    }

    fn write(&self, out: &mut [u8]) {
        match self {
            UniformValue::Float(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Int(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec2(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec3(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Vec4(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
            UniformValue::Mat4(v) => out.copy_from_slice(bytemuck::bytes_of(v)),
        }
    }
}

impl From<f32> for UniformValue {
    fn from(v: f32) -> Self {
        UniformValue::Float(v)
    }
}

impl From<i32> for UniformValue {
    fn from(v: i32) -> Self {
        UniformValue::Int(v)
    }
}

impl From<bool> for UniformValue {
    fn from(v: bool) -> Self {
        UniformValue::Int(v as i32)
    }
}

impl From<Vec2> for UniformValue {
    fn from(v: Vec2) -> Self {
        UniformValue::Vec2(v)
    }
}

impl From<Vec3> for UniformValue {
    fn from(v: Vec3) -> Self {
        UniformValue::Vec3(v)
    }
}

impl From<Vec4> for UniformValue {
    fn from(v: Vec4) -> Self {
        UniformValue::Vec4(v)
    }
}

impl From<Mat4> for UniformValue {
    fn from(v: Mat4) -> Self {
        UniformValue::Mat4(v)
    }
}

/// Resolved location of one named parameter.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct UniformSlot {
    pub offset: u32,
    pub kind: UniformKind,
}

/// Name → offset table for one program's uniform block.
#[derive(Debug, Clone, Default)]
pub struct UniformLayout {
    slots: HashMap<String, UniformSlot>,
    size: u32,
}

#[inline]
fn round_up(align: u32, n: u32) -> u32 {
    n.div_ceil(align) * align
}

impl UniformLayout {
    pub fn builder() -> UniformLayoutBuilder {
        UniformLayoutBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<UniformSlot> {
        self.slots.get(name).copied()
    }

    /// Size of the staging block in bytes. Always a non-zero multiple of 16.
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }
}

/// Members of a struct used as an array element.
#[derive(Debug, Default)]
pub struct StructBuilder {
    members: Vec<(String, UniformKind)>,
}

impl StructBuilder {
    pub fn member(&mut self, name: &str, kind: UniformKind) -> &mut Self {
        self.members.push((name.to_string(), kind));
        self
    }

    /// Returns `(member offsets, struct alignment, struct size)`.
    fn layout(&self) -> (Vec<(String, UniformSlot)>, u32, u32) {
        let mut cursor = 0;
        let mut align = 4;
        let mut out = Vec::with_capacity(self.members.len());
        for (name, kind) in &self.members {
            let offset = round_up(kind.align(), cursor);
            out.push((name.clone(), UniformSlot { offset, kind: *kind }));
            cursor = offset + kind.size();
            align = align.max(kind.align());
        }
        (out, align, round_up(align, cursor))
    }
}

#[derive(Debug, Default)]
pub struct UniformLayoutBuilder {
    slots: HashMap<String, UniformSlot>,
    cursor: u32,
}

impl UniformLayoutBuilder {
    fn insert(&mut self, name: String, slot: UniformSlot) {
        if self.slots.insert(name.clone(), slot).is_some() {
            log::warn!("uniform `{name}` declared twice; last declaration wins");
        }
    }

    pub fn field(mut self, name: &str, kind: UniformKind) -> Self {
        let offset = round_up(kind.align(), self.cursor);
        self.insert(name.to_string(), UniformSlot { offset, kind });
        self.cursor = offset + kind.size();
        self
    }

    pub fn float(self, name: &str) -> Self {
        self.field(name, UniformKind::Float)
    }

    pub fn int(self, name: &str) -> Self {
        self.field(name, UniformKind::Int)
    }

    pub fn vec2(self, name: &str) -> Self {
        self.field(name, UniformKind::Vec2)
    }

    pub fn vec3(self, name: &str) -> Self {
        self.field(name, UniformKind::Vec3)
    }

    pub fn vec4(self, name: &str) -> Self {
        self.field(name, UniformKind::Vec4)
    }

    pub fn mat4(self, name: &str) -> Self {
        self.field(name, UniformKind::Mat4)
    }

    /// `array<kind, count>` addressed as `name[i]`.
    pub fn array(mut self, name: &str, count: u32, kind: UniformKind) -> Self {
        let stride = round_up(16, round_up(kind.align(), kind.size()));
        let base = round_up(16, self.cursor);
        for i in 0..count {
            self.insert(
                format!("{name}[{i}]"),
                UniformSlot {
                    offset: base + i * stride,
                    kind,
                },
            );
        }
        self.cursor = base + count * stride;
        self
    }

    /// `array<Struct, count>` addressed as `name[i].member`.
    pub fn struct_array(
        mut self,
        name: &str,
        count: u32,
        members: impl FnOnce(&mut StructBuilder),
    ) -> Self {
        let mut sb = StructBuilder::default();
        members(&mut sb);
        let (fields, align, size) = sb.layout();
        let stride = round_up(16, round_up(align, size));
        let base = round_up(16, self.cursor);
        for i in 0..count {
            for (member, slot) in &fields {
                self.insert(
                    format!("{name}[{i}].{member}"),
                    UniformSlot {
                        offset: base + i * stride + slot.offset,
                        kind: slot.kind,
                    },
                );
            }
        }
        self.cursor = base + count * stride;
        self
    }

    pub fn build(self) -> UniformLayout {
        UniformLayout {
            slots: self.slots,
            size: round_up(16, self.cursor).max(16),
        }
    }
}

/// Outcome of writing a named parameter.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum UniformWrite {
    Written,
    UnknownName,
    KindMismatch { expected: UniformKind },
}

/// CPU staging bytes for one program, persistent between draws.
#[derive(Debug, Clone)]
pub struct UniformBlock {
    layout: UniformLayout,
    bytes: Vec<u8>,
}

impl UniformBlock {
    pub fn new(layout: UniformLayout) -> Self {
        let bytes = vec![0u8; layout.size() as usize];
        Self { layout, bytes }
    }

    pub fn layout(&self) -> &UniformLayout {
        &self.layout
    }

    /// Writes `value` at `name`'s offset.
    ///
    /// `Int` values are promoted when written to a `Float` slot. Unknown names
    /// leave the block untouched.
    pub fn set(&mut self, name: &str, value: UniformValue) -> UniformWrite {
        let Some(slot) = self.layout.get(name) else {
            return UniformWrite::UnknownName;
        };

        let value = match (slot.kind, value) {
            (UniformKind::Float, UniformValue::Int(i)) => UniformValue::Float(i as f32),
            _ => value,
        };

        if value.kind() != slot.kind {
            return UniformWrite::KindMismatch { expected: slot.kind };
        }

        let start = slot.offset as usize;
        let end = start + slot.kind.size() as usize;
        value.write(&mut self.bytes[start..end]);
        UniformWrite::Written
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn read_f32(&self, offset: u32) -> f32 {
        let o = offset as usize;
        bytemuck::pod_read_unaligned(&self.bytes[o..o + 4])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── offsets ───────────────────────────────────────────────────────────

    #[test]
    fn scalar_after_vec3_packs_into_padding() {
        let l = UniformLayout::builder().vec3("viewPos").int("lightCount").build();
        assert_eq!(l.get("viewPos").unwrap().offset, 0);
        assert_eq!(l.get("lightCount").unwrap().offset, 12);
        assert_eq!(l.size(), 16);
    }

    #[test]
    fn ssao_block_matches_wgsl_layout() {
        let l = UniformLayout::builder()
            .mat4("projection")
            .mat4("view")
            .array("samples", 64, UniformKind::Vec3)
            .vec2("noiseScale")
            .float("radius")
            .float("bias")
            .build();

        assert_eq!(l.get("view").unwrap().offset, 64);
        assert_eq!(l.get("samples[0]").unwrap().offset, 128);
        assert_eq!(l.get("samples[1]").unwrap().offset, 144);
        assert_eq!(l.get("samples[63]").unwrap().offset, 128 + 63 * 16);
        assert_eq!(l.get("noiseScale").unwrap().offset, 1152);
        assert_eq!(l.get("radius").unwrap().offset, 1160);
        assert_eq!(l.get("bias").unwrap().offset, 1164);
        assert_eq!(l.size(), 1168);
    }

    #[test]
    fn struct_array_member_offsets() {
        let l = UniformLayout::builder()
            .vec3("viewPos")
            .int("lightCount")
            .struct_array("lights", 4, |s| {
                s.member("Position", UniformKind::Vec3)
                    .member("Color", UniformKind::Vec3)
                    .member("Linear", UniformKind::Float)
                    .member("Quadratic", UniformKind::Float);
            })
            .build();

        // Light: Position 0, Color 16, Linear 28, Quadratic 32, size 48.
        assert_eq!(l.get("lights[0].Position").unwrap().offset, 16);
        assert_eq!(l.get("lights[0].Color").unwrap().offset, 32);
        assert_eq!(l.get("lights[0].Linear").unwrap().offset, 44);
        assert_eq!(l.get("lights[0].Quadratic").unwrap().offset, 48);
        assert_eq!(l.get("lights[1].Color").unwrap().offset, 16 + 48 + 16);
        assert_eq!(l.size(), 16 + 4 * 48);
    }

    #[test]
    fn empty_layout_still_has_storage() {
        assert_eq!(UniformLayout::builder().build().size(), 16);
    }

    // ── UniformBlock ──────────────────────────────────────────────────────

    #[test]
    fn set_writes_at_offset() {
        let mut b = UniformBlock::new(UniformLayout::builder().float("a").float("exposure").build());
        assert_eq!(b.set("exposure", 2.5f32.into()), UniformWrite::Written);
        assert_eq!(b.read_f32(4), 2.5);
        assert_eq!(b.read_f32(0), 0.0);
    }

    #[test]
    fn unknown_name_is_noop() {
        let mut b = UniformBlock::new(UniformLayout::builder().float("exposure").build());
        let before = b.bytes().to_vec();
        assert_eq!(b.set("nope", 1.0f32.into()), UniformWrite::UnknownName);
        assert_eq!(b.bytes(), &before[..]);
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let mut b = UniformBlock::new(UniformLayout::builder().mat4("view").build());
        assert_eq!(
            b.set("view", 1.0f32.into()),
            UniformWrite::KindMismatch {
                expected: UniformKind::Mat4
            }
        );
    }

    #[test]
    fn int_promotes_to_float_slot() {
        let mut b = UniformBlock::new(UniformLayout::builder().float("x").build());
        assert_eq!(b.set("x", 3i32.into()), UniformWrite::Written);
        assert_eq!(b.read_f32(0), 3.0);
    }
}
