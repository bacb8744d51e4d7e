//! Fixed-size geometry primitives shared by the timestamped variants.
//!
//! Each type is a plain data holder with a `write`/`read` pair operating
//! directly on a `bytes::Buf`/`BufMut` — the same discipline `FrameHeader`
//! uses for its individual fields, just applied to small vector types
//! instead of one packed header.

use bytes::{Buf, BufMut};

use crate::half_float;

/// A full-precision 3D position or scale, encoded as 3 big-endian `f32`s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loc1 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
}

impl Loc1 {
    /// Wire size in bytes.
    pub const WIRE_SIZE: usize = 12;

    pub(crate) fn write(self, dst: &mut impl BufMut) {
        dst.put_f32(self.x);
        dst.put_f32(self.y);
        dst.put_f32(self.z);
    }

    pub(crate) fn read(src: &mut impl Buf) -> Self {
        Self {
            x: src.get_f32(),
            y: src.get_f32(),
            z: src.get_f32(),
        }
    }
}

/// A full-precision orientation, encoded as 3 big-endian `f32`s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rot1 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Rot1 {
    /// Wire size in bytes.
    pub const WIRE_SIZE: usize = 12;

    pub(crate) fn write(self, dst: &mut impl BufMut) {
        dst.put_f32(self.x);
        dst.put_f32(self.y);
        dst.put_f32(self.z);
    }

    pub(crate) fn read(src: &mut impl Buf) -> Self {
        Self {
            x: src.get_f32(),
            y: src.get_f32(),
            z: src.get_f32(),
        }
    }
}

/// A position and its linear velocity, each component half-precision on the
/// wire (6 `f16`s) but held as `f32` in memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Loc2 {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
    /// Z coordinate.
    pub z: f32,
    /// X velocity.
    pub vx: f32,
    /// Y velocity.
    pub vy: f32,
    /// Z velocity.
    pub vz: f32,
}

impl Loc2 {
    /// Wire size in bytes.
    pub const WIRE_SIZE: usize = 12;

    pub(crate) fn write(self, dst: &mut impl BufMut) {
        for component in [self.x, self.y, self.z, self.vx, self.vy, self.vz] {
            dst.put_u16(half_float::f32_to_bits(component));
        }
    }

    pub(crate) fn read(src: &mut impl Buf) -> Self {
        let mut c = [0.0f32; 6];
        for slot in &mut c {
            *slot = half_float::bits_to_f32(src.get_u16());
        }
        Self {
            x: c[0],
            y: c[1],
            z: c[2],
            vx: c[3],
            vy: c[4],
            vz: c[5],
        }
    }
}

/// An orientation and its angular velocity, each component half-precision
/// on the wire (6 `f16`s) but held as `f32` in memory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rot2 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
    /// X angular velocity.
    pub vx: f32,
    /// Y angular velocity.
    pub vy: f32,
    /// Z angular velocity.
    pub vz: f32,
}

impl Rot2 {
    /// Wire size in bytes.
    pub const WIRE_SIZE: usize = 12;

    pub(crate) fn write(self, dst: &mut impl BufMut) {
        for component in [self.x, self.y, self.z, self.vx, self.vy, self.vz] {
            dst.put_u16(half_float::f32_to_bits(component));
        }
    }

    pub(crate) fn read(src: &mut impl Buf) -> Self {
        let mut c = [0.0f32; 6];
        for slot in &mut c {
            *slot = half_float::bits_to_f32(src.get_u16());
        }
        Self {
            x: c[0],
            y: c[1],
            z: c[2],
            vx: c[3],
            vy: c[4],
            vz: c[5],
        }
    }
}

/// A full-precision joint pose: one [`Loc1`] and one [`Rot1`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform1 {
    /// Joint position.
    pub loc: Loc1,
    /// Joint orientation.
    pub rot: Rot1,
}

impl Transform1 {
    /// Wire size in bytes.
    pub const WIRE_SIZE: usize = Loc1::WIRE_SIZE + Rot1::WIRE_SIZE;

    pub(crate) fn write(self, dst: &mut impl BufMut) {
        self.loc.write(dst);
        self.rot.write(dst);
    }

    pub(crate) fn read(src: &mut impl Buf) -> Self {
        Self {
            loc: Loc1::read(src),
            rot: Rot1::read(src),
        }
    }
}

/// A mesh vertex normal, encoded identically to [`Loc1`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Norm1 {
    /// X component.
    pub x: f32,
    /// Y component.
    pub y: f32,
    /// Z component.
    pub z: f32,
}

impl Norm1 {
    /// Wire size in bytes.
    pub const WIRE_SIZE: usize = 12;

    pub(crate) fn write(self, dst: &mut impl BufMut) {
        dst.put_f32(self.x);
        dst.put_f32(self.y);
        dst.put_f32(self.z);
    }

    pub(crate) fn read(src: &mut impl Buf) -> Self {
        Self {
            x: src.get_f32(),
            y: src.get_f32(),
            z: src.get_f32(),
        }
    }
}

/// A mesh texture coordinate pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextureUV1 {
    /// U coordinate.
    pub u: f32,
    /// V coordinate.
    pub v: f32,
}

impl TextureUV1 {
    /// Wire size in bytes.
    pub const WIRE_SIZE: usize = 8;

    pub(crate) fn write(self, dst: &mut impl BufMut) {
        dst.put_f32(self.u);
        dst.put_f32(self.v);
    }

    pub(crate) fn read(src: &mut impl Buf) -> Self {
        Self {
            u: src.get_f32(),
            v: src.get_f32(),
        }
    }
}
