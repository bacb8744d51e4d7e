//! The `GSObject` tagged union and its identity/tag types.
//!
//! A closed sum type with one variant per recognized wire tag, plus
//! `UnknownObject` as the catch-all for anything the decoder doesn't
//! recognize. Each variant is a flat data holder — no raw overlapping-field
//! storage — in the same spirit as `Frame`/`Payload` in the teacher's proto
//! crate, including their practice of giving every closed-sum variant a
//! doc comment naming its fields' meaning rather than just its shape.

use bytes::Bytes;

use crate::geometry::{Loc1, Loc2, Norm1, Rot1, Rot2, TextureUV1, Transform1};
use crate::timestamp::DateTimeMs;

/// Routing identity for a synchronized object. Equality-only: two messages
/// are the same object iff their IDs are equal. Not a sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

/// The wire tag of a [`GSObject`] variant. Values `1..=6` are recognized;
/// `0x20` and above (that aren't one of the recognized six) fall back to
/// [`GSObject::UnknownObject`].
pub type Tag = u64;

/// Wire tag for [`GSObject::Head1`].
pub const TAG_HEAD1: Tag = 1;
/// Wire tag for [`GSObject::Hand1`].
pub const TAG_HAND1: Tag = 2;
/// Wire tag for [`GSObject::Object1`].
pub const TAG_OBJECT1: Tag = 3;
/// Wire tag for [`GSObject::Mesh1`].
pub const TAG_MESH1: Tag = 4;
/// Wire tag for [`GSObject::Hand2`].
pub const TAG_HAND2: Tag = 5;
/// Wire tag for [`GSObject::HeadIPD1`].
pub const TAG_HEAD_IPD1: Tag = 6;
/// First tag value eligible for [`GSObject::UnknownObject`] treatment.
pub const TAG_UNKNOWN_FLOOR: Tag = 0x20;

/// A head pose update, optionally carrying interpupillary distance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Head1 {
    /// Object identity.
    pub id: ObjectId,
    /// Full reconstructed timestamp.
    pub time: DateTimeMs,
    /// Head position and linear velocity.
    pub loc: Loc2,
    /// Head orientation and angular velocity.
    pub rot: Rot2,
    /// Interpupillary distance in meters, if reported.
    pub ipd: Option<f32>,
}

/// A single-hand pose update.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hand1 {
    /// Object identity.
    pub id: ObjectId,
    /// Full reconstructed timestamp.
    pub time: DateTimeMs,
    /// `true` for the left hand, `false` for the right.
    pub left: bool,
    /// Hand position and linear velocity.
    pub loc: Loc2,
    /// Hand orientation and angular velocity.
    pub rot: Rot2,
}

/// A generic full-precision object update (position, orientation, scale),
/// optionally attached to a parent object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Object1 {
    /// Object identity.
    pub id: ObjectId,
    /// Full reconstructed timestamp.
    pub time: DateTimeMs,
    /// World-space position.
    pub loc: Loc1,
    /// World-space orientation.
    pub rot: Rot1,
    /// Per-axis scale.
    pub scale: Loc1,
    /// Parent object identity, if attached.
    pub parent: Option<ObjectId>,
}

/// A static mesh definition: vertices, normals, texture coordinates, and
/// triangle indices. Carries no timestamp — mesh geometry is not a pose
/// reconciled over time, only ever replaced wholesale.
#[derive(Debug, Clone, PartialEq)]
pub struct Mesh1 {
    /// Object identity.
    pub id: ObjectId,
    /// Vertex positions.
    pub vertices: Vec<Loc1>,
    /// Per-vertex normals.
    pub normals: Vec<Norm1>,
    /// Per-vertex texture coordinates.
    pub textures: Vec<TextureUV1>,
    /// Flattened triangle vertex indices (length a multiple of 3).
    pub triangles: Vec<u64>,
}

/// A full-hand skeletal pose: wrist, thumb, and four fingers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hand2 {
    /// Object identity.
    pub id: ObjectId,
    /// Full reconstructed timestamp.
    pub time: DateTimeMs,
    /// `true` for the left hand, `false` for the right.
    pub left: bool,
    /// Hand position and linear velocity.
    pub loc: Loc2,
    /// Hand orientation and angular velocity.
    pub rot: Rot2,
    /// Wrist joint pose.
    pub wrist: Transform1,
    /// Thumb joint poses, root to tip.
    pub thumb: [Transform1; 4],
    /// The four non-thumb fingers' joint poses, root to tip, index to
    /// pinky.
    pub fingers: [[Transform1; 5]; 4],
}

/// A standalone interpupillary-distance update. Carries no timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadIPD1 {
    /// Object identity.
    pub id: ObjectId,
    /// Interpupillary distance in meters.
    pub ipd: f32,
}

/// An unrecognized tag (`>= 0x20`, not one of the six known variants),
/// preserved as an opaque body for bit-exact round-tripping.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownObject {
    /// The tag as read from the wire.
    pub tag: Tag,
    /// The object's raw, unparsed body.
    pub bytes: Bytes,
}

/// The closed tagged union of all object variants this protocol version
/// understands, plus the unknown-tag catch-all.
#[derive(Debug, Clone, PartialEq)]
pub enum GSObject {
    /// See [`Head1`].
    Head1(Head1),
    /// See [`Hand1`].
    Hand1(Hand1),
    /// See [`Object1`].
    Object1(Object1),
    /// See [`Mesh1`].
    Mesh1(Mesh1),
    /// See [`Hand2`].
    Hand2(Hand2),
    /// See [`HeadIPD1`].
    HeadIPD1(HeadIPD1),
    /// See [`UnknownObject`].
    UnknownObject(UnknownObject),
}

impl GSObject {
    /// This object's routing identity.
    #[must_use]
    pub fn id(&self) -> Option<ObjectId> {
        match self {
            Self::Head1(v) => Some(v.id),
            Self::Hand1(v) => Some(v.id),
            Self::Object1(v) => Some(v.id),
            Self::Mesh1(v) => Some(v.id),
            Self::Hand2(v) => Some(v.id),
            Self::HeadIPD1(v) => Some(v.id),
            Self::UnknownObject(_) => None,
        }
    }

    /// The message-carried timestamp, for variants that have one.
    #[must_use]
    pub fn timestamp(&self) -> Option<DateTimeMs> {
        match self {
            Self::Head1(v) => Some(v.time),
            Self::Hand1(v) => Some(v.time),
            Self::Object1(v) => Some(v.time),
            Self::Hand2(v) => Some(v.time),
            Self::Mesh1(_) | Self::HeadIPD1(_) | Self::UnknownObject(_) => None,
        }
    }

    /// The wire tag this value encodes under.
    #[must_use]
    pub fn tag(&self) -> Tag {
        match self {
            Self::Head1(_) => TAG_HEAD1,
            Self::Hand1(_) => TAG_HAND1,
            Self::Object1(_) => TAG_OBJECT1,
            Self::Mesh1(_) => TAG_MESH1,
            Self::Hand2(_) => TAG_HAND2,
            Self::HeadIPD1(_) => TAG_HEAD_IPD1,
            Self::UnknownObject(v) => v.tag,
        }
    }
}
