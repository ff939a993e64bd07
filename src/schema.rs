use crate::error::{Result, StateError};
use crate::mask::MASK_BITS;
use crate::snapshot::{ReplicatedState, Snapshot};
use ahash::AHashMap;
use std::sync::OnceLock;

pub type FieldIndex = u32;

pub const FIELD_POS_X: FieldIndex = 0;
pub const FIELD_POS_Y: FieldIndex = 1;
pub const FIELD_POS_Z: FieldIndex = 2;
pub const FIELD_ROTA_X: FieldIndex = 3;
pub const FIELD_ROTA_Y: FieldIndex = 4;
pub const FIELD_ROTA_Z: FieldIndex = 5;
pub const FIELD_PARAM1: FieldIndex = 6;
pub const FIELD_PARAM2: FieldIndex = 7;
pub const FIELD_EVENTS: FieldIndex = 8;
/// Never registered; a set bit here is treated as an unknown field.
pub const FIELD_RESERVED: FieldIndex = 9;
/// First index entity kinds may register their own fields at.
pub const FIELD_EXTENSION_START: FieldIndex = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// IEEE-754 single precision, 4 bytes, compared with tolerance.
    Float32,
    /// Raw 64-bit pattern, 8 bytes, compared bit for bit.
    Raw64,
    /// Length-prefixed blob, compared byte for byte.
    Bytes,
}

impl FieldKind {
    /// Encoded width, or `None` for length-prefixed values.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            FieldKind::Float32 => Some(4),
            FieldKind::Raw64 => Some(8),
            FieldKind::Bytes => None,
        }
    }
}

/// Typed accessor pair for one field. The variant decides both the wire
/// encoding and the equality rule.
pub enum FieldAccess<S> {
    Float32 {
        get: fn(&S) -> f32,
        set: fn(&mut S, f32),
    },
    Raw64 {
        get: fn(&S) -> u64,
        set: fn(&mut S, u64),
    },
    Bytes {
        get: for<'a> fn(&'a S) -> &'a [u8],
        set: fn(&mut S, Vec<u8>),
    },
}

impl<S> Clone for FieldAccess<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for FieldAccess<S> {}

pub struct FieldDef<S> {
    pub index: FieldIndex,
    pub name: &'static str,
    pub access: FieldAccess<S>,
}

impl<S> Clone for FieldDef<S> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<S> Copy for FieldDef<S> {}

impl<S> FieldDef<S> {
    pub fn float32(index: FieldIndex, name: &'static str, get: fn(&S) -> f32, set: fn(&mut S, f32)) -> Self {
        Self {
            index,
            name,
            access: FieldAccess::Float32 { get, set },
        }
    }

    pub fn raw64(index: FieldIndex, name: &'static str, get: fn(&S) -> u64, set: fn(&mut S, u64)) -> Self {
        Self {
            index,
            name,
            access: FieldAccess::Raw64 { get, set },
        }
    }

    pub fn bytes(
        index: FieldIndex,
        name: &'static str,
        get: for<'a> fn(&'a S) -> &'a [u8],
        set: fn(&mut S, Vec<u8>),
    ) -> Self {
        Self {
            index,
            name,
            access: FieldAccess::Bytes { get, set },
        }
    }

    pub fn kind(&self) -> FieldKind {
        match self.access {
            FieldAccess::Float32 { .. } => FieldKind::Float32,
            FieldAccess::Raw64 { .. } => FieldKind::Raw64,
            FieldAccess::Bytes { .. } => FieldKind::Bytes,
        }
    }
}

impl<S> std::fmt::Debug for FieldDef<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FieldDef")
            .field("index", &self.index)
            .field("name", &self.name)
            .field("kind", &self.kind())
            .finish()
    }
}

// Base accessors write straight into the snapshot so that decoding does not
// raise the modify flag.

fn pos_x<S: ReplicatedState>(s: &S) -> f32 {
    s.snapshot().position.x
}
fn set_pos_x<S: ReplicatedState>(s: &mut S, v: f32) {
    s.snapshot_mut().position.x = v;
}
fn pos_y<S: ReplicatedState>(s: &S) -> f32 {
    s.snapshot().position.y
}
fn set_pos_y<S: ReplicatedState>(s: &mut S, v: f32) {
    s.snapshot_mut().position.y = v;
}
fn pos_z<S: ReplicatedState>(s: &S) -> f32 {
    s.snapshot().position.z
}
fn set_pos_z<S: ReplicatedState>(s: &mut S, v: f32) {
    s.snapshot_mut().position.z = v;
}
fn rota_x<S: ReplicatedState>(s: &S) -> f32 {
    s.snapshot().rotation.x
}
fn set_rota_x<S: ReplicatedState>(s: &mut S, v: f32) {
    s.snapshot_mut().rotation.x = v;
}
fn rota_y<S: ReplicatedState>(s: &S) -> f32 {
    s.snapshot().rotation.y
}
fn set_rota_y<S: ReplicatedState>(s: &mut S, v: f32) {
    s.snapshot_mut().rotation.y = v;
}
fn rota_z<S: ReplicatedState>(s: &S) -> f32 {
    s.snapshot().rotation.z
}
fn set_rota_z<S: ReplicatedState>(s: &mut S, v: f32) {
    s.snapshot_mut().rotation.z = v;
}
fn param1<S: ReplicatedState>(s: &S) -> u64 {
    s.snapshot().param1
}
fn set_param1<S: ReplicatedState>(s: &mut S, v: u64) {
    s.snapshot_mut().param1 = v;
}
fn param2<S: ReplicatedState>(s: &S) -> u64 {
    s.snapshot().param2
}
fn set_param2<S: ReplicatedState>(s: &mut S, v: u64) {
    s.snapshot_mut().param2 = v;
}
fn events<S: ReplicatedState>(s: &S) -> &[u8] {
    &s.snapshot().events
}
fn set_events<S: ReplicatedState>(s: &mut S, v: Vec<u8>) {
    s.snapshot_mut().events = v;
}

/// Ordered registry of replicated fields keyed by mask bit.
///
/// Indices 0-9 are fixed by [`FieldTable::base`]; entity kinds append their
/// own fields from [`FIELD_EXTENSION_START`] up to bit 31. Both peers must
/// build the same table.
pub struct FieldTable<S> {
    fields: Vec<Option<FieldDef<S>>>,
    names: AHashMap<&'static str, FieldIndex>,
}

impl<S: ReplicatedState> FieldTable<S> {
    pub fn base() -> Self {
        let mut table = Self {
            fields: vec![None; MASK_BITS as usize],
            names: AHashMap::new(),
        };

        let base = [
            FieldDef::float32(FIELD_POS_X, "pos.x", pos_x::<S>, set_pos_x::<S>),
            FieldDef::float32(FIELD_POS_Y, "pos.y", pos_y::<S>, set_pos_y::<S>),
            FieldDef::float32(FIELD_POS_Z, "pos.z", pos_z::<S>, set_pos_z::<S>),
            FieldDef::float32(FIELD_ROTA_X, "rota.x", rota_x::<S>, set_rota_x::<S>),
            FieldDef::float32(FIELD_ROTA_Y, "rota.y", rota_y::<S>, set_rota_y::<S>),
            FieldDef::float32(FIELD_ROTA_Z, "rota.z", rota_z::<S>, set_rota_z::<S>),
            FieldDef::raw64(FIELD_PARAM1, "param1", param1::<S>, set_param1::<S>),
            FieldDef::raw64(FIELD_PARAM2, "param2", param2::<S>, set_param2::<S>),
            FieldDef::bytes(FIELD_EVENTS, "events", events::<S>, set_events::<S>),
        ];

        for field in base {
            table.insert(field);
        }

        table
    }
}

impl<S> FieldTable<S> {
    fn insert(&mut self, field: FieldDef<S>) {
        self.names.insert(field.name, field.index);
        self.fields[field.index as usize] = Some(field);
    }

    /// Adds an entity-specific field in the open range 10..32.
    pub fn register(&mut self, field: FieldDef<S>) -> Result<()> {
        if field.index >= MASK_BITS {
            return Err(StateError::MaskOffsetExceed { offset: field.index });
        }
        if field.index < FIELD_EXTENSION_START || self.fields[field.index as usize].is_some() {
            return Err(StateError::MaskOffsetInvalid { offset: field.index });
        }
        if self.names.contains_key(field.name) {
            return Err(StateError::DuplicateFieldName { name: field.name });
        }

        self.insert(field);
        Ok(())
    }

    pub fn with_field(mut self, field: FieldDef<S>) -> Result<Self> {
        self.register(field)?;
        Ok(self)
    }

    pub fn get(&self, index: FieldIndex) -> Option<&FieldDef<S>> {
        self.fields.get(index as usize).and_then(Option::as_ref)
    }

    pub fn index_of(&self, name: &str) -> Option<FieldIndex> {
        self.names.get(name).copied()
    }

    pub fn highest_index(&self) -> Option<FieldIndex> {
        self.iter().last().map(|field| field.index)
    }

    /// Registered fields in ascending bit order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldDef<S>> {
        self.fields.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// Process-wide base table for plain [`Snapshot`] values.
pub fn base_table() -> &'static FieldTable<Snapshot> {
    static TABLE: OnceLock<FieldTable<Snapshot>> = OnceLock::new();
    TABLE.get_or_init(FieldTable::base)
}
