pub mod stream;
pub mod mask;
pub mod schema;
pub mod snapshot;
pub mod codec;
pub mod serialization;
pub mod event;
pub mod error;
pub mod sync;
pub mod debug;

pub use stream::{
    ByteReader, ByteWriter,
};

pub use mask::{
    Mask, MASK_BITS,
};

pub use schema::{
    base_table, FieldAccess, FieldDef, FieldIndex, FieldKind, FieldTable,
    FIELD_EVENTS, FIELD_EXTENSION_START, FIELD_PARAM1, FIELD_PARAM2,
    FIELD_POS_X, FIELD_POS_Y, FIELD_POS_Z, FIELD_RESERVED,
    FIELD_ROTA_X, FIELD_ROTA_Y, FIELD_ROTA_Z,
};

pub use snapshot::{
    ReplicatedState, Snapshot, Vec3,
    slot_from_f32, slot_from_f64, slot_from_u32,
    slot_to_f32, slot_to_f64, slot_to_u32,
};

pub use codec::{
    FieldOutcome, FLOAT_TOLERANCE,
    write_base_value, compare_and_write_delta, set_base_value,
    encode_full, encode_delta, combine, combine_masked,
};

pub use serialization::{
    ArgFormat, ArgSerializer, ArgValue,
};

pub use event::{
    Event, EVENT_HEADER_LEN, decode_event, encode_event,
};

pub use error::{
    StateError, Result,
};

pub use sync::{
    BaselineTracker, StateUpdate, SyncConfig, SyncStats,
};

pub use debug::{
    init_debug_mode, is_debug_enabled, is_trace_enabled,
    log_snapshot, trace_full, trace_delta, trace_combine,
    format_mask, format_bytes,
};
