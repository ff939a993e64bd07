use thiserror::Error;

#[derive(Error, Debug)]
pub enum StateError {
    #[error("Mask offset {offset} exceeds the 32-bit mask")]
    MaskOffsetExceed { offset: u32 },

    #[error("Mask offset {offset} is not available for registration")]
    MaskOffsetInvalid { offset: u32 },

    #[error("Field name '{name}' is already registered")]
    DuplicateFieldName { name: &'static str },

    #[error("Events Nil")]
    EventsNil,

    #[error("Events error: {0}")]
    EventsError(String),

    #[error("Event carries {count} arguments, header allows at most 255")]
    EventArgsOverflow { count: usize },

    #[error("Blob of {len} bytes exceeds length prefix limit of {max}")]
    BlobTooLarge { len: usize, max: usize },

    #[error("Unexpected end of payload: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEnd { needed: usize, remaining: usize },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("MessagePack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    #[error("MessagePack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    #[error("Bincode error: {0}")]
    Bincode(#[from] bincode::Error),
}

pub type Result<T> = std::result::Result<T, StateError>;
