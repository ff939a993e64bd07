use crate::mask::Mask;
use crate::schema::FieldTable;
use crate::snapshot::Snapshot;
use std::env;
use std::sync::atomic::{AtomicBool, Ordering};

static DEBUG_MODE: AtomicBool = AtomicBool::new(false);
static TRACE_MODE: AtomicBool = AtomicBool::new(false);

/// Initialize debug mode from environment variables
///
/// - `STATE_LINK_DEBUG=1`: Dump snapshots as JSON through `log::debug!`
/// - `STATE_LINK_TRACE=1`: Log one line per encode/combine through `log::trace!`
pub fn init_debug_mode() {
    let debug = env::var("STATE_LINK_DEBUG").is_ok();
    let trace = env::var("STATE_LINK_TRACE").is_ok();

    DEBUG_MODE.store(debug, Ordering::Relaxed);
    TRACE_MODE.store(trace, Ordering::Relaxed);

    if debug {
        log::info!("state-link debug mode enabled - snapshots will be logged as JSON");
    }

    if trace {
        log::info!("state-link trace mode enabled - mask operations will be logged");
    }
}

/// Check if debug mode is enabled
pub fn is_debug_enabled() -> bool {
    DEBUG_MODE.load(Ordering::Relaxed)
}

/// Check if trace mode is enabled
pub fn is_trace_enabled() -> bool {
    TRACE_MODE.load(Ordering::Relaxed)
}

/// Log a snapshot in JSON format if debug mode is enabled
pub fn log_snapshot(label: &str, snapshot: &Snapshot) {
    if !is_debug_enabled() {
        return;
    }

    match serde_json::to_string_pretty(snapshot) {
        Ok(json) => log::debug!("{} snapshot:\n{}", label, json),
        Err(e) => log::debug!("failed to serialize snapshot to JSON: {}", e),
    }
}

pub fn trace_full<S>(table: &FieldTable<S>, mask: Mask, payload_len: usize) {
    if !is_trace_enabled() {
        return;
    }

    log::trace!(
        "full encode: {} fields [{}], {}",
        mask.count(),
        format_mask(table, mask),
        format_bytes(payload_len)
    );
}

pub fn trace_delta<S>(table: &FieldTable<S>, mask: Mask, payload_len: usize) {
    if !is_trace_enabled() {
        return;
    }

    if mask.is_empty() {
        log::trace!("delta encode: unchanged");
    } else {
        log::trace!(
            "delta encode: {} fields [{}], {}",
            mask.count(),
            format_mask(table, mask),
            format_bytes(payload_len)
        );
    }
}

pub fn trace_combine<S>(table: &FieldTable<S>, mask: Mask, payload_len: usize) {
    if !is_trace_enabled() {
        return;
    }

    log::trace!(
        "combine: mask {:#010x} [{}], {}",
        mask.bits(),
        format_mask(table, mask),
        format_bytes(payload_len)
    );
}

/// Field names for the set bits; unregistered bits show as `?N`.
pub fn format_mask<S>(table: &FieldTable<S>, mask: Mask) -> String {
    mask.iter()
        .map(|index| match table.get(index) {
            Some(field) => field.name.to_string(),
            None => format!("?{}", index),
        })
        .collect::<Vec<_>>()
        .join("|")
}

/// Format bytes in human-readable format (KB, MB, etc.)
pub fn format_bytes(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = KB * 1024;

    if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{base_table, FIELD_EVENTS, FIELD_POS_Y};
    use crate::snapshot::Vec3;

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(12), "12 bytes");
        assert_eq!(format_bytes(1024), "1.00 KB");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(1024 * 1024), "1.00 MB");
    }

    #[test]
    fn test_format_mask() {
        let mask = Mask::from_bits((1 << FIELD_POS_Y) | (1 << FIELD_EVENTS) | (1 << 9));
        assert_eq!(format_mask(base_table(), mask), "pos.y|events|?9");
        assert_eq!(format_mask(base_table(), Mask::EMPTY), "");
    }

    #[test]
    fn test_debug_mode_initialization() {
        // Should not crash without env vars
        init_debug_mode();
        log_snapshot("test", &Snapshot::new());
    }

    #[test]
    fn test_snapshot_json_shape() {
        let json = serde_json::to_value(Snapshot::new()).unwrap();
        assert!(json.get("position").is_some());
        assert!(json.get("dirty").is_none());
    }

    #[test]
    fn test_combine_dumps_snapshot_in_debug_mode() {
        DEBUG_MODE.store(true, Ordering::Relaxed);

        let mut state = Snapshot::new();
        state.set_position(Vec3::new(1.0, 2.0, 3.0));
        let data = state.marshal().unwrap();

        let mut remote = Snapshot::new();
        remote.combine(&data).unwrap();

        DEBUG_MODE.store(false, Ordering::Relaxed);
        assert_eq!(remote.position(), state.position());
    }
}
