//! Ring item type codes.
//!
//! The type code occupies the low 16 bits of the 32-bit `type` header
//! field. Codes are shared by every protocol generation; a generation may
//! simply not define some of them (see [`crate::FormatVersion`]).

/// Start of a run.
pub const BEGIN_RUN: u32 = 1;
/// End of a run.
pub const END_RUN: u32 = 2;
/// Run paused.
pub const PAUSE_RUN: u32 = 3;
/// Run resumed.
pub const RESUME_RUN: u32 = 4;
/// Run ended without a normal end-run record.
pub const ABNORMAL_ENDRUN: u32 = 5;

/// Documentation: packet type descriptions.
pub const PACKET_TYPES: u32 = 10;
/// Documentation: monitored variable values.
pub const MONITORED_VARIABLES: u32 = 11;
/// Ring item format declaration.
pub const RING_FORMAT: u32 = 12;

/// Periodic scaler readout.
pub const PERIODIC_SCALERS: u32 = 20;

/// Physics event payload.
pub const PHYSICS_EVENT: u32 = 30;
/// Count of physics events emitted so far.
pub const PHYSICS_EVENT_COUNT: u32 = 31;

/// Event builder fragment.
pub const EVB_FRAGMENT: u32 = 40;
/// Event builder fragment whose payload is not a ring item.
pub const EVB_UNKNOWN_PAYLOAD: u32 = 41;
/// Event builder glom parameters.
pub const EVB_GLOM_INFO: u32 = 42;

/// First code available for user defined items.
pub const FIRST_USER_ITEM_CODE: u32 = 32768;

/// Returns `true` for the four run state transition codes.
#[must_use]
pub const fn is_state_change(code: u32) -> bool {
    matches!(code, BEGIN_RUN | END_RUN | PAUSE_RUN | RESUME_RUN)
}

/// Returns `true` for the documentation (text) item codes.
#[must_use]
pub const fn is_text(code: u32) -> bool {
    matches!(code, PACKET_TYPES | MONITORED_VARIABLES)
}

/// Returns `true` for event builder fragment codes.
#[must_use]
pub const fn is_fragment(code: u32) -> bool {
    matches!(code, EVB_FRAGMENT | EVB_UNKNOWN_PAYLOAD)
}

/// Human readable name of an item type code.
#[must_use]
pub fn name(code: u32) -> String {
    let name = match code {
        BEGIN_RUN => "Begin Run",
        END_RUN => "End Run",
        PAUSE_RUN => "Pause Run",
        RESUME_RUN => "Resume Run",
        ABNORMAL_ENDRUN => "Abnormal End",
        PACKET_TYPES => "Packet types",
        MONITORED_VARIABLES => "Monitored Variables",
        RING_FORMAT => "Ring Item format version",
        PERIODIC_SCALERS => "Scaler",
        PHYSICS_EVENT => "Event",
        PHYSICS_EVENT_COUNT => "Trigger count",
        EVB_FRAGMENT => "Event fragment",
        EVB_UNKNOWN_PAYLOAD => "Fragment with unknown payload",
        EVB_GLOM_INFO => "Glom Parameters",
        c if c >= FIRST_USER_ITEM_CODE => return format!("User item ({c})"),
        c => return format!("Unknown (0x{c:x})"),
    };
    name.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_change_codes() {
        for code in [BEGIN_RUN, END_RUN, PAUSE_RUN, RESUME_RUN] {
            assert!(is_state_change(code));
        }
        assert!(!is_state_change(ABNORMAL_ENDRUN));
        assert!(!is_state_change(0));
    }

    #[test]
    fn names_for_known_and_unknown_codes() {
        assert_eq!(name(BEGIN_RUN), "Begin Run");
        assert_eq!(name(EVB_GLOM_INFO), "Glom Parameters");
        assert_eq!(name(FIRST_USER_ITEM_CODE + 1), "User item (32769)");
        assert_eq!(name(99), "Unknown (0x63)");
    }
}
