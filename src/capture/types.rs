use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Raw input button-transition flags, low word of the Windows `RAWMOUSE`
/// button state. Down and up are separate bits; an event with neither bit set
/// carries no button change.
pub const BUTTON_1_DOWN: u16 = 0x0001;
pub const BUTTON_1_UP: u16 = 0x0002;
pub const BUTTON_2_DOWN: u16 = 0x0004;
pub const BUTTON_2_UP: u16 = 0x0008;
pub const BUTTON_3_DOWN: u16 = 0x0010;
pub const BUTTON_3_UP: u16 = 0x0020;
pub const BUTTON_4_DOWN: u16 = 0x0040;
pub const BUTTON_4_UP: u16 = 0x0080;
pub const BUTTON_5_DOWN: u16 = 0x0100;
pub const BUTTON_5_UP: u16 = 0x0200;

/// Held-button bitmask bits for [`Sample::buttons`].
/// Bits: 1=left, 2=right, 4=middle, 8=button4, 16=button5.
pub const MASK_LEFT: i32 = 1 << 0;
pub const MASK_RIGHT: i32 = 1 << 1;
pub const MASK_MIDDLE: i32 = 1 << 2;
pub const MASK_BUTTON_4: i32 = 1 << 3;
pub const MASK_BUTTON_5: i32 = 1 << 4;

/// (down flag, up flag, held mask bit) for each tracked button.
pub(crate) const BUTTON_TRANSITIONS: [(u16, u16, i32); 5] = [
    (BUTTON_1_DOWN, BUTTON_1_UP, MASK_LEFT),
    (BUTTON_2_DOWN, BUTTON_2_UP, MASK_RIGHT),
    (BUTTON_3_DOWN, BUTTON_3_UP, MASK_MIDDLE),
    (BUTTON_4_DOWN, BUTTON_4_UP, MASK_BUTTON_4),
    (BUTTON_5_DOWN, BUTTON_5_UP, MASK_BUTTON_5),
];

/// One raw motion event as delivered by the OS listener.
///
/// Producer-owned until consumed from the ring; never persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionEvent {
    /// Relative horizontal delta in device counts.
    pub dx: i32,
    /// Relative vertical delta in device counts.
    pub dy: i32,
    /// Button transition flags (`BUTTON_*_DOWN` / `BUTTON_*_UP`).
    pub button_flags: u16,
}

/// One aggregated cursor sample.
///
/// `x`/`y` are cumulative virtual coordinates — the unclamped sum of all
/// relative deltas, independent of screen bounds. Samples are stored only when
/// position or button state changed, so consecutive samples always differ.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    /// Wall-clock timestamp in unix milliseconds.
    pub ts: i64,
    pub x: i32,
    pub y: i32,
    /// Held-button bitmask (`MASK_*`).
    #[serde(default)]
    pub buttons: i32,
}

/// Current wall-clock time in unix milliseconds.
pub(crate) fn unix_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
