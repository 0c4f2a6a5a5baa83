//! Emoji used in alert titles.

/// Party popper, prefixed to found-slot alerts.
pub const TADA: &str = "\u{1f389}";
/// Loudspeaker, prefixed to lifecycle alerts.
pub const LOUDSPEAKER: &str = "\u{1f50a}";
/// Warning sign.
pub const WARNING: &str = "\u{26a0}\u{fe0f}";
/// Facepalm, used for fatal alerts.
pub const FACEPALM: &str = "\u{1f926}";
