//! Proptest strategies for crab-castle inputs.

use crab_core::config::ZoneConfig;
use crab_core::math::Vec2Fixed;
use proptest::prelude::*;

/// Whole-unit position within `extent` of the origin.
pub fn arb_position(extent: i32) -> impl Strategy<Value = Vec2Fixed> {
    (-extent..=extent, -extent..=extent).prop_map(|(x, y)| Vec2Fixed::from_units(x, y))
}

/// Zone thresholds with danger strictly below warning.
pub fn arb_zones() -> impl Strategy<Value = ZoneConfig> {
    (1..40_i32, 1..40_i32, any::<bool>()).prop_map(|(danger, gap, band)| ZoneConfig {
        danger_distance: danger,
        warning_distance: danger + gap,
        classify_warning_band: band,
    })
}

/// Wood and stone shares of a target ratio, both positive.
pub fn arb_ratio() -> impl Strategy<Value = (u32, u32)> {
    (1..6_u32, 1..4_u32)
}

/// Sequence of set operations: `true` inserts, `false` removes.
pub fn arb_set_ops(max_id: u64, len: usize) -> impl Strategy<Value = Vec<(bool, u64)>> {
    proptest::collection::vec((any::<bool>(), 1..=max_id), 0..len)
}
