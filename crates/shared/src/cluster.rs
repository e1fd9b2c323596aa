//! Coincident-marker clustering and spiderfication layout.
//!
//! A pure function of (marker list, expanded-key set): grouping quantizes
//! coordinates to a fixed decimal precision, collapsed groups render one
//! representative with an aggregated label, expanded groups fan their
//! members out radially with connecting legs. The expanded-key set is owned
//! by the caller (UI state), never by this module.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::models::Marker;

/// Decimal places of the quantization key (~0.1 m at 6 places). Rounding is
/// whatever `{:.6}` formatting does; boundary behavior is pinned by tests,
/// not assumed.
pub const CLUSTER_KEY_DECIMALS: usize = 6;

/// Radial displacement of expanded members, in degrees (~40 m). Purely
/// presentational; only needs to separate markers at district zoom.
pub const SPIDER_RADIUS_DEG: f64 = 4.0e-4;

/// Quantization key for a coordinate pair.
pub fn cluster_key(lat: f64, lon: f64) -> String {
    format!("{lat:.p$},{lon:.p$}", p = CLUSTER_KEY_DECIMALS)
}

/// A spiderfied group member: the marker displaced to its radial position,
/// with the leg running from the shared center to that position.
#[derive(Debug, Clone, PartialEq)]
pub struct SpiderMember {
    pub marker: Marker,
    pub lat: f64,
    pub lon: f64,
}

/// One render-ready layout item.
#[derive(Debug, Clone, PartialEq)]
pub enum MapItem {
    /// A lone marker at its true position.
    Single(Marker),
    /// A collapsed group: one representative at the shared coordinate.
    Cluster {
        key: String,
        lat: f64,
        lon: f64,
        count: usize,
        label: String,
        markers: Vec<Marker>,
    },
    /// An expanded group: members fanned out around the shared coordinate.
    /// Each member's leg runs from (lat, lon) to the member position.
    Spider {
        key: String,
        lat: f64,
        lon: f64,
        members: Vec<SpiderMember>,
    },
}

/// Radial offsets for `count` members: member `i` sits at angle
/// `i * 2π / count` (zero-indexed), displaced by [`SPIDER_RADIUS_DEG`].
pub fn spider_offsets(count: usize) -> Vec<(f64, f64)> {
    (0..count)
        .map(|i| {
            let angle = i as f64 * std::f64::consts::TAU / count as f64;
            (SPIDER_RADIUS_DEG * angle.cos(), SPIDER_RADIUS_DEG * angle.sin())
        })
        .collect()
}

/// Aggregated label for a collapsed group: per-distinct-name counts in
/// first-seen order, e.g. `"旺角 x2, 銅鑼灣"`.
fn aggregate_label(markers: &[Marker]) -> String {
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for marker in markers {
        *counts.entry(marker.name_zh.as_str()).or_default() += 1;
    }
    counts
        .iter()
        .map(|(name, n)| {
            if *n > 1 {
                format!("{name} x{n}")
            } else {
                (*name).to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Derive the render layout. Markers with non-finite coordinates are
/// filtered out; group order and in-group order follow marker list order,
/// so the layout is deterministic for a given (markers, expanded) input.
pub fn build_layout(markers: &[Marker], expanded: &HashSet<String>) -> Vec<MapItem> {
    let mut groups: IndexMap<String, Vec<Marker>> = IndexMap::new();
    for marker in markers.iter().filter(|m| m.has_finite_position()) {
        groups
            .entry(cluster_key(marker.lat, marker.lon))
            .or_default()
            .push(marker.clone());
    }

    groups
        .into_iter()
        .map(|(key, members)| {
            if members.len() == 1 {
                return MapItem::Single(members.into_iter().next().unwrap());
            }
            // Every member shares the quantized key; the first one's true
            // position is the shared center.
            let (lat, lon) = (members[0].lat, members[0].lon);
            if expanded.contains(&key) {
                let offsets = spider_offsets(members.len());
                let spider_members = members
                    .into_iter()
                    .zip(offsets)
                    .map(|(marker, (dlat, dlon))| SpiderMember {
                        marker,
                        lat: lat + dlat,
                        lon: lon + dlon,
                    })
                    .collect();
                MapItem::Spider {
                    key,
                    lat,
                    lon,
                    members: spider_members,
                }
            } else {
                MapItem::Cluster {
                    key,
                    lat,
                    lon,
                    count: members.len(),
                    label: aggregate_label(&members),
                    markers: members,
                }
            }
        })
        .collect()
}

/// Flip the expansion state of one cluster key. Symmetric and idempotent:
/// toggling twice restores the original state.
pub fn toggle_key(expanded: &mut HashSet<String>, key: &str) {
    if !expanded.remove(key) {
        expanded.insert(key.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn marker(id: u64, name: &str, lat: f64, lon: f64) -> Marker {
        Marker {
            id,
            name_zh: name.to_string(),
            name_en: String::new(),
            district_zh: String::new(),
            lat,
            lon,
            category: 0,
            description: String::new(),
        }
    }

    #[test]
    fn test_singletons_render_at_true_position() {
        let markers = [
            marker(1, "旺角", 22.3193, 114.1694),
            marker(2, "銅鑼灣", 22.2800, 114.1860),
        ];
        let layout = build_layout(&markers, &HashSet::new());
        assert_eq!(layout.len(), 2);
        assert!(matches!(&layout[0], MapItem::Single(m) if m.id == 1));
        assert!(matches!(&layout[1], MapItem::Single(m) if m.id == 2));
    }

    #[test]
    fn test_coincident_markers_collapse_to_one_representative() {
        let markers = [
            marker(1, "旺角", 22.3193, 114.1694),
            marker(2, "旺角", 22.3193, 114.1694),
            marker(3, "朗豪坊", 22.3193, 114.1694),
        ];
        let layout = build_layout(&markers, &HashSet::new());
        assert_eq!(layout.len(), 1);
        match &layout[0] {
            MapItem::Cluster { count, label, lat, lon, .. } => {
                assert_eq!(*count, 3);
                assert_eq!(label, "旺角 x2, 朗豪坊");
                assert_eq!((*lat, *lon), (22.3193, 114.1694));
            }
            other => panic!("expected cluster, got {other:?}"),
        }
    }

    #[test]
    fn test_expanded_group_of_three_has_equal_angles() {
        let markers = [
            marker(1, "甲", 22.3193, 114.1694),
            marker(2, "乙", 22.3193, 114.1694),
            marker(3, "丙", 22.3193, 114.1694),
        ];
        let key = cluster_key(22.3193, 114.1694);
        let expanded: HashSet<String> = [key.clone()].into();
        let layout = build_layout(&markers, &expanded);
        assert_eq!(layout.len(), 1);
        let MapItem::Spider { members, lat, lon, .. } = &layout[0] else {
            panic!("expected spider");
        };
        assert_eq!(members.len(), 3);
        for (i, member) in members.iter().enumerate() {
            let expected = i as f64 * std::f64::consts::TAU / 3.0;
            let dlat = member.lat - lat;
            let dlon = member.lon - lon;
            let radius = (dlat * dlat + dlon * dlon).sqrt();
            assert!((radius - SPIDER_RADIUS_DEG).abs() < 1e-12);
            let angle = dlon.atan2(dlat).rem_euclid(std::f64::consts::TAU);
            assert!((angle - expected).abs() < 1e-9, "member {i}: {angle}");
        }
    }

    #[test]
    fn test_toggle_is_symmetric_and_reproducible() {
        let markers = [
            marker(1, "甲", 22.3193, 114.1694),
            marker(2, "乙", 22.3193, 114.1694),
            marker(3, "丙", 22.3193, 114.1694),
        ];
        let key = cluster_key(22.3193, 114.1694);
        let mut expanded = HashSet::new();

        toggle_key(&mut expanded, &key);
        let first_open = build_layout(&markers, &expanded);
        assert!(matches!(first_open[0], MapItem::Spider { .. }));

        toggle_key(&mut expanded, &key);
        let closed = build_layout(&markers, &expanded);
        assert!(matches!(closed[0], MapItem::Cluster { .. }));

        toggle_key(&mut expanded, &key);
        let second_open = build_layout(&markers, &expanded);
        assert_eq!(first_open, second_open);
    }

    #[test]
    fn test_nearby_but_distinct_coordinates_stay_separate() {
        // 1e-5 degrees apart: distinct at 6-decimal quantization.
        let markers = [
            marker(1, "甲", 22.319300, 114.169400),
            marker(2, "乙", 22.319310, 114.169400),
        ];
        let layout = build_layout(&markers, &HashSet::new());
        assert_eq!(layout.len(), 2);
    }

    #[test]
    fn test_quantization_boundary_sub_precision_difference_merges() {
        // Differences beyond the sixth decimal place share a key.
        let markers = [
            marker(1, "甲", 22.3193000001, 114.1694),
            marker(2, "乙", 22.3193000004, 114.1694),
        ];
        assert_eq!(
            cluster_key(markers[0].lat, markers[0].lon),
            cluster_key(markers[1].lat, markers[1].lon)
        );
        let layout = build_layout(&markers, &HashSet::new());
        assert_eq!(layout.len(), 1);
    }

    #[test]
    fn test_malformed_markers_are_filtered_not_propagated() {
        let markers = [
            marker(1, "甲", 22.3193, 114.1694),
            marker(2, "壞", f64::NAN, 114.1694),
            marker(3, "壞", 22.3193, f64::INFINITY),
        ];
        let layout = build_layout(&markers, &HashSet::new());
        assert_eq!(layout.len(), 1);
        assert!(matches!(&layout[0], MapItem::Single(m) if m.id == 1));
    }

    #[test]
    fn test_expanding_one_key_leaves_other_groups_collapsed() {
        let markers = [
            marker(1, "甲", 22.3193, 114.1694),
            marker(2, "乙", 22.3193, 114.1694),
            marker(3, "丙", 22.2800, 114.1860),
            marker(4, "丁", 22.2800, 114.1860),
        ];
        let expanded: HashSet<String> = [cluster_key(22.3193, 114.1694)].into();
        let layout = build_layout(&markers, &expanded);
        assert!(matches!(layout[0], MapItem::Spider { .. }));
        assert!(matches!(layout[1], MapItem::Cluster { .. }));
    }

    #[test]
    fn test_spider_offsets_single_member_points_north() {
        let offsets = spider_offsets(1);
        assert_eq!(offsets.len(), 1);
        assert!((offsets[0].0 - SPIDER_RADIUS_DEG).abs() < 1e-15);
        assert!(offsets[0].1.abs() < 1e-15);
    }
}
