use std::collections::HashSet;

use dioxus::html::geometry::WheelDelta;
use dioxus::html::input_data::MouseButton;
use dioxus::prelude::*;
use hkmap_shared::cluster::{self, MapItem};
use hkmap_shared::models::{Marker, MarkerCategory};

use crate::coords;

const MAP_CONTAINER_ID: &str = "hkmap-container";

/// Drag threshold in pixels — movement below this is treated as a click.
const DRAG_THRESHOLD: f64 = 3.0;

const ZOOM_MIN: f64 = 1.0;
const ZOOM_MAX: f64 = 12.0;
const ZOOM_STEP: f64 = 1.1;

/// Zoom applied when panning to a marker from the list or a search pick.
const FOCUS_ZOOM: f64 = 6.0;

/// Hit-test threshold (in view pixels, before zoom) for marker clicks.
const CLICK_THRESHOLD: f64 = 40.0;

/// Narrower threshold for spider leg segments.
const LEG_THRESHOLD: f64 = 14.0;

/// Reference container width (desktop map panel) used to normalize marker sizes.
const REFERENCE_WIDTH: f64 = 960.0;

// ---------------------------------------------------------------------------
// DOM helpers
// ---------------------------------------------------------------------------

/// Get the bounding client rect of the map container element.
fn container_rect() -> Option<web_sys::DomRect> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(MAP_CONTAINER_ID)?;
    Some(element.get_bounding_client_rect())
}

// ---------------------------------------------------------------------------
// Zoom / pan math (pure functions, easily testable)
// ---------------------------------------------------------------------------

/// Compute new pan offsets so that `cursor` stays over the same content point
/// when zooming from `old_zoom` to `new_zoom`.
fn zoom_pan_at_cursor(
    cursor_x: f64,
    cursor_y: f64,
    old_zoom: f64,
    new_zoom: f64,
    old_pan_x: f64,
    old_pan_y: f64,
) -> (f64, f64) {
    let content_x = (cursor_x - old_pan_x) / old_zoom;
    let content_y = (cursor_y - old_pan_y) / old_zoom;
    (
        cursor_x - content_x * new_zoom,
        cursor_y - content_y * new_zoom,
    )
}

/// Clamp pan values so the view can't be dragged off-screen.
///
/// The view surface renders at `width: 100%` of the container, so its actual
/// rendered height is `container_w * (VIEW_HEIGHT_PX / VIEW_WIDTH_PX)`, which
/// may exceed the container height.
fn clamp_pan(pan_x: f64, pan_y: f64, zoom: f64, container_w: f64, container_h: f64) -> (f64, f64) {
    let content_w = container_w * zoom;
    let content_h = container_w * (coords::VIEW_HEIGHT_PX / coords::VIEW_WIDTH_PX) * zoom;
    let min_pan_x = -(content_w - container_w).max(0.0);
    let min_pan_y = -(content_h - container_h).max(0.0);
    (pan_x.clamp(min_pan_x, 0.0), pan_y.clamp(min_pan_y, 0.0))
}

/// Apply `clamp_pan` using the live container dimensions.
fn clamp_pan_to_container(pan_x: f64, pan_y: f64, zoom: f64) -> (f64, f64) {
    match container_rect() {
        Some(rect) => clamp_pan(pan_x, pan_y, zoom, rect.width(), rect.height()),
        None => (pan_x, pan_y),
    }
}

/// Pan offsets that place view point (`view_x`, `view_y`) at the container
/// center for the given zoom.
fn center_pan(
    view_x: f64,
    view_y: f64,
    zoom: f64,
    container_w: f64,
    container_h: f64,
) -> (f64, f64) {
    let scale = container_w / coords::VIEW_WIDTH_PX * zoom;
    (
        container_w / 2.0 - view_x * scale,
        container_h / 2.0 - view_y * scale,
    )
}

/// Convert a wheel delta (pixels / lines / pages) to a uniform pixel-like value.
fn wheel_delta_y(delta: WheelDelta) -> f64 {
    match delta {
        WheelDelta::Pixels(d) => d.y,
        WheelDelta::Lines(d) => d.y * 40.0,
        WheelDelta::Pages(d) => d.y * 400.0,
    }
}

// ---------------------------------------------------------------------------
// Hit testing
// ---------------------------------------------------------------------------

/// What a click on the map resolved to.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickTarget {
    /// A lone marker or an expanded group member: select it.
    Marker(u64),
    /// A collapsed representative, spider hub or spider leg: toggle the key.
    Cluster(String),
}

/// Point targets (marker circles, cluster representatives, spider hubs) in
/// view pixel space.
fn point_targets(layout: &[MapItem]) -> Vec<((f64, f64), ClickTarget)> {
    let mut targets = Vec::new();
    for item in layout {
        match item {
            MapItem::Single(marker) => {
                targets.push((
                    coords::geo_to_view_px(marker.lat, marker.lon),
                    ClickTarget::Marker(marker.id),
                ));
            }
            MapItem::Cluster { key, lat, lon, .. } => {
                targets.push((
                    coords::geo_to_view_px(*lat, *lon),
                    ClickTarget::Cluster(key.clone()),
                ));
            }
            MapItem::Spider {
                key,
                lat,
                lon,
                members,
            } => {
                for member in members {
                    targets.push((
                        coords::geo_to_view_px(member.lat, member.lon),
                        ClickTarget::Marker(member.marker.id),
                    ));
                }
                targets.push((
                    coords::geo_to_view_px(*lat, *lon),
                    ClickTarget::Cluster(key.clone()),
                ));
            }
        }
    }
    targets
}

/// Spider leg segments as (center, tip, key) in view pixel space.
fn leg_segments(layout: &[MapItem]) -> Vec<((f64, f64), (f64, f64), String)> {
    let mut legs = Vec::new();
    for item in layout {
        if let MapItem::Spider {
            key,
            lat,
            lon,
            members,
        } = item
        {
            let center = coords::geo_to_view_px(*lat, *lon);
            for member in members {
                legs.push((
                    center,
                    coords::geo_to_view_px(member.lat, member.lon),
                    key.clone(),
                ));
            }
        }
    }
    legs
}

/// Distance from point `p` to segment `ab`.
fn segment_distance(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (abx, aby) = (b.0 - a.0, b.1 - a.1);
    let (apx, apy) = (p.0 - a.0, p.1 - a.1);
    let len_sq = abx * abx + aby * aby;
    let t = if len_sq > 0.0 {
        ((apx * abx + apy * aby) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.0 + abx * t, a.1 + aby * t);
    let (dx, dy) = (p.0 - cx, p.1 - cy);
    (dx * dx + dy * dy).sqrt()
}

/// Find the nearest point target within `threshold` (Euclidean distance).
fn find_nearest(
    targets: &[((f64, f64), ClickTarget)],
    click: (f64, f64),
    threshold: f64,
) -> Option<ClickTarget> {
    let mut best = None;
    let mut best_dist = threshold;
    for (pos, target) in targets {
        let dx = pos.0 - click.0;
        let dy = pos.1 - click.1;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist < best_dist {
            best_dist = dist;
            best = Some(target.clone());
        }
    }
    best
}

/// Resolve a click in view pixel space. Point targets win over legs.
fn resolve_click(layout: &[MapItem], click: (f64, f64), zoom: f64) -> Option<ClickTarget> {
    let shrink = zoom.min(5.0);
    if let Some(target) = find_nearest(&point_targets(layout), click, CLICK_THRESHOLD / shrink) {
        return Some(target);
    }
    let leg_threshold = LEG_THRESHOLD / shrink;
    leg_segments(layout)
        .into_iter()
        .find(|(a, b, _)| segment_distance(click, *a, *b) < leg_threshold)
        .map(|(_, _, key)| ClickTarget::Cluster(key))
}

// ---------------------------------------------------------------------------
// SVG builder
// ---------------------------------------------------------------------------

/// Escape user-supplied text for inclusion in SVG markup.
fn xml_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Build the full SVG content as a string for reliable rendering.
/// Positions are in view pixel space (2048 wide).
fn build_svg_content(
    layout: &[MapItem],
    zoom: f64,
    container_width: f64,
    selected: Option<u64>,
) -> String {
    let mut svg = String::with_capacity(8192);

    // Scale factor: keeps markers, strokes, and labels a consistent physical
    // size on screen regardless of container width.
    let mobile_boost = (REFERENCE_WIDTH / container_width).max(1.0);
    let s = mobile_boost / zoom.min(5.0);

    build_graticule_lines(&mut svg, mobile_boost);
    build_graticule_labels(&mut svg, mobile_boost);
    build_spider_legs(&mut svg, layout, s);
    build_markers(&mut svg, layout, s, selected);

    svg
}

fn build_graticule_lines(svg: &mut String, mb: f64) {
    use hkmap_shared::projection::{
        REGION_LAT_MAX, REGION_LAT_MIN, REGION_LON_MAX, REGION_LON_MIN,
    };
    let sw = 1.0 * mb;

    // Meridians and parallels at every 0.1 degree inside the region.
    let mut lon_tenths = (REGION_LON_MIN * 10.0).ceil() as i64;
    while (lon_tenths as f64) / 10.0 < REGION_LON_MAX {
        let lon = lon_tenths as f64 / 10.0;
        let (x, _) = coords::geo_to_view_px(REGION_LAT_MAX, lon);
        svg.push_str(&format!(
            r#"<line x1="{x}" y1="0" x2="{x}" y2="{}" stroke="rgba(255,255,255,0.15)" stroke-width="{sw}"/>"#,
            coords::VIEW_HEIGHT_PX
        ));
        lon_tenths += 1;
    }
    let mut lat_tenths = (REGION_LAT_MIN * 10.0).ceil() as i64;
    while (lat_tenths as f64) / 10.0 < REGION_LAT_MAX {
        let lat = lat_tenths as f64 / 10.0;
        let (_, y) = coords::geo_to_view_px(lat, REGION_LON_MIN);
        svg.push_str(&format!(
            r#"<line x1="0" y1="{y}" x2="{}" y2="{y}" stroke="rgba(255,255,255,0.15)" stroke-width="{sw}"/>"#,
            coords::VIEW_WIDTH_PX
        ));
        lat_tenths += 1;
    }
}

fn build_graticule_labels(svg: &mut String, mb: f64) {
    use hkmap_shared::projection::{
        REGION_LAT_MAX, REGION_LAT_MIN, REGION_LON_MAX, REGION_LON_MIN,
    };
    let fs = 16.0 * mb;
    let top_y = 22.0 * mb;
    let left_x = 8.0 * mb;

    let mut lon_tenths = (REGION_LON_MIN * 10.0).ceil() as i64;
    while (lon_tenths as f64) / 10.0 < REGION_LON_MAX {
        let lon = lon_tenths as f64 / 10.0;
        let (x, _) = coords::geo_to_view_px(REGION_LAT_MAX, lon);
        svg.push_str(&format!(
            r#"<text x="{x}" y="{top_y}" fill="rgba(255,255,255,0.4)" font-size="{fs}" font-family="monospace" text-anchor="middle">{lon:.1}°E</text>"#
        ));
        lon_tenths += 1;
    }
    let mut lat_tenths = (REGION_LAT_MIN * 10.0).ceil() as i64;
    while (lat_tenths as f64) / 10.0 < REGION_LAT_MAX {
        let lat = lat_tenths as f64 / 10.0;
        let (_, y) = coords::geo_to_view_px(lat, REGION_LON_MIN);
        svg.push_str(&format!(
            r#"<text x="{left_x}" y="{y}" fill="rgba(255,255,255,0.4)" font-size="{fs}" font-family="monospace" dominant-baseline="central">{lat:.1}°N</text>"#
        ));
        lat_tenths += 1;
    }
}

fn build_spider_legs(svg: &mut String, layout: &[MapItem], s: f64) {
    let sw = 2.0 * s;
    for (center, tip, _) in leg_segments(layout) {
        let (x1, y1) = center;
        let (x2, y2) = tip;
        svg.push_str(&format!(
            r#"<line x1="{x1}" y1="{y1}" x2="{x2}" y2="{y2}" stroke="rgba(255,255,255,0.55)" stroke-width="{sw}"/>"#
        ));
    }
}

fn push_marker_circle(svg: &mut String, marker: &Marker, x: f64, y: f64, s: f64, selected: bool) {
    let color = MarkerCategory::from_index(marker.category).color();
    if selected {
        let ring_r = 20.0 * s;
        let ring_sw = 3.0 * s;
        svg.push_str(&format!(
            r##"<circle cx="{x}" cy="{y}" r="{ring_r}" fill="none" stroke="#ffffff" stroke-width="{ring_sw}"/>"##
        ));
    }
    let r = 13.0 * s;
    let sw = 2.0 * s;
    svg.push_str(&format!(
        r##"<circle cx="{x}" cy="{y}" r="{r}" fill="{color}" stroke="rgba(255,255,255,0.8)" stroke-width="{sw}"/>"##
    ));
    let fs = 16.0 * s;
    let label_y = y + 32.0 * s;
    let name = xml_escape(&marker.name_zh);
    svg.push_str(&format!(
        r##"<text x="{x}" y="{label_y}" fill="#e8e8e8" font-size="{fs}" text-anchor="middle">{name}</text>"##
    ));
}

fn build_markers(svg: &mut String, layout: &[MapItem], s: f64, selected: Option<u64>) {
    for item in layout {
        match item {
            MapItem::Single(marker) => {
                let (x, y) = coords::geo_to_view_px(marker.lat, marker.lon);
                push_marker_circle(svg, marker, x, y, s, selected == Some(marker.id));
            }
            MapItem::Cluster {
                lat,
                lon,
                count,
                label,
                ..
            } => {
                let (x, y) = coords::geo_to_view_px(*lat, *lon);
                let r = 19.0 * s;
                let sw = 2.5 * s;
                let fs = 18.0 * s;
                svg.push_str(&format!(
                    r##"<circle cx="{x}" cy="{y}" r="{r}" fill="#4a8fd4" stroke="rgba(255,255,255,0.9)" stroke-width="{sw}"/>"##
                ));
                svg.push_str(&format!(
                    r##"<text x="{x}" y="{y}" fill="#ffffff" font-size="{fs}" font-weight="700" text-anchor="middle" dominant-baseline="central">{count}</text>"##
                ));
                let label_fs = 15.0 * s;
                let label_y = y + 40.0 * s;
                let label = xml_escape(label);
                svg.push_str(&format!(
                    r##"<text x="{x}" y="{label_y}" fill="#e8e8e8" font-size="{label_fs}" text-anchor="middle">{label}</text>"##
                ));
            }
            MapItem::Spider {
                lat, lon, members, ..
            } => {
                let (hx, hy) = coords::geo_to_view_px(*lat, *lon);
                let hub_r = 6.0 * s;
                svg.push_str(&format!(
                    r##"<circle cx="{hx}" cy="{hy}" r="{hub_r}" fill="rgba(255,255,255,0.85)"/>"##
                ));
                for member in members {
                    let (x, y) = coords::geo_to_view_px(member.lat, member.lon);
                    push_marker_circle(
                        svg,
                        &member.marker,
                        x,
                        y,
                        s,
                        selected == Some(member.marker.id),
                    );
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Component
// ---------------------------------------------------------------------------

#[component]
pub fn MapView(
    markers: Memo<Vec<Marker>>,
    expanded: Signal<HashSet<String>>,
    selected_id: Signal<Option<u64>>,
    focus: Signal<Option<(f64, f64)>>,
) -> Element {
    let mut expanded = expanded;
    let mut selected_id = selected_id;
    let mut focus = focus;
    let mut zoom = use_signal(|| 1.0_f64);
    let mut pan_x = use_signal(|| 0.0_f64);
    let mut pan_y = use_signal(|| 0.0_f64);
    let mut is_dragging = use_signal(|| false);
    let mut did_drag = use_signal(|| false);
    let mut drag_start_x = use_signal(|| 0.0_f64);
    let mut drag_start_y = use_signal(|| 0.0_f64);
    let mut drag_start_pan_x = use_signal(|| 0.0_f64);
    let mut drag_start_pan_y = use_signal(|| 0.0_f64);

    // Pan-to requests from the search panel and marker list. Consumed here so
    // repeated focuses on the same marker still re-center.
    use_effect(move || {
        let focus_target = *focus.read();
        if let Some((lat, lon)) = focus_target {
            let (vx, vy) = coords::geo_to_view_px(lat, lon);
            if let Some(rect) = container_rect() {
                let new_zoom = zoom.peek().max(FOCUS_ZOOM);
                let (px, py) = center_pan(vx, vy, new_zoom, rect.width(), rect.height());
                let (px, py) = clamp_pan(px, py, new_zoom, rect.width(), rect.height());
                zoom.set(new_zoom);
                pan_x.set(px);
                pan_y.set(py);
            }
            focus.set(None);
        }
    });

    // Memoize SVG generation — only recomputes when the layout inputs, zoom
    // or selection change. Pan changes are read outside this memo so they
    // don't trigger SVG rebuilds.
    let svg_html = use_memo(move || {
        let layout = cluster::build_layout(&markers.read(), &expanded.read());
        let cur_zoom = *zoom.read();
        let cur_selected = *selected_id.read();
        let cw = container_rect().map(|r| r.width()).unwrap_or(REFERENCE_WIDTH);

        let svg_content = build_svg_content(&layout, cur_zoom, cw, cur_selected);
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" preserveAspectRatio="none" style="position:absolute;top:0;left:0;width:100%;height:100%;pointer-events:none;">{}</svg>"#,
            coords::VIEW_WIDTH_PX,
            coords::VIEW_HEIGHT_PX,
            svg_content
        )
    });

    let cur_pan_x = *pan_x.read();
    let cur_pan_y = *pan_y.read();
    let cur_zoom = *zoom.read();
    let dragging = *is_dragging.read();

    let transform_style = format!(
        "transform: translate({cur_pan_x}px, {cur_pan_y}px) scale({cur_zoom}); transform-origin: 0 0;"
    );
    let container_class = if dragging {
        "map-container dragging"
    } else {
        "map-container"
    };

    rsx! {
        div {
            id: MAP_CONTAINER_ID,
            class: "{container_class}",

            onwheel: move |evt: Event<WheelData>| {
                evt.prevent_default();

                let delta_y = wheel_delta_y(evt.data().delta());
                let factor = if delta_y < 0.0 { ZOOM_STEP } else { 1.0 / ZOOM_STEP };
                let old_z = *zoom.read();
                let new_z = (old_z * factor).clamp(ZOOM_MIN, ZOOM_MAX);
                if (new_z - old_z).abs() < 1e-9 {
                    return;
                }

                let Some(rect) = container_rect() else { return };
                let client = evt.data().client_coordinates();
                let cx = client.x - rect.left();
                let cy = client.y - rect.top();

                let (new_px, new_py) =
                    zoom_pan_at_cursor(cx, cy, old_z, new_z, *pan_x.read(), *pan_y.read());
                let (px, py) = clamp_pan(new_px, new_py, new_z, rect.width(), rect.height());

                zoom.set(new_z);
                pan_x.set(px);
                pan_y.set(py);
            },

            onmousedown: move |evt: Event<MouseData>| {
                if evt.trigger_button() != Some(MouseButton::Primary) {
                    return;
                }
                let client = evt.client_coordinates();
                is_dragging.set(true);
                did_drag.set(false);
                drag_start_x.set(client.x);
                drag_start_y.set(client.y);
                drag_start_pan_x.set(*pan_x.read());
                drag_start_pan_y.set(*pan_y.read());
            },

            onmousemove: move |evt: Event<MouseData>| {
                if !*is_dragging.read() {
                    return;
                }
                let client = evt.client_coordinates();
                let dx = client.x - *drag_start_x.read();
                let dy = client.y - *drag_start_y.read();

                if !*did_drag.read() && (dx.abs() > DRAG_THRESHOLD || dy.abs() > DRAG_THRESHOLD) {
                    did_drag.set(true);
                }
                if *did_drag.read() {
                    let new_px = *drag_start_pan_x.read() + dx;
                    let new_py = *drag_start_pan_y.read() + dy;
                    let (px, py) = clamp_pan_to_container(new_px, new_py, *zoom.read());
                    pan_x.set(px);
                    pan_y.set(py);
                }
            },

            onmouseup: move |evt: Event<MouseData>| {
                let was_dragging = *is_dragging.read();
                let was_drag = *did_drag.read();
                is_dragging.set(false);

                // A mouseup without drag movement = a click
                if was_dragging && !was_drag {
                    let client = evt.client_coordinates();
                    if let Some(click) = coords::click_to_view_px_zoomed(
                        client.x, client.y, MAP_CONTAINER_ID,
                        *zoom.read(), *pan_x.read(), *pan_y.read(),
                    ) {
                        let layout =
                            cluster::build_layout(&markers.read(), &expanded.read());
                        match resolve_click(&layout, click, *zoom.read()) {
                            Some(ClickTarget::Marker(id)) => {
                                selected_id.set(Some(id));
                            }
                            Some(ClickTarget::Cluster(key)) => {
                                cluster::toggle_key(&mut expanded.write(), &key);
                            }
                            None => {
                                selected_id.set(None);
                            }
                        }
                    }
                }
            },

            onmouseleave: move |_| {
                is_dragging.set(false);
            },

            ondoubleclick: move |evt: Event<MouseData>| {
                evt.prevent_default();
                zoom.set(1.0);
                pan_x.set(0.0);
                pan_y.set(0.0);
            },

            div {
                class: "map-inner",
                style: "{transform_style}",
                div { dangerous_inner_html: "{svg_html}" }
            }
        }
    }
}
