use hkmap_shared::projection::{
    REGION_LAT_MAX, REGION_LAT_MIN, REGION_LON_MAX, REGION_LON_MIN,
};

/// Native width of the map view surface, in SVG user units.
pub const VIEW_WIDTH_PX: f64 = 2048.0;

/// Native height, derived so the region bounding box fills the surface
/// with a uniform degrees-per-pixel scale on each axis.
pub const VIEW_HEIGHT_PX: f64 =
    VIEW_WIDTH_PX * (REGION_LAT_MAX - REGION_LAT_MIN) / (REGION_LON_MAX - REGION_LON_MIN);

/// Project a geographic position onto the view surface. Plain linear
/// interpolation over the region bounding box, north up.
pub fn geo_to_view_px(lat: f64, lon: f64) -> (f64, f64) {
    let x = (lon - REGION_LON_MIN) / (REGION_LON_MAX - REGION_LON_MIN) * VIEW_WIDTH_PX;
    let y = (REGION_LAT_MAX - lat) / (REGION_LAT_MAX - REGION_LAT_MIN) * VIEW_HEIGHT_PX;
    (x, y)
}

/// Pure function: convert container-relative coordinates to native view
/// pixels, undoing the zoom/pan CSS transform. Usable in unit tests (no
/// web_sys dependency).
///
/// Only `container_w` is needed because the view renders with
/// `width:100%; height:auto`, so both axes share the same scale factor
/// (`VIEW_WIDTH_PX / container_w`).
pub fn client_to_view_px_zoomed(
    container_x: f64,
    container_y: f64,
    container_w: f64,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<(f64, f64)> {
    if container_w <= 0.0 || zoom <= 0.0 {
        return None;
    }

    // Undo CSS transform: translate(pan_x, pan_y) scale(zoom)
    let rendered_x = (container_x - pan_x) / zoom;
    let rendered_y = (container_y - pan_y) / zoom;

    let scale = VIEW_WIDTH_PX / container_w;
    let view_x = (rendered_x * scale).clamp(0.0, VIEW_WIDTH_PX);
    let view_y = (rendered_y * scale).clamp(0.0, VIEW_HEIGHT_PX);

    Some((view_x, view_y))
}

/// Get container-relative click coordinates using web_sys, then convert
/// to view pixel space, undoing the zoom/pan transform.
pub fn click_to_view_px_zoomed(
    client_x: f64,
    client_y: f64,
    container_id: &str,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
) -> Option<(f64, f64)> {
    let document = web_sys::window()?.document()?;
    let element = document.get_element_by_id(container_id)?;
    let rect = element.get_bounding_client_rect();

    let container_x = client_x - rect.left();
    let container_y = client_y - rect.top();

    client_to_view_px_zoomed(container_x, container_y, rect.width(), zoom, pan_x, pan_y)
}

/// Human-readable coordinate readout for popups.
pub fn format_geo(lat: f64, lon: f64) -> String {
    format!("{lat:.4}°N {lon:.4}°E")
}
