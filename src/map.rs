//! Static incident map rendering.
//!
//! Markers are projected with Web-Mercator math onto a locally drawn canvas
//! and encoded to PNG entirely in memory, so concurrent requests never share
//! a file and rendering has no second upstream to fail on. Zoom auto-fits
//! the marker bounding box into the canvas.

use std::io::Cursor;

use anyhow::{Context, Result};
use image::{ImageFormat, Rgba, RgbaImage};

pub const MAP_WIDTH: u32 = 800;
pub const MAP_HEIGHT: u32 = 600;

const TILE_SIZE: f64 = 256.0;
const MAX_ZOOM: u8 = 17;
const EDGE_PADDING: f64 = 40.0;
const MARKER_RADIUS: f64 = 10.0;

const CANVAS_FILL: Rgba<u8> = Rgba([236, 233, 225, 255]);
const GRID_LINE: Rgba<u8> = Rgba([214, 210, 200, 255]);
const MARKER_FILL: Rgba<u8> = Rgba([204, 32, 32, 255]);
const MARKER_RING: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Render one marker per `(lat, lon)` position and return the PNG bytes.
/// Non-finite coordinates are dropped; an empty position list yields the
/// bare canvas.
pub fn render_incident_map(positions: &[(f64, f64)]) -> Result<Vec<u8>> {
    let positions: Vec<(f64, f64)> = positions
        .iter()
        .copied()
        .filter(|(lat, lon)| lat.is_finite() && lon.is_finite())
        .collect();

    let mut canvas = RgbaImage::from_pixel(MAP_WIDTH, MAP_HEIGHT, CANVAS_FILL);
    draw_graticule(&mut canvas);

    if !positions.is_empty() {
        let zoom = fit_zoom(&positions);
        let (min_x, min_y, max_x, max_y) = world_bounds(&positions, zoom);
        let center_x = (min_x + max_x) / 2.0;
        let center_y = (min_y + max_y) / 2.0;

        for &(lat, lon) in &positions {
            let (wx, wy) = world_px(lat, lon, zoom);
            let px = f64::from(MAP_WIDTH) / 2.0 + (wx - center_x);
            let py = f64::from(MAP_HEIGHT) / 2.0 + (wy - center_y);
            draw_disc(&mut canvas, px, py, MARKER_RADIUS + 2.0, MARKER_RING);
            draw_disc(&mut canvas, px, py, MARKER_RADIUS, MARKER_FILL);
        }
    }

    let mut out = Cursor::new(Vec::new());
    canvas
        .write_to(&mut out, ImageFormat::Png)
        .context("encoding incident map png")?;
    Ok(out.into_inner())
}

/// Web-Mercator world pixel coordinates at the given zoom.
fn world_px(lat: f64, lon: f64, zoom: u8) -> (f64, f64) {
    let lat = lat.clamp(-85.0511, 85.0511);
    let n = 2.0_f64.powi(i32::from(zoom));
    let x = (lon + 180.0) / 360.0;
    let lat_rad = lat.to_radians();
    let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
    (x * n * TILE_SIZE, y * n * TILE_SIZE)
}

fn world_bounds(positions: &[(f64, f64)], zoom: u8) -> (f64, f64, f64, f64) {
    let mut min_x = f64::MAX;
    let mut min_y = f64::MAX;
    let mut max_x = f64::MIN;
    let mut max_y = f64::MIN;
    for &(lat, lon) in positions {
        let (x, y) = world_px(lat, lon, zoom);
        min_x = min_x.min(x);
        min_y = min_y.min(y);
        max_x = max_x.max(x);
        max_y = max_y.max(y);
    }
    (min_x, min_y, max_x, max_y)
}

/// Highest zoom whose marker bounding box fits inside the padded canvas.
fn fit_zoom(positions: &[(f64, f64)]) -> u8 {
    let usable_w = f64::from(MAP_WIDTH) - 2.0 * EDGE_PADDING;
    let usable_h = f64::from(MAP_HEIGHT) - 2.0 * EDGE_PADDING;
    for zoom in (0..=MAX_ZOOM).rev() {
        let (min_x, min_y, max_x, max_y) = world_bounds(positions, zoom);
        if max_x - min_x <= usable_w && max_y - min_y <= usable_h {
            return zoom;
        }
    }
    0
}

fn draw_graticule(canvas: &mut RgbaImage) {
    for x in (0..MAP_WIDTH).step_by(64) {
        for y in 0..MAP_HEIGHT {
            canvas.put_pixel(x, y, GRID_LINE);
        }
    }
    for y in (0..MAP_HEIGHT).step_by(64) {
        for x in 0..MAP_WIDTH {
            canvas.put_pixel(x, y, GRID_LINE);
        }
    }
}

/// Filled disc, clipped to the canvas.
fn draw_disc(canvas: &mut RgbaImage, cx: f64, cy: f64, radius: f64, color: Rgba<u8>) {
    let x0 = (cx - radius).floor().max(0.0) as u32;
    let x1 = (cx + radius).ceil().min(f64::from(MAP_WIDTH - 1)) as u32;
    let y0 = (cy - radius).floor().max(0.0) as u32;
    let y1 = (cy + radius).ceil().min(f64::from(MAP_HEIGHT - 1)) as u32;
    let r2 = radius * radius;
    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = f64::from(x) - cx;
            let dy = f64::from(y) - cy;
            if dx * dx + dy * dy <= r2 {
                canvas.put_pixel(x, y, color);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    fn marker_pixel_count(png: &[u8]) -> usize {
        let img = image::load_from_memory(png).expect("png decodes").to_rgba8();
        img.pixels().filter(|p| p.0 == MARKER_FILL.0).count()
    }

    #[test]
    fn empty_positions_render_bare_canvas() {
        let png = render_incident_map(&[]).expect("renders");
        assert_eq!(&png[..8], &PNG_MAGIC);
        let img = image::load_from_memory(&png).expect("png decodes");
        assert_eq!(img.width(), MAP_WIDTH);
        assert_eq!(img.height(), MAP_HEIGHT);
        assert_eq!(marker_pixel_count(&png), 0);
    }

    #[test]
    fn single_marker_lands_at_canvas_center() {
        let png = render_incident_map(&[(34.1815, -117.3229)]).expect("renders");
        let img = image::load_from_memory(&png).expect("png decodes").to_rgba8();
        assert_eq!(
            img.get_pixel(MAP_WIDTH / 2, MAP_HEIGHT / 2).0,
            MARKER_FILL.0
        );
    }

    #[test]
    fn more_markers_paint_more_ink() {
        let one = render_incident_map(&[(34.18, -117.32)]).expect("renders");
        let two =
            render_incident_map(&[(34.18, -117.32), (34.30, -117.10)]).expect("renders");
        let single = marker_pixel_count(&one);
        assert!(single > 0);
        assert!(marker_pixel_count(&two) > single + single / 2);
    }

    #[test]
    fn non_finite_coordinates_are_dropped() {
        let png = render_incident_map(&[(f64::NAN, -117.0), (f64::INFINITY, 0.0)])
            .expect("renders");
        assert_eq!(marker_pixel_count(&png), 0);
    }

    #[test]
    fn spread_markers_still_fit_the_canvas() {
        // Continent-wide spread forces a low zoom; nothing should panic or clip out.
        let png = render_incident_map(&[(40.71, -74.01), (34.05, -118.24)]).expect("renders");
        assert!(marker_pixel_count(&png) > 0);
    }
}
