//! Shake rotoshape parser
//!
//! Turns the per-frame vertex lists of a `shake_shape_data` export into
//! closed bezier drawings that can be dropped straight into `\clip(...)`.
//! Every `vertex_data` row is one frame. Its numbers group into vertices of
//! six values: center point, incoming tangent and outgoing tangent.

use crate::utils::{format_number, MotionError, Result};

/// Whether `text` carries the rotoshape signature
#[must_use]
pub fn is_rotoshape_data(text: &str) -> bool {
    text.trim_start().starts_with("shake_shape_data")
}

#[derive(Debug, Clone, Copy)]
struct Vertex {
    center: (f64, f64),
    tangent_in: (f64, f64),
    tangent_out: (f64, f64),
}

/// Parse rotoshape text into one drawing per frame
///
/// Shake measures y upwards, so y values are flipped against `res_y`.
///
/// # Errors
///
/// Returns `MotionError::DataParse` on a missing signature, no frames, a
/// frame without a complete vertex or a non-numeric vertex value.
pub fn parse_rotoshape(text: &str, res_y: f64) -> Result<Vec<String>> {
    if !is_rotoshape_data(text) {
        return Err(MotionError::data_parse("missing shake_shape_data header"));
    }

    let mut drawings = Vec::new();
    for line in text.lines() {
        let mut fields = line.split_whitespace();
        if fields.next() != Some("vertex_data") {
            continue;
        }

        let numbers = fields
            .map(str::parse::<f64>)
            .collect::<core::result::Result<Vec<_>, _>>()
            .map_err(|err| MotionError::data_parse(format!("bad vertex value: {err}")))?;

        let flip = |x: f64, y: f64| (x, res_y - y);
        let vertices: Vec<Vertex> = numbers
            .chunks_exact(6)
            .map(|v| Vertex {
                center: flip(v[0], v[1]),
                tangent_in: flip(v[2], v[3]),
                tangent_out: flip(v[4], v[5]),
            })
            .collect();

        if vertices.is_empty() {
            return Err(MotionError::data_parse(format!(
                "frame {} has no complete vertex",
                drawings.len() + 1
            )));
        }
        drawings.push(render(&vertices));
    }

    if drawings.is_empty() {
        return Err(MotionError::data_parse("no vertex_data rows"));
    }
    Ok(drawings)
}

fn point((x, y): (f64, f64)) -> String {
    format!("{} {}", format_number(x, 2), format_number(y, 2))
}

fn render(vertices: &[Vertex]) -> String {
    let mut drawing = format!("m {}", point(vertices[0].center));
    for (i, vertex) in vertices.iter().enumerate() {
        let next = &vertices[(i + 1) % vertices.len()];
        drawing.push_str(&format!(
            " b {} {} {}",
            point(vertex.tangent_out),
            point(next.tangent_in),
            point(next.center)
        ));
    }
    drawing
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHAPE: &str = "shake_shape_data 4.0\nmotion_blur 0\nnum_shapes 1\nvertex_data 10 90 5 90 15 90 20 80 20 85 20 75\nvertex_data 11 90 6 90 16 90 21 80 21 85 21 75\n";

    #[test]
    fn one_drawing_per_frame() {
        let drawings = parse_rotoshape(SHAPE, 100.0).unwrap();
        assert_eq!(drawings.len(), 2);
        assert_eq!(
            drawings[0],
            "m 10 10 b 15 10 20 15 20 20 b 20 25 5 10 10 10"
        );
        assert!(drawings[1].starts_with("m 11 10 b 16 10"));
    }

    #[test]
    fn incomplete_frames_fail() {
        let text = "shake_shape_data 4.0\nvertex_data 1 2 3\n";
        assert!(parse_rotoshape(text, 100.0).is_err());
        assert!(parse_rotoshape("shake_shape_data 4.0\n", 100.0).is_err());
        assert!(parse_rotoshape("vertex_data 1 2 3 4 5 6", 100.0).is_err());
    }
}
