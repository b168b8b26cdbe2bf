//! After Effects keyframe data parser
//!
//! Mocha and After Effects export tracking results as tab separated text:
//!
//! ```text
//! Adobe After Effects 6.0 Keyframe Data
//!
//! 	Units Per Second	23.976
//! 	Source Width	1920
//! 	Source Height	1080
//!
//! Position
//! 	Frame	X pixels	Y pixels	Z pixels
//! 	0	960	540	0
//!
//! Scale
//! 	Frame	X percent	Y percent	Z percent
//! 	0	100	100	100
//!
//! Rotation
//! 	Frame	Degrees
//! 	0	0
//!
//! End of Keyframe Data
//! ```
//!
//! Section headers are unindented; data rows are indented and start with a
//! frame number. The Position section decides how many frames the data has.

use crate::utils::{MotionError, Result};

/// Per-frame numeric tracking channels
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeyframeSeries {
    pub x_position: Vec<f64>,
    pub y_position: Vec<f64>,
    pub z_position: Vec<f64>,
    pub x_scale: Vec<f64>,
    pub y_scale: Vec<f64>,
    pub x_rotation: Vec<f64>,
    pub y_rotation: Vec<f64>,
    pub z_rotation: Vec<f64>,
    pub source_width: f64,
    pub source_height: f64,
    pub frame_rate: f64,
}

/// One frame's worth of channel values
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub x_scale: f64,
    pub y_scale: f64,
    pub x_rotation: f64,
    pub y_rotation: f64,
    pub z_rotation: f64,
}

impl KeyframeSeries {
    /// Number of tracked frames
    #[must_use]
    pub fn len(&self) -> usize {
        self.x_position.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.x_position.is_empty()
    }

    /// Whether every channel has the same non-zero length
    #[must_use]
    pub fn is_valid(&self) -> bool {
        let n = self.len();
        n > 0 && self.channels().iter().all(|channel| channel.len() == n)
    }

    /// Values at a 0-based index
    #[must_use]
    pub fn sample(&self, index: usize) -> Sample {
        let at = |channel: &[f64]| channel.get(index).copied().unwrap_or_default();
        Sample {
            x: at(&self.x_position),
            y: at(&self.y_position),
            z: at(&self.z_position),
            x_scale: at(&self.x_scale),
            y_scale: at(&self.y_scale),
            x_rotation: at(&self.x_rotation),
            y_rotation: at(&self.y_rotation),
            z_rotation: at(&self.z_rotation),
        }
    }

    /// Reverse every channel in place
    pub fn reverse(&mut self) {
        for channel in self.channels_mut() {
            channel.reverse();
        }
    }

    fn channels(&self) -> [&Vec<f64>; 8] {
        [
            &self.x_position,
            &self.y_position,
            &self.z_position,
            &self.x_scale,
            &self.y_scale,
            &self.x_rotation,
            &self.y_rotation,
            &self.z_rotation,
        ]
    }

    fn channels_mut(&mut self) -> [&mut Vec<f64>; 8] {
        [
            &mut self.x_position,
            &mut self.y_position,
            &mut self.z_position,
            &mut self.x_scale,
            &mut self.y_scale,
            &mut self.x_rotation,
            &mut self.y_rotation,
            &mut self.z_rotation,
        ]
    }
}

/// Whether `text` carries the keyframe data signature
#[must_use]
pub fn is_keyframe_data(text: &str) -> bool {
    text.lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .is_some_and(|first| first.contains("Adobe After Effects") && first.contains("Keyframe Data"))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    None,
    Position,
    Scale,
    XRotation,
    YRotation,
    ZRotation,
    Other,
}

/// Parse keyframe text, scaling positions from the source frame to `res_x` x `res_y`
///
/// # Errors
///
/// Returns `MotionError::DataParse` when the signature, the source
/// dimensions or the position rows are missing, or a channel has more rows
/// than the Position section.
pub fn parse_keyframes(text: &str, res_x: f64, res_y: f64) -> Result<KeyframeSeries> {
    if !is_keyframe_data(text) {
        return Err(MotionError::data_parse("missing After Effects keyframe header"));
    }

    let mut series = KeyframeSeries::default();
    let mut section = Section::None;

    for line in text.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        if let Some(value) = metadata(trimmed, "Source Width") {
            series.source_width = value;
            continue;
        }
        if let Some(value) = metadata(trimmed, "Source Height") {
            series.source_height = value;
            continue;
        }
        if let Some(value) = metadata(trimmed, "Units Per Second") {
            series.frame_rate = value;
            continue;
        }

        if !line.starts_with([' ', '\t']) {
            section = match trimmed {
                "Position" => Section::Position,
                "Scale" => Section::Scale,
                "X Rotation" => Section::XRotation,
                "Y Rotation" => Section::YRotation,
                "Rotation" | "Z Rotation" => Section::ZRotation,
                "End of Keyframe Data" => break,
                _ => Section::Other,
            };
            continue;
        }

        let Some(fields) = data_row(trimmed) else {
            continue;
        };
        match section {
            Section::Position if fields.len() >= 3 => {
                series.x_position.push(fields[1]);
                series.y_position.push(fields[2]);
                series.z_position.push(fields.get(3).copied().unwrap_or_default());
            }
            Section::Scale if fields.len() >= 2 => {
                series.x_scale.push(fields[1]);
                if let Some(y) = fields.get(2) {
                    series.y_scale.push(*y);
                }
            }
            Section::XRotation if fields.len() >= 2 => series.x_rotation.push(-fields[1]),
            Section::YRotation if fields.len() >= 2 => series.y_rotation.push(-fields[1]),
            Section::ZRotation if fields.len() >= 2 => series.z_rotation.push(-fields[1]),
            _ => {}
        }
    }

    if series.source_width <= 0.0 || series.source_height <= 0.0 {
        return Err(MotionError::data_parse("source width/height missing or zero"));
    }

    let n = series.x_position.len();
    if n == 0 {
        return Err(MotionError::data_parse("no position data"));
    }

    let x_factor = res_x / series.source_width;
    let y_factor = res_y / series.source_height;
    for x in &mut series.x_position {
        *x *= x_factor;
    }
    for y in &mut series.y_position {
        *y *= y_factor;
    }

    back_fill(&mut series.x_scale, n, |_| 100.0)?;
    let x_scale = series.x_scale.clone();
    back_fill(&mut series.y_scale, n, |i| x_scale[i])?;
    back_fill(&mut series.x_rotation, n, |_| 0.0)?;
    back_fill(&mut series.y_rotation, n, |_| 0.0)?;
    back_fill(&mut series.z_rotation, n, |_| 0.0)?;

    if !series.is_valid() {
        return Err(MotionError::data_parse("channel lengths differ"));
    }
    Ok(series)
}

fn metadata(line: &str, key: &str) -> Option<f64> {
    let rest = line.strip_prefix(key)?;
    rest.split_whitespace().last()?.parse().ok()
}

fn data_row(line: &str) -> Option<Vec<f64>> {
    let fields: Option<Vec<f64>> = line.split_whitespace().map(|f| f.parse().ok()).collect();
    fields.filter(|fields| !fields.is_empty())
}

fn back_fill(channel: &mut Vec<f64>, n: usize, fill: impl Fn(usize) -> f64) -> Result<()> {
    if channel.len() > n {
        return Err(MotionError::data_parse(format!(
            "channel has {} rows but position has {n}",
            channel.len()
        )));
    }
    for i in channel.len()..n {
        channel.push(fill(i));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "Adobe After Effects 6.0 Keyframe Data\n\n\tUnits Per Second\t25\n\tSource Width\t200\n\tSource Height\t100\n\tSource Pixel Aspect Ratio\t1\n\nPosition\n\tFrame\tX pixels\tY pixels\tZ pixels\n\t0\t100\t50\t0\n\t1\t110\t55\t0\n\t2\t120\t60\t0\n\nScale\n\tFrame\tX percent\tY percent\tZ percent\n\t0\t100\t100\t100\n\t1\t110\t120\t100\n\nRotation\n\tFrame\tDegrees\n\t0\t0\n\t1\t5\n\t2\t10\n\nEnd of Keyframe Data\n";

    #[test]
    fn parse_sample() {
        let series = parse_keyframes(SAMPLE, 400.0, 100.0).unwrap();
        assert_eq!(series.len(), 3);
        assert!(series.is_valid());
        assert_eq!(series.x_position, vec![200.0, 220.0, 240.0]);
        assert_eq!(series.y_position, vec![50.0, 55.0, 60.0]);
        assert_eq!(series.z_rotation, vec![0.0, -5.0, -10.0]);
        assert_eq!(series.frame_rate, 25.0);
    }

    #[test]
    fn short_channels_are_back_filled() {
        let series = parse_keyframes(SAMPLE, 200.0, 100.0).unwrap();
        assert_eq!(series.x_scale, vec![100.0, 110.0, 100.0]);
        assert_eq!(series.y_scale, vec![100.0, 120.0, 100.0]);
        assert_eq!(series.x_rotation, vec![0.0; 3]);
        assert_eq!(series.y_rotation, vec![0.0; 3]);
    }

    #[test]
    fn y_scale_copies_x_scale() {
        let text = "Adobe After Effects 6.0 Keyframe Data\n\tSource Width\t10\n\tSource Height\t10\nPosition\n\t0\t1\t1\n\t1\t2\t2\nScale\n\t0\t150\nEnd of Keyframe Data\n";
        let series = parse_keyframes(text, 10.0, 10.0).unwrap();
        assert_eq!(series.x_scale, vec![150.0, 100.0]);
        assert_eq!(series.y_scale, vec![150.0, 100.0]);
    }

    #[test]
    fn missing_dimensions_fail() {
        let text = "Adobe After Effects 6.0 Keyframe Data\nPosition\n\t0\t1\t1\n";
        assert!(matches!(
            parse_keyframes(text, 10.0, 10.0),
            Err(MotionError::DataParse { .. })
        ));
    }

    #[test]
    fn extra_rows_fail_validation() {
        let text = "Adobe After Effects 6.0 Keyframe Data\n\tSource Width\t10\n\tSource Height\t10\nPosition\n\t0\t1\t1\nRotation\n\t0\t1\n\t1\t2\n";
        assert!(parse_keyframes(text, 10.0, 10.0).is_err());
    }

    #[test]
    fn signature_detection() {
        assert!(is_keyframe_data("\n  Adobe After Effects 6.0 Keyframe Data\n"));
        assert!(!is_keyframe_data("shake_shape_data 4.0"));
    }

    #[test]
    fn reverse_in_place() {
        let mut series = parse_keyframes(SAMPLE, 200.0, 100.0).unwrap();
        series.reverse();
        assert_eq!(series.x_position, vec![120.0, 110.0, 100.0]);
        assert_eq!(series.sample(0).z_rotation, -10.0);
    }
}
