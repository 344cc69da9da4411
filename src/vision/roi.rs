use crate::error::PipelineError;
use crate::models::{ReferenceRoi, ReferenceSize, ResolvedRoi};

/// Map a reference-frame ROI onto a frame of `actual_width` x `actual_height`.
///
/// Each axis scales independently, so a reference size with a different aspect
/// ratio than the captured frame stretches the ROI rather than letterboxing it.
/// The result is clamped to the frame; a rectangle that collapses to zero area
/// is reported as [`PipelineError::EmptyRegion`].
pub fn resolve(
    actual_width: u32,
    actual_height: u32,
    roi: &ReferenceRoi,
    reference: &ReferenceSize,
) -> Result<ResolvedRoi, PipelineError> {
    let empty = PipelineError::EmptyRegion {
        width: actual_width,
        height: actual_height,
    };
    if actual_width == 0 || actual_height == 0 || reference.width == 0 || reference.height == 0 {
        return Err(empty);
    }

    let scale_x = actual_width as f64 / reference.width as f64;
    let scale_y = actual_height as f64 / reference.height as f64;

    let x1 = scaled(roi.x, scale_x);
    let y1 = scaled(roi.y, scale_y);
    let x2 = x1 + scaled(roi.w, scale_x);
    let y2 = y1 + scaled(roi.h, scale_y);

    let width = actual_width as i64;
    let height = actual_height as i64;
    let x1 = x1.clamp(0, width - 1);
    let x2 = x2.clamp(1, width);
    let y1 = y1.clamp(0, height - 1);
    let y2 = y2.clamp(1, height);

    if x1 >= x2 || y1 >= y2 {
        return Err(empty);
    }

    Ok(ResolvedRoi {
        x1: x1 as u32,
        y1: y1 as u32,
        x2: x2 as u32,
        y2: y2 as u32,
    })
}

fn scaled(value: u32, scale: f64) -> i64 {
    (value as f64 * scale).round() as i64
}
