//! Pure decision logic over decoded images.

mod border_scanner;
mod transform_decider;

pub use border_scanner::{BorderMeasurement, BorderScanner, ScanConfig};
pub use transform_decider::{
    CalibratedRegion, DeciderConfig, TransformAction, TransformDecider, TransformDecision,
    base_name, fit_inside,
};
