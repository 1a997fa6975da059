//! Artifact metrics: compare input and output byte sizes.
//!
//! Pure arithmetic, no I/O. The input size used here is the one the
//! controller captured when the session's first run was accepted, so savings
//! percentages stay comparable across reactive re-runs on the same files.

use serde::{Deserialize, Serialize};

/// Whether the transformation shrank, grew, or kept the payload size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeDirection {
    /// Output is smaller than input.
    Saved,
    /// Output is larger than input (e.g. an already-optimised PDF).
    Increased,
    /// Sizes are equal, or the input size was zero.
    Unchanged,
}

/// Result of comparing input and output sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeComparison {
    /// Absolute difference in bytes.
    pub delta: u64,
    /// Rounded percentage: saved relative to input, or increase relative to input.
    pub delta_percent: u32,
    pub direction: SizeDirection,
}

/// Compare recorded input size against artifact output size.
///
/// `input_size = 0` yields `Unchanged` with a zero percentage rather than
/// dividing by zero.
pub fn compare(input_size: u64, output_size: u64) -> SizeComparison {
    if input_size == 0 || input_size == output_size {
        return SizeComparison {
            delta: output_size.abs_diff(input_size),
            delta_percent: 0,
            direction: SizeDirection::Unchanged,
        };
    }

    let delta = input_size.abs_diff(output_size);
    if output_size < input_size {
        // round((1 - out/in) * 100)
        let percent = (1.0 - output_size as f64 / input_size as f64) * 100.0;
        SizeComparison {
            delta,
            delta_percent: percent.round() as u32,
            direction: SizeDirection::Saved,
        }
    } else {
        // round((out/in - 1) * 100)
        let percent = (output_size as f64 / input_size as f64 - 1.0) * 100.0;
        SizeComparison {
            delta,
            delta_percent: percent.round() as u32,
            direction: SizeDirection::Increased,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_input_is_unchanged() {
        for output in [0, 1, 1_000_000] {
            let c = compare(0, output);
            assert_eq!(c.direction, SizeDirection::Unchanged);
            assert_eq!(c.delta_percent, 0);
        }
    }

    #[test]
    fn equal_sizes_are_unchanged() {
        let c = compare(4096, 4096);
        assert_eq!(c.direction, SizeDirection::Unchanged);
        assert_eq!(c.delta, 0);
        assert_eq!(c.delta_percent, 0);
    }

    #[test]
    fn saved_forty_percent() {
        let c = compare(100, 60);
        assert_eq!(c.direction, SizeDirection::Saved);
        assert_eq!(c.delta, 40);
        assert_eq!(c.delta_percent, 40);
    }

    #[test]
    fn increased_is_relative_to_input() {
        // (100/60 - 1) * 100 ≈ 66.67, rounds to 67
        let c = compare(60, 100);
        assert_eq!(c.direction, SizeDirection::Increased);
        assert_eq!(c.delta, 40);
        assert_eq!(c.delta_percent, 67);
    }

    #[test]
    fn compress_scenario_five_to_three_megabytes() {
        let c = compare(5_000_000, 3_000_000);
        assert_eq!(c.direction, SizeDirection::Saved);
        assert_eq!(c.delta, 2_000_000);
        assert_eq!(c.delta_percent, 40);
    }
}
