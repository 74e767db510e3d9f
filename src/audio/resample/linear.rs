//! `resample/linear.rs`: linear-interpolation sample-rate conversion over
//! planar `f32` data. State carries across blocks so consecutive calls join
//! without clicks.

pub struct LinearResampler {
    /// Source / target ratio (< 1.0 upsamples, > 1.0 downsamples).
    ratio: f64,
    /// Fractional read head within the current input block.
    index: f64,
    /// Last sample of the previous block (per channel) for cross-block interpolation.
    last_samples: Vec<f32>,
}

impl LinearResampler {
    pub fn new(source_rate: u32, target_rate: u32, channels: usize) -> Self {
        Self {
            ratio: source_rate as f64 / target_rate as f64,
            index: 0.0,
            last_samples: vec![0.0; channels],
        }
    }

    /// Upper bound on output samples per channel for `input_samples` of input.
    pub fn max_output(&self, input_samples: usize) -> usize {
        (input_samples as f64 / self.ratio).ceil() as usize + 1
    }

    /// Resample every plane of `input` into the matching plane of `output`
    /// (cleared first). All input planes must be the same length.
    pub fn process(&mut self, input: &[Vec<f32>], output: &mut [Vec<f32>]) {
        let num_frames = input.first().map_or(0, Vec::len);
        for plane in output.iter_mut() {
            plane.clear();
        }

        while self.index < num_frames as f64 {
            let idx = self.index as usize;
            let fract = self.index.fract() as f32;

            for (c, plane) in input.iter().enumerate() {
                let s1 = if idx == 0 {
                    self.last_samples[c]
                } else {
                    plane[idx - 1]
                };
                let s2 = plane[idx.min(num_frames - 1)];
                output[c].push(s1 * (1.0 - fract) + s2 * fract);
            }

            self.index += self.ratio;
        }

        self.index -= num_frames as f64;

        if num_frames > 0 {
            for (c, plane) in input.iter().enumerate() {
                self.last_samples[c] = plane[num_frames - 1];
            }
        }
    }

    pub fn reset(&mut self) {
        self.index = 0.0;
        self.last_samples.fill(0.0);
    }

    pub fn is_passthrough(&self) -> bool {
        (self.ratio - 1.0).abs() < f64::EPSILON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn downsample_by_two_halves_the_count() {
        let mut r = LinearResampler::new(16_000, 8_000, 1);
        let input = vec![vec![0.5f32; 320]];
        let mut output = vec![Vec::new()];
        r.process(&input, &mut output);
        assert_eq!(output[0].len(), 160);
    }

    #[test]
    fn upsample_stays_within_bound() {
        let mut r = LinearResampler::new(44_100, 48_000, 2);
        let input = vec![vec![0.25f32; 1024], vec![-0.25f32; 1024]];
        let mut output = vec![Vec::new(), Vec::new()];
        r.process(&input, &mut output);
        assert!(output[0].len() <= r.max_output(1024));
        assert!(output[0].len() >= 1114);
        assert_eq!(output[0].len(), output[1].len());
    }

    #[test]
    fn passthrough_detection() {
        assert!(LinearResampler::new(48_000, 48_000, 2).is_passthrough());
        assert!(!LinearResampler::new(44_100, 48_000, 2).is_passthrough());
    }
}
