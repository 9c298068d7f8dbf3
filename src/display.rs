use std::{fmt::Display, time::Duration};

/// Wall time of one reordering pass and the triangle rate it achieved.
pub struct Timing {
    pub elapsed: Duration,
    pub triangles: usize,
}

impl Timing {
    /// Millions of triangles per second, `None` when the clock did not advance.
    pub fn mtris_per_sec(&self) -> Option<f64> {
        let secs = self.elapsed.as_secs_f64();
        (secs > 0.0).then(|| self.triangles as f64 / secs / 1e6)
    }
}

impl Display for Timing {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let nanos = self.elapsed.as_nanos();
        match nanos {
            0..=999 => write!(f, "{}ns", nanos)?,
            1_000..=999_999 => write!(f, "{:.2}us", nanos as f64 / 1e3)?,
            1_000_000..=999_999_999 => write!(f, "{:.2}ms", nanos as f64 / 1e6)?,
            _ => write!(f, "{:.2}s", nanos as f64 / 1e9)?,
        }
        match self.mtris_per_sec() {
            Some(rate) => write!(f, " ({:.2} Mtri/s)", rate),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn timing(elapsed: Duration, triangles: usize) -> String {
        Timing { elapsed, triangles }.to_string()
    }

    #[test]
    fn picks_unit_by_magnitude() {
        assert_eq!(timing(Duration::from_nanos(500), 0), "500ns (0.00 Mtri/s)");
        assert_eq!(timing(Duration::from_nanos(1500), 3), "1.50us (2.00 Mtri/s)");
        assert_eq!(timing(Duration::from_micros(2500), 5_000), "2.50ms (2.00 Mtri/s)");
        assert_eq!(timing(Duration::from_millis(1500), 3_000_000), "1.50s (2.00 Mtri/s)");
    }

    #[test]
    fn zero_duration_has_no_rate() {
        assert_eq!(timing(Duration::ZERO, 12), "0ns");
    }
}
