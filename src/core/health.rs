/// Severity classification for metric readings
///
/// A reading falls into one of three bands depending on two cutoffs.
/// Each request is classified on its own; there is no smoothing.

use axum::http::StatusCode;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Ok,
    Warning,
    Critical,
}

impl Severity {
    /// HTTP status reported for this band
    pub fn status_code(&self) -> StatusCode {
        match self {
            Severity::Ok => StatusCode::OK,
            Severity::Warning => StatusCode::TOO_MANY_REQUESTS,
            Severity::Critical => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Process exit code for one-shot checks
    pub fn exit_code(&self) -> i32 {
        match self {
            Severity::Ok => 0,
            Severity::Warning => 1,
            Severity::Critical => 2,
        }
    }
}

/// Pair of cutoffs: below `ok_ceiling` is Ok, above `warn_ceiling` is Critical
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub ok_ceiling: f64,
    pub warn_ceiling: f64,
}

impl Thresholds {
    pub const fn new(ok_ceiling: f64, warn_ceiling: f64) -> Self {
        Self { ok_ceiling, warn_ceiling }
    }

    pub fn classify(&self, value: f64) -> Severity {
        classify(value, self.ok_ceiling, self.warn_ceiling)
    }
}

/// Both ceilings are inclusive of the Warning band.
pub fn classify(value: f64, ok_ceiling: f64, warn_ceiling: f64) -> Severity {
    if value < ok_ceiling {
        Severity::Ok
    } else if value <= warn_ceiling {
        Severity::Warning
    } else {
        Severity::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percentage_boundaries() {
        let t = Thresholds::new(70.0, 90.0);
        assert_eq!(t.classify(0.0), Severity::Ok);
        assert_eq!(t.classify(69.0), Severity::Ok);
        assert_eq!(t.classify(69.9), Severity::Ok);
        assert_eq!(t.classify(70.0), Severity::Warning);
        assert_eq!(t.classify(90.0), Severity::Warning);
        assert_eq!(t.classify(90.1), Severity::Critical);
        assert_eq!(t.classify(91.0), Severity::Critical);
    }

    #[test]
    fn test_thread_count_boundaries() {
        assert_eq!(classify(3999.0, 4000.0, 5000.0), Severity::Ok);
        assert_eq!(classify(4000.0, 4000.0, 5000.0), Severity::Warning);
        assert_eq!(classify(5000.0, 4000.0, 5000.0), Severity::Warning);
        assert_eq!(classify(5001.0, 4000.0, 5000.0), Severity::Critical);
    }

    #[test]
    fn test_bands_partition_the_range() {
        let (a, b) = (10.0, 20.0);
        for v in -5..30 {
            let v = v as f64;
            let expected = if v < a {
                Severity::Ok
            } else if v <= b {
                Severity::Warning
            } else {
                Severity::Critical
            };
            assert_eq!(classify(v, a, b), expected, "value {}", v);
        }
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(Severity::Ok.status_code(), StatusCode::OK);
        assert_eq!(Severity::Warning.status_code().as_u16(), 429);
        assert_eq!(Severity::Critical.status_code().as_u16(), 500);
    }
}
