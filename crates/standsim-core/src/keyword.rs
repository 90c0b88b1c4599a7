//! Fixed-column keyword records.
//!
//! The simulator reads a keyword in columns 1-10 followed by numeric fields,
//! each occupying the next 10 columns.

use crate::error::{Result, StandsimError};

pub const FIELD_WIDTH: usize = 10;

/// Render one keyword record: keyword left-aligned, fields right-aligned.
///
/// Every field keeps at least one leading blank so adjacent columns never
/// run together; a value that needs the whole field is rejected.
pub fn record<S: AsRef<str>>(keyword: &str, fields: &[S]) -> Result<String> {
    let mut line = format!("{keyword:<width$}", width = FIELD_WIDTH);
    for field in fields {
        let value = field.as_ref();
        if value.len() >= FIELD_WIDTH {
            return Err(StandsimError::FieldTooWide {
                keyword: keyword.to_string(),
                value: value.to_string(),
            });
        }
        line.push_str(&format!("{value:>width$}", width = FIELD_WIDTH));
    }
    Ok(line)
}

/// Shortest form of a number: `60`, `0.5`.
pub fn plain(value: f64) -> String {
    format!("{value}")
}

/// A number that always carries a fractional part: `1.0`, `999.0`, `0.25`.
pub fn decimal(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_pads_to_columns() {
        let line = record("NUMCYCLE", &["10"]).unwrap();
        assert_eq!(line, "NUMCYCLE          10");
        assert_eq!(line.len(), 2 * FIELD_WIDTH);
    }

    #[test]
    fn record_without_fields_is_just_keyword() {
        assert_eq!(record::<&str>("PROCESS", &[]).unwrap().trim_end(), "PROCESS");
    }

    #[test]
    fn widest_accepted_field_keeps_a_blank() {
        let line = record("ThinBBA", &["1", "123456789"]).unwrap();
        assert_eq!(&line[20..30], " 123456789");
    }

    #[test]
    fn overlong_field_is_rejected() {
        let err = record("ThinBBA", &["1", "1234567890"]).unwrap_err();
        assert!(matches!(
            err,
            StandsimError::FieldTooWide { ref keyword, ref value }
                if keyword == "ThinBBA" && value == "1234567890"
        ));
    }

    #[test]
    fn plain_drops_trailing_zero() {
        assert_eq!(plain(60.0), "60");
        assert_eq!(plain(0.5), "0.5");
    }

    #[test]
    fn decimal_forces_fraction() {
        assert_eq!(decimal(1.0), "1.0");
        assert_eq!(decimal(999.0), "999.0");
        assert_eq!(decimal(0.25), "0.25");
    }
}
