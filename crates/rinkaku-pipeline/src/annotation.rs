//! Boundary annotation parsing.
//!
//! An annotation file is plain text with one polygon vertex per line,
//! each line holding two whitespace-separated floating-point numbers
//! (`x y`). Vertex order defines the polygon and is preserved exactly.
//!
//! An empty file parses to an empty [`Contour`] — that is valid input and
//! signals "no boundary present" (outer boundaries are optional).

use crate::types::{Contour, Point};

/// Errors raised while parsing a boundary annotation.
#[derive(Debug, thiserror::Error)]
pub enum AnnotationError {
    /// A line did not split into exactly two fields.
    #[error("line {line}: expected two coordinate fields, found {found}")]
    WrongFieldCount {
        /// 1-based line number.
        line: usize,
        /// Number of whitespace-separated fields on the line.
        found: usize,
    },

    /// A coordinate field was not a valid floating-point number.
    #[error("line {line}: invalid coordinate '{field}'")]
    InvalidCoordinate {
        /// 1-based line number.
        line: usize,
        /// The offending field text.
        field: String,
    },
}

/// Parse annotation text into an ordered vertex sequence.
///
/// One vertex per line, two whitespace-separated numeric fields per line.
/// Blank lines (including a trailing newline) are tolerated. No
/// deduplication and no reordering is performed.
///
/// # Errors
///
/// Returns [`AnnotationError::WrongFieldCount`] if a non-blank line does
/// not contain exactly two fields, and
/// [`AnnotationError::InvalidCoordinate`] if a field does not parse as a
/// floating-point number.
pub fn parse_contour(text: &str) -> Result<Contour, AnnotationError> {
    let mut points = Vec::new();

    for (index, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [x_field, y_field] = fields.as_slice() else {
            return Err(AnnotationError::WrongFieldCount {
                line: index + 1,
                found: fields.len(),
            });
        };

        let x = parse_coordinate(x_field, index + 1)?;
        let y = parse_coordinate(y_field, index + 1)?;
        points.push(Point::new(x, y));
    }

    Ok(Contour::new(points))
}

fn parse_coordinate(field: &str, line: usize) -> Result<f64, AnnotationError> {
    field
        .parse()
        .map_err(|_| AnnotationError::InvalidCoordinate {
            line,
            field: field.to_owned(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parses_vertices_in_file_order() {
        let contour = parse_contour("120.50 137.50\n121.00 136.50\n119.00 138.00\n").unwrap();
        assert_eq!(
            contour.points(),
            &[
                Point::new(120.5, 137.5),
                Point::new(121.0, 136.5),
                Point::new(119.0, 138.0),
            ]
        );
    }

    #[test]
    fn empty_input_yields_empty_contour() {
        let contour = parse_contour("").unwrap();
        assert!(contour.is_empty());
    }

    #[test]
    fn blank_lines_and_trailing_newline_are_tolerated() {
        let contour = parse_contour("1.0 2.0\n\n3.0 4.0\n").unwrap();
        assert_eq!(contour.len(), 2);
    }

    #[test]
    fn tabs_and_repeated_spaces_split_like_single_spaces() {
        let contour = parse_contour("1.0\t2.0\n3.0   4.0\n").unwrap();
        assert_eq!(
            contour.points(),
            &[Point::new(1.0, 2.0), Point::new(3.0, 4.0)]
        );
    }

    #[test]
    fn one_field_line_is_rejected_with_line_number() {
        let err = parse_contour("1.0 2.0\n3.0\n").unwrap_err();
        assert!(matches!(
            err,
            AnnotationError::WrongFieldCount { line: 2, found: 1 }
        ));
    }

    #[test]
    fn three_field_line_is_rejected() {
        let err = parse_contour("1.0 2.0 3.0\n").unwrap_err();
        assert!(matches!(
            err,
            AnnotationError::WrongFieldCount { line: 1, found: 3 }
        ));
    }

    #[test]
    fn non_numeric_field_is_rejected() {
        let err = parse_contour("1.0 2.0\nabc 4.0\n").unwrap_err();
        assert!(matches!(
            err,
            AnnotationError::InvalidCoordinate { line: 2, ref field } if field == "abc"
        ));
    }
}
