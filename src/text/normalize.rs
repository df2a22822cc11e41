//! Text canonicalization ahead of segmentation.

use crate::error::{Result, VoxcastError};

/// Normalize raw input text.
///
/// Line endings become `\n`, trailing spaces and tabs are stripped from every
/// line, and the whole text is trimmed. Blank input is rejected with
/// [`VoxcastError::EmptyInput`]; `source_name` ends up in that error.
pub fn normalize(raw: &str, source_name: &str) -> Result<String> {
    let unified = raw.replace("\r\n", "\n").replace('\r', "\n");

    let stripped = unified
        .split('\n')
        .map(|line| line.trim_end_matches([' ', '\t']))
        .collect::<Vec<_>>()
        .join("\n");

    let trimmed = stripped.trim();
    if trimmed.is_empty() {
        return Err(VoxcastError::EmptyInput {
            source_name: source_name.to_string(),
        });
    }

    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crlf_becomes_lf() {
        let text = normalize("Hola.\r\nAdiós.", "test").unwrap();
        assert_eq!(text, "Hola.\nAdiós.");
    }

    #[test]
    fn lone_cr_becomes_lf() {
        let text = normalize("uno\rdos", "test").unwrap();
        assert_eq!(text, "uno\ndos");
    }

    #[test]
    fn trailing_horizontal_whitespace_is_stripped_per_line() {
        let text = normalize("primera \t\nsegunda  \n\ntercera\t", "test").unwrap();
        assert_eq!(text, "primera\nsegunda\n\ntercera");
    }

    #[test]
    fn leading_whitespace_inside_lines_is_kept() {
        let text = normalize("a\n  indented", "test").unwrap();
        assert_eq!(text, "a\n  indented");
    }

    #[test]
    fn whole_text_is_trimmed() {
        let text = normalize("\n\n   Hola mundo.   \n\n", "test").unwrap();
        assert_eq!(text, "Hola mundo.");
    }

    #[test]
    fn whitespace_lines_collapse_into_blank_separators() {
        // A line of spaces between paragraphs must end up a true blank line.
        let text = normalize("uno\n   \ndos", "test").unwrap();
        assert_eq!(text, "uno\n\ndos");
    }

    #[test]
    fn blank_input_is_rejected() {
        for raw in ["", "   ", "\r\n\t\n", " \t \r "] {
            match normalize(raw, "es_text.txt") {
                Err(VoxcastError::EmptyInput { source_name }) => {
                    assert_eq!(source_name, "es_text.txt");
                }
                other => panic!("expected EmptyInput for {:?}, got {:?}", raw, other),
            }
        }
    }

    #[test]
    fn normalization_is_idempotent() {
        let inputs = [
            "Hola.\r\n\r\nSegundo párrafo. \t\r\nFin.",
            "  a  \n\n\n b \r c\t",
            "Una sola línea.",
            "x\n \n \ny",
        ];
        for raw in inputs {
            let once = normalize(raw, "test").unwrap();
            let twice = normalize(&once, "test").unwrap();
            assert_eq!(once, twice, "not idempotent for {:?}", raw);
        }
    }
}
