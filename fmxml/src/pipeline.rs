use fmscript::{Parser, Step, Warning, validate};
use log::debug;

use crate::error::ComposeError;
use crate::serialize::to_snippet;

/// A successfully composed snippet.
#[derive(Debug, Clone)]
pub struct Composed {
    pub xml: String,
    pub steps: Vec<Step>,
    pub warnings: Vec<Warning>,
}

/// Script text to snippet XML: parse, validate, encode.
pub fn compose(text: &str) -> Result<Composed, ComposeError> {
    compose_file(text, 0)
}

/// Same as [`compose`], with recognition diagnostics labelled against `file_id`.
pub fn compose_file(text: &str, file_id: usize) -> Result<Composed, ComposeError> {
    let script = Parser::new(text.to_string(), file_id)
        .parse()
        .map_err(ComposeError::Recognition)?;

    let validation = validate(&script.steps);
    if !validation.is_valid() {
        return Err(ComposeError::Structure(validation));
    }

    let xml = to_snippet(&script.steps);
    debug!("composed {} steps into {} bytes", script.steps.len(), xml.len());
    Ok(Composed {
        xml,
        steps: script.steps,
        warnings: validation.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognition_errors_stop_before_validation() {
        let Err(ComposeError::Recognition(errors)) = compose("If [ 1 ]\nBogus step") else {
            panic!("expected recognition errors");
        };
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].line, 2);
    }

    #[test]
    fn structural_errors_are_all_reported() {
        let Err(ComposeError::Structure(result)) = compose("End If\nIf [ 1 ]") else {
            panic!("expected structural errors");
        };
        assert_eq!(result.errors.len(), 2);
    }

    #[test]
    fn empty_input_warns_but_succeeds() {
        let composed = compose("\n\n").unwrap();
        assert!(composed.steps.is_empty());
        assert_eq!(composed.warnings.len(), 1);
        assert_eq!(composed.xml, r#"<fmxmlsnippet type="FMObjectList"></fmxmlsnippet>"#);
    }
}
