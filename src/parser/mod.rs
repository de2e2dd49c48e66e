pub mod dcf;
pub mod validate;

pub use dcf::{normalize_line_endings, parse_block, parse_blocks, DcfBlocks};
pub use validate::{validate_fields, REQUIRED_FIELDS};

use crate::error::TemplateError;
use crate::types::TemplateDescription;

/// Parse and validate every block of a template file.
///
/// Each block yields either a template or the reason it was rejected.
pub fn parse_templates<'a>(
    package: &'a str,
    contents: &'a str,
) -> impl Iterator<Item = Result<TemplateDescription, TemplateError>> + 'a {
    parse_blocks(contents).map(move |block| -> Result<TemplateDescription, TemplateError> {
        let fields = block?;
        Ok(validate_fields(package, &fields)?)
    })
}
