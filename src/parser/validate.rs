use crate::error::ValidationError;
use crate::types::{FieldMap, TemplateDescription};

/// Fields every template block must provide, in reporting order.
pub const REQUIRED_FIELDS: [&str; 3] = ["binding", "title", "description"];

/// Check a parsed block against [`REQUIRED_FIELDS`] and build the template.
///
/// Every missing or empty field is reported at once. Unknown fields are
/// ignored.
pub fn validate_fields(
    package: &str,
    fields: &FieldMap,
) -> Result<TemplateDescription, ValidationError> {
    let missing: Vec<&'static str> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| fields.get(*field).map_or(true, |value| value.is_empty()))
        .collect();

    if !missing.is_empty() {
        return Err(ValidationError { missing });
    }

    Ok(TemplateDescription::new(
        package,
        &fields["binding"],
        &fields["title"],
        &fields["description"],
    ))
}
