//! Flat per-shape summary as CSV.

use crate::ExportInput;
use fieldmap_core::calibration::measure;

pub const HEADER: [&str; 7] = ["ID", "Type", "Name", "Measurement", "QualitativeType", "Tags", "Notes"];

/// Quote a field when it contains a delimiter, quote or line break.
pub fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn write_row(out: &mut String, fields: &[&str]) {
    let row: Vec<String> = fields.iter().map(|f| escape_field(f)).collect();
    out.push_str(&row.join(","));
    out.push('\n');
}

/// One row per shape, in insertion order.
pub fn to_csv(input: &ExportInput) -> String {
    let mut out = String::new();
    write_row(&mut out, &HEADER);
    for object in input.scene.objects() {
        let id = object.id.to_string();
        let measurement = measure(object, input.calibration).format();
        let tags = object.metadata.tags.join("; ");
        let qualitative = object.metadata.qualitative_type.as_deref().unwrap_or("");
        write_row(
            &mut out,
            &[
                id.as_str(),
                object.kind().label(),
                object.name.as_str(),
                measurement.as_str(),
                qualitative,
                tags.as_str(),
                object.metadata.notes.as_str(),
            ],
        );
    }
    out
}
