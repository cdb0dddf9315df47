//! Zip bundle: project document, CSV summary, photos and journey strips.

use crate::ExportInput;
use crate::csv::to_csv;
use crate::error::ExportResult;
use crate::json::ProjectDocument;
use crate::photo_strip::{self, StripOptions};
use std::collections::HashSet;
use std::io::{Cursor, Seek, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

/// File name for a journey strip, unique within the bundle.
fn journey_file_name(name: &str, fallback: &str, taken: &mut HashSet<String>) -> String {
    let cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | ' ') { c } else { '_' })
        .collect();
    let base = if cleaned.trim().is_empty() {
        fallback.to_string()
    } else {
        cleaned.trim().to_string()
    };
    let mut candidate = base.clone();
    let mut n = 2;
    while !taken.insert(candidate.clone()) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    format!("journeys/{candidate}.png")
}

/// Write the bundle into `writer` and hand it back.
///
/// Photos are extracted to `photos/<object-id>_<n>.<ext>` and the embedded
/// data in `project.json` is replaced by that path.
pub fn write_bundle<W: Write + Seek>(input: &ExportInput, writer: W, strip: &StripOptions) -> ExportResult<W> {
    let mut zip = ZipWriter::new(writer);
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Deflated);
    let mut document = ProjectDocument::build(input);

    for record in &mut document.objects {
        for (i, photo) in record.metadata.photos.iter_mut().enumerate() {
            let path = format!("photos/{}_{}.{}", record.id, i + 1, photo.extension());
            match photo.decode() {
                Ok(bytes) => {
                    zip.start_file(path.as_str(), options)?;
                    zip.write_all(&bytes)?;
                    photo.data = path;
                }
                Err(e) => log::warn!("Photo '{}' of {} is not valid base64: {}", photo.name, record.name, e),
            }
        }
    }

    zip.start_file("project.json", options)?;
    zip.write_all(document.to_json()?.as_bytes())?;

    zip.start_file("summary.csv", options)?;
    zip.write_all(to_csv(input).as_bytes())?;

    let mut taken = HashSet::new();
    for sequence in input.sequences.iter() {
        let Some(png) = photo_strip::render_png(sequence, input.scene, strip)? else {
            continue;
        };
        let path = journey_file_name(&sequence.name, &sequence.id.to_string(), &mut taken);
        zip.start_file(path.as_str(), SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored))?;
        zip.write_all(&png)?;
    }

    let writer = zip.finish()?;
    log::info!("Exported project {} ({} shapes)", input.project.name, input.scene.len());
    Ok(writer)
}

/// The bundle as an in-memory zip.
pub fn bundle(input: &ExportInput) -> ExportResult<Vec<u8>> {
    let cursor = write_bundle(input, Cursor::new(Vec::new()), &StripOptions::default())?;
    Ok(cursor.into_inner())
}
