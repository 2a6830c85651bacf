//! Output file naming

use crate::api::PriceRecord;

/// Characters that cannot appear in a file name on common filesystems
pub const UNSAFE_FILE_NAME_CHARS: [char; 9] = ['<', '>', '\\', '/', '|', '?', '*', ':', '"'];

/// Replaces every filesystem-unsafe character with a space
pub fn sanitize_file_component(name: &str) -> String {
    name.chars()
        .map(|c| {
            if UNSAFE_FILE_NAME_CHARS.contains(&c) {
                ' '
            } else {
                c
            }
        })
        .collect()
}

/// Builds `"{fipeCode} - {brand} - {model}.xlsx"` for a record's batch
pub fn output_file_name(record: &PriceRecord) -> String {
    format!(
        "{} - {} - {}.xlsx",
        sanitize_file_component(&record.fipe_code),
        sanitize_file_component(&record.brand),
        sanitize_file_component(&record.model)
    )
}
