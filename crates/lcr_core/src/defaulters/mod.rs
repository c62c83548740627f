use std::path::Path;

use tracing::warn;

use crate::error::AppError;
use crate::rules::LandlordScreening;

// CSV column holding the listed person's name.
const NAME_HEADER: &str = "성명";

fn normalize_name(raw: &str) -> String {
    raw.split_whitespace().collect::<String>()
}

/// Screen a landlord name against the habitual defaulter list.
///
/// The list is a delimited table with a name column; comparison ignores
/// whitespace. An unreadable list is a recoverable condition surfaced as
/// `ListUnavailable`, never a hard failure of the analysis.
pub fn screen_landlord(list_path: &Path, landlord_name: &str) -> LandlordScreening {
    let name = normalize_name(landlord_name);
    if name.is_empty() {
        return LandlordScreening::NameNotFound;
    }

    match scan_list(list_path, &name) {
        Ok(true) => LandlordScreening::Listed { name },
        Ok(false) => LandlordScreening::Clear { name },
        Err(e) => {
            warn!(path = %list_path.display(), error = %e, "defaulter list unavailable");
            LandlordScreening::ListUnavailable {
                details: e.to_string(),
            }
        }
    }
}

fn scan_list(list_path: &Path, normalized_name: &str) -> Result<bool, AppError> {
    let mut reader = csv::Reader::from_path(list_path).map_err(|e| {
        AppError::new(
            "RULES_DEFAULTER_LIST_UNAVAILABLE",
            "Failed to open the defaulter list",
        )
        .with_details(format!("path={}; err={}", list_path.display(), e))
    })?;

    let headers = reader
        .headers()
        .map_err(|e| {
            AppError::new(
                "RULES_DEFAULTER_LIST_UNAVAILABLE",
                "Failed to read defaulter list headers",
            )
            .with_details(e.to_string())
        })?
        .clone();
    let Some(name_idx) = headers.iter().position(|h| h.trim() == NAME_HEADER) else {
        return Err(AppError::new(
            "RULES_DEFAULTER_LIST_UNAVAILABLE",
            "Defaulter list is missing the name column",
        )
        .with_details(format!("expected header '{NAME_HEADER}'")));
    };

    for row in reader.records() {
        // Malformed rows are skipped, not fatal.
        let Ok(row) = row else { continue };
        let Some(listed) = row.get(name_idx) else {
            continue;
        };
        if normalize_name(listed) == normalized_name {
            return Ok(true);
        }
    }
    Ok(false)
}
