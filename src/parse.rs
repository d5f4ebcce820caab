//! Value parsers for raw spreadsheet/CSV cells (spec.md §4.1 C1): dates,
//! ages, MIC values (with Excel serial-date corruption recovery), and halo
//! diameters. None of these ever raise — an unparsable cell yields `None`
//! and the caller decides whether that makes the row unusable.

use chrono::NaiveDate;
use std::sync::OnceLock;

use regex::Regex;

const SPANISH_MONTHS: &[(&str, &str)] = &[
    ("enero", "01"),
    ("ene", "01"),
    ("febrero", "02"),
    ("feb", "02"),
    ("marzo", "03"),
    ("mar", "03"),
    ("abril", "04"),
    ("abr", "04"),
    ("mayo", "05"),
    ("may", "05"),
    ("junio", "06"),
    ("jun", "06"),
    ("julio", "07"),
    ("jul", "07"),
    ("agosto", "08"),
    ("ago", "08"),
    ("septiembre", "09"),
    ("sept", "09"),
    ("sep", "09"),
    ("octubre", "10"),
    ("oct", "10"),
    ("noviembre", "11"),
    ("nov", "11"),
    ("diciembre", "12"),
    ("dic", "12"),
];

/// Ordered date formats tried in turn, matching spec.md's requirement that
/// ambiguous `dd/mm/yy` forms take precedence over `mm/dd/yyyy`.
const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%d/%m/%y",
    "%Y/%m/%d",
    "%Y.%m.%d",
    "%d/%m/%Y",
    "%d-%m-%Y",
    "%d.%m.%Y",
    "%d-%m-%y",
    "%d.%m.%y",
    "%d %m %Y",
    "%d %m %y",
    "%m/%d/%Y",
];

/// Substitutes Spanish month names ("12 mar 2024", "12/mar/2024", "12 de
/// marzo de 2024") with their two-digit numeric form so the fixed
/// [`DATE_FORMATS`] list can take over.
fn substitute_spanish_months(raw: &str) -> String {
    let mut out = raw.to_string();
    for (name, num) in SPANISH_MONTHS {
        for delim in ['/', '-', '.'] {
            let pattern = format!("{delim}{name}{delim}");
            if out.contains(&pattern) {
                out = out.replacen(&pattern, &format!("{delim}{num}{delim}"), 1);
                return out;
            }
        }
        let de_pattern = format!(" de {name} de ");
        if out.contains(&de_pattern) {
            out = out.replacen(&de_pattern, &format!("/{num}/"), 1);
            return out;
        }
        let bare_pattern = format!(" {name} ");
        if out.contains(&bare_pattern) {
            out = out.replacen(&bare_pattern, &format!("/{num}/"), 1);
            return out;
        }
    }
    out
}

/// Parses a raw date cell, whether it arrived as a string or as a float day
/// count already resolved by the caller from a spreadsheet date cell.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim().to_lowercase();
    if trimmed.is_empty() {
        return None;
    }
    let candidate = substitute_spanish_months(&trimmed);
    for fmt in DATE_FORMATS {
        if let Ok(dt) = NaiveDate::parse_from_str(&candidate, fmt) {
            return Some(dt);
        }
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(&candidate, fmt) {
            return Some(dt.date());
        }
    }
    NaiveDate::parse_from_str(&candidate, "%Y-%m-%dT%H:%M:%S").ok()
}

/// Parses a raw age cell. Accepts both `,` and `.` decimal separators.
pub fn parse_age(raw: &str) -> Option<f64> {
    let cleaned = raw.trim().replace(',', ".");
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok()
}

/// Excel's epoch for the legacy 1900 date system (day 0 = 1899-12-30, the
/// Lotus-1-2-3-compatible convention Excel still honors).
fn excel_epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1899, 12, 30).expect("valid epoch date")
}

/// A combined antibiotic's MIC (e.g. `4/76` for amoxicillin-clavulanate) can
/// get silently reinterpreted by Excel as a date ("4/79" -> "abr-79" ->
/// serial day 27851) before it ever reaches this pipeline. When a bare
/// numeric cell, read back as an Excel serial day count, resolves to a year
/// in this window, the original value has almost certainly been mangled;
/// the month number is the only part of the original MIC Excel preserved.
const EXCEL_CORRUPTION_YEAR_MIN: i32 = 1950;
const EXCEL_CORRUPTION_YEAR_MAX: i32 = 1980;

/// MIC values above this are not biologically meaningful dilutions.
const MIC_UPPER_BOUND: f64 = 1024.0;

/// Parses a raw MIC (minimum inhibitory concentration) cell into a
/// representative float, recovering from the Excel date-corruption failure
/// mode described on [`EXCEL_CORRUPTION_YEAR_MIN`].
pub fn parse_mic(raw: &str) -> Option<f64> {
    let mut value = raw.trim().replace(',', ".");
    if value.is_empty() {
        return None;
    }

    if let Ok(numeric) = value.parse::<f64>() {
        if numeric.fract() == 0.0 && numeric >= 0.0 {
            if let Some(possible_date) = excel_epoch().checked_add_signed(chrono::Duration::days(numeric as i64)) {
                let year = possible_date.format("%Y").to_string().parse::<i32>().unwrap_or(0);
                if (EXCEL_CORRUPTION_YEAR_MIN..=EXCEL_CORRUPTION_YEAR_MAX).contains(&year) {
                    return Some(possible_date.format("%m").to_string().parse::<f64>().unwrap_or(0.0));
                }
            }
        }
        if numeric > MIC_UPPER_BOUND {
            return None;
        }
        return Some(numeric);
    }

    if let Some(stripped) = value.strip_prefix('=') {
        value = stripped.trim().to_string();
    }
    value = value.replace("<=", "\u{2264}").replace(">=", "\u{2265}");

    if let Ok(numeric) = value.parse::<f64>() {
        return Some(numeric);
    }

    if let Some(rest) = value.strip_prefix('\u{2264}').or_else(|| value.strip_prefix('<')) {
        let num_part = rest.trim().split('/').next().unwrap_or("").trim();
        return num_part.parse::<f64>().ok();
    }

    if let Some(rest) = value.strip_prefix('\u{2265}').or_else(|| value.strip_prefix('>')) {
        let num_part = rest.trim().split('/').next().unwrap_or("").trim();
        // Usually only `>`, never `\u{2265}`, appears in practice: the true MIC is
        // unknown but lies beyond the next two-fold dilution step, so this
        // returns double the marked dilution (EUCAST dilutions are serial base-2).
        return num_part.parse::<f64>().ok().map(|n| n * 2.0);
    }

    if value.contains('/') {
        let numerator = value.split('/').next().unwrap_or("").trim();
        return numerator.parse::<f64>().ok();
    }

    None
}

/// Parses a raw halo (disc-diffusion inhibition zone) diameter in mm.
pub fn parse_halo(raw: &str) -> Option<f64> {
    let mut value = raw.trim().replace(',', ".");
    if value.is_empty() {
        return None;
    }
    if let Some(stripped) = value.strip_prefix('=') {
        value = stripped.trim().to_string();
    }
    value = value.replace("<=", "\u{2264}").replace(">=", "\u{2265}");

    if let Ok(numeric) = value.parse::<f64>() {
        return Some(numeric);
    }
    if let Some(rest) = value.strip_prefix('\u{2264}').or_else(|| value.strip_prefix('<')) {
        return rest.trim().parse::<f64>().ok();
    }
    if let Some(rest) = value.strip_prefix('\u{2265}').or_else(|| value.strip_prefix('>')) {
        return rest.trim().parse::<f64>().ok();
    }
    None
}

/// Characters that flag a spreadsheet cell as "do not coerce to a number" —
/// combined-antibiotic and comparator notations that [`parse_mic`] handles
/// on its own, later in the pipeline.
fn looks_like_comparator_notation(value: &str) -> bool {
    value.contains(['/', '>', '<', '=', '\u{2265}', '\u{2264}'])
}

/// Attempts to coerce a raw cell string read from a CSV/XLSX column into a
/// canonical numeric string, leaving comparator/combination notations
/// (`>4/76`, `<=1`) untouched for [`parse_mic`]/[`parse_halo`] to resolve.
/// Mirrors the column-wide numeric transformer spec.md §4.1 describes,
/// applied cell-by-cell rather than column-at-a-time since this crate has no
/// dataframe abstraction.
pub fn transform_numeric_cell(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() || looks_like_comparator_notation(trimmed) {
        return trimmed.to_string();
    }
    let normalized = trimmed.replace(',', ".");
    if normalized.parse::<f64>().is_ok() {
        normalized
    } else {
        trimmed.to_string()
    }
}

static COLUMN_SUFFIX_SPLIT: OnceLock<Regex> = OnceLock::new();

fn column_suffix_regex() -> &'static Regex {
    COLUMN_SUFFIX_SPLIT.get_or_init(|| Regex::new(r"[-_]").unwrap())
}

/// Strips the given suffix (e.g. `"cmi"`, `"mm"`) from a normalized column
/// name, also tolerating `-`/`_` separators before the suffix
/// (`antibiotico-cmi`, `antibiotico_cmi`, `antibioticocmi`).
pub fn strip_column_suffix(normalized_column: &str, suffix: &str) -> Option<String> {
    let collapsed: String = column_suffix_regex().replace_all(normalized_column, "").to_string();
    collapsed.strip_suffix(suffix).map(|s| s.trim().to_string())
}
