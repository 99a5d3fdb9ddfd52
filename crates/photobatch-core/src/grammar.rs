//! Folder and file naming grammar
//!
//! Pure functions that read a submitted folder's display name (country marker,
//! color) and check the per-file suffix conventions (`.PT<2 digits>` / `.MAIN`).
//! The preview and processing paths both go through these functions, so there is
//! exactly one definition of what a valid name looks like.
//!
//! Country detection is a substring scan while suffix stripping only looks at the
//! end of the name: "BAG FRESH" is detected as FR but keeps its full color.
//! Existing remote trees depend on both.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::models::CountryCode;

/// Extensions accepted as images (compared lowercase, without the dot).
pub const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tiff", "webp", "raw", "cr2", "nef", "arw", "dng", "svg",
    "ico", "jfif",
];

/// Platform housekeeping files that are silently ignored.
pub const SYSTEM_FILES: &[&str] = &[".DS_Store", "Thumbs.db", "desktop.ini", ".localized"];

static PT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\.PT([^.\s]*)").expect("valid .PT pattern"));
static PT_ANY_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.pt([0-9]*)").expect("valid .pt pattern"));
static MAIN_ANY_CASE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\.main").expect("valid .main pattern"));

/// Leaf directory name of a possibly nested path.
fn leaf_name(display_name: &str) -> &str {
    display_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(display_name)
}

/// Detect the country marker: the first token (in priority order) that appears
/// anywhere in the uppercased name preceded by a space.
pub fn classify_country(display_name: &str) -> Option<CountryCode> {
    let upper = display_name.to_uppercase();
    CountryCode::ALL
        .iter()
        .copied()
        .find(|country| upper.contains(&format!(" {}", country.token())))
}

/// Uppercase the leaf name and drop one trailing `" XX"` country marker.
pub fn strip_country_suffix(display_name: &str) -> String {
    let upper = leaf_name(display_name).to_uppercase();

    for country in CountryCode::ALL {
        let suffix = format!(" {}", country.token());
        if let Some(stripped) = upper.strip_suffix(&suffix) {
            return stripped.trim().to_string();
        }
    }

    upper
}

/// Replace every space with `_` except the last one.
///
/// `"RED BAG ES"` becomes `"RED_BAG ES"`; names without spaces are unchanged.
pub fn transform_folder_name(display_name: &str) -> String {
    match display_name.rfind(' ') {
        None => display_name.to_string(),
        Some(last_space) => {
            let (head, tail) = display_name.split_at(last_space);
            format!("{}{}", head.replace(' ', "_"), tail)
        }
    }
}

/// Color segment used for the remote path.
pub fn extract_color(display_name: &str) -> String {
    strip_country_suffix(&transform_folder_name(display_name))
}

pub fn is_image_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e.as_str()))
}

pub fn is_png(name: &str) -> bool {
    name.to_lowercase().ends_with(".png")
}

pub fn is_system_file(name: &str) -> bool {
    SYSTEM_FILES.contains(&name) || name.starts_with('.')
}

/// Every `.PT` occurrence (any case) must be followed by exactly two digits,
/// up to the next `.` or whitespace. Names without `.PT` pass.
pub fn validate_pt_suffix(name: &str) -> bool {
    let upper = name.to_uppercase();
    PT_SUFFIX.captures_iter(&upper).all(|caps| {
        let suffix = caps.get(1).map(|m| m.as_str()).unwrap_or("");
        suffix.len() == 2 && suffix.bytes().all(|b| b.is_ascii_digit())
    })
}

/// Whether the name carries a `.PT` or `.MAIN` marker (any case).
pub fn has_marker(name: &str) -> bool {
    let upper = name.to_uppercase();
    upper.contains(".PT") || upper.contains(".MAIN")
}

/// Rewrite `.pt<digits>` to `.PT<digits>` and `.main` to `.MAIN`.
pub fn normalize_case(name: &str) -> String {
    let pt_fixed = PT_ANY_CASE.replace_all(name, ".PT${1}");
    MAIN_ANY_CASE.replace_all(&pt_fixed, ".MAIN").into_owned()
}

/// Everything from the first `.` onward (not just the last suffix).
pub fn logical_extension(name: &str) -> &str {
    name.find('.').map(|idx| &name[idx..]).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_country_priority_and_substring() {
        assert_eq!(classify_country("red bag es"), Some(CountryCode::Es));
        assert_eq!(classify_country("BLUE DE"), Some(CountryCode::De));
        assert_eq!(classify_country("GREEN SE"), Some(CountryCode::Se));
        // Substring scan: ES beats DE regardless of position
        assert_eq!(classify_country("X DE ESTRELLA"), Some(CountryCode::Es));
        // "FRESH" contains " FR"
        assert_eq!(classify_country("BAG FRESH"), Some(CountryCode::Fr));
        assert_eq!(classify_country("BLACK"), None);
        assert_eq!(classify_country("BLACKES"), None);
    }

    #[test]
    fn test_strip_country_suffix() {
        for country in CountryCode::ALL {
            let name = format!("Dark Red {}", country.token());
            let stripped = strip_country_suffix(&name);
            assert_eq!(stripped, "DARK RED");
            assert_eq!(strip_country_suffix(&stripped), stripped);
        }
        assert_eq!(strip_country_suffix("bag fresh"), "BAG FRESH");
        assert_eq!(strip_country_suffix("uploads/RED ES"), "RED");
        assert_eq!(strip_country_suffix("RED"), "RED");
    }

    #[test]
    fn test_transform_folder_name() {
        assert_eq!(transform_folder_name("RED BAG ES"), "RED_BAG ES");
        assert_eq!(transform_folder_name("RED"), "RED");
        assert_eq!(transform_folder_name("A B C D"), "A_B_C D");
        assert_eq!(transform_folder_name("RED ES"), "RED ES");
    }

    #[test]
    fn test_extract_color() {
        assert_eq!(extract_color("Red Bag ES"), "RED_BAG");
        assert_eq!(extract_color("NAVY DE"), "NAVY");
        assert_eq!(extract_color("NAVY"), "NAVY");
        assert_eq!(extract_color("ES"), "ES");
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file("photo.PT01.jpg"));
        assert!(is_image_file("PHOTO.JPEG"));
        assert!(is_image_file("scan.jfif"));
        assert!(is_image_file("raw.CR2"));
        assert!(!is_image_file("notes.txt"));
        assert!(!is_image_file("noextension"));
        assert!(!is_image_file("photo.jpg.bak"));
    }

    #[test]
    fn test_validate_pt_suffix() {
        assert!(validate_pt_suffix("IMG.PT01.jpg"));
        assert!(!validate_pt_suffix("IMG.PT1.jpg"));
        assert!(!validate_pt_suffix("IMG.PTAB.jpg"));
        assert!(validate_pt_suffix("IMG.MAIN.jpg"));
        assert!(validate_pt_suffix("img.pt02.png"));
        assert!(!validate_pt_suffix("IMG.PT123.jpg"));
        assert!(!validate_pt_suffix("IMG.PT01.PT9.jpg"));
        assert!(!validate_pt_suffix("IMG.PT.jpg"));
        assert!(validate_pt_suffix("plain.jpg"));
    }

    #[test]
    fn test_has_marker() {
        assert!(has_marker("x.pt01.jpg"));
        assert!(has_marker("x.Main.jpg"));
        assert!(!has_marker("x.jpg"));
    }

    #[test]
    fn test_normalize_case() {
        assert_eq!(normalize_case("photo.pt01.jpg"), "photo.PT01.jpg");
        assert_eq!(normalize_case("photo.Main.png"), "photo.MAIN.png");
        assert_eq!(normalize_case("photo.PT01.jpg"), "photo.PT01.jpg");
        assert_eq!(normalize_case("Photo.pt3.Jpg"), "Photo.PT3.Jpg");
        assert_eq!(normalize_case("plain.jpg"), "plain.jpg");
    }

    #[test]
    fn test_is_system_file() {
        assert!(is_system_file(".DS_Store"));
        assert!(is_system_file("Thumbs.db"));
        assert!(is_system_file("desktop.ini"));
        assert!(is_system_file("._photo.PT01.jpg"));
        assert!(is_system_file(".hidden"));
        assert!(!is_system_file("photo.PT01.jpg"));
    }

    #[test]
    fn test_logical_extension() {
        assert_eq!(logical_extension("IMAGE.PT01.png"), ".PT01.png");
        assert_eq!(logical_extension("photo.jpg"), ".jpg");
        assert_eq!(logical_extension("noext"), "");
    }
}
