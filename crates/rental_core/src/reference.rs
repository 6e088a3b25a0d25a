//! crates/rental_core/src/reference.rs
//!
//! Human-presentable display codes for listings: the random shortcode, the
//! composite reference code and the QR link that points at the canonical
//! property page. None of these are identifiers; shortcodes are not checked
//! for uniqueness.

use tracing::debug;

use crate::domain::{Property, PropertyMetadata};
use crate::ports::RandomSource;

/// Uppercase letters and digits without the look-alikes 0, O, I and 1.
pub const SHORTCODE_ALPHABET: &[u8; 32] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
pub const SHORTCODE_LEN: usize = 6;
pub const REFERENCE_PREFIX: &str = "BOB";
pub const DEFAULT_TYPE_CODE: &str = "UNT";

/// Known location fragments, checked in order against the lowercased input.
/// Broader names sit below the districts that contain them.
const CITY_CODES: &[(&str, &str)] = &[
    ("new cairo", "NC"),
    ("fifth settlement", "NC"),
    ("tagamoa", "NC"),
    ("new capital", "NAC"),
    ("maadi", "MAD"),
    ("zamalek", "ZAM"),
    ("garden city", "GC"),
    ("heliopolis", "HEL"),
    ("nasr city", "NSR"),
    ("sheikh zayed", "SZ"),
    ("6th of october", "OCT"),
    ("october", "OCT"),
    ("mohandessin", "MOH"),
    ("dokki", "DOK"),
    ("rehab", "RHB"),
    ("madinaty", "MDY"),
    ("north coast", "NCO"),
    ("sahel", "NCO"),
    ("gouna", "GOU"),
    ("hurghada", "HRG"),
    ("sokhna", "SOK"),
    ("alexandria", "ALX"),
    ("downtown", "DT"),
    ("cairo", "CAI"),
];

/// Property-type keywords searched in the title. Order is the tie-break.
const TYPE_CODES: &[(&str, &str)] = &[
    ("apartment", "APT"),
    ("villa", "VIL"),
    ("penthouse", "PNT"),
    ("studio", "STU"),
    ("duplex", "DPX"),
    ("townhouse", "TWN"),
    ("chalet", "CHL"),
];

/// Where canonical URLs and QR images point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetadataSettings {
    pub site_url: String,
    pub qr_endpoint: String,
    pub qr_size: u32,
}

impl Default for MetadataSettings {
    fn default() -> Self {
        Self {
            site_url: "http://localhost:5173".to_string(),
            qr_endpoint: "https://api.qrserver.com/v1/create-qr-code/".to_string(),
            qr_size: 200,
        }
    }
}

pub fn generate_shortcode<R: RandomSource + ?Sized>(rng: &mut R) -> String {
    (0..SHORTCODE_LEN)
        .map(|_| SHORTCODE_ALPHABET[rng.next_index(SHORTCODE_ALPHABET.len())] as char)
        .collect()
}

pub fn city_code(location: &str) -> String {
    let location = location.trim();
    if location.is_empty() {
        return "UNK".to_string();
    }
    let haystack = location.to_lowercase();
    CITY_CODES
        .iter()
        .find(|(pattern, _)| haystack.contains(pattern))
        .map(|(_, code)| code.to_string())
        .unwrap_or_else(|| location.chars().take(3).collect::<String>().to_uppercase())
}

pub fn type_code(title: &str) -> &'static str {
    let haystack = title.to_lowercase();
    TYPE_CODES
        .iter()
        .find(|(keyword, _)| haystack.contains(keyword))
        .map(|(_, code)| *code)
        .unwrap_or(DEFAULT_TYPE_CODE)
}

/// Numeric ids are zero-padded to four digits; anything else is uppercased
/// and used verbatim.
fn id_segment(id: &str) -> String {
    match id.trim().parse::<u64>() {
        Ok(n) => format!("{:04}", n),
        Err(_) => id.trim().to_uppercase(),
    }
}

pub fn reference_code(id: &str, location: &str, title: &str, shortcode: &str, cycle: u32) -> String {
    format!(
        "{}-{}-{}-{}-R{} • {}",
        REFERENCE_PREFIX,
        city_code(location),
        type_code(title),
        id_segment(id),
        cycle,
        shortcode
    )
}

pub fn property_url(settings: &MetadataSettings, id: &str) -> String {
    format!("{}/property/{}", settings.site_url.trim_end_matches('/'), id)
}

pub fn qr_code_url(settings: &MetadataSettings, target: &str) -> String {
    format!(
        "{}?size={}x{}&data={}",
        settings.qr_endpoint,
        settings.qr_size,
        settings.qr_size,
        urlencoding::encode(target)
    )
}

/// Builds the display codes for a listing from an already drawn shortcode.
///
/// Repositories call this while the new row is still inside its insert
/// transaction, once the id is known.
pub fn build_metadata(
    id: &str,
    location: &str,
    title: &str,
    shortcode: &str,
    cycle: u32,
    settings: &MetadataSettings,
) -> PropertyMetadata {
    let reference_code = reference_code(id, location, title, shortcode, cycle);
    let property_url = property_url(settings, id);
    let qr_code_url = qr_code_url(settings, &property_url);

    debug!(property_id = %id, %reference_code, "Generated property metadata");

    PropertyMetadata {
        shortcode: shortcode.to_string(),
        reference_code,
        qr_code_url,
        property_url,
        cycle,
    }
}

/// Attaches a fresh shortcode, reference code, canonical URL and QR link.
///
/// A property that already carries metadata moves to the next listing cycle;
/// otherwise the cycle starts at 1.
pub fn add_metadata<R: RandomSource + ?Sized>(
    mut property: Property,
    settings: &MetadataSettings,
    rng: &mut R,
) -> Property {
    let cycle = property.metadata.as_ref().map_or(1, |m| m.cycle.saturating_add(1));
    let shortcode = generate_shortcode(rng);
    property.metadata = Some(build_metadata(
        &property.id,
        &property.location,
        &property.title,
        &shortcode,
        cycle,
        settings,
    ));
    property
}
