//! Codetabellen voor regio's en districten.

/// Bekende regio's met hun driekarakter-code.
pub const REGION_CODES: &[(&str, &str)] = &[
    ("Greater Accra", "GAR"),
    ("Ashanti", "ASH"),
    ("Western", "WES"),
    ("Western North", "WNO"),
    ("Central", "CEN"),
    ("Eastern", "EAS"),
    ("Volta", "VOL"),
    ("Oti", "OTI"),
    ("Northern", "NOR"),
    ("Savannah", "SAV"),
    ("North East", "NEA"),
    ("Upper East", "UEA"),
    ("Upper West", "UWE"),
    ("Bono", "BON"),
    ("Bono East", "BOE"),
    ("Ahafo", "AHA"),
];

/// Bekende districten met hun driekarakter-code.
pub const DISTRICT_CODES: &[(&str, &str)] = &[
    ("Accra Metropolitan", "AMA"),
    ("Tema Metropolitan", "TMA"),
    ("Kumasi Metropolitan", "KMA"),
    ("Ga East", "GEA"),
    ("Ga West", "GWE"),
    ("Cape Coast Metropolitan", "CCM"),
    ("Sekondi-Takoradi", "STM"),
    ("Tamale Metropolitan", "TAM"),
    ("Ho Municipal", "HOM"),
    ("New Juaben South", "NJS"),
    ("Sunyani Municipal", "SUM"),
    ("Bolgatanga", "BOL"),
    ("Wa Municipal", "WAM"),
];

const UNKNOWN_CODE: &str = "UNK";

#[must_use]
pub fn region_code(name: &str) -> String {
    lookup(REGION_CODES, name)
}

#[must_use]
pub fn district_code(name: &str) -> String {
    lookup(DISTRICT_CODES, name)
}

/// Zoekt de naam op (hoofdletterongevoelig, witruimte genegeerd). Onbekende
/// namen vallen terug op de eerste drie tekens in hoofdletters.
fn lookup(table: &[(&str, &str)], name: &str) -> String {
    let trimmed = name.trim();
    if let Some((_, code)) = table
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(trimmed))
    {
        return (*code).to_owned();
    }

    let fallback: String = trimmed.chars().take(3).flat_map(char::to_uppercase).collect();
    if fallback.is_empty() {
        UNKNOWN_CODE.to_owned()
    } else {
        fallback
    }
}
