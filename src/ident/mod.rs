//! Perceelidentificaties in de vorm `GH-{REGIO}-{DISTRICT}-{JAAR}-{VOLGNR}`.
//!
//! Het volgnummer is zes cijfers met voorloopnullen. Zonder expliciet
//! volgnummer wordt een willekeurig nummer in `[100000, 999999]` gekozen;
//! uniciteit is dan niet gegarandeerd en hoort bij een externe registry.

use rand::rngs::{StdRng, ThreadRng};
use rand::{Rng, SeedableRng};

pub mod codes;

pub use codes::{DISTRICT_CODES, REGION_CODES, district_code, region_code};

/// Laagste willekeurige volgnummer.
pub const RANDOM_SEQUENCE_MIN: u32 = 100_000;
/// Hoogste willekeurige volgnummer.
pub const RANDOM_SEQUENCE_MAX: u32 = 999_999;

/// Bron van volgnummers.
pub trait SequenceAllocator {
    fn next_sequence(&mut self) -> u32;
}

/// Willekeurige volgnummers in `[100000, 999999]`.
#[derive(Debug, Clone)]
pub struct RandomSequence<R = ThreadRng> {
    rng: R,
}

impl RandomSequence<ThreadRng> {
    #[must_use]
    pub fn new() -> Self {
        Self { rng: rand::rng() }
    }
}

impl Default for RandomSequence<ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSequence<StdRng> {
    /// Reproduceerbare reeks, voor tests en batchverwerking.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> SequenceAllocator for RandomSequence<R> {
    fn next_sequence(&mut self) -> u32 {
        self.rng.random_range(RANDOM_SEQUENCE_MIN..=RANDOM_SEQUENCE_MAX)
    }
}

/// Zuivere opmaak van een identificatie.
///
/// Volgnummers boven `999999` worden niet afgekapt en leveren meer dan zes cijfers.
#[must_use]
pub fn format_parcel_id(region_code: &str, district_code: &str, year: i32, sequence: u32) -> String {
    format!("GH-{region_code}-{district_code}-{year}-{sequence:06}")
}

/// Het huidige kalenderjaar (UTC).
#[must_use]
pub fn current_year() -> i32 {
    time::OffsetDateTime::now_utc().year()
}

/// Genereert een identificatie voor het huidige jaar.
#[must_use]
pub fn generate(region: &str, district: &str, sequence: Option<u32>) -> String {
    generate_with(region, district, current_year(), sequence, &mut RandomSequence::new())
}

/// Zoals [`generate`], met expliciet jaar en volgnummerbron.
pub fn generate_with<A: SequenceAllocator + ?Sized>(
    region: &str,
    district: &str,
    year: i32,
    sequence: Option<u32>,
    allocator: &mut A,
) -> String {
    let sequence = sequence.unwrap_or_else(|| allocator.next_sequence());
    let id = format_parcel_id(&region_code(region), &district_code(district), year, sequence);
    log::debug!("perceel-id gegenereerd: {id}");
    id
}

#[must_use]
pub fn known_regions() -> impl Iterator<Item = &'static str> {
    REGION_CODES.iter().map(|(name, _)| *name)
}

#[must_use]
pub fn known_districts() -> impl Iterator<Item = &'static str> {
    DISTRICT_CODES.iter().map(|(name, _)| *name)
}
