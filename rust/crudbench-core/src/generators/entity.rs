//! Synthetic person/location documents.
//!
//! Every field is a fixed slice of a 64-character alphabet built from the
//! key, so documents are reproducible from the key alone. Only the body
//! length is random: it follows a skewed size distribution with a small
//! share of heavy outliers.

use super::KeyValueGenerator;
use crate::adapter::{Document, QueryParams};
use crate::error::ConfigError;
use crate::keyspace::{HotSpot, KeySelector, KeySpace, Uniform};
use crate::synth::{hash, rand_string};
use chrono::{DateTime, Datelike, Timelike, Utc};
use rand::rngs::StdRng;
use rand::Rng;
use rand_distr::{Distribution, Normal, Zipf};
use serde_json::{json, Value};

/// Approximate serialized size of everything but the body
pub const OVERHEAD: usize = 450;

/// Share of documents sized around the target; the rest are outliers
const NORMAL_SHARE: f32 = 0.995;

/// Dotted path of the field used by entity queries
pub const CITY_FIELD: &str = "city.f.f";

const STATES: [(&str, &str); 57] = [
    ("AL", "Alabama"),
    ("AK", "Alaska"),
    ("AS", "American Samoa"),
    ("AZ", "Arizona"),
    ("AR", "Arkansas"),
    ("CA", "California"),
    ("CO", "Colorado"),
    ("CT", "Connecticut"),
    ("DE", "Delaware"),
    ("DC", "District of Columbia"),
    ("FL", "Florida"),
    ("GA", "Georgia"),
    ("GU", "Guam"),
    ("HI", "Hawaii"),
    ("ID", "Idaho"),
    ("IL", "Illinois"),
    ("IN", "Indiana"),
    ("IA", "Iowa"),
    ("KS", "Kansas"),
    ("KY", "Kentucky"),
    ("LA", "Louisiana"),
    ("ME", "Maine"),
    ("MH", "Marshall Islands"),
    ("MD", "Maryland"),
    ("MA", "Massachusetts"),
    ("MI", "Michigan"),
    ("MN", "Minnesota"),
    ("MS", "Mississippi"),
    ("MO", "Missouri"),
    ("MT", "Montana"),
    ("NE", "Nebraska"),
    ("NV", "Nevada"),
    ("NH", "New Hampshire"),
    ("NJ", "New Jersey"),
    ("NM", "New Mexico"),
    ("NY", "New York"),
    ("NC", "North Carolina"),
    ("ND", "North Dakota"),
    ("MP", "Northern Mariana Islands"),
    ("OH", "Ohio"),
    ("OK", "Oklahoma"),
    ("OR", "Oregon"),
    ("PA", "Pennsylvania"),
    ("PR", "Puerto Rico"),
    ("RI", "Rhode Island"),
    ("SC", "South Carolina"),
    ("SD", "South Dakota"),
    ("TN", "Tennessee"),
    ("TX", "Texas"),
    ("UT", "Utah"),
    ("VT", "Vermont"),
    ("VI", "Virgin Islands"),
    ("VA", "Virginia"),
    ("WA", "Washington"),
    ("WV", "West Virginia"),
    ("WI", "Wisconsin"),
    ("WY", "Wyoming"),
];

/// Two digests, of the key and of the reversed key.
pub fn alphabet(key: &str) -> String {
    let reversed: String = key.chars().rev().collect();
    hash(key) + &hash(&reversed)
}

fn hex_digit(alphabet: &str, at: usize) -> u32 {
    alphabet[at..at + 1].chars().next().and_then(|c| c.to_digit(16)).unwrap_or(0)
}

pub fn name(a: &str) -> String {
    format!("{} {}", &a[..6], &a[6..12])
}

pub fn email(a: &str) -> String {
    format!("{}@{}.com", &a[12..18], &a[18..24])
}

pub fn city(a: &str) -> &str {
    &a[24..30]
}

fn realm(a: &str) -> &str {
    &a[30..36]
}

fn country(a: &str) -> &str {
    &a[42..48]
}

fn county(a: &str) -> &str {
    &a[48..54]
}

fn street(a: &str) -> &str {
    &a[54..62]
}

fn coins(a: &str) -> f64 {
    let raw = u32::from_str_radix(&a[36..40], 16).unwrap_or(0);
    (raw as f64 / 100.0).max(0.1)
}

fn category(a: &str) -> u32 {
    hex_digit(a, 41) % 3
}

fn year(a: &str) -> u32 {
    1985 + hex_digit(a, 62)
}

fn state_index(a: &str, digit: char) -> usize {
    a.find(digit)
        .map(|i| i % STATES.len())
        .unwrap_or(STATES.len() - 1)
}

fn state(a: &str) -> &'static str {
    STATES[state_index(a, '7')].0
}

fn full_state(a: &str) -> &'static str {
    STATES[state_index(a, '8')].1
}

/// `struct tm`-like breakdown of one of twelve fixed instants.
fn gmtime(a: &str) -> [i64; 9] {
    let seconds = 396 * 24 * 3600 * (hex_digit(a, 63) as i64 % 12);
    let t: DateTime<Utc> = DateTime::from_timestamp(seconds, 0).unwrap_or_default();
    [
        t.year() as i64,
        t.month() as i64,
        t.day() as i64,
        t.hour() as i64,
        t.minute() as i64,
        t.second() as i64,
        t.weekday().num_days_from_monday() as i64,
        t.ordinal() as i64,
        0,
    ]
}

fn achievements(a: &str) -> Vec<u32> {
    let mut achievement = 256;
    let mut out = Vec::new();
    for (i, c) in a[42..58].chars().enumerate() {
        let id = c.to_digit(16).unwrap_or(0);
        achievement = (achievement + id * i as u32) % 512;
        if achievement < 256 {
            out.push(achievement);
        }
    }
    out
}

/// Every field except the body.
pub fn entity_fields(key: &str) -> Document {
    let a = alphabet(key);
    let doc = json!({
        "name": { "f": { "f": { "f": name(&a) } } },
        "email": { "f": { "f": email(&a) } },
        "street": { "f": { "f": street(&a) } },
        "city": { "f": { "f": city(&a) } },
        "county": { "f": { "f": county(&a) } },
        "realm": { "f": realm(&a) },
        "country": { "f": country(&a) },
        "coins": { "f": coins(&a) },
        "state": { "f": state(&a) },
        "full_state": { "f": full_state(&a) },
        "category": category(&a),
        "achievements": achievements(&a),
        "gmtime": gmtime(&a),
        "year": year(&a),
    });
    match doc {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

/// Skewed body sizes around `value_size - OVERHEAD`.
#[derive(Debug, Clone)]
pub struct SizeDistribution {
    target: usize,
    normal: Normal<f64>,
    outliers: Zipf<f64>,
}

impl SizeDistribution {
    pub fn new(target: usize) -> Self {
        Self {
            target,
            normal: Normal::new(1.0, 0.17).expect("normal"),
            outliers: Zipf::new(1000, 1.1).expect("zipf"),
        }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> usize {
        if self.target <= OVERHEAD {
            return 0;
        }
        if rng.gen::<f32>() < NORMAL_SHARE {
            let scale = self.normal.sample(rng).max(0.0);
            ((self.target - OVERHEAD) as f64 * scale) as usize
        } else {
            self.target * self.outliers.sample(rng) as usize
        }
    }
}

#[derive(Debug, Clone)]
pub struct EntityGenerator {
    sizes: SizeDistribution,
    hot_spot: Option<HotSpot>,
}

impl EntityGenerator {
    pub fn new(value_size: usize, hot_spot: Option<HotSpot>) -> Result<Self, ConfigError> {
        if value_size < OVERHEAD {
            return Err(ConfigError::ValueTooSmall {
                min: OVERHEAD,
                got: value_size,
            });
        }
        Ok(Self {
            sizes: SizeDistribution::new(value_size),
            hot_spot,
        })
    }
}

impl KeyValueGenerator for EntityGenerator {
    fn new_key(&self, id: u64) -> String {
        format!("{id:012}")
    }

    fn existing_key(&self, keys: &KeySpace, rng: &mut StdRng) -> Option<String> {
        let live = keys.live()?;
        let id = match &self.hot_spot {
            Some(hot) => hot.existing_id(live, rng),
            None => Uniform.existing_id(live, rng),
        };
        Some(self.new_key(id))
    }

    fn value(&self, key: &str, rng: &mut StdRng) -> Document {
        let mut doc = entity_fields(key);
        let body = rand_string(key, self.sizes.sample(rng));
        doc.insert("body".to_string(), Value::String(body));
        doc
    }

    fn query(&self, keys: &KeySpace, rng: &mut StdRng) -> Option<QueryParams> {
        let key = self.existing_key(keys, rng)?;
        Some(QueryParams {
            field: CITY_FIELD.to_string(),
            value: city(&alphabet(&key)).to_string(),
            limit: rng.gen_range(10..20),
        })
    }
}
