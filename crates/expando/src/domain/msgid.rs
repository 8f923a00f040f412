//! Message-Id generation: `message_id_format`.

use std::{
    cell::RefCell,
    process,
    sync::atomic::{AtomicU8, Ordering},
};

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Datelike, Timelike, Utc};
use maildata::Clock;
use rand::RngCore;
use serde::Serialize;
use tracing::debug;

use super::{Field, Provider, ValueKind, fields, two_digits};
use crate::{Expando, definition::Definition, render::RenderFlags};

fields! {
    /// Ingredients of a generated Message-Id.
    MsgIdField {
        /// A letter cycling `A` to `Z` per generated id.
        Counter => "COUNTER", String;
        /// Day of month.
        Day => "DAY", Number;
        /// Fully qualified hostname.
        Hostname => "HOSTNAME", String;
        /// Hour.
        Hour => "HOUR", Number;
        /// Minute.
        Minute => "MINUTE", Number;
        /// Month.
        Month => "MONTH", Number;
        /// Process id.
        Pid => "PID", Number;
        /// One random byte, hex.
        Random1 => "RANDOM_1", String;
        /// Three random bytes, url-safe base64.
        Random3 => "RANDOM_3", String;
        /// Timestamp and eight random bytes, url-safe base64.
        Random12 => "RANDOM_12", String;
        /// Second.
        Second => "SECOND", Number;
        /// Year.
        Year => "YEAR", Number;
    }
}

/// Codes for `message_id_format`.
pub static MSGID_FORMAT: &[Definition] = &[
    Definition::new("c", "counter", Field::MsgId(MsgIdField::Counter)),
    Definition::new("d", "day", Field::MsgId(MsgIdField::Day)),
    Definition::new("h", "hostname", Field::MsgId(MsgIdField::Hostname)),
    Definition::new("H", "hour", Field::MsgId(MsgIdField::Hour)),
    Definition::new("m", "month", Field::MsgId(MsgIdField::Month)),
    Definition::new("M", "minute", Field::MsgId(MsgIdField::Minute)),
    Definition::new("p", "pid", Field::MsgId(MsgIdField::Pid)),
    Definition::new("r12", "random-12", Field::MsgId(MsgIdField::Random12)),
    Definition::new("r1", "random-1", Field::MsgId(MsgIdField::Random1)),
    Definition::new("r3", "random-3", Field::MsgId(MsgIdField::Random3)),
    Definition::new("S", "second", Field::MsgId(MsgIdField::Second)),
    Definition::new("Y", "year", Field::MsgId(MsgIdField::Year)),
];

/// Alphabet for the random fallback id.
const BASE32: &[u8; 32] = b"abcdefghijklmnopqrstuvwxyz234567";

/// Last counter letter handed out, as an offset from `A`.
static COUNTER: AtomicU8 = AtomicU8::new(25);

/// Next letter in the `A` to `Z` cycle.
fn next_counter() -> char {
    let prev = COUNTER
        .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| Some((n + 1) % 26))
        .unwrap_or(0);
    char::from(b'A' + (prev + 1) % 26)
}

/// `n` random base32 characters.
fn random_base32(rng: &mut dyn RngCore, n: usize) -> String {
    let mut bytes = vec![0u8; n];
    rng.fill_bytes(&mut bytes);
    bytes
        .iter()
        .map(|b| char::from(BASE32[usize::from(b % 32)]))
        .collect()
}

/// Data for one Message-Id, frozen at creation.
pub struct MsgIdData<'a> {
    /// Generation time, UTC.
    pub now: DateTime<Utc>,
    /// Fully qualified hostname.
    pub hostname: &'a str,
    /// Source of random bytes.
    rng: RefCell<&'a mut dyn RngCore>,
    /// Counter letter, drawn once per id.
    counter: char,
}

impl<'a> MsgIdData<'a> {
    /// Freeze the ingredients for an id generated at `now`.
    pub fn new(now: DateTime<Utc>, hostname: &'a str, rng: &'a mut dyn RngCore) -> Self {
        Self {
            now,
            hostname,
            rng: RefCell::new(rng),
            counter: next_counter(),
        }
    }

    /// `n` random bytes.
    fn random(&self, n: usize) -> Vec<u8> {
        let mut buf = vec![0u8; n];
        self.rng.borrow_mut().fill_bytes(&mut buf);
        buf
    }
}

impl Provider for MsgIdData<'_> {
    fn string(&self, field: Field, _flags: RenderFlags) -> Option<String> {
        let Field::MsgId(f) = field else {
            return None;
        };
        let now = self.now;
        Some(match f {
            MsgIdField::Counter => self.counter.to_string(),
            MsgIdField::Day => two_digits(now.day()),
            MsgIdField::Hostname => self.hostname.to_string(),
            MsgIdField::Hour => two_digits(now.hour()),
            MsgIdField::Minute => two_digits(now.minute()),
            MsgIdField::Month => two_digits(now.month()),
            MsgIdField::Second => two_digits(now.second()),
            MsgIdField::Year => format!("{:04}", now.year()),
            MsgIdField::Random1 => format!("{:02x}", self.random(1)[0]),
            MsgIdField::Random3 => URL_SAFE_NO_PAD.encode(self.random(3)),
            MsgIdField::Random12 => {
                let mut bytes = now.timestamp().to_be_bytes()[4..].to_vec();
                bytes.extend(self.random(8));
                URL_SAFE_NO_PAD.encode(bytes)
            }
            MsgIdField::Pid => return None,
        })
    }

    fn number(&self, field: Field, _flags: RenderFlags) -> Option<i64> {
        let Field::MsgId(f) = field else {
            return None;
        };
        let now = self.now;
        Some(match f {
            MsgIdField::Day => i64::from(now.day()),
            MsgIdField::Hour => i64::from(now.hour()),
            MsgIdField::Minute => i64::from(now.minute()),
            MsgIdField::Month => i64::from(now.month()),
            MsgIdField::Second => i64::from(now.second()),
            MsgIdField::Year => i64::from(now.year()),
            MsgIdField::Pid => i64::from(process::id()),
            _ => return None,
        })
    }
}

/// Generate a Message-Id, angle brackets included.
///
/// The format is rendered in UTC. With no format, or one that renders empty,
/// a random `<50 chars@12 chars>` id is produced instead.
pub fn generate_message_id(
    format: Option<&Expando>,
    clock: &dyn Clock,
    rng: &mut dyn RngCore,
    hostname: &str,
) -> String {
    let now = clock.now();
    if let Some(exp) = format {
        let rendered = {
            let data = MsgIdData::new(now, hostname, rng);
            exp.render_unbounded(&data, RenderFlags::empty(), clock)
        };
        if !rendered.is_empty() {
            return format!("<{rendered}>");
        }
        debug!(format = exp.source(), "message id format rendered empty");
    }
    format!("<{}@{}>", random_base32(rng, 50), random_base32(rng, 12))
}

#[cfg(test)]
mod tests {
    use maildata::FixedClock;
    use rand::{SeedableRng, rngs::StdRng};
    use regex::Regex;

    use super::*;

    #[test]
    fn formatted_id() {
        let exp = Expando::parse("%Y%m%d%H%M%S.%r3@%h", MSGID_FORMAT).unwrap();
        let clock = FixedClock::at(1_704_164_645);
        let mut rng = StdRng::seed_from_u64(7);
        let id = generate_message_id(Some(&exp), &clock, &mut rng, "a.b");
        let re = Regex::new(r"^<20240102030405\.[A-Za-z0-9_-]{4}@a\.b>$").unwrap();
        assert!(re.is_match(&id), "{id}");
    }

    #[test]
    fn random_fallback() {
        let clock = FixedClock::at(0);
        let mut rng = StdRng::seed_from_u64(1);
        let id = generate_message_id(None, &clock, &mut rng, "a.b");
        let re = Regex::new(r"^<[a-z2-7]{50}@[a-z2-7]{12}>$").unwrap();
        assert!(re.is_match(&id), "{id}");

        let empty = Expando::parse("", MSGID_FORMAT).unwrap();
        let id = generate_message_id(Some(&empty), &clock, &mut rng, "a.b");
        assert!(re.is_match(&id), "{id}");
    }

    #[test]
    fn counter_cycles() {
        for _ in 0..60 {
            assert!(next_counter().is_ascii_uppercase());
        }
    }

    #[test]
    fn random12_is_sixteen_chars() {
        let exp = Expando::parse("%r12", MSGID_FORMAT).unwrap();
        let clock = FixedClock::at(1_704_164_645);
        let mut rng = StdRng::seed_from_u64(3);
        let id = generate_message_id(Some(&exp), &clock, &mut rng, "h");
        assert_eq!(id.len(), 18, "{id}");
    }
}
