//! Generates keys in the same format the Realtime Database uses for pushed children.
//!
//! A key is 20 characters: 8 encode the creation time in milliseconds and 12
//! are random. Keys sort lexicographically in creation order, and keys
//! created within the same millisecond are ordered by incrementing the
//! random part of the previous key.

use rand::Rng;

/// The alphabet is in ASCII order so that string order matches numeric order.
const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

const TIMESTAMP_LENGTH: usize = 8;
const RANDOM_LENGTH: usize = 12;

/// Produces strictly increasing push keys.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    last_timestamp: i64,
    last_random: [u8; RANDOM_LENGTH],
}

impl PushIdGenerator {
    /// Create a generator that has not produced any keys yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate a key for a child created at `timestamp_millis`.
    ///
    /// If the clock goes backwards the previous timestamp is reused so that
    /// keys never go out of order.
    pub fn generate(&mut self, timestamp_millis: i64) -> String {
        let timestamp = timestamp_millis.max(self.last_timestamp);

        if timestamp == self.last_timestamp {
            self.increment_random();
        } else {
            let mut rng = rand::thread_rng();
            for digit in self.last_random.iter_mut() {
                *digit = rng.gen_range(0..PUSH_CHARS.len() as u8);
            }
        }
        self.last_timestamp = timestamp;

        let mut key = [0u8; TIMESTAMP_LENGTH + RANDOM_LENGTH];

        let mut remaining = timestamp;
        for slot in key[..TIMESTAMP_LENGTH].iter_mut().rev() {
            *slot = PUSH_CHARS[(remaining % 64) as usize];
            remaining /= 64;
        }

        for (slot, digit) in key[TIMESTAMP_LENGTH..].iter_mut().zip(self.last_random) {
            *slot = PUSH_CHARS[digit as usize];
        }

        key.iter().map(|&byte| byte as char).collect()
    }

    fn increment_random(&mut self) {
        for digit in self.last_random.iter_mut().rev() {
            if *digit == 63 {
                *digit = 0;
            } else {
                *digit += 1;
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::PushIdGenerator;

    #[test]
    fn keys_are_twenty_characters() {
        let mut generator = PushIdGenerator::new();

        let key = generator.generate(1_700_000_000_000);

        assert_eq!(key.len(), 20);
    }

    #[test]
    fn keys_in_same_millisecond_are_increasing() {
        let mut generator = PushIdGenerator::new();

        let keys: Vec<String> = (0..100)
            .map(|_| generator.generate(1_700_000_000_000))
            .collect();

        for pair in keys.windows(2) {
            assert!(pair[0] < pair[1], "{} should sort before {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn later_timestamps_sort_later() {
        let mut generator = PushIdGenerator::new();

        let first = generator.generate(1_700_000_000_000);
        let second = generator.generate(1_700_000_000_001);

        assert!(first < second);
        assert_ne!(first[..8], second[..8]);
    }

    #[test]
    fn clock_going_backwards_keeps_order() {
        let mut generator = PushIdGenerator::new();

        let first = generator.generate(1_700_000_000_000);
        let second = generator.generate(1_600_000_000_000);

        assert!(first < second);
    }

    #[test]
    fn random_part_carries_over() {
        let mut generator = PushIdGenerator::new();
        generator.last_timestamp = 42;
        generator.last_random = [63; 12];
        generator.last_random[0] = 5;

        let key = generator.generate(42);

        assert_eq!(&key[8..], "5-----------");
    }
}
