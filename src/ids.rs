// SPDX-FileCopyrightText: 2025 Hyperpolymath
// SPDX-License-Identifier: PMPL-1.0-or-later

//! Reversible obfuscation of database row IDs for use in URLs.
//!
//! Produces the same strings as the public Hashids scheme, so links minted
//! by older site builds keep resolving. This is obfuscation, not encryption:
//! anyone holding the salt can decode.

use thiserror::Error;

const DEFAULT_ALPHABET: &str = "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ1234567890";
const DEFAULT_SEPARATORS: &str = "cfhistuCFHISTU";
const MIN_ALPHABET_LENGTH: usize = 16;
const SEPARATOR_RATIO: f64 = 3.5;
const GUARD_RATIO: f64 = 12.0;

/// Codec construction and decoding errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IdError {
    #[error("Alphabet must contain at least 16 unique characters, got {0}")]
    AlphabetTooShort(usize),

    #[error("Alphabet must not contain spaces")]
    AlphabetContainsSpace,

    #[error("Invalid character {0:?} in encoded ID")]
    InvalidCharacter(char),

    #[error("Encoded ID overflows a 64-bit integer")]
    Overflow,

    #[error("Malformed encoded ID: {0}")]
    Malformed(String),
}

/// Salted integer <-> string codec.
#[derive(Debug, Clone)]
pub struct IdCodec {
    salt: Vec<char>,
    min_length: usize,
    alphabet: Vec<char>,
    separators: Vec<char>,
    guards: Vec<char>,
}

impl IdCodec {
    /// Codec over the default alphabet.
    pub fn new(salt: &str, min_length: usize) -> Result<Self, IdError> {
        Self::with_alphabet(salt, min_length, DEFAULT_ALPHABET)
    }

    pub fn with_alphabet(salt: &str, min_length: usize, alphabet: &str) -> Result<Self, IdError> {
        let mut unique: Vec<char> = Vec::new();
        for c in alphabet.chars() {
            if !unique.contains(&c) {
                unique.push(c);
            }
        }
        if unique.len() < MIN_ALPHABET_LENGTH {
            return Err(IdError::AlphabetTooShort(unique.len()));
        }
        if unique.contains(&' ') {
            return Err(IdError::AlphabetContainsSpace);
        }

        let salt: Vec<char> = salt.chars().collect();

        // Separators come out of the alphabet, topped up to keep the ratio
        let mut separators: Vec<char> = DEFAULT_SEPARATORS
            .chars()
            .filter(|c| unique.contains(c))
            .collect();
        let mut alphabet: Vec<char> = unique
            .into_iter()
            .filter(|c| !separators.contains(c))
            .collect();
        shuffle(&mut separators, &salt);

        if separators.is_empty()
            || alphabet.len() as f64 / separators.len() as f64 > SEPARATOR_RATIO
        {
            let mut wanted = (alphabet.len() as f64 / SEPARATOR_RATIO).ceil() as usize;
            if wanted == 1 {
                wanted += 1;
            }
            if wanted > separators.len() {
                let diff = (wanted - separators.len()).min(alphabet.len());
                separators.extend(alphabet.drain(..diff));
            } else {
                separators.truncate(wanted);
            }
        }

        shuffle(&mut alphabet, &salt);

        let guard_count = (alphabet.len() as f64 / GUARD_RATIO).ceil() as usize;
        let guards: Vec<char> = if alphabet.len() < 3 {
            separators.drain(..guard_count.min(separators.len())).collect()
        } else {
            alphabet.drain(..guard_count).collect()
        };

        Ok(Self {
            salt,
            min_length,
            alphabet,
            separators,
            guards,
        })
    }

    pub fn encode(&self, id: u64) -> String {
        self.encode_many(&[id])
    }

    pub fn encode_many(&self, numbers: &[u64]) -> String {
        if numbers.is_empty() {
            return String::new();
        }

        let mut alphabet = self.alphabet.clone();
        let numbers_id: u64 = numbers
            .iter()
            .enumerate()
            .map(|(i, &n)| n % (i as u64 + 100))
            .sum();

        let lottery = alphabet[(numbers_id % alphabet.len() as u64) as usize];
        let mut out = vec![lottery];

        for (i, &number) in numbers.iter().enumerate() {
            self.reshuffle(&mut alphabet, lottery);
            let last = to_alphabet(number, &alphabet);
            out.extend_from_slice(&last);

            if i + 1 < numbers.len() {
                let n = number % (last[0] as u64 + i as u64);
                out.push(self.separators[(n % self.separators.len() as u64) as usize]);
            }
        }

        if out.len() < self.min_length && !self.guards.is_empty() {
            let index = (numbers_id + out[0] as u64) % self.guards.len() as u64;
            out.insert(0, self.guards[index as usize]);

            if out.len() < self.min_length {
                let index = (numbers_id + out[2] as u64) % self.guards.len() as u64;
                out.push(self.guards[index as usize]);
            }
        }

        let half = alphabet.len() / 2;
        while out.len() < self.min_length {
            let key = alphabet.clone();
            shuffle(&mut alphabet, &key);

            let mut padded = alphabet[half..].to_vec();
            padded.extend_from_slice(&out);
            padded.extend_from_slice(&alphabet[..half]);
            out = padded;

            if out.len() > self.min_length {
                let start = (out.len() - self.min_length) / 2;
                out = out[start..start + self.min_length].to_vec();
            }
        }

        out.into_iter().collect()
    }

    /// Decode a single ID.
    pub fn decode(&self, hash: &str) -> Result<u64, IdError> {
        match self.decode_many(hash)?.as_slice() {
            [id] => Ok(*id),
            other => Err(IdError::Malformed(format!(
                "expected one number, found {}",
                other.len()
            ))),
        }
    }

    /// Decode every number in `hash`.
    ///
    /// Strings that do not re-encode to themselves are rejected, which
    /// catches tampered and foreign IDs.
    pub fn decode_many(&self, hash: &str) -> Result<Vec<u64>, IdError> {
        let chars: Vec<char> = hash.chars().collect();
        let parts: Vec<&[char]> = chars.split(|c| self.guards.contains(c)).collect();
        let body = match parts.len() {
            2 | 3 => parts[1],
            _ => parts[0],
        };

        let (&lottery, rest) = body
            .split_first()
            .ok_or_else(|| IdError::Malformed("empty".to_string()))?;

        let mut alphabet = self.alphabet.clone();
        let mut numbers = Vec::new();
        for chunk in rest.split(|c| self.separators.contains(c)) {
            self.reshuffle(&mut alphabet, lottery);
            numbers.push(from_alphabet(chunk, &alphabet)?);
        }

        if self.encode_many(&numbers) != hash {
            return Err(IdError::Malformed(hash.to_string()));
        }
        Ok(numbers)
    }

    fn reshuffle(&self, alphabet: &mut [char], lottery: char) {
        let mut buffer = Vec::with_capacity(1 + self.salt.len() + alphabet.len());
        buffer.push(lottery);
        buffer.extend_from_slice(&self.salt);
        buffer.extend_from_slice(alphabet);
        let len = alphabet.len();
        shuffle(alphabet, &buffer[..len]);
    }
}

/// Deterministic salt-keyed permutation.
fn shuffle(chars: &mut [char], salt: &[char]) {
    if salt.is_empty() {
        return;
    }
    let mut p: u64 = 0;
    for (v, i) in (1..chars.len()).rev().enumerate() {
        let v = v % salt.len();
        let integer = salt[v] as u64;
        p += integer;
        let j = ((integer + v as u64 + p) % i as u64) as usize;
        chars.swap(i, j);
    }
}

fn to_alphabet(mut n: u64, alphabet: &[char]) -> Vec<char> {
    let base = alphabet.len() as u64;
    let mut out = Vec::new();
    loop {
        out.push(alphabet[(n % base) as usize]);
        n /= base;
        if n == 0 {
            break;
        }
    }
    out.reverse();
    out
}

fn from_alphabet(chunk: &[char], alphabet: &[char]) -> Result<u64, IdError> {
    let base = alphabet.len() as u64;
    chunk.iter().try_fold(0u64, |acc, c| {
        let digit = alphabet
            .iter()
            .position(|a| a == c)
            .ok_or(IdError::InvalidCharacter(*c))? as u64;
        acc.checked_mul(base)
            .and_then(|v| v.checked_add(digit))
            .ok_or(IdError::Overflow)
    })
}
