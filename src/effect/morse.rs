//! Morse code conversion.
//!
//! Text is first converted to a string of dots, dashes and spaces, with a
//! space following every character. That string is then packed into bytes
//! holding four 2-bit symbols each, least significant bits first:
//!
//! | bits | symbol     |
//! |------|------------|
//! | 00   | space      |
//! | 01   | dot        |
//! | 10   | dash       |
//! | 11   | terminator |

use crate::packet::profile::PAGE_SIZE;

/// Maximum number of symbols in a sequence, leaving room for the terminator.
pub const MAX_SYMBOLS: usize = PAGE_SIZE * 4 - 1;

const TERMINATOR: u8 = 0b11;

/// Codes for ASCII 0x20 (space) through 0x5A (Z), empty codes are unsupported.
const CODES: [&str; 59] = [
    " ", "-.-.--", ".-..-.", "", "...-..-", "", ".-...", ".----.", "-.--.", "-.--.-", "", ".-.-.",
    "--..--", "-....-", ".-.-.-", "-..-.", "-----", ".----", "..---", "...--", "....-", ".....",
    "-....", "--...", "---..", "----.", "---...", "-.-.-.", "", "-...-", "", "..--..", ".--.-.",
    ".-", "-...", "-.-.", "-..", ".", "..-.", "--.", "....", "..", ".---", "-.-", ".-..", "--",
    "-.", "---", ".--.", "--.-", ".-.", "...", "-", "..-", "...-", ".--", "-..-", "-.--", "--..",
];

fn code(character: char) -> Option<&'static str> {
    let index = (character.to_ascii_uppercase() as u32).checked_sub(0x20)?;
    CODES.get(index as usize).copied().filter(|code| !code.is_empty())
}

fn character(code: &str) -> Option<char> {
    let index = CODES.iter().position(|candidate| !candidate.is_empty() && *candidate == code)?;
    Some((0x20 + index as u8) as char)
}

/// Convert text to dots and dashes.
///
/// Lowercase letters are treated as uppercase, characters without a morse
/// code are dropped.
pub fn encode(text: &str) -> String {
    let mut morse = String::new();

    for code in text.chars().filter_map(code) {
        morse.push_str(code);
        morse.push(' ');
    }

    morse
}

/// Convert dots and dashes back to lowercase text.
///
/// Words are separated by a double space, every decoded word is followed by a
/// single space.
pub fn decode(morse: &str) -> String {
    let mut text = String::new();

    for word in morse.split("  ").filter(|word| !word.trim().is_empty()) {
        text.extend(word.split_whitespace().filter_map(character).map(|c| c.to_ascii_lowercase()));
        text.push(' ');
    }

    text
}

/// Pack dots and dashes into 2-bit symbols followed by a terminator.
///
/// Sequences longer than [`MAX_SYMBOLS`] are cut after the last complete
/// character which still fits.
pub fn to_bytes(morse: &str) -> Vec<u8> {
    let mut symbols: Vec<u8> = morse
        .chars()
        .filter_map(|symbol| match symbol {
            ' ' => Some(0b00),
            '.' => Some(0b01),
            '-' => Some(0b10),
            _ => None,
        })
        .collect();

    if symbols.len() > MAX_SYMBOLS {
        let end = symbols[..MAX_SYMBOLS].iter().rposition(|symbol| *symbol == 0b00).map_or(0, |i| i + 1);
        symbols.truncate(end);
    }
    symbols.push(TERMINATOR);

    symbols
        .chunks(4)
        .map(|chunk| chunk.iter().enumerate().fold(0, |byte, (i, symbol)| byte | symbol << (i * 2)))
        .collect()
}

/// Unpack 2-bit symbols up to the first terminator.
pub fn from_bytes(bytes: &[u8]) -> String {
    let mut morse = String::new();

    for byte in bytes {
        for shift in (0..8).step_by(2) {
            match (byte >> shift) & 0b11 {
                0b00 => morse.push(' '),
                0b01 => morse.push('.'),
                0b10 => morse.push('-'),
                _ => return morse,
            }
        }
    }

    morse
}

/// Packed sequence padded to a full morse page.
pub fn to_page(morse: &str) -> [u8; PAGE_SIZE] {
    let mut page = [0; PAGE_SIZE];
    let bytes = to_bytes(morse);
    page[..bytes.len()].copy_from_slice(&bytes);
    page
}
