//! Deterministic input masks for plates, phone numbers and national ids.
//!
//! Every function here is total and idempotent: it accepts arbitrary input,
//! strips everything that does not belong, and re-applies the canonical
//! grouping. Running a mask over its own output is a no-op.

/// Canonicalise a vehicle plate: alphanumerics only, uppercase, hyphen after
/// the third character, truncated to the 3+4 pattern (`ABC-1234`).
pub fn plate(input: &str) -> String {
  let clean: String = input
    .chars()
    .filter(char::is_ascii_alphanumeric)
    .map(|c| c.to_ascii_uppercase())
    .take(7)
    .collect();

  if clean.len() <= 3 {
    clean
  } else {
    format!("{}-{}", &clean[..3], &clean[3..])
  }
}

/// `true` if `s` is a fully-formed normalised plate: three letters, a
/// hyphen, then `NNNN` or `NLNN` (classic or Mercosul-style group of four,
/// where the second position may be a letter).
pub fn is_plate(s: &str) -> bool {
  let bytes = s.as_bytes();
  if bytes.len() != 8 || bytes[3] != b'-' {
    return false;
  }
  let letters = bytes[..3].iter().all(u8::is_ascii_uppercase);
  let second_ok = bytes[5].is_ascii_digit() || bytes[5].is_ascii_uppercase();
  letters
    && bytes[4].is_ascii_digit()
    && second_ok
    && bytes[6..].iter().all(u8::is_ascii_digit)
}

/// Canonicalise a phone number: digits only, capped at 11 (two-digit area
/// code plus subscriber), grouped `(DD) NNNNN-NNNN` with the hyphen after
/// the fifth subscriber digit.
pub fn phone(input: &str) -> String {
  let digits: String = input
    .chars()
    .filter(char::is_ascii_digit)
    .take(11)
    .collect();

  if digits.len() <= 2 {
    return digits;
  }
  let (area, rest) = digits.split_at(2);
  if rest.len() <= 5 {
    format!("({area}) {rest}")
  } else {
    format!("({area}) {}-{}", &rest[..5], &rest[5..])
  }
}

/// `true` if `s` carries a plausible phone number (10 or 11 digits).
pub fn is_phone(s: &str) -> bool {
  let count = s.chars().filter(char::is_ascii_digit).count();
  count == 10 || count == 11
}

/// Canonicalise a national id: digits only, capped at 11, grouped
/// `NNN.NNN.NNN-NN`.
pub fn national_id(input: &str) -> String {
  let digits: String = input
    .chars()
    .filter(char::is_ascii_digit)
    .take(11)
    .collect();

  match digits.len() {
    0..=3 => digits,
    4..=6 => format!("{}.{}", &digits[..3], &digits[3..]),
    7..=9 => format!("{}.{}.{}", &digits[..3], &digits[3..6], &digits[6..]),
    _ => format!(
      "{}.{}.{}-{}",
      &digits[..3],
      &digits[3..6],
      &digits[6..9],
      &digits[9..]
    ),
  }
}

/// `true` if `s` carries a complete national id (11 digits).
pub fn is_national_id(s: &str) -> bool {
  s.chars().filter(char::is_ascii_digit).count() == 11
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn plate_uppercases_and_inserts_hyphen() {
    assert_eq!(plate("abc1234"), "ABC-1234");
    assert_eq!(plate("abc1d23"), "ABC-1D23");
    assert_eq!(plate(" a?b c--12.34xyz"), "ABC-1234");
  }

  #[test]
  fn plate_short_input_stays_bare() {
    assert_eq!(plate("ab"), "AB");
    assert_eq!(plate("abc"), "ABC");
    assert_eq!(plate(""), "");
  }

  #[test]
  fn plate_is_idempotent() {
    for input in ["abc1234", "AB", "a1b2c3d4e5", "ABC-1D23", "?!"] {
      let once = plate(input);
      assert_eq!(plate(&once), once, "not idempotent for {input:?}");
    }
  }

  #[test]
  fn is_plate_accepts_both_patterns() {
    assert!(is_plate("ABC-1234"));
    assert!(is_plate("ABC-1D23")); // Mercosul: letter in the second position
    assert!(!is_plate("ABC-D123")); // letter in the first position is not a plate
    assert!(!is_plate("ABC-12345"));
    assert!(!is_plate("AB-1234"));
    assert!(!is_plate("ABC-12a4"));
    assert!(!is_plate("abc-1234"));
  }

  #[test]
  fn mercosul_plate_survives_the_full_mask_and_check() {
    let masked = plate("abc1d23");
    assert_eq!(masked, "ABC-1D23");
    assert!(is_plate(&masked));
  }

  #[test]
  fn phone_groups_mobile_and_landline() {
    assert_eq!(phone("11987654321"), "(11) 98765-4321");
    assert_eq!(phone("1132165498"), "(11) 32165-498");
    // A country-prefixed number is capped at 11 digits; the mask does not
    // strip country codes, matching the management form.
    assert_eq!(phone("+55 (11) 98765-4321"), "(55) 11987-6543");
    assert_eq!(phone("11"), "11");
  }

  #[test]
  fn phone_is_idempotent() {
    for input in ["11987654321", "(11) 98765-4321", "11", ""] {
      let once = phone(input);
      assert_eq!(phone(&once), once, "not idempotent for {input:?}");
    }
  }

  #[test]
  fn national_id_groups_progressively() {
    assert_eq!(national_id("12345678900"), "123.456.789-00");
    assert_eq!(national_id("123456"), "123.456");
    assert_eq!(national_id("123.456.789-00"), "123.456.789-00");
  }

  #[test]
  fn validators_count_digits_only() {
    assert!(is_phone("(11) 98765-4321"));
    assert!(!is_phone("12345"));
    assert!(is_national_id("123.456.789-00"));
    assert!(!is_national_id("123.456.789"));
  }
}
