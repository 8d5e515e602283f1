//! Russian cardinal numbers in canonical uppercase word form.
//!
//! The output feeds straight back into the code mapper, so spelling is
//! nominative case, space separated, and covers `0..=999_999`.

/// Largest number that can be spelled (and largest valid L1).
pub const CODE_MAX: u32 = 999_999;

const HUNDREDS: [&str; 10] = [
    "", "СТО", "ДВЕСТИ", "ТРИСТА", "ЧЕТЫРЕСТА", "ПЯТЬСОТ", "ШЕСТЬСОТ", "СЕМЬСОТ", "ВОСЕМЬСОТ",
    "ДЕВЯТЬСОТ",
];
const TENS: [&str; 10] = [
    "", "ДЕСЯТЬ", "ДВАДЦАТЬ", "ТРИДЦАТЬ", "СОРОК", "ПЯТЬДЕСЯТ", "ШЕСТЬДЕСЯТ", "СЕМЬДЕСЯТ",
    "ВОСЕМЬДЕСЯТ", "ДЕВЯНОСТО",
];
const UNITS: [&str; 10] = [
    "", "ОДИН", "ДВА", "ТРИ", "ЧЕТЫРЕ", "ПЯТЬ", "ШЕСТЬ", "СЕМЬ", "ВОСЕМЬ", "ДЕВЯТЬ",
];
const UNITS_FEMININE: [&str; 10] = [
    "", "ОДНА", "ДВЕ", "ТРИ", "ЧЕТЫРЕ", "ПЯТЬ", "ШЕСТЬ", "СЕМЬ", "ВОСЕМЬ", "ДЕВЯТЬ",
];
const TEENS: [&str; 10] = [
    "ДЕСЯТЬ", "ОДИННАДЦАТЬ", "ДВЕНАДЦАТЬ", "ТРИНАДЦАТЬ", "ЧЕТЫРНАДЦАТЬ", "ПЯТНАДЦАТЬ",
    "ШЕСТНАДЦАТЬ", "СЕМНАДЦАТЬ", "ВОСЕМНАДЦАТЬ", "ДЕВЯТНАДЦАТЬ",
];

const ZERO: &str = "НОЛЬ";

/// Grammatical gender of the counted noun.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Gender {
    Masculine,
    /// Used when counting thousands (ОДНА ТЫСЯЧА, ДВЕ ТЫСЯЧИ).
    Feminine,
}

fn below_thousand(n: u32, gender: Gender) -> Vec<&'static str> {
    let units = match gender {
        Gender::Masculine => &UNITS,
        Gender::Feminine => &UNITS_FEMININE,
    };
    let h = (n / 100) as usize;
    let t = ((n % 100) / 10) as usize;
    let u = (n % 10) as usize;

    let mut out = Vec::with_capacity(3);
    if h > 0 {
        out.push(HUNDREDS[h]);
    }
    if t == 1 {
        out.push(TEENS[u]);
    } else {
        if t > 0 {
            out.push(TENS[t]);
        }
        if u > 0 {
            out.push(units[u]);
        }
    }
    out
}

/// Agreement form of ТЫСЯЧА for a count of thousands.
pub fn thousand_word(count: u32) -> &'static str {
    let mod100 = count % 100;
    let mod10 = count % 10;
    if (11..=14).contains(&mod100) {
        "ТЫСЯЧ"
    } else if mod10 == 1 {
        "ТЫСЯЧА"
    } else if (2..=4).contains(&mod10) {
        "ТЫСЯЧИ"
    } else {
        "ТЫСЯЧ"
    }
}

/// Spell `n` as uppercase Russian words, `None` above [`CODE_MAX`].
///
/// # Examples
///
/// ```
/// use kryon_encoder::speller::spell;
///
/// assert_eq!(spell(0).as_deref(), Some("НОЛЬ"));
/// assert_eq!(spell(21_000).as_deref(), Some("ДВАДЦАТЬ ОДНА ТЫСЯЧА"));
/// assert_eq!(spell(2_005).as_deref(), Some("ДВЕ ТЫСЯЧИ ПЯТЬ"));
/// assert!(spell(1_000_000).is_none());
/// ```
pub fn spell(n: u32) -> Option<String> {
    if n > CODE_MAX {
        return None;
    }
    if n == 0 {
        return Some(ZERO.to_string());
    }
    if n < 1000 {
        return Some(below_thousand(n, Gender::Masculine).join(" "));
    }

    let thousands = n / 1000;
    let rest = n % 1000;

    let mut words = below_thousand(thousands, Gender::Feminine);
    words.push(thousand_word(thousands));
    if rest > 0 {
        words.extend(below_thousand(rest, Gender::Masculine));
    }
    Some(words.join(" "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_numbers() {
        assert_eq!(spell(1).unwrap(), "ОДИН");
        assert_eq!(spell(10).unwrap(), "ДЕСЯТЬ");
        assert_eq!(spell(15).unwrap(), "ПЯТНАДЦАТЬ");
        assert_eq!(spell(40).unwrap(), "СОРОК");
        assert_eq!(spell(115).unwrap(), "СТО ПЯТНАДЦАТЬ");
        assert_eq!(spell(302).unwrap(), "ТРИСТА ДВА");
        assert_eq!(spell(999).unwrap(), "ДЕВЯТЬСОТ ДЕВЯНОСТО ДЕВЯТЬ");
    }

    #[test]
    fn thousands_agree_in_number_and_gender() {
        assert_eq!(spell(1000).unwrap(), "ОДНА ТЫСЯЧА");
        assert_eq!(spell(2000).unwrap(), "ДВЕ ТЫСЯЧИ");
        assert_eq!(spell(3000).unwrap(), "ТРИ ТЫСЯЧИ");
        assert_eq!(spell(5000).unwrap(), "ПЯТЬ ТЫСЯЧ");
        assert_eq!(spell(11_000).unwrap(), "ОДИННАДЦАТЬ ТЫСЯЧ");
        assert_eq!(spell(14_000).unwrap(), "ЧЕТЫРНАДЦАТЬ ТЫСЯЧ");
        assert_eq!(spell(22_000).unwrap(), "ДВАДЦАТЬ ДВЕ ТЫСЯЧИ");
        assert_eq!(spell(112_000).unwrap(), "СТО ДВЕНАДЦАТЬ ТЫСЯЧ");
    }

    #[test]
    fn remainder_clause_is_masculine_and_omitted_when_zero() {
        assert_eq!(spell(1001).unwrap(), "ОДНА ТЫСЯЧА ОДИН");
        assert_eq!(spell(2002).unwrap(), "ДВЕ ТЫСЯЧИ ДВА");
        assert_eq!(spell(40_000).unwrap(), "СОРОК ТЫСЯЧ");
    }

    #[test]
    fn upper_bound() {
        assert_eq!(
            spell(CODE_MAX).unwrap(),
            "ДЕВЯТЬСОТ ДЕВЯНОСТО ДЕВЯТЬ ТЫСЯЧ ДЕВЯТЬСОТ ДЕВЯНОСТО ДЕВЯТЬ"
        );
        assert!(spell(CODE_MAX + 1).is_none());
    }
}
