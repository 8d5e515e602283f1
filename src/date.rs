//! Dates as canonical long-form Russian phrases.
//!
//! `21.06.1992` becomes "ДВАДЦАТЬ ПЕРВОЕ ИЮНЯ ОДНА ТЫСЯЧА ДЕВЯТЬСОТ ДЕВЯНОСТО
//! ВТОРОГО ГОДА", which is then encoded like any other word.

const ORDINAL_DAY: [&str; 31] = [
    "ПЕРВОЕ",
    "ВТОРОЕ",
    "ТРЕТЬЕ",
    "ЧЕТВЁРТОЕ",
    "ПЯТОЕ",
    "ШЕСТОЕ",
    "СЕДЬМОЕ",
    "ВОСЬМОЕ",
    "ДЕВЯТОЕ",
    "ДЕСЯТОЕ",
    "ОДИННАДЦАТОЕ",
    "ДВЕНАДЦАТОЕ",
    "ТРИНАДЦАТОЕ",
    "ЧЕТЫРНАДЦАТОЕ",
    "ПЯТНАДЦАТОЕ",
    "ШЕСТНАДЦАТОЕ",
    "СЕМНАДЦАТОЕ",
    "ВОСЕМНАДЦАТОЕ",
    "ДЕВЯТНАДЦАТОЕ",
    "ДВАДЦАТОЕ",
    "ДВАДЦАТЬ ПЕРВОЕ",
    "ДВАДЦАТЬ ВТОРОЕ",
    "ДВАДЦАТЬ ТРЕТЬЕ",
    "ДВАДЦАТЬ ЧЕТВЁРТОЕ",
    "ДВАДЦАТЬ ПЯТОЕ",
    "ДВАДЦАТЬ ШЕСТОЕ",
    "ДВАДЦАТЬ СЕДЬМОЕ",
    "ДВАДЦАТЬ ВОСЬМОЕ",
    "ДВАДЦАТЬ ДЕВЯТОЕ",
    "ТРИДЦАТОЕ",
    "ТРИДЦАТЬ ПЕРВОЕ",
];

const MONTH_GENITIVE: [&str; 12] = [
    "ЯНВАРЯ", "ФЕВРАЛЯ", "МАРТА", "АПРЕЛЯ", "МАЯ", "ИЮНЯ", "ИЮЛЯ", "АВГУСТА", "СЕНТЯБРЯ",
    "ОКТЯБРЯ", "НОЯБРЯ", "ДЕКАБРЯ",
];

const ORD_UNIT_GEN: [&str; 10] = [
    "", "ПЕРВОГО", "ВТОРОГО", "ТРЕТЬЕГО", "ЧЕТВЁРТОГО", "ПЯТОГО", "ШЕСТОГО", "СЕДЬМОГО",
    "ВОСЬМОГО", "ДЕВЯТОГО",
];
const ORD_TEEN_GEN: [&str; 10] = [
    "ДЕСЯТОГО",
    "ОДИННАДЦАТОГО",
    "ДВЕНАДЦАТОГО",
    "ТРИНАДЦАТОГО",
    "ЧЕТЫРНАДЦАТОГО",
    "ПЯТНАДЦАТОГО",
    "ШЕСТНАДЦАТОГО",
    "СЕМНАДЦАТОГО",
    "ВОСЕМНАДЦАТОГО",
    "ДЕВЯТНАДЦАТОГО",
];
const TENS_CARDINAL: [&str; 10] = [
    "", "", "ДВАДЦАТЬ", "ТРИДЦАТЬ", "СОРОК", "ПЯТЬДЕСЯТ", "ШЕСТЬДЕСЯТ", "СЕМЬДЕСЯТ",
    "ВОСЕМЬДЕСЯТ", "ДЕВЯНОСТО",
];
const TENS_ORD_GEN: [&str; 10] = [
    "",
    "",
    "ДВАДЦАТОГО",
    "ТРИДЦАТОГО",
    "СОРОКОВОГО",
    "ПЯТИДЕСЯТОГО",
    "ШЕСТИДЕСЯТОГО",
    "СЕМИДЕСЯТОГО",
    "ВОСЬМИДЕСЯТОГО",
    "ДЕВЯНОСТОГО",
];
const HUNDREDS_ORD_GEN: [&str; 10] = [
    "",
    "СОТОГО",
    "ДВУХСОТОГО",
    "ТРЁХСОТОГО",
    "ЧЕТЫРЁХСОТОГО",
    "ПЯТИСОТОГО",
    "ШЕСТИСОТОГО",
    "СЕМИСОТОГО",
    "ВОСЬМИСОТОГО",
    "ДЕВЯТИСОТОГО",
];
const THOUSANDS_COUNT: [&str; 10] = [
    "", "ОДНА", "ДВЕ", "ТРИ", "ЧЕТЫРЕ", "ПЯТЬ", "ШЕСТЬ", "СЕМЬ", "ВОСЕМЬ", "ДЕВЯТЬ",
];

/// Gregorian leap year.
pub fn is_leap(year: u32) -> bool {
    year % 400 == 0 || (year % 4 == 0 && year % 100 != 0)
}

/// Days in `month` (1..=12) of `year`.
pub fn days_in_month(month: u32, year: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        _ if is_leap(year) => 29,
        _ => 28,
    }
}

fn last_two_ordinal(n: u32) -> String {
    if (10..=19).contains(&n) {
        return ORD_TEEN_GEN[(n - 10) as usize].to_string();
    }
    let t = (n / 10) as usize;
    let u = (n % 10) as usize;
    if t == 0 {
        return ORD_UNIT_GEN[u].to_string();
    }
    if u == 0 {
        return TENS_ORD_GEN[t].to_string();
    }
    format!("{} {}", TENS_CARDINAL[t], ORD_UNIT_GEN[u])
}

fn thousands_phrase(thousands: u32) -> String {
    let th = thousands as usize;
    match thousands {
        1 => "ОДНА ТЫСЯЧА".to_string(),
        2..=4 => format!("{} ТЫСЯЧИ", THOUSANDS_COUNT[th]),
        _ => format!("{} ТЫСЯЧ", THOUSANDS_COUNT[th]),
    }
}

/// Long-form genitive phrase for a calendar date with a four-digit year.
/// Returns `None` for anything that is not a real date in 1000..=9999.
pub fn date_to_phrase(day: u32, month: u32, year: u32) -> Option<String> {
    if !(1000..=9999).contains(&year) || !(1..=12).contains(&month) {
        return None;
    }
    if day == 0 || day > days_in_month(month, year) {
        return None;
    }
    let day_word = ORDINAL_DAY.get(day as usize - 1)?;
    let month_word = MONTH_GENITIVE.get(month as usize - 1)?;
    if year == 2000 {
        return Some(format!("{day_word} {month_word} ДВУХТЫСЯЧНОГО ГОДА"));
    }

    let thousands = year / 1000;
    let hundreds = ((year % 1000) / 100) as usize;
    let last_two = year % 100;

    let mut parts = vec![thousands_phrase(thousands)];
    if hundreds > 0 {
        parts.push(HUNDREDS_ORD_GEN[hundreds].to_string());
    }
    if last_two > 0 {
        parts.push(last_two_ordinal(last_two));
    }
    Some(format!("{day_word} {month_word} {} ГОДА", parts.join(" ")))
}

fn split_date(text: &str) -> Option<(&str, &str, &str)> {
    let is_sep = |c: char| matches!(c, '.' | '-' | '/');
    let mut fields = text.trim().split(is_sep);
    let day = fields.next()?;
    let month = fields.next()?;
    let year = fields.next()?;
    if fields.next().is_some() {
        return None;
    }
    Some((day, month, year))
}

fn digits(field: &str, min: usize, max: usize) -> Option<u32> {
    if field.len() < min || field.len() > max || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

/// Recognise `D.M.YYYY` (separators `.`, `-` or `/`) and return the phrase
/// plus a `YYYYMMDD` key. Invalid calendar dates yield `None`.
///
/// # Examples
///
/// ```
/// use kryon_encoder::date::parse_date_phrase;
///
/// let (phrase, key) = parse_date_phrase("21.06.1992").unwrap();
/// assert_eq!(phrase, "ДВАДЦАТЬ ПЕРВОЕ ИЮНЯ ОДНА ТЫСЯЧА ДЕВЯТЬСОТ ДЕВЯНОСТО ВТОРОГО ГОДА");
/// assert_eq!(key, "19920621");
/// assert!(parse_date_phrase("29.02.2023").is_none());
/// ```
pub fn parse_date_phrase(text: &str) -> Option<(String, String)> {
    let (d, m, y) = split_date(text)?;
    let day = digits(d, 1, 2)?;
    let month = digits(m, 1, 2)?;
    let year = digits(y, 4, 4)?;
    let phrase = date_to_phrase(day, month, year)?;
    Some((phrase, format!("{year:04}{month:02}{day:02}")))
}
