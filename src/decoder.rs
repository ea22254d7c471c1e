//! Decoder for the plain-text CloudWatcher status report.
//!
//! A report is a list of `key=value` lines. Each line is matched against the
//! known keys in a fixed order and the first match consumes it. Lines that do
//! not match any key are logged and skipped. After all lines are consumed the
//! mandatory fields are checked; a report missing one of them is rejected as a
//! whole.

use tracing::warn;

use crate::error::DecodeError;
use crate::models::{Field, Reading, SwitchState};

// ---

/// Target slot for a matched line.
#[derive(Debug, Clone, Copy)]
enum Slot {
    Date,
    CwInfo,
    Clouds,
    Temp,
    Wind,
    Gust,
    Rain,
    LightMpsas,
    Switch,
    Safe,
    Hum,
    Dewp,
    RawIr,
    AbsPress,
    RelPress,
}

#[derive(Debug, Clone, Copy)]
enum Grammar {
    /// One or more characters up to end of line.
    Text,
    /// Floating point literal, trailing garbage ignored.
    Number,
    /// Integer literal, zero is false.
    Flag,
}

/// Match order matters: the first pattern that accepts a line wins.
const PATTERNS: [(&str, Grammar, Slot); 15] = [
    ("dataGMTTime=", Grammar::Text, Slot::Date),
    ("cwinfo=", Grammar::Text, Slot::CwInfo),
    ("clouds=", Grammar::Number, Slot::Clouds),
    ("temp=", Grammar::Number, Slot::Temp),
    ("wind=", Grammar::Number, Slot::Wind),
    ("gust=", Grammar::Number, Slot::Gust),
    ("rain=", Grammar::Number, Slot::Rain),
    ("lightmpsas=", Grammar::Number, Slot::LightMpsas),
    ("switch=", Grammar::Flag, Slot::Switch),
    ("safe=", Grammar::Flag, Slot::Safe),
    ("hum=", Grammar::Number, Slot::Hum),
    ("dewp=", Grammar::Number, Slot::Dewp),
    ("rawir=", Grammar::Number, Slot::RawIr),
    ("abspress=", Grammar::Number, Slot::AbsPress),
    ("relpress=", Grammar::Number, Slot::RelPress),
];

#[derive(Debug)]
enum Value<'a> {
    Text(&'a str),
    Number(f64),
    Flag(bool),
}

/// Fields collected while scanning, before validation.
#[derive(Debug, Default)]
struct Partial {
    date: Option<String>,
    cwinfo: Option<String>,
    switch: SwitchState,
    safe: bool,
    clouds: Option<f64>,
    temp: Option<f64>,
    lightmpsas: Option<f64>,
    rawir: Option<f64>,
    wind: Option<f64>,
    gust: Option<f64>,
    rain: Option<f64>,
    hum: Option<f64>,
    dewp: Option<f64>,
    abspress: Option<f64>,
    relpress: Option<f64>,
}

impl Partial {
    fn store(&mut self, slot: Slot, value: Value<'_>) {
        // ---
        match (slot, value) {
            (Slot::Date, Value::Text(s)) => self.date = Some(s.to_string()),
            (Slot::CwInfo, Value::Text(s)) => self.cwinfo = Some(s.to_string()),
            (Slot::Switch, Value::Flag(b)) => self.switch = SwitchState::from_raw(b),
            (Slot::Safe, Value::Flag(b)) => self.safe = b,
            (Slot::Clouds, Value::Number(v)) => self.clouds = Some(v),
            (Slot::Temp, Value::Number(v)) => self.temp = Some(v),
            (Slot::Wind, Value::Number(v)) => self.wind = Some(v),
            (Slot::Gust, Value::Number(v)) => self.gust = Some(v),
            (Slot::Rain, Value::Number(v)) => self.rain = Some(v),
            (Slot::LightMpsas, Value::Number(v)) => self.lightmpsas = Some(v),
            (Slot::Hum, Value::Number(v)) => self.hum = Some(v),
            (Slot::Dewp, Value::Number(v)) => self.dewp = Some(v),
            (Slot::RawIr, Value::Number(v)) => self.rawir = Some(v),
            (Slot::AbsPress, Value::Number(v)) => self.abspress = Some(v),
            (Slot::RelPress, Value::Number(v)) => self.relpress = Some(v),
            // PATTERNS pairs every slot with its grammar
            (slot, value) => unreachable!("slot {slot:?} cannot hold {value:?}"),
        }
    }

    fn validate(self) -> Result<Reading, DecodeError> {
        // ---
        let date = self
            .date
            .filter(|s| !s.is_empty())
            .ok_or(DecodeError::MissingField(Field::Date))?;
        let cwinfo = self
            .cwinfo
            .filter(|s| !s.is_empty())
            .ok_or(DecodeError::MissingField(Field::CwInfo))?;
        let clouds = self.clouds.ok_or(DecodeError::MissingField(Field::Clouds))?;
        let lightmpsas = self
            .lightmpsas
            .ok_or(DecodeError::MissingField(Field::LightMpsas))?;
        let temp = self.temp.ok_or(DecodeError::MissingField(Field::Temp))?;

        Ok(Reading {
            date,
            cwinfo,
            switch: self.switch,
            safe: self.safe,
            clouds,
            temp,
            lightmpsas,
            rawir: self.rawir,
            wind: self.wind,
            gust: self.gust,
            rain: self.rain,
            hum: self.hum,
            dewp: self.dewp,
            abspress: self.abspress,
            relpress: self.relpress,
        })
    }
}

/// Decode a full report body into a validated [`Reading`].
///
/// Unrecognized lines are logged at WARN and ignored. Fails with the first
/// missing mandatory field, checked in the order date, cwinfo, clouds,
/// lightmpsas, temp.
pub fn decode(data: &str) -> Result<Reading, DecodeError> {
    // ---
    let mut partial = Partial::default();

    for line in data.lines() {
        match match_line(line) {
            Some((slot, value)) => partial.store(slot, value),
            None => warn!("Did not understand value: {}", line),
        }
    }

    partial.validate()
}

fn match_line(line: &str) -> Option<(Slot, Value<'_>)> {
    // ---
    PATTERNS.iter().find_map(|&(prefix, grammar, slot)| {
        let rest = line.strip_prefix(prefix)?;
        let value = match grammar {
            Grammar::Text => (!rest.is_empty()).then_some(Value::Text(rest))?,
            Grammar::Number => Value::Number(parse_number(rest)?),
            Grammar::Flag => Value::Flag(parse_flag(rest)?),
        };
        Some((slot, value))
    })
}

/// Parse the longest leading decimal floating point literal.
fn parse_number(s: &str) -> Option<f64> {
    // ---
    let s = s.trim_start();
    let bytes = s.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end += 1;
    }

    let int_digits = count_digits(&bytes[end..]);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = count_digits(&bytes[end + 1..]);
        if int_digits > 0 || frac_digits > 0 {
            end += 1 + frac_digits;
        }
    }

    if int_digits == 0 && frac_digits == 0 {
        return None;
    }

    // Exponent only counts when at least one digit follows it
    if matches!(bytes.get(end), Some(b'e') | Some(b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+') | Some(b'-')) {
            exp_end += 1;
        }
        let exp_digits = count_digits(&bytes[exp_end..]);
        if exp_digits > 0 {
            end = exp_end + exp_digits;
        }
    }

    s[..end].parse().ok()
}

/// Parse a leading integer literal as a flag; zero is `false`.
fn parse_flag(s: &str) -> Option<bool> {
    // ---
    let s = s.trim_start();
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    let n = count_digits(digits.as_bytes());
    if n == 0 {
        return None;
    }
    Some(digits[..n].bytes().any(|b| b != b'0'))
}

fn count_digits(bytes: &[u8]) -> usize {
    bytes.iter().take_while(|b| b.is_ascii_digit()).count()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    const FULL_REPORT: &str = "dataGMTTime=2023-01-01 00:00:00\n\
        cwinfo=AAG v1\n\
        clouds=-10.5\n\
        temp=5.2\n\
        lightmpsas=19.3\n\
        wind=12\n\
        safe=1\n\
        switch=0\n";

    fn report_without(key: &str) -> String {
        report_without_in(FULL_REPORT, key)
    }

    fn report_without_in(text: &str, key: &str) -> String {
        // ---
        text.lines()
            .filter(|l| !l.starts_with(key))
            .map(|l| format!("{l}\n"))
            .collect()
    }

    #[test]
    fn test_decodes_reference_report() {
        // ---
        let r = decode(FULL_REPORT).unwrap();

        assert_eq!(r.date, "2023-01-01 00:00:00");
        assert_eq!(r.cwinfo, "AAG v1");
        assert_eq!(r.clouds, -10.5);
        assert_eq!(r.temp, 5.2);
        assert_eq!(r.lightmpsas, 19.3);
        assert_eq!(r.wind, Some(12.0));
        assert!(r.safe);
        assert_eq!(r.switch, SwitchState::Closed);

        assert_eq!(r.gust, None);
        assert_eq!(r.rain, None);
        assert_eq!(r.hum, None);
        assert_eq!(r.dewp, None);
        assert_eq!(r.rawir, None);
        assert_eq!(r.abspress, None);
        assert_eq!(r.relpress, None);
    }

    #[test]
    fn test_decodes_every_optional_field() {
        // ---
        let text = format!(
            "{FULL_REPORT}gust=20\nrain=3000\nhum=65\ndewp=-1.25\nrawir=-15.75\n\
             abspress=950.5\nrelpress=1013.25\n"
        );
        let r = decode(&text).unwrap();

        assert_eq!(r.gust, Some(20.0));
        assert_eq!(r.rain, Some(3000.0));
        assert_eq!(r.hum, Some(65.0));
        assert_eq!(r.dewp, Some(-1.25));
        assert_eq!(r.rawir, Some(-15.75));
        assert_eq!(r.abspress, Some(950.5));
        assert_eq!(r.relpress, Some(1013.25));
    }

    #[test]
    fn test_missing_mandatory_field_is_named() {
        // ---
        let cases = [
            ("dataGMTTime=", Field::Date),
            ("cwinfo=", Field::CwInfo),
            ("clouds=", Field::Clouds),
            ("lightmpsas=", Field::LightMpsas),
            ("temp=", Field::Temp),
        ];

        for (key, field) in cases {
            let err = decode(&report_without(key)).unwrap_err();
            assert_eq!(err, DecodeError::MissingField(field), "removed {key}");
        }
    }

    #[test]
    fn test_first_missing_field_wins() {
        // ---
        let err = decode("temp=1\n").unwrap_err();
        assert_eq!(err, DecodeError::MissingField(Field::Date));

        let err = decode("dataGMTTime=x\ncwinfo=y\n").unwrap_err();
        assert_eq!(err, DecodeError::MissingField(Field::Clouds));
    }

    #[test]
    fn test_unknown_lines_are_ignored() {
        // ---
        let with_noise = format!("foo=bar\n{FULL_REPORT}\n   \nnot a pair\n");
        assert_eq!(decode(&with_noise).unwrap(), decode(FULL_REPORT).unwrap());
    }

    #[test]
    fn test_decoding_is_idempotent() {
        // ---
        assert_eq!(decode(FULL_REPORT).unwrap(), decode(FULL_REPORT).unwrap());
    }

    #[test]
    fn test_flag_values() {
        // ---
        let decode_with = |extra: &str| decode(&format!("{}{extra}\n", report_without("safe=")));

        assert!(!decode_with("safe=0").unwrap().safe);
        assert!(decode_with("safe=1").unwrap().safe);
        assert!(decode_with("safe=7").unwrap().safe);
        assert!(decode_with("safe=-2").unwrap().safe);

        let r = decode(&format!("{}switch=1\n", report_without("switch="))).unwrap();
        assert_eq!(r.switch, SwitchState::Open);
    }

    #[test]
    fn test_flags_default_when_absent() {
        // ---
        let text = report_without("safe=");
        let r = decode(&report_without_in(&text, "switch=")).unwrap();
        assert!(!r.safe);
        assert_eq!(r.switch, SwitchState::Closed);
    }

    #[test]
    fn test_text_fields_keep_whole_line() {
        // ---
        let text = FULL_REPORT.replace("cwinfo=AAG v1", "cwinfo=Serial: 1234, FW: 5.89 = ok");
        let r = decode(&text).unwrap();
        assert_eq!(r.cwinfo, "Serial: 1234, FW: 5.89 = ok");
    }

    #[test]
    fn test_crlf_line_endings() {
        // ---
        let text = FULL_REPORT.replace('\n', "\r\n");
        let r = decode(&text).unwrap();
        assert_eq!(r.date, "2023-01-01 00:00:00");
        assert_eq!(r.cwinfo, "AAG v1");
    }

    #[test]
    fn test_empty_text_value_counts_as_missing() {
        // ---
        let text = FULL_REPORT.replace("cwinfo=AAG v1", "cwinfo=");
        let err = decode(&text).unwrap_err();
        assert_eq!(err, DecodeError::MissingField(Field::CwInfo));
    }

    #[test]
    fn test_non_numeric_measurement_is_unrecognized() {
        // ---
        let text = FULL_REPORT.replace("clouds=-10.5", "clouds=n/a");
        let err = decode(&text).unwrap_err();
        assert_eq!(err, DecodeError::MissingField(Field::Clouds));
    }

    #[test]
    fn test_repeated_key_overwrites() {
        // ---
        let text = format!("{FULL_REPORT}temp=-3.5\n");
        assert_eq!(decode(&text).unwrap().temp, -3.5);
    }

    #[test]
    fn test_parse_number_prefix() {
        // ---
        assert_eq!(parse_number("12"), Some(12.0));
        assert_eq!(parse_number(" -10.5"), Some(-10.5));
        assert_eq!(parse_number("+.5"), Some(0.5));
        assert_eq!(parse_number("3."), Some(3.0));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("2.5E-1kg"), Some(0.25));
        assert_eq!(parse_number("7e"), Some(7.0));
        assert_eq!(parse_number("19.3 mpsas"), Some(19.3));
        assert_eq!(parse_number("."), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
    }

    #[test]
    fn test_parse_flag_prefix() {
        // ---
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("000"), Some(false));
        assert_eq!(parse_flag("-0"), Some(false));
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag(" 12abc"), Some(true));
        assert_eq!(parse_flag("99999999999999999999999"), Some(true));
        assert_eq!(parse_flag("x"), None);
        assert_eq!(parse_flag(""), None);
    }
}
