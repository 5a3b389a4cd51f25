// Display formatting for dates, times and phone numbers (Indonesian locale)

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};

use super::datetime::to_jakarta;

const EMPTY: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatKind {
    #[default]
    Full,
    FullDay,
    Short,
    ShortDay,
}

impl std::str::FromStr for FormatKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "full" => Ok(FormatKind::Full),
            "full_day" => Ok(FormatKind::FullDay),
            "short" => Ok(FormatKind::Short),
            "short_day" => Ok(FormatKind::ShortDay),
            other => Err(format!("unknown format kind: {}", other)),
        }
    }
}

pub fn day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Senin",
        Weekday::Tue => "Selasa",
        Weekday::Wed => "Rabu",
        Weekday::Thu => "Kamis",
        Weekday::Fri => "Jumat",
        Weekday::Sat => "Sabtu",
        Weekday::Sun => "Minggu",
    }
}

pub fn short_day_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Sen",
        Weekday::Tue => "Sel",
        Weekday::Wed => "Rab",
        Weekday::Thu => "Kam",
        Weekday::Fri => "Jum",
        Weekday::Sat => "Sab",
        Weekday::Sun => "Min",
    }
}

/// Format a timestamp in Jakarta time.
///
/// `Full` -> `30/12/2025 15:30:00`, `FullDay` -> `Selasa, 30/12/2025 15:30:00`,
/// `Short` -> `30/12 15:30`, `ShortDay` -> `Sel, 30/12 15:30`. `None` renders as `-`.
pub fn format_datetime(dt: Option<DateTime<Utc>>, kind: FormatKind) -> String {
    let Some(dt) = dt else {
        return EMPTY.to_string();
    };
    let local = to_jakarta(dt);
    let weekday = local.weekday();

    match kind {
        FormatKind::Full => local.format("%d/%m/%Y %H:%M:%S").to_string(),
        FormatKind::FullDay => format!("{}, {}", day_name(weekday), local.format("%d/%m/%Y %H:%M:%S")),
        FormatKind::Short => local.format("%d/%m %H:%M").to_string(),
        FormatKind::ShortDay => format!("{}, {}", short_day_name(weekday), local.format("%d/%m %H:%M")),
    }
}

/// Format a calendar date: `30/12/2025`, `Selasa, 30/12/2025`, `30/12/25`, `Sel, 30/12/25`.
pub fn format_date(date: Option<NaiveDate>, kind: FormatKind) -> String {
    let Some(date) = date else {
        return EMPTY.to_string();
    };
    let weekday = date.weekday();

    match kind {
        FormatKind::Full => date.format("%d/%m/%Y").to_string(),
        FormatKind::FullDay => format!("{}, {}", day_name(weekday), date.format("%d/%m/%Y")),
        FormatKind::Short => date.format("%d/%m/%y").to_string(),
        FormatKind::ShortDay => format!("{}, {}", short_day_name(weekday), date.format("%d/%m/%y")),
    }
}

pub fn format_time(dt: Option<DateTime<Utc>>, with_seconds: bool) -> String {
    let Some(dt) = dt else {
        return EMPTY.to_string();
    };
    let pattern = if with_seconds { "%H:%M:%S" } else { "%H:%M" };
    to_jakarta(dt).format(pattern).to_string()
}

/// Normalize an Indonesian phone number for display: `+62 812 3456 7890` -> `0812-3456-7890`.
pub fn format_phone(raw: Option<&str>) -> String {
    let digits: String = raw.unwrap_or_default().chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return EMPTY.to_string();
    }

    let local = match digits.strip_prefix("62") {
        Some(rest) => format!("0{}", rest),
        None => digits,
    };

    let mut groups = Vec::new();
    let mut rest = local.as_str();
    while rest.len() > 4 && groups.len() < 2 {
        let (head, tail) = rest.split_at(4);
        groups.push(head);
        rest = tail;
    }
    groups.push(rest);
    groups.join("-")
}
