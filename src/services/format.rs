//! Display helpers shared by the CLI views.

use chrono::{DateTime, Datelike, NaiveDateTime, Timelike, Utc};

use crate::models::email::Category;

const MONTHS_PT: [&str; 12] = [
    "janeiro", "fevereiro", "março", "abril", "maio", "junho", "julho", "agosto", "setembro",
    "outubro", "novembro", "dezembro",
];

/// Display label for a category. Unknown values are capitalized as-is.
pub fn format_category(category: &str) -> String {
    match category.parse::<Category>() {
        Ok(Category::Productive) => "Produtivo".to_string(),
        Ok(Category::Unproductive) => "Improdutivo".to_string(),
        _ => capitalize(category),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Guess a display name from an address: `joao.silva_2@x.com` → `Joao Silva`.
pub fn extract_name_from_email(email: &str) -> String {
    if email.is_empty() {
        return String::new();
    }

    let local = email.split('@').next().unwrap_or_default();
    if local.is_empty() {
        return email.to_string();
    }

    local
        .replace(['.', '_'], " ")
        .chars()
        .filter(|c| !c.is_ascii_digit())
        .collect::<String>()
        .split(' ')
        .map(|part| {
            let lower = part.to_lowercase();
            capitalize(&lower)
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Cut `text` to `max_chars` characters, appending `...` when shortened.
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}...", &text[..byte_idx]),
        None => text.to_string(),
    }
}

/// Estimated queue wait, `Imediato` when there is none.
pub fn format_wait(seconds: f64) -> String {
    if seconds <= 0.0 {
        "Imediato".to_string()
    } else {
        format!("{}s", seconds.round() as u64)
    }
}

/// Confidence scores are 0–100.
pub fn format_confidence(score: f64) -> String {
    format!("{:.0}%", score.clamp(0.0, 100.0))
}

/// Backend timestamps come either as RFC 3339 or as naive ISO-8601 local
/// times; the latter are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    value
        .parse::<NaiveDateTime>()
        .ok()
        .map(|naive| naive.and_utc())
}

/// Relative age in Portuguese, e.g. `há 5 minutos`.
pub fn format_relative(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created_at).num_seconds().max(0);
    let (amount, singular, plural) = match seconds {
        s if s < 60 => return "há menos de um minuto".to_string(),
        s if s < 3_600 => (s / 60, "minuto", "minutos"),
        s if s < 86_400 => (s / 3_600, "hora", "horas"),
        s if s < 30 * 86_400 => (s / 86_400, "dia", "dias"),
        s if s < 365 * 86_400 => (s / (30 * 86_400), "mês", "meses"),
        s => (s / (365 * 86_400), "ano", "anos"),
    };
    let unit = if amount == 1 { singular } else { plural };
    format!("há {amount} {unit}")
}

/// Long date in Portuguese, e.g. `1 de março de 2025 às 10:05`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    format!(
        "{} de {} de {} às {:02}:{:02}",
        at.day(),
        MONTHS_PT[at.month0() as usize],
        at.year(),
        at.hour(),
        at.minute()
    )
}

/// Short job id for listings.
pub fn short_id(id: &str, len: usize) -> String {
    truncate_text(id, len)
}
