use std::time::Duration;

use crate::error::{ReelError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct SrtCue {
    pub index: usize,
    pub start: Duration,
    pub end: Duration,
    pub text: String,
}

pub fn format_timestamp(seconds: f64) -> String {
    let total_ms = (seconds.max(0.0) * 1000.0).round() as u64;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms / 60_000) % 60;
    let secs = (total_ms / 1000) % 60;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{secs:02},{millis:03}")
}

/// One text line per cue, 1-based indices, blank line between cues.
pub fn format_srt<'a>(cues: impl IntoIterator<Item = (f64, f64, &'a str)>) -> String {
    let mut out = String::new();
    for (idx, (start, end, text)) in cues.into_iter().enumerate() {
        if idx > 0 {
            out.push('\n');
        }
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n",
            idx + 1,
            format_timestamp(start),
            format_timestamp(end),
            text.replace('\n', " ")
        ));
    }
    out
}

fn srt_error(reason: impl Into<String>) -> ReelError {
    ReelError::schema("captions.srt", reason)
}

pub fn parse_srt(input: &str) -> Result<Vec<SrtCue>> {
    let mut cues = Vec::new();
    let mut lines = input.lines().peekable();

    while let Some(line) = lines.next() {
        let index_line = line.trim().trim_start_matches('\u{feff}');
        if index_line.is_empty() {
            continue;
        }

        // Index line can be omitted by some writers; fall back to position.
        let (index, times) = match index_line.parse::<usize>() {
            Ok(index) => (
                index,
                lines
                    .next()
                    .map(str::trim)
                    .ok_or_else(|| srt_error(format!("cue {index} is missing a timestamp line")))?,
            ),
            Err(_) => (cues.len() + 1, index_line),
        };

        let (start_raw, end_raw) = times
            .split_once("-->")
            .map(|(a, b)| (a.trim(), b.trim()))
            .ok_or_else(|| srt_error(format!("timestamp line must contain '-->': '{times}'")))?;

        let start = parse_timestamp(start_raw)?;
        let end = parse_timestamp(end_raw)?;
        if end < start {
            return Err(srt_error(format!(
                "cue ends before it starts: {start_raw} --> {end_raw}"
            )));
        }

        let mut text_lines = Vec::new();
        while let Some(next) = lines.peek() {
            if next.trim().is_empty() {
                break;
            }
            text_lines.push(next.trim().to_string());
            lines.next();
        }

        cues.push(SrtCue {
            index,
            start,
            end,
            text: text_lines.join(" "),
        });
    }

    Ok(cues)
}

pub fn parse_timestamp(value: &str) -> Result<Duration> {
    let bad = || srt_error(format!("invalid timestamp '{value}'"));
    let cleaned = value.trim().replace(',', ".");
    let (time_part, fractional_part) = cleaned.split_once('.').unwrap_or((cleaned.as_str(), "0"));

    let mut hms = time_part.split(':');
    let mut component = || -> Result<u64> {
        hms.next()
            .ok_or_else(bad)?
            .parse::<u64>()
            .map_err(|_| bad())
    };
    let hours = component()?;
    let minutes = component()?;
    let seconds = component()?;
    if hms.next().is_some() {
        return Err(bad());
    }

    let mut millis_str: String = fractional_part.chars().take(3).collect();
    while millis_str.len() < 3 {
        millis_str.push('0');
    }
    let millis = millis_str.parse::<u64>().map_err(|_| bad())?;

    let total_seconds = hours * 3600 + minutes * 60 + seconds;
    Ok(Duration::from_secs(total_seconds) + Duration::from_millis(millis))
}
