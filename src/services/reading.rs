// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reading speed tracking.

use crate::error::AppError;
use crate::models::{ContentRef, ReadingStats};

/// Sessions faster than this are treated as skimming or bad client data.
pub const MAX_PLAUSIBLE_WPM: f64 = 1500.0;

/// One reading session reported by a client.
#[derive(Debug, Clone)]
pub struct ReadingSession {
    pub content: ContentRef,
    pub words_read: u32,
    pub seconds: u32,
    pub progress_percent: Option<u8>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ReadingError {
    #[error("Session duration must be greater than 0 seconds")]
    ZeroDuration,

    #[error("Session must cover at least one word")]
    NoWords,

    #[error("Progress must be between 0 and 100, got {0}")]
    ProgressOutOfRange(u8),

    #[error("Reading speed of {0:.0} words per minute is not plausible")]
    ImplausibleSpeed(f64),
}

impl From<ReadingError> for AppError {
    fn from(err: ReadingError) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Words per minute for a single session.
pub fn session_wpm(words: u32, seconds: u32) -> f64 {
    if seconds == 0 {
        return 0.0;
    }
    words as f64 * 60.0 / seconds as f64
}

/// Fold a session into the running stats.
///
/// The stats are left untouched when the session is rejected.
pub fn record_session(
    stats: &mut ReadingStats,
    session: &ReadingSession,
    now: &str,
) -> Result<f64, ReadingError> {
    if session.seconds == 0 {
        return Err(ReadingError::ZeroDuration);
    }
    if session.words_read == 0 {
        return Err(ReadingError::NoWords);
    }
    if let Some(p) = session.progress_percent.filter(|p| *p > 100) {
        return Err(ReadingError::ProgressOutOfRange(p));
    }

    let wpm = session_wpm(session.words_read, session.seconds);
    if wpm > MAX_PLAUSIBLE_WPM {
        return Err(ReadingError::ImplausibleSpeed(wpm));
    }

    stats.sessions += 1;
    stats.total_words += u64::from(session.words_read);
    stats.total_seconds += u64::from(session.seconds);
    stats.average_wpm =
        ((stats.total_words as f64 * 60.0 / stats.total_seconds as f64) * 10.0).round() / 10.0;
    if let Some(progress) = session.progress_percent {
        stats.progress.insert(session.content.key(), progress);
    }
    stats.last_read_at = Some(now.to_string());

    Ok(wpm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(words: u32, seconds: u32, progress: Option<u8>) -> ReadingSession {
        ReadingSession {
            content: ContentRef::book(1),
            words_read: words,
            seconds,
            progress_percent: progress,
        }
    }

    #[test]
    fn test_average_is_weighted_by_time() {
        let mut stats = ReadingStats::default();

        // 300 wpm for 2 minutes, then 150 wpm for 2 minutes
        record_session(&mut stats, &session(600, 120, Some(10)), "t1").unwrap();
        record_session(&mut stats, &session(300, 120, Some(25)), "t2").unwrap();

        assert_eq!(stats.sessions, 2);
        assert_eq!(stats.total_words, 900);
        assert_eq!(stats.total_seconds, 240);
        assert_eq!(stats.average_wpm, 225.0);
        assert_eq!(stats.progress.get("book:1"), Some(&25));
        assert_eq!(stats.last_read_at.as_deref(), Some("t2"));
    }

    #[test]
    fn test_rejected_sessions_leave_stats_untouched() {
        let mut stats = ReadingStats::default();

        assert_eq!(
            record_session(&mut stats, &session(100, 0, None), "t"),
            Err(ReadingError::ZeroDuration)
        );
        assert_eq!(
            record_session(&mut stats, &session(0, 60, None), "t"),
            Err(ReadingError::NoWords)
        );
        assert_eq!(
            record_session(&mut stats, &session(100, 60, Some(101)), "t"),
            Err(ReadingError::ProgressOutOfRange(101))
        );
        assert!(matches!(
            record_session(&mut stats, &session(5000, 60, None), "t"),
            Err(ReadingError::ImplausibleSpeed(_))
        ));

        assert_eq!(stats.sessions, 0);
        assert!(stats.last_read_at.is_none());
    }

    #[test]
    fn test_session_without_progress_keeps_previous() {
        let mut stats = ReadingStats::default();
        record_session(&mut stats, &session(200, 60, Some(40)), "t1").unwrap();
        record_session(&mut stats, &session(200, 60, None), "t2").unwrap();
        assert_eq!(stats.progress.get("book:1"), Some(&40));
    }
}
