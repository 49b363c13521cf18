use std::io::BufRead;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::notify::{Notifier, Severity};

use super::describe::{PayloadKind, describe_payload};
use super::guard::ScanGuard;
use super::strategy::{Detection, interpret};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ScanEvent {
    /// Same payload as the last one, still inside the cooldown
    Suppressed,
    Recognized(Detection),
    Unrecognized(PayloadKind),
}

/// Interpreter behind a re-scan guard
#[derive(Debug, Clone)]
pub(crate) struct Scanner {
    guard: ScanGuard,
}

impl Scanner {
    pub(crate) fn new(cooldown: Duration) -> Self {
        Self {
            guard: ScanGuard::new(cooldown),
        }
    }

    pub(crate) fn process(&mut self, payload: &str, now: Instant) -> ScanEvent {
        if !self.guard.admit(payload, now) {
            debug!(payload, "duplicate scan suppressed");
            return ScanEvent::Suppressed;
        }
        match interpret(payload) {
            Some(detection) => {
                debug!(code = %detection.code, strategy = %detection.strategy, "employee code recognized");
                ScanEvent::Recognized(detection)
            }
            None => {
                debug!(payload, "no employee code in payload");
                ScanEvent::Unrecognized(describe_payload(payload))
            }
        }
    }

    pub(crate) fn reset(&mut self) {
        self.guard.reset();
    }
}

/// Pull polls from `source` until one yields a recognized code.
///
/// `None` polls (nothing decoded in that frame) are skipped. Rejected
/// payloads are reported through `notifier`. Returns `None` once the source
/// runs dry.
pub(crate) fn scan_until_recognized<I, C>(
    source: I,
    scanner: &mut Scanner,
    mut clock: C,
    notifier: &dyn Notifier,
) -> Option<Detection>
where
    I: IntoIterator<Item = Option<String>>,
    C: FnMut() -> Instant,
{
    for payload in source.into_iter().flatten() {
        match scanner.process(&payload, clock()) {
            ScanEvent::Recognized(detection) => return Some(detection),
            ScanEvent::Unrecognized(kind) => notifier.notify(
                &format!("Unrecognized QR code ({kind}). Expected format: EMP001"),
                Severity::Error,
            ),
            ScanEvent::Suppressed => {}
        }
    }
    None
}

/// Scanner source fed by text lines, one poll per line.
///
/// Blank lines and lines that are not UTF-8 are frames where nothing was
/// decoded. Only end of input or a read error ends the source.
pub(crate) struct LineSource<R> {
    reader: R,
}

impl<R: BufRead> LineSource<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead> Iterator for LineSource<R> {
    type Item = Option<String>;

    fn next(&mut self) -> Option<Self::Item> {
        let mut frame = Vec::new();
        match self.reader.read_until(b'\n', &mut frame) {
            Ok(0) => None,
            Ok(_) => {
                // A garbled frame decodes to nothing, like a blank one
                let Ok(line) = std::str::from_utf8(&frame) else {
                    debug!(bytes = frame.len(), "undecodable scanner frame skipped");
                    return Some(None);
                };
                let payload = line.trim_end_matches(['\r', '\n']);
                if payload.trim().is_empty() {
                    Some(None)
                } else {
                    Some(Some(payload.to_string()))
                }
            }
            Err(e) => {
                warn!(error = %e, "scanner source failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::notify::testing::RecordingNotifier;
    use crate::qr::strategy::Strategy;

    /// Clock advancing 300ms per poll, like the camera loop
    fn ticking_clock(start: Instant) -> impl FnMut() -> Instant {
        let mut tick = 0u32;
        move || {
            let now = start + Duration::from_millis(300) * tick;
            tick += 1;
            now
        }
    }

    #[test]
    fn process_reports_each_outcome() {
        let mut scanner = Scanner::new(Duration::from_secs(3));
        let t0 = Instant::now();
        assert!(matches!(
            scanner.process("hello", t0),
            ScanEvent::Unrecognized(PayloadKind::Text(_))
        ));
        assert_eq!(scanner.process("hello", t0), ScanEvent::Suppressed);
        match scanner.process("https://x.io/EMP001", t0) {
            ScanEvent::Recognized(d) => {
                assert_eq!(d.code.as_str(), "EMP001");
                assert_eq!(d.strategy, Strategy::PathEmbedded);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn identical_payload_within_cooldown_notifies_once() {
        let notifier = RecordingNotifier::default();
        let mut scanner = Scanner::new(Duration::from_secs(3));
        let polls = vec![
            Some("garbage".to_string()),
            Some("garbage".to_string()),
            None,
            Some("garbage".to_string()),
        ];
        let found = scan_until_recognized(polls, &mut scanner, ticking_clock(Instant::now()), &notifier);
        assert_eq!(found, None);
        let messages = notifier.messages.borrow();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].1, Severity::Error);
        assert!(messages[0].0.contains("text: garbage"));
    }

    #[test]
    fn repeated_badge_authenticates_once() {
        let notifier = RecordingNotifier::default();
        let mut scanner = Scanner::new(Duration::from_secs(3));
        let mut clock = ticking_clock(Instant::now());

        let first = scan_until_recognized(
            vec![None, Some("EMP002".to_string())],
            &mut scanner,
            &mut clock,
            &notifier,
        );
        assert_eq!(first.map(|d| d.code.to_string()), Some("EMP002".to_string()));

        // The camera keeps seeing the same badge right after
        let again = scan_until_recognized(
            vec![Some("EMP002".to_string()); 5],
            &mut scanner,
            &mut clock,
            &notifier,
        );
        assert_eq!(again, None);

        scanner.reset();
        let after_reset = scan_until_recognized(
            vec![Some("EMP002".to_string())],
            &mut scanner,
            &mut clock,
            &notifier,
        );
        assert!(after_reset.is_some());
    }

    #[test]
    fn line_source_maps_blank_lines_to_empty_polls() {
        let input = Cursor::new("first\n\n  \nsecond\r\n");
        let polls: Vec<_> = LineSource::new(input).collect();
        assert_eq!(
            polls,
            vec![
                Some("first".to_string()),
                None,
                None,
                Some("second".to_string())
            ]
        );
    }

    #[test]
    fn garbled_frame_is_an_empty_poll() {
        let input = Cursor::new(&b"\xff\xfe garbage\nEMP001\n"[..]);
        let polls: Vec<_> = LineSource::new(input).collect();
        assert_eq!(polls, vec![None, Some("EMP001".to_string())]);
    }

    #[test]
    fn scan_reaches_badge_after_garbled_frame() {
        let notifier = RecordingNotifier::default();
        let mut scanner = Scanner::new(Duration::from_secs(3));
        let source = LineSource::new(Cursor::new(&b"\xc3\x28\nhttps://b.io/EMP003\n"[..]));

        let found = scan_until_recognized(source, &mut scanner, ticking_clock(Instant::now()), &notifier);
        assert_eq!(found.map(|d| d.code.to_string()), Some("EMP003".to_string()));
        assert!(notifier.messages.borrow().is_empty());
    }
}
