use super::{JunkFilter, PatternTable};
use crate::error::SegmentError;
use crate::types::{HeaderOutcome, Label, ScanStats, Segment};
use std::time::{Duration, Instant};
use tracing::debug;

/// Lines between deadline checks.
const DEADLINE_CHECK_INTERVAL: usize = 64;

/// Wall-clock budget for one document scan.
#[derive(Debug, Clone, Copy)]
pub struct Deadline {
    started: Instant,
    limit: Duration,
}

impl Deadline {
    pub fn starting_now(limit: Duration) -> Self {
        Self {
            started: Instant::now(),
            limit,
        }
    }

    pub fn expired(&self) -> bool {
        self.started.elapsed() >= self.limit
    }

    fn limit_ms(&self) -> u64 {
        self.limit.as_millis() as u64
    }
}

// ScanState - the only mutable state of a scan: active label plus the lines
// buffered since the last flush. Borrowed lines point into the document text.
#[derive(Debug)]
struct ScanState<'t> {
    current_label: Label,
    buffer: Vec<&'t str>,
    stats: ScanStats,
}

impl<'t> ScanState<'t> {
    fn new() -> Self {
        Self {
            current_label: Label::default(),
            buffer: Vec::new(),
            stats: ScanStats::default(),
        }
    }

    /// Close the buffered segment under the active label. Blocks shorter
    /// than `min_chars` after trimming are dropped here.
    fn flush(&mut self, min_chars: usize) -> Option<Segment> {
        if self.buffer.is_empty() {
            return None;
        }
        let joined = self.buffer.join("\n");
        self.buffer.clear();

        let block = joined.trim();
        if block.is_empty() {
            return None;
        }
        if block.chars().count() < min_chars {
            self.stats.segments_dropped += 1;
            return None;
        }
        self.stats.segments_flushed += 1;
        Some(Segment {
            text: block.to_string(),
            label: self.current_label,
        })
    }

    /// Flush, then switch to `next`.
    fn transition(&mut self, next: Label, min_chars: usize) -> Option<Segment> {
        let segment = self.flush(min_chars);
        debug!(from = %self.current_label, to = %next, "section transition");
        self.current_label = next;
        segment
    }
}

/// Split `text` into lines without their terminators. Besides `\n` and
/// `\r\n`, a lone `\r`, vertical tab, form feed, the information separators
/// 0x1C-0x1E, NEL and the Unicode line/paragraph separators all end a line.
/// A terminator at the very end does not open an extra empty line.
pub fn split_lines(text: &str) -> TextLines<'_> {
    TextLines { rest: text }
}

const LINE_BREAKS: [char; 10] = [
    '\n', '\r', '\x0b', '\x0c', '\x1c', '\x1d', '\x1e', '\u{85}', '\u{2028}', '\u{2029}',
];

/// Iterator returned by [`split_lines`].
#[derive(Debug, Clone)]
pub struct TextLines<'t> {
    rest: &'t str,
}

impl<'t> Iterator for TextLines<'t> {
    type Item = &'t str;

    fn next(&mut self) -> Option<&'t str> {
        if self.rest.is_empty() {
            return None;
        }
        let Some(at) = self.rest.find(LINE_BREAKS) else {
            return Some(std::mem::take(&mut self.rest));
        };

        let line = &self.rest[..at];
        let tail = &self.rest[at..];
        let width = if tail.starts_with("\r\n") {
            2
        } else {
            tail.chars().next().map_or(1, char::len_utf8)
        };
        self.rest = &tail[width..];
        Some(line)
    }
}

/// Line-by-line section state machine. Holds only borrowed, immutable rule
/// tables; every scan gets a fresh `ScanState`, so one scanner can serve any
/// number of documents, including concurrently.
#[derive(Debug, Clone, Copy)]
pub struct SectionScanner<'r> {
    junk: &'r JunkFilter,
    table: &'r PatternTable,
    min_chars: usize,
}

impl<'r> SectionScanner<'r> {
    pub fn new(junk: &'r JunkFilter, table: &'r PatternTable, min_chars: usize) -> Self {
        Self {
            junk,
            table,
            min_chars,
        }
    }

    /// Scan `text` and hand every flushed segment to `emit`, in document
    /// order. Returns the scan counters.
    pub fn scan<F>(
        &self,
        text: &str,
        deadline: Option<Deadline>,
        mut emit: F,
    ) -> Result<ScanStats, SegmentError>
    where
        F: FnMut(Segment),
    {
        let mut state = ScanState::new();

        for (index, line) in split_lines(text).enumerate() {
            if let Some(deadline) = deadline {
                if index % DEADLINE_CHECK_INTERVAL == 0 && deadline.expired() {
                    return Err(SegmentError::Timeout {
                        limit_ms: deadline.limit_ms(),
                        lines_scanned: index,
                    });
                }
            }
            state.stats.lines_scanned += 1;

            if self.junk.is_junk(line) {
                state.stats.junk_lines += 1;
                continue;
            }

            // Header lines are consumed: they never reach a buffer.
            let flushed = match self.table.match_header(line) {
                HeaderOutcome::NewLabel(label) => {
                    state.stats.headers_matched += 1;
                    state.transition(label, self.min_chars)
                }
                HeaderOutcome::Stop => {
                    state.stats.stops_matched += 1;
                    state.transition(Label::default(), self.min_chars)
                }
                HeaderOutcome::NoMatch => {
                    state.buffer.push(line);
                    None
                }
            };
            if let Some(segment) = flushed {
                emit(segment);
            }
        }

        if let Some(segment) = state.flush(self.min_chars) {
            emit(segment);
        }
        Ok(state.stats)
    }

    /// Convenience wrapper collecting segments into a vector.
    pub fn scan_to_vec(&self, text: &str) -> Result<(Vec<Segment>, ScanStats), SegmentError> {
        let mut segments = Vec::new();
        let stats = self.scan(text, None, |segment| segments.push(segment))?;
        Ok((segments, stats))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{HeaderRuleConfig, JunkFilterConfig};
    use crate::types::RuleTarget;

    const LONG_A: &str = "Cada comprimido revestido contém 500 mg de paracetamol e excipientes.";
    const LONG_B: &str = "Tome um comprimido a cada seis horas, sem ultrapassar quatro ao dia.";
    const LONG_C: &str = "Guarde o produto em temperatura ambiente, protegido da luz e umidade.";

    fn tables() -> (JunkFilter, PatternTable) {
        let junk = JunkFilter::new(&JunkFilterConfig {
            enabled: true,
            patterns: vec!["LABORATORIO ACME".to_string(), r"^página \d+".to_string()],
        })
        .unwrap();
        let table = PatternTable::new(&[
            HeaderRuleConfig::new("COMPOSIÇÃO", RuleTarget::Label(Label::Composicao)),
            HeaderRuleConfig::new("POSOLOGIA", RuleTarget::Label(Label::Posologia)),
            HeaderRuleConfig::new("ARMAZENAMENTO", RuleTarget::Stop),
        ])
        .unwrap();
        (junk, table)
    }

    fn segment(text: &str, label: Label) -> Segment {
        Segment {
            text: text.to_string(),
            label,
        }
    }

    fn scan(text: &str) -> (Vec<Segment>, ScanStats) {
        let (junk, table) = tables();
        SectionScanner::new(&junk, &table, 50).scan_to_vec(text).unwrap()
    }

    #[test]
    fn header_retargets_and_is_not_buffered() {
        let text = format!("{LONG_C}\nCOMPOSIÇÃO\n{LONG_A}\nPOSOLOGIA\n{LONG_B}");
        let (segments, stats) = scan(&text);

        assert_eq!(
            segments,
            vec![
                segment(LONG_C, Label::Outros),
                segment(LONG_A, Label::Composicao),
                segment(LONG_B, Label::Posologia),
            ]
        );
        assert_eq!(stats.headers_matched, 2);
        assert_eq!(stats.segments_flushed, 3);
    }

    #[test]
    fn stop_flushes_and_resets_to_default() {
        let text = format!("POSOLOGIA\n{LONG_B}\nARMAZENAMENTO\n{LONG_C}\nCOMPOSIÇÃO\n{LONG_A}");
        let (segments, stats) = scan(&text);

        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].label, Label::Posologia);
        assert_eq!(segments[1], segment(LONG_C, Label::Outros));
        // Content after the stop never leaks into the next labeled section
        assert_eq!(segments[2], segment(LONG_A, Label::Composicao));
        assert_eq!(stats.stops_matched, 1);
    }

    #[test]
    fn junk_lines_are_skipped_before_header_matching() {
        let junk_then_header = format!("LABORATORIO ACME POSOLOGIA\nPOSOLOGIA\n{LONG_B}");
        let (segments, stats) = scan(&junk_then_header);

        assert_eq!(segments, vec![segment(LONG_B, Label::Posologia)]);
        assert_eq!(stats.junk_lines, 1);
        assert_eq!(stats.headers_matched, 1);
    }

    #[test]
    fn junk_line_inside_a_section_keeps_the_label() {
        let text = format!("POSOLOGIA\n{LONG_B}\nPágina 2\n{LONG_A}");
        let (segments, _) = scan(&text);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].label, Label::Posologia);
        assert_eq!(segments[0].text, format!("{LONG_B}\n{LONG_A}"));
    }

    #[test]
    fn short_blocks_are_dropped_at_flush() {
        let text = format!("COMPOSIÇÃO\nlactose\nPOSOLOGIA\n{LONG_B}");
        let (segments, stats) = scan(&text);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].label, Label::Posologia);
        assert_eq!(stats.segments_dropped, 1);
    }

    #[test]
    fn blank_lines_are_kept_inside_blocks() {
        let text = format!("POSOLOGIA\n{LONG_A}\n\n{LONG_B}\n\n");
        let (segments, _) = scan(&text);

        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].text, format!("{LONG_A}\n\n{LONG_B}"));
    }

    #[test]
    fn consecutive_headers_produce_no_empty_segments() {
        let (segments, stats) = scan("COMPOSIÇÃO\nPOSOLOGIA\nARMAZENAMENTO\n");
        assert!(segments.is_empty());
        assert_eq!(stats.segments_flushed, 0);
        assert_eq!(stats.segments_dropped, 0);
    }

    #[test]
    fn carriage_return_only_text_still_finds_headers() {
        let text = format!("POSOLOGIA\r{LONG_B}\rARMAZENAMENTO\r{LONG_C}\r");
        let (segments, stats) = scan(&text);

        assert_eq!(
            segments,
            vec![segment(LONG_B, Label::Posologia), segment(LONG_C, Label::Outros)]
        );
        assert_eq!(stats.lines_scanned, 4);
        assert_eq!(stats.headers_matched, 1);
        assert_eq!(stats.stops_matched, 1);
    }

    #[test]
    fn every_line_terminator_ends_a_line() {
        let text = "a\nb\r\nc\rd\x0be\x0cf\x1cg\x1dh\x1ei\u{85}j\u{2028}k\u{2029}l";
        let lines: Vec<&str> = split_lines(text).collect();
        assert_eq!(lines, vec!["a", "b", "c", "d", "e", "f", "g", "h", "i", "j", "k", "l"]);
    }

    #[test]
    fn trailing_terminator_adds_no_empty_line() {
        assert_eq!(split_lines("a\r\n\r\n").collect::<Vec<_>>(), vec!["a", ""]);
        assert_eq!(split_lines("\r").collect::<Vec<_>>(), vec![""]);
        assert_eq!(split_lines("").count(), 0);
    }

    #[test]
    fn expired_deadline_fails_the_scan() {
        let (junk, table) = tables();
        let scanner = SectionScanner::new(&junk, &table, 50);
        let deadline = Deadline::starting_now(Duration::ZERO);

        let result = scanner.scan(LONG_A, Some(deadline), |_| {});
        assert!(matches!(result, Err(SegmentError::Timeout { limit_ms: 0, .. })));
    }
}
