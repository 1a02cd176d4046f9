//! Line scanner that splits raw SQL text into individually terminated
//! instructions.
//!
//! The scanner is deliberately shallow. A line is skipped when it is blank
//! or when its first non-whitespace characters open a block comment; no
//! attempt is made to find the matching close marker or to recognise
//! comments that begin mid-line. Every other line belongs to the statement
//! being accumulated, and a line whose trimmed end is the terminator closes
//! that statement. Text left over at end of input is still committed as a
//! final instruction.
//!
//! Stored text is the statement as written, trailing whitespace removed and
//! the terminator kept. A dangling final statement is stored without one.
//! Both forms replay identically since the target accepts a single
//! statement with or without its terminator.

/// Placeholder opener as written by upstream tooling, e.g. `${tenantDB}$`.
pub const RAW_OPEN: &str = "${";
/// Placeholder closer as written by upstream tooling.
pub const RAW_CLOSE: &str = "}$";
/// Placeholder opener as stored in the catalog.
///
/// `$` is shifted to `#` so the stored text never contains `$`-prefixed
/// sequences that PostgreSQL would read as parameters or dollar quotes.
pub const MARKER_OPEN: &str = "#{";
/// Placeholder closer as stored in the catalog.
pub const MARKER_CLOSE: &str = "}#";

/// Statement terminator.
pub const TERMINATOR: char = ';';

const COMMENT_OPENER: &str = "/*";

/// One statement cut from the source, numbered from 1 in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInstruction {
    pub ordinal: i32,
    pub text: String,
}

/// How a single source line participates in the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    /// Blank, or starts with a block-comment opener.
    Skipped,
    /// Part of a statement; `terminated` when it ends the statement.
    Body { line: &'a str, terminated: bool },
}

fn classify(line: &str) -> LineKind<'_> {
    let leading = line.trim_start();
    if leading.is_empty() || leading.starts_with(COMMENT_OPENER) {
        return LineKind::Skipped;
    }
    LineKind::Body {
        line,
        terminated: line.trim_end().ends_with(TERMINATOR),
    }
}

#[derive(Debug)]
enum ScanState {
    /// No statement text collected since the last terminator.
    Idle,
    /// Collecting lines of an unterminated statement.
    InStatement(String),
}

/// Two-state scanner fed one line at a time.
#[derive(Debug)]
pub struct StatementScanner {
    state: ScanState,
    instructions: Vec<ParsedInstruction>,
}

impl Default for StatementScanner {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementScanner {
    pub fn new() -> Self {
        Self {
            state: ScanState::Idle,
            instructions: Vec::new(),
        }
    }

    pub fn push_line(&mut self, line: &str) {
        let LineKind::Body { line, terminated } = classify(line) else {
            return;
        };

        let mut buffer = match std::mem::replace(&mut self.state, ScanState::Idle) {
            ScanState::Idle => String::new(),
            ScanState::InStatement(buffer) => buffer,
        };
        buffer.push_str(line);

        if terminated {
            self.commit(buffer);
        } else {
            buffer.push('\n');
            self.state = ScanState::InStatement(buffer);
        }
    }

    /// Flush any dangling statement and return everything scanned.
    pub fn finish(mut self) -> Vec<ParsedInstruction> {
        if let ScanState::InStatement(buffer) = std::mem::replace(&mut self.state, ScanState::Idle)
        {
            self.commit(buffer);
        }
        self.instructions
    }

    fn commit(&mut self, buffer: String) {
        let text = buffer.trim_end();
        if text.is_empty() {
            return;
        }
        let ordinal = self.instructions.len() as i32 + 1;
        self.instructions.push(ParsedInstruction {
            ordinal,
            text: normalize_placeholders(text),
        });
    }
}

/// Split `source` into instructions with normalized placeholders.
pub fn parse_instructions(source: &str) -> Vec<ParsedInstruction> {
    let mut scanner = StatementScanner::new();
    for line in source.lines() {
        scanner.push_line(line);
    }
    scanner.finish()
}

/// Rewrite `${name}$` placeholders into the stored `#{name}#` form.
pub fn normalize_placeholders(text: &str) -> String {
    text.replace(RAW_OPEN, MARKER_OPEN)
        .replace(RAW_CLOSE, MARKER_CLOSE)
}
