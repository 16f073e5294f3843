//! Terminal rendering of enrollment deltas.
//!
//! The renderer never writes directly. It builds a [`Frame`] and the
//! caller writes that frame in one buffered write, so a cancelled client
//! never leaves half a frame on screen.
//!
//! Layout of one course line:
//!
//! ```text
//! CS1001301 Data Structures                          +2     43 / 50      TR-313
//! ```

use std::io::{self, Write};

use chrono::{DateTime, Local, Utc};
use coursewatch_types::{CourseRecord, Snapshot};
use unicode_width::UnicodeWidthChar;

use crate::config::ClientConfig;
use crate::diff::{Change, FieldDelta};

// ANSI SGR sequences.
const RESET: &str = "\x1b[0m";
const BOLD_MAGENTA: &str = "\x1b[1;35m";
const CYAN: &str = "\x1b[36m";
const YELLOW: &str = "\x1b[33m";
const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const DIM: &str = "\x1b[2m";

/// Clear screen, home the cursor.
const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
/// Scroll region from row 2 to the bottom, leaving row 1 fixed.
const PIN_FIRST_ROW: &str = "\x1b[2r";
/// Cursor to row 2, column 1.
const CURSOR_BELOW_TITLE: &str = "\x1b[2;1H";

/// Restores the full-screen scroll region.
pub const RESET_SCROLL_REGION: &str = "\x1b[r";

/// Display width of the identifier-and-name column.
const NAME_WIDTH: usize = 54;
/// Display width of the delta marker column.
const MARKER_WIDTH: usize = 6;
/// Display width of the `enrollment / capacity` column.
const COUNT_WIDTH: usize = 16;

/// A fully rendered block of terminal output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    preamble: String,
    lines: Vec<String>,
}

impl Frame {
    /// The rendered lines, without trailing newlines.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// Whether writing this frame would produce no output.
    pub fn is_empty(&self) -> bool {
        self.preamble.is_empty() && self.lines.is_empty()
    }

    /// Append one line.
    pub fn push(&mut self, line: String) {
        self.lines.push(line);
    }

    /// Insert one line before all others.
    pub fn push_front(&mut self, line: String) {
        self.lines.insert(0, line);
    }

    /// Write the frame with a single `write_all`, then flush.
    pub fn write_to(&self, out: &mut impl Write) -> io::Result<()> {
        if self.is_empty() {
            return Ok(());
        }
        let mut buf = self.preamble.clone();
        for line in &self.lines {
            buf.push_str(line);
            buf.push('\n');
        }
        out.write_all(buf.as_bytes())?;
        out.flush()
    }
}

/// Turns deltas into colored, column-aligned lines.
#[derive(Debug, Clone)]
pub struct Renderer {
    show_unchanged: bool,
    color: bool,
}

impl Renderer {
    /// Create a renderer.
    pub const fn new(show_unchanged: bool, color: bool) -> Self {
        Self {
            show_unchanged,
            color,
        }
    }

    /// Create a renderer from client configuration.
    pub const fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.show_unchanged, config.color)
    }

    /// The sticky title bar.
    ///
    /// With color enabled this clears the screen, draws the title on the
    /// first row and pins it there with a scroll region.
    pub fn title(&self, title: &str) -> Frame {
        if self.color {
            Frame {
                preamble: format!(
                    "{CLEAR_SCREEN}{BOLD_MAGENTA}{title}{RESET}{PIN_FIRST_ROW}{CURSOR_BELOW_TITLE}"
                ),
                lines: Vec::new(),
            }
        } else {
            Frame {
                preamble: String::new(),
                lines: vec![format!("== {title} ==")],
            }
        }
    }

    /// A one-line status message stamped with the current time.
    pub fn status(&self, message: &str) -> String {
        self.status_at(Utc::now(), message)
    }

    /// A one-line status message stamped with `at` in local time.
    pub fn status_at(&self, at: DateTime<Utc>, message: &str) -> String {
        let stamp = at.with_timezone(&Local).format("%H:%M:%S");
        self.paint(DIM, &format!("[{stamp}] {message}"))
    }

    /// Render every delta that should be shown for this cycle.
    ///
    /// `snapshot` supplies the current name, capacity and classroom of
    /// each course. Unchanged courses are skipped unless configured
    /// otherwise.
    pub fn frame(&self, deltas: &[FieldDelta], snapshot: &Snapshot) -> Frame {
        let mut frame = Frame::default();
        for delta in deltas {
            if delta.change == Change::Unchanged && !self.show_unchanged {
                continue;
            }
            frame.push(self.line(delta, snapshot.get(&delta.course_id)));
        }
        frame
    }

    fn line(&self, delta: &FieldDelta, record: Option<&CourseRecord>) -> String {
        let label = record.map_or_else(
            || delta.course_id.to_string(),
            |r| format!("{} {}", r.course_no, r.course_name),
        );
        let mut line = self.paint(CYAN, &pad_to_width(&label, NAME_WIDTH));
        line.push(' ');

        let (marker, marker_color) = marker(delta);
        line.push_str(&self.paint(marker_color, &pad_to_width(&marker, MARKER_WIDTH)));

        let Some(record) = record else {
            line.push_str(&self.paint(DIM, "no longer listed"));
            return line;
        };

        let capacity = record
            .capacity()
            .map_or_else(|| String::from("-"), |c| c.to_string());
        let counts = format!("{:>4} / {capacity}", record.enrollment);
        line.push_str(&self.paint(YELLOW, &pad_to_width(&counts, COUNT_WIDTH)));
        line.push(' ');
        line.push_str(&self.paint(GREEN, &record.class_room_no));
        line
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_owned()
        }
    }
}

/// Marker text and color for a delta.
fn marker(delta: &FieldDelta) -> (String, &'static str) {
    let magnitude = match (delta.previous, delta.current) {
        (Some(previous), Some(current)) => previous.abs_diff(current),
        _ => 0,
    };
    match delta.change {
        Change::Increased => (format!("+{magnitude}"), RED),
        Change::Decreased => (format!("-{magnitude}"), GREEN),
        Change::New => (String::from("*"), YELLOW),
        Change::Removed => (String::from("x"), DIM),
        Change::Unchanged => (String::from("="), DIM),
    }
}

/// Pad or truncate `text` to exactly `width` terminal columns.
///
/// Wide (CJK) characters count as two columns. A wide character that
/// would straddle the boundary is replaced by a space.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let mut out = String::with_capacity(width);
    let mut used: usize = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        let next = used.saturating_add(w);
        if next > width {
            break;
        }
        out.push(ch);
        used = next;
    }
    out.extend(std::iter::repeat_n(' ', width.saturating_sub(used)));
    out
}
