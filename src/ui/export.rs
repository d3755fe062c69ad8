//! Frame export
//!
//! Writes a rendered buffer as 24-bit ANSI colored text, so that `cat`
//! on the file reproduces the frame in a terminal.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use ratatui::{buffer::Buffer, style::Color};

use crate::error::MeterError;

/// Write a buffer to `path`
pub fn write_frame(buf: &Buffer, path: &Path) -> Result<(), MeterError> {
    let failure = |source| MeterError::ExportWriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let file = File::create(path).map_err(failure)?;
    let mut out = BufWriter::new(file);
    encode_ansi(buf, &mut out).map_err(failure)?;
    out.flush().map_err(failure)
}

/// Encode a buffer row by row, switching colors only where they change
pub fn encode_ansi<W: Write>(buf: &Buffer, out: &mut W) -> io::Result<()> {
    let area = buf.area;
    for y in area.top()..area.bottom() {
        let mut current: Option<(Color, Color)> = None;
        for x in area.left()..area.right() {
            let cell = &buf[(x, y)];
            if current != Some((cell.fg, cell.bg)) {
                out.write_all(b"\x1b[0m")?;
                write_color(out, 38, cell.fg)?;
                write_color(out, 48, cell.bg)?;
                current = Some((cell.fg, cell.bg));
            }
            out.write_all(cell.symbol().as_bytes())?;
        }
        out.write_all(b"\x1b[0m\n")?;
    }
    Ok(())
}

fn write_color<W: Write>(out: &mut W, layer: u8, color: Color) -> io::Result<()> {
    match color {
        Color::Rgb(r, g, b) => write!(out, "\x1b[{};2;{};{};{}m", layer, r, g, b),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;

    #[test]
    fn test_encode_ansi() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 3, 2));
        buf[(0, 0)].set_char('A').set_bg(Color::Rgb(1, 2, 3));
        buf[(1, 0)].set_char('B').set_bg(Color::Rgb(1, 2, 3));

        let mut out = Vec::new();
        encode_ansi(&buf, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("\x1b[0m\x1b[48;2;1;2;3mAB"));
        assert_eq!(lines[0].matches("\x1b[48;2;1;2;3m").count(), 1);
        assert!(lines[1].ends_with("\x1b[0m"));
    }

    #[test]
    fn test_write_frame_to_missing_directory() {
        let buf = Buffer::empty(Rect::new(0, 0, 2, 2));
        let path = std::env::temp_dir()
            .join("r128view-missing-dir")
            .join("nested")
            .join("frame.ans");

        let err = write_frame(&buf, &path).unwrap_err();
        match err {
            MeterError::ExportWriteFailure { path: failed, .. } => assert_eq!(failed, path),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_write_frame() {
        let mut buf = Buffer::empty(Rect::new(0, 0, 2, 1));
        buf[(0, 0)].set_char('X');
        let path = std::env::temp_dir().join(format!("r128view-export-{}.ans", std::process::id()));

        write_frame(&buf, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert!(written.contains('X'));
    }
}
