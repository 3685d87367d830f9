//! A minimal C source writer for nested brace initializers.
//!
//! The writer tracks the brace depth and whether the last thing written was a
//! value that still needs its punctuation. That punctuation is decided lazily
//! on the next write: inside braces another sibling follows, so it is a comma;
//! at file scope the declaration is complete, so it is a semicolon followed by
//! a blank line.

use std::io::{self, Write};

/// Whether the previous write left a value without trailing punctuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pending {
    Idle,
    Content,
}

pub struct CGen<W: io::Write> {
    out: W,
    tab: String,
    depth: usize,
    pending: Pending,
}

impl<W: io::Write> CGen<W> {
    pub fn new(out: W, columns: usize) -> Self {
        CGen {
            out,
            tab: " ".repeat(columns),
            depth: 0,
            pending: Pending::Idle,
        }
    }

    #[cfg(test)]
    fn depth(&self) -> usize {
        self.depth
    }

    #[cfg(test)]
    fn pending(&self) -> Pending {
        self.pending
    }

    /// Terminate the current line, resolving any pending punctuation.
    pub fn newline(&mut self) -> io::Result<()> {
        match self.pending {
            Pending::Content if self.depth > 0 => self.out.write_all(b",\n")?,
            Pending::Content => self.out.write_all(b";\n\n")?,
            Pending::Idle => self.out.write_all(b"\n")?,
        }
        self.pending = Pending::Idle;
        Ok(())
    }

    fn indent(&mut self) -> io::Result<()> {
        for _ in 0..self.depth {
            self.out.write_all(self.tab.as_bytes())?;
        }
        Ok(())
    }

    /// Write a preprocessor line such as `include "x.h"`, without the `#`.
    pub fn directive(&mut self, line: &str) -> io::Result<()> {
        if self.pending == Pending::Content {
            self.newline()?;
        }
        writeln!(self.out, "#{}", line)
    }

    /// Write one value or field assignment.
    pub fn line(&mut self, line: &str) -> io::Result<()> {
        self.newline()?;
        self.indent()?;
        self.out.write_all(line.as_bytes())?;
        self.pending = if line.is_empty() { Pending::Idle } else { Pending::Content };
        Ok(())
    }

    /// Open `levels` braces, preceded by `header = ` if a header is given.
    pub fn open(&mut self, header: Option<&str>, levels: usize) -> io::Result<()> {
        self.newline()?;
        self.indent()?;
        if let Some(header) = header {
            write!(self.out, "{} = ", header)?;
        }
        self.out.write_all("{".repeat(levels).as_bytes())?;
        self.depth += levels;
        self.pending = Pending::Idle;
        Ok(())
    }

    /// Close `levels` braces opened by `open`.
    pub fn close(&mut self, levels: usize) -> io::Result<()> {
        self.depth = self.depth.checked_sub(levels).ok_or_else(|| {
            io::Error::new(io::ErrorKind::Other, "closing more braces than were opened")
        })?;
        self.out.write_all(b"\n")?;
        self.indent()?;
        self.out.write_all("}".repeat(levels).as_bytes())?;
        self.pending = Pending::Content;
        Ok(())
    }

    /// Write `text` as `//` comment lines. Trailing backslashes are removed
    /// so a comment line never continues onto the next source line.
    pub fn comment(&mut self, text: &str) -> io::Result<()> {
        for line in text.trim().split('\n') {
            let line = line.trim_end_matches('\r').trim_end_matches('\\');
            self.newline()?;
            self.indent()?;
            write!(self.out, "// {}", line)?;
        }
        Ok(())
    }

    /// Resolve the last pending punctuation and hand back the writer.
    pub fn finish(mut self) -> io::Result<W> {
        self.newline()?;
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F>(f: F) -> String
    where
        F: FnOnce(&mut CGen<Vec<u8>>) -> io::Result<()>,
    {
        let mut cg = CGen::new(Vec::new(), 3);
        f(&mut cg).unwrap();
        String::from_utf8(cg.finish().unwrap()).unwrap()
    }

    #[test]
    fn test_state_transitions() {
        let mut cg = CGen::new(Vec::new(), 3);
        assert_eq!(cg.pending(), Pending::Idle);
        cg.open(Some("int a[2]"), 1).unwrap();
        assert_eq!((cg.depth(), cg.pending()), (1, Pending::Idle));
        cg.line("1").unwrap();
        assert_eq!(cg.pending(), Pending::Content);
        cg.comment("note").unwrap();
        assert_eq!(cg.pending(), Pending::Idle);
        cg.line("").unwrap();
        assert_eq!(cg.pending(), Pending::Idle);
        cg.close(1).unwrap();
        assert_eq!((cg.depth(), cg.pending()), (0, Pending::Content));
        cg.newline().unwrap();
        assert_eq!(cg.pending(), Pending::Idle);
    }

    #[test]
    fn test_siblings_get_commas() {
        let out = render(|cg| {
            cg.open(Some("static int a[3]"), 1)?;
            cg.line("1")?;
            cg.line("2")?;
            cg.line("3")?;
            cg.close(1)
        });
        assert_eq!(out, "\nstatic int a[3] = {\n   1,\n   2,\n   3\n};\n\n");
    }

    #[test]
    fn test_nested_blocks() {
        let out = render(|cg| {
            cg.directive("include \"x.h\"")?;
            cg.open(Some("static s v[2]"), 1)?;
            cg.open(None, 1)?;
            cg.line(".a = 1")?;
            cg.close(1)?;
            cg.open(None, 1)?;
            cg.line(".a = 2")?;
            cg.close(1)?;
            cg.close(1)?;
            cg.open(Some("t x"), 1)?;
            cg.line(".v = v")?;
            cg.close(1)
        });
        assert_eq!(
            out,
            "#include \"x.h\"\n\
             \n\
             static s v[2] = {\n   {\n      .a = 1\n   },\n   {\n      .a = 2\n   }\n};\n\
             \n\
             t x = {\n   .v = v\n};\n\n"
        );
    }

    #[test]
    fn test_multiple_levels() {
        let out = render(|cg| {
            cg.open(Some("int m[1][1]"), 2)?;
            cg.line("0")?;
            cg.close(2)
        });
        assert_eq!(out, "\nint m[1][1] = {{\n      0\n}};\n\n");
    }

    #[test]
    fn test_directive_terminates_declaration() {
        let out = render(|cg| {
            cg.open(Some("int a[1]"), 1)?;
            cg.line("1")?;
            cg.close(1)?;
            cg.directive("endif")
        });
        assert_eq!(out, "\nint a[1] = {\n   1\n};\n\n#endif\n\n");
    }

    #[test]
    fn test_comment_lines() {
        let out = render(|cg| {
            cg.open(None, 1)?;
            cg.comment("  first \\\n second\\\\\n")?;
            cg.line(".a = 1")?;
            cg.close(1)
        });
        assert_eq!(out, "\n{\n   // first \n   //  second\n   .a = 1\n};\n\n");
    }

    #[test]
    fn test_comment_after_value_gets_comma() {
        let out = render(|cg| {
            cg.open(None, 1)?;
            cg.line("1")?;
            cg.comment("next")?;
            cg.line("2")?;
            cg.close(1)
        });
        assert_eq!(out, "\n{\n   1,\n   // next\n   2\n};\n\n");
    }

    #[test]
    fn test_unbalanced_close() {
        let mut cg = CGen::new(Vec::new(), 3);
        assert!(cg.close(1).is_err());
    }
}
