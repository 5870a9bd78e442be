//! Rewriting of class names inside descriptors and generic signatures.
//!
//! One recursive-descent walker covers field and method descriptors as well
//! as class, method and field signatures, since descriptors are a subset of
//! the signature grammar. Only the leading (package-qualified) segment of a
//! class type is handed to the mapper; inner-class segments after `.` and
//! type variables are copied unchanged.

use crate::{Error, Result};

/// Rewrites every class name in `text` through `map`.
///
/// `map` receives internal names (`com/foo/Bar`) and returns the replacement,
/// or `None` to keep the name. Returns `Ok(None)` when nothing changed.
pub(crate) fn remap(
    text: &str,
    map: &mut dyn FnMut(&str) -> Option<String>,
) -> Result<Option<String>> {
    let mut walker = Walker {
        text,
        pos: 0,
        out: String::with_capacity(text.len() + 16),
        changed: false,
        map,
    };
    walker.signature().map_err(|reason| Error::InvalidDescriptor {
        descriptor: text.to_string(),
        reason,
    })?;
    Ok(walker.changed.then_some(walker.out))
}

type Step = std::result::Result<(), String>;

struct Walker<'a, 'm> {
    text: &'a str,
    pos: usize,
    out: String,
    changed: bool,
    map: &'m mut dyn FnMut(&str) -> Option<String>,
}

impl<'a> Walker<'a, '_> {
    fn peek(&self) -> Option<u8> {
        self.text.as_bytes().get(self.pos).copied()
    }

    fn copy_byte(&mut self) {
        // Only called on ASCII grammar bytes.
        self.out.push(self.text.as_bytes()[self.pos] as char);
        self.pos += 1;
    }

    fn expect(&mut self, byte: u8) -> Step {
        match self.peek() {
            Some(b) if b == byte => {
                self.copy_byte();
                Ok(())
            }
            Some(b) => Err(format!(
                "expected '{}' at {}, found '{}'",
                byte as char, self.pos, b as char
            )),
            None => Err(format!("expected '{}' at end of input", byte as char)),
        }
    }

    /// Reads up to (not including) one of `stops` and returns the span.
    fn identifier(&mut self, stops: &[u8]) -> std::result::Result<&'a str, String> {
        let text = self.text;
        let start = self.pos;
        while let Some(b) = self.peek() {
            if stops.contains(&b) {
                break;
            }
            self.pos += 1;
        }
        if self.peek().is_none() {
            return Err(format!("unterminated name starting at {}", start));
        }
        if self.pos == start {
            return Err(format!("empty name at {}", start));
        }
        Ok(&text[start..self.pos])
    }

    fn signature(&mut self) -> Step {
        if self.text.is_empty() {
            return Err("empty descriptor".into());
        }
        if self.peek() == Some(b'<') {
            self.formal_type_parameters()?;
        }
        while let Some(b) = self.peek() {
            match b {
                b'(' | b')' | b'^' => self.copy_byte(),
                _ => self.field_type()?,
            }
        }
        Ok(())
    }

    fn formal_type_parameters(&mut self) -> Step {
        self.expect(b'<')?;
        while self.peek() != Some(b'>') {
            let name = self.identifier(b":>")?;
            self.out.push_str(name);
            if self.peek() != Some(b':') {
                return Err(format!("type parameter '{}' has no bound", name));
            }
            while self.peek() == Some(b':') {
                self.copy_byte();
                if matches!(self.peek(), Some(b'L' | b'T' | b'[')) {
                    self.field_type()?;
                }
            }
        }
        self.expect(b'>')
    }

    fn field_type(&mut self) -> Step {
        match self.peek() {
            Some(b'B' | b'C' | b'D' | b'F' | b'I' | b'J' | b'S' | b'Z' | b'V') => {
                self.copy_byte();
                Ok(())
            }
            Some(b'[') => {
                self.copy_byte();
                self.field_type()
            }
            Some(b'L') => self.class_type(),
            Some(b'T') => {
                self.copy_byte();
                let name = self.identifier(b";")?;
                self.out.push_str(name);
                self.expect(b';')
            }
            Some(b) => Err(format!("unexpected '{}' at {}", b as char, self.pos)),
            None => Err("unexpected end of input".into()),
        }
    }

    fn class_type(&mut self) -> Step {
        self.expect(b'L')?;
        let name = self.identifier(b";<.")?;
        match (self.map)(name) {
            Some(new_name) if new_name != name => {
                self.out.push_str(&new_name);
                self.changed = true;
            }
            _ => self.out.push_str(name),
        }

        loop {
            match self.peek() {
                Some(b'<') => self.type_arguments()?,
                Some(b'.') => {
                    self.copy_byte();
                    let inner = self.identifier(b";<.")?;
                    self.out.push_str(inner);
                }
                Some(b';') => {
                    self.copy_byte();
                    return Ok(());
                }
                _ => return Err(format!("unterminated class type at {}", self.pos)),
            }
        }
    }

    fn type_arguments(&mut self) -> Step {
        self.expect(b'<')?;
        loop {
            match self.peek() {
                Some(b'>') => {
                    self.copy_byte();
                    return Ok(());
                }
                Some(b'*') => self.copy_byte(),
                Some(b'+' | b'-') => {
                    self.copy_byte();
                    self.field_type()?;
                }
                Some(_) => self.field_type()?,
                None => return Err("unterminated type arguments".into()),
            }
        }
    }
}
