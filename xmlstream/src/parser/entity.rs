use crate::config::ParserConfig;
use crate::error::{ErrorKind, Result};
use crate::handler::Handler;
use crate::source::CharSource;

use super::Parser;

impl<'h, S, H, C> Parser<'h, S, H, C>
where
	S: CharSource,
	H: Handler,
	C: ParserConfig,
{
	/// `Reference`, entered with `&` already consumed. Pushes the resolved
	/// code unit(s) straight into the scratch buffer, at whatever position
	/// the lexeme currently being assembled is (content or attribute value).
	pub(super) fn parse_reference_into_scratch(&mut self) -> Result<()> {
		let (pl, pc) = (self.line, self.column);
		let first = self.bump().ok_or_else(|| self.eof())?;
		if first == b'#' as u16 {
			self.parse_character_reference(pl, pc)
		} else {
			self.parse_entity_reference(first, pl, pc)
		}
	}

	/// `CharRef ::= '&#' [0-9]+ ';' | '&#x' [0-9a-fA-F]+ ';'`, entered just
	/// after `&#`.
	fn parse_character_reference(&mut self, amp_line: u64, amp_column: u64) -> Result<()> {
		let first = self.bump().ok_or_else(|| self.eof())?;
		let (hex, mut cu) = if first == b'x' as u16 {
			(true, self.bump().ok_or_else(|| self.eof())?)
		} else {
			(false, first)
		};

		let mut value: u32 = 0;
		let mut digits = 0u32;
		loop {
			if cu == b';' as u16 {
				break;
			}
			let digit = if hex {
				match (cu as u8 as char).to_digit(16) {
					Some(d) if cu < 0x80 => d,
					_ => return Err(self.err_at(ErrorKind::InvalidHexDigit, amp_line, amp_column)),
				}
			} else {
				match (cu as u8 as char).to_digit(10) {
					Some(d) if cu < 0x80 => d,
					_ => return Err(self.err_at(ErrorKind::InvalidDecimalDigit, amp_line, amp_column)),
				}
			};
			value = value.saturating_mul(if hex { 16 } else { 10 }).saturating_add(digit);
			digits += 1;
			cu = self.bump().ok_or_else(|| self.eof())?;
		}
		if digits == 0 {
			let kind =
				if hex { ErrorKind::InvalidHexDigit } else { ErrorKind::InvalidDecimalDigit };
			return Err(self.err_at(kind, amp_line, amp_column));
		}

		if !xmlstream_chars::is_valid_char_scalar(value) {
			return Err(self.err_at(ErrorKind::InvalidCharacterReference, amp_line, amp_column));
		}
		let c = char::from_u32(value)
			.ok_or_else(|| self.err_at(ErrorKind::InvalidCharacterReference, amp_line, amp_column))?;
		let mut buf = [0u16; 2];
		for cu in c.encode_utf16(&mut buf).iter() {
			self.scratch.push_unit(*cu);
		}
		Ok(())
	}

	/// `EntityRef ::= '&' Name ';'`, restricted to the five predefined
	/// entities, entered with the name's first code unit (`first`) already
	/// consumed.
	fn parse_entity_reference(&mut self, first: u16, amp_line: u64, amp_column: u64) -> Result<()> {
		let mut name = [0u16; 4];
		let mut len = 0usize;
		let mut cu = first;
		loop {
			if cu == b';' as u16 {
				break;
			}
			if len >= name.len() {
				return Err(self.err_at(ErrorKind::UnknownEntity, amp_line, amp_column));
			}
			name[len] = cu;
			len += 1;
			cu = self.bump().ok_or_else(|| {
				self.err_at(ErrorKind::MissingReferenceSemicolon, amp_line, amp_column)
			})?;
		}
		let resolved: u16 = match &name[..len] {
			[a, t] if [*a, *t] == [b'l' as u16, b't' as u16] => b'<' as u16,
			[g, t] if [*g, *t] == [b'g' as u16, b't' as u16] => b'>' as u16,
			[a, m, p] if [*a, *m, *p] == [b'a' as u16, b'm' as u16, b'p' as u16] => b'&' as u16,
			[a, p, o, s] if [*a, *p, *o, *s] == [b'a' as u16, b'p' as u16, b'o' as u16, b's' as u16] => {
				b'\'' as u16
			}
			[q, u, o, t] if [*q, *u, *o, *t] == [b'q' as u16, b'u' as u16, b'o' as u16, b't' as u16] => {
				b'"' as u16
			}
			_ => return Err(self.err_at(ErrorKind::UnknownEntity, amp_line, amp_column)),
		};
		self.scratch.push_unit(resolved);
		Ok(())
	}
}
