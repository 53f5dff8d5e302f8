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
	/// `<!` has just been consumed; dispatch into a comment, a CDATA section,
	/// or reject anything else as an unsupported directive (DTD markup is out
	/// of scope).
	pub(super) fn parse_markup_declaration(&mut self) -> Result<()> {
		let (bang_line, bang_column) = (self.line, self.column);
		let first = self.bump().ok_or_else(|| self.eof())?;
		match first {
			b'-' as u16 => self.parse_comment(bang_line, bang_column),
			b'[' as u16 => self.parse_cdata(bang_line, bang_column),
			_ => Err(self.err_at(ErrorKind::UnsupportedDirective, bang_line, bang_column)),
		}
	}

	/// `Comment ::= '<!--' ((Char - '-') | ('-' (Char - '-')))* '-->'`,
	/// entered with `<!-` already consumed.
	fn parse_comment(&mut self, bang_line: u64, bang_column: u64) -> Result<()> {
		let second = self.bump().ok_or_else(|| self.eof())?;
		if second != b'-' as u16 {
			return Err(self.err_at(ErrorKind::MalformedCommentStart, bang_line, bang_column));
		}
		let (body_line, body_column) = (self.line, self.column);
		let body_start = self.scratch.end();

		loop {
			if C::SIMD && self.pending.is_none() {
				if let Some(lane) = self.source.try_preview_lane8() {
					if lane.iter().all(|&cu| is_plain_comment(cu)) {
						self.scratch.push_lane(&lane);
						self.source.advance(8);
						self.column += 8;
						continue;
					}
				}
			}
			let (pl, pc) = (self.line, self.column);
			let cu = self.bump().ok_or_else(|| self.eof())?;
			if cu != b'-' as u16 {
				self.push_comment_char(cu, pl, pc)?;
				continue;
			}
			let next = self.bump().ok_or_else(|| self.eof())?;
			if next == b'-' as u16 {
				let end = self.bump().ok_or_else(|| self.eof())?;
				if end != b'>' as u16 {
					return Err(self.err_at(ErrorKind::CommentDashDash, pl, pc));
				}
				let body_end = self.scratch.end();
				let body = self.scratch.slice(body_start, body_end);
				self.handler.on_comment(body, body_line, body_column);
				self.scratch.clear_lexeme_to(body_start);
				return Ok(());
			}
			self.scratch.push_unit(b'-' as u16);
			self.push_comment_char(next, pl, pc)?;
		}
	}

	fn push_comment_char(&mut self, cu: u16, pl: u64, pc: u64) -> Result<()> {
		if xmlstream_chars::is_high_surrogate(cu) {
			let lo = self.bump().ok_or_else(|| self.err_at(ErrorKind::UnexpectedEof, pl, pc))?;
			if !xmlstream_chars::is_low_surrogate(lo) {
				return Err(self.err_at(ErrorKind::LoneSurrogate, pl, pc));
			}
			self.scratch.push_unit(cu);
			self.scratch.push_unit(lo);
			Ok(())
		} else if xmlstream_chars::is_low_surrogate(cu) {
			Err(self.err_at(ErrorKind::LoneSurrogate, pl, pc))
		} else if !xmlstream_chars::is_char(cu) {
			Err(self.err_at(ErrorKind::InvalidChar, pl, pc))
		} else {
			self.scratch.push_unit(cu);
			Ok(())
		}
	}

	/// `CDSect ::= '<![CDATA[' (Char* - (Char* ']]>' Char*)) ']]>'`, entered
	/// with `<![` already consumed.
	fn parse_cdata(&mut self, bang_line: u64, bang_column: u64) -> Result<()> {
		const LITERAL: &[u16] = &[
			b'C' as u16, b'D' as u16, b'A' as u16, b'T' as u16, b'A' as u16, b'[' as u16,
		];
		for &expected in LITERAL {
			let cu = self.bump().ok_or_else(|| self.eof())?;
			if cu != expected {
				return Err(self.err_at(ErrorKind::MalformedCDataStart, bang_line, bang_column));
			}
		}

		let (body_line, body_column) = (self.line, self.column);
		let body_start = self.scratch.end();
		let mut run_of_brackets = 0u32;

		loop {
			if C::SIMD && self.pending.is_none() {
				if let Some(lane) = self.source.try_preview_lane8() {
					if lane.iter().all(|&cu| is_plain_cdata(cu)) {
						self.scratch.push_lane(&lane);
						self.source.advance(8);
						self.column += 8;
						run_of_brackets = 0;
						continue;
					}
				}
			}
			let (pl, pc) = (self.line, self.column);
			let cu = self.bump().ok_or_else(|| self.eof())?;
			if cu == b']' as u16 {
				run_of_brackets += 1;
				self.scratch.push_unit(cu);
				continue;
			}
			if cu == b'>' as u16 && run_of_brackets >= 2 {
				let body_end = self.scratch.end() - 2;
				let body = self.scratch.slice(body_start, body_end);
				self.handler.on_cdata(body, body_line, body_column);
				self.scratch.clear_lexeme_to(body_start);
				return Ok(());
			}
			run_of_brackets = 0;
			self.push_comment_char(cu, pl, pc)?;
		}
	}
}

#[inline]
fn is_plain_comment(cu: u16) -> bool {
	cu >= 0x20 && cu < xmlstream_chars::HIGH_SURROGATE_START && cu != b'-' as u16
}

#[inline]
fn is_plain_cdata(cu: u16) -> bool {
	cu >= 0x20 && cu < xmlstream_chars::HIGH_SURROGATE_START && cu != b']' as u16
}

#[cfg(test)]
mod tests {
	use super::super::Parser;
	use crate::config::SimdCheckTags;
	use crate::handler::Handler;
	use crate::source::SliceSource;

	#[derive(Default)]
	struct Recorder {
		events: Vec<String>,
	}

	impl Handler for Recorder {
		fn on_comment(&mut self, body: &[u16], line: u64, column: u64) {
			self.events.push(format!("comment({},{},{})", String::from_utf16_lossy(body), line, column));
		}

		fn on_cdata(&mut self, body: &[u16], line: u64, column: u64) {
			self.events.push(format!("cdata({},{},{})", String::from_utf16_lossy(body), line, column));
		}
	}

	fn run_str(text: &str) -> Vec<String> {
		let units: Vec<u16> = text.encode_utf16().collect();
		let source = SliceSource::new(&units);
		let mut handler = Recorder::default();
		let parser = Parser::<_, _, SimdCheckTags>::new(source, &mut handler);
		parser.run().unwrap();
		handler.events
	}

	#[test]
	fn comment_with_single_dash_ok() {
		assert_eq!(run_str("<!-- a - b -->"), vec!["comment( a - b ,0,4)".to_string()]);
	}

	#[test]
	fn comment_with_double_dash_rejected() {
		let units: Vec<u16> = "<!-- a -- b -->".encode_utf16().collect();
		let source = SliceSource::new(&units);
		let mut handler = Recorder::default();
		let parser = Parser::<_, _, SimdCheckTags>::new(source, &mut handler);
		assert!(parser.run().is_err());
	}

	#[test]
	fn doctype_declaration_is_an_unsupported_directive() {
		let units: Vec<u16> = "<!DOCTYPE html><a/>".encode_utf16().collect();
		let source = SliceSource::new(&units);
		let mut handler = Recorder::default();
		let parser = Parser::<_, _, SimdCheckTags>::new(source, &mut handler);
		assert!(parser.run().is_err());
	}

	#[test]
	fn cdata_with_single_bracket_is_literal() {
		assert_eq!(run_str("<![CDATA[a]b]]>"), vec!["cdata(a]b,0,9)".to_string()]);
	}

	#[test]
	fn cdata_with_embedded_double_bracket_run() {
		assert_eq!(run_str("<![CDATA[x]]y]]>"), vec!["cdata(x]]y,0,9)".to_string()]);
	}

	#[test]
	fn simd_and_scalar_comment_and_cdata_bodies_agree() {
		use crate::config::ScalarCheckTags;

		let text = "<!-- a long plain comment body without any dashes --><![CDATA[a reasonably long plain body]]>";
		let units: Vec<u16> = text.encode_utf16().collect();

		let mut simd_handler = Recorder::default();
		let simd_source = SliceSource::new(&units);
		Parser::<_, _, SimdCheckTags>::new(simd_source, &mut simd_handler).run().unwrap();

		let mut scalar_handler = Recorder::default();
		let scalar_source = SliceSource::new(&units);
		Parser::<_, _, ScalarCheckTags>::new(scalar_source, &mut scalar_handler).run().unwrap();

		assert_eq!(simd_handler.events, scalar_handler.events);
	}
}
