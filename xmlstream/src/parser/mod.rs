/*!
# Parser state machine

[`Parser`] drives a [`crate::source::CharSource`] through the XML 1.0 grammar
and delivers events to a [`crate::handler::Handler`], entirely by ordinary
recursive-descent function calls: each production (`parse_begin_tag`,
`parse_attribute`, `parse_end_tag`, `parse_cdata`, `parse_comment`,
`parse_xml_declaration`, `parse_entity`, ...) is a plain method that calls
into the next one and propagates `Result` up to [`Parser::run`]. There is no
re-entrant state enum to suspend and resume mid-production: the character
source is allowed to block the calling thread, so an ordinary call stack is
sufficient and is the natural shape for this design.

Positions are tracked as a single running `(line, column)` cursor, both
zero-based, pointing at the next not-yet-consumed code unit; every production
that needs to report "where it started" snapshots the cursor at the point
just before it reads the relevant content, which is what makes the reported
positions line up with the start of the name/body rather than with whatever
delimiter preceded it.
*/

mod declaration;
mod entity;
mod markup;
mod tag;

use std::marker::PhantomData;

use crate::config::ParserConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::handler::Handler;
use crate::scratch::ScratchBuffer;
use crate::source::CharSource;

const LT: u16 = b'<' as u16;
const AMP: u16 = b'&' as u16;
const LF: u16 = 0x0a;
const CR: u16 = 0x0d;

pub struct Parser<'h, S, H, C> {
	source: S,
	handler: &'h mut H,
	scratch: ScratchBuffer,
	line: u64,
	column: u64,
	/// A single code unit read ahead (while resolving a `\r`/`\r\n`/`\r\r\n`
	/// line break) that belongs to the next call to [`Parser::bump`].
	pending: Option<u16>,
	/// Position of the first code unit of the text run currently being
	/// assembled, valid only while the lexeme is non-empty.
	content_line: u64,
	content_column: u64,
	_config: PhantomData<C>,
}

impl<'h, S, H, C> Parser<'h, S, H, C>
where
	S: CharSource,
	H: Handler,
	C: ParserConfig,
{
	pub fn new(source: S, handler: &'h mut H) -> Self {
		Parser {
			source,
			handler,
			scratch: ScratchBuffer::new(),
			line: 0,
			column: 0,
			pending: None,
			content_line: 0,
			content_column: 0,
			_config: PhantomData,
		}
	}

	/// Run the parser to completion: either clean end-of-input or the first
	/// hard error.
	pub fn run(mut self) -> Result<()> {
		self.maybe_parse_leading_declaration()?;
		loop {
			if C::SIMD {
				self.content_fast_path()?;
			}
			let (pl, pc) = (self.line, self.column);
			let cu = match self.bump() {
				Some(cu) => cu,
				None => break,
			};
			match cu {
				LT => {
					self.flush_text();
					self.dispatch_after_lt()?;
				}
				AMP => {
					self.ensure_content_start(pl, pc);
					self.parse_reference_into_scratch()?;
				}
				_ => {
					self.ensure_content_start(pl, pc);
					self.push_validated_content_char(cu, pl, pc)?;
				}
			}
		}
		self.flush_text();
		if C::CHECK_TAGS {
			self.report_unclosed_elements();
		}
		Ok(())
	}

	/// Read the next code unit, applying `\r`/`\r\n`/`\r\r\n` line-break
	/// collapsing and updating `line`/`column`. Returns `\n` for any line
	/// break (a bare `\r` is never handed to a caller).
	fn bump(&mut self) -> Option<u16> {
		let cu = match self.pending.take() {
			Some(cu) => cu,
			None => self.source.try_read_next()?,
		};
		Some(self.advance_position(cu))
	}

	fn advance_position(&mut self, cu: u16) -> u16 {
		match cu {
			LF => {
				self.line += 1;
				self.column = 0;
				LF
			}
			CR => {
				self.line += 1;
				self.column = 0;
				match self.raw_read() {
					Some(LF) => {}
					Some(other) => self.pending = Some(other),
					None => {}
				}
				LF
			}
			_ => {
				self.column += 1;
				cu
			}
		}
	}

	/// Read the next raw code unit without running line-break collapsing;
	/// used only from inside [`Parser::advance_position`] itself.
	fn raw_read(&mut self) -> Option<u16> {
		match self.pending.take() {
			Some(cu) => Some(cu),
			None => self.source.try_read_next(),
		}
	}

	fn err(&mut self, kind: ErrorKind) -> Error {
		self.err_at(kind, self.line, self.column)
	}

	fn err_at(&mut self, kind: ErrorKind, line: u64, column: u64) -> Error {
		let message = kind.message();
		self.handler.on_error(&message, line, column);
		Error::wf(kind, line, column)
	}

	fn eof(&mut self) -> Error {
		self.err(ErrorKind::UnexpectedEof)
	}

	fn ensure_content_start(&mut self, line: u64, column: u64) {
		if self.scratch.lexeme().is_empty() {
			self.content_line = line;
			self.content_column = column;
		}
	}

	fn flush_text(&mut self) {
		if !self.scratch.lexeme().is_empty() {
			self.handler.on_text(self.scratch.lexeme(), self.content_line, self.content_column);
			self.scratch.clear_lexeme();
		}
	}

	fn push_validated_content_char(&mut self, cu: u16, pl: u64, pc: u64) -> Result<()> {
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

	/// Vectorised bulk-copy of plain content: while a preview lane is fully
	/// printable (`>= ' '`, not a potential surrogate, not `&` or `<`), copy
	/// it whole into the scratch buffer instead of validating one code unit
	/// at a time.
	fn content_fast_path(&mut self) -> Result<()> {
		if self.pending.is_some() {
			return Ok(());
		}
		loop {
			if let Some(lane) = self.source.try_preview_lane16() {
				if lane.iter().all(|&cu| is_plain_content(cu)) {
					self.ensure_content_start(self.line, self.column);
					self.scratch.push_lane(&lane);
					self.source.advance(16);
					self.column += 16;
					continue;
				}
			} else if let Some(lane) = self.source.try_preview_lane8() {
				if lane.iter().all(|&cu| is_plain_content(cu)) {
					self.ensure_content_start(self.line, self.column);
					self.scratch.push_lane(&lane);
					self.source.advance(8);
					self.column += 8;
					continue;
				}
			}
			break;
		}
		Ok(())
	}

	fn dispatch_after_lt(&mut self) -> Result<()> {
		let (start_line, start_column) = (self.line, self.column);
		let c = self.bump().ok_or_else(|| self.eof())?;
		match c {
			b'?' as u16 => self.parse_question_mark(start_line, start_column),
			b'!' as u16 => self.parse_markup_declaration(),
			b'/' as u16 => self.parse_end_tag(),
			_ if xmlstream_chars::is_name_start_char(c) => {
				self.parse_begin_tag(c, start_line, start_column)
			}
			_ if xmlstream_chars::is_high_surrogate(c) => {
				let lo = self.bump().ok_or_else(|| self.eof())?;
				if !xmlstream_chars::is_low_surrogate(lo) {
					return Err(self.err_at(ErrorKind::LoneSurrogate, start_line, start_column));
				}
				let cp = xmlstream_chars::decode_surrogate_pair(c, lo);
				if xmlstream_chars::is_name_start_scalar(cp) {
					self.scratch.push_unit(c);
					self.scratch.push_unit(lo);
					let stop = self.parse_name_continuation()?;
					self.finish_begin_tag(stop, start_line, start_column)
				} else {
					Err(self.err_at(ErrorKind::InvalidBeginTagName, start_line, start_column))
				}
			}
			_ => Err(self.err_at(ErrorKind::InvalidBeginTagName, start_line, start_column)),
		}
	}

	/// Parse the remainder of a `Name` whose already-validated first code
	/// unit, `first`, has *not yet* been pushed to the scratch buffer.
	/// Returns the code unit that ended the name together with the position
	/// it was read at (already consumed from the source, not yet
	/// interpreted by the caller).
	fn parse_name(&mut self, first: u16) -> Result<(u16, u64, u64)> {
		self.scratch.push_unit(first);
		self.parse_name_continuation()
	}

	/// Same as [`Parser::parse_name`], but the first code unit(s) have
	/// already been pushed (used for astral-plane name-start characters,
	/// which arrive as a pair).
	fn parse_name_continuation(&mut self) -> Result<(u16, u64, u64)> {
		loop {
			if C::SIMD {
				if let Some(lane) = self.source.try_preview_lane8() {
					if lane.iter().all(|&cu| xmlstream_chars::is_common_name_fast(cu)) {
						self.scratch.push_lane(&lane);
						self.source.advance(8);
						self.column += 8;
						continue;
					}
				}
			}
			let (pl, pc) = (self.line, self.column);
			let cu = self.bump().ok_or_else(|| self.eof())?;
			if xmlstream_chars::is_high_surrogate(cu) {
				let lo = self.bump().ok_or_else(|| self.err_at(ErrorKind::UnexpectedEof, pl, pc))?;
				if !xmlstream_chars::is_low_surrogate(lo) {
					return Err(self.err_at(ErrorKind::LoneSurrogate, pl, pc));
				}
				let cp = xmlstream_chars::decode_surrogate_pair(cu, lo);
				if !xmlstream_chars::is_name_scalar(cp) {
					return Err(self.err_at(ErrorKind::InvalidChar, pl, pc));
				}
				self.scratch.push_unit(cu);
				self.scratch.push_unit(lo);
				continue;
			}
			if xmlstream_chars::is_name_char(cu) {
				self.scratch.push_unit(cu);
				continue;
			}
			return Ok((cu, pl, pc));
		}
	}

	/// Skip `S` (whitespace); returns whether at least one code unit was
	/// skipped, and the first non-whitespace code unit found together with
	/// its position (not yet interpreted by the caller, already consumed
	/// from the source).
	fn skip_whitespace(&mut self) -> Result<(bool, u16, u64, u64)> {
		let mut any = false;
		loop {
			let (pl, pc) = (self.line, self.column);
			let cu = self.bump().ok_or_else(|| self.eof())?;
			if xmlstream_chars::is_whitespace(cu) {
				any = true;
				continue;
			}
			return Ok((any, cu, pl, pc));
		}
	}

	/// Like [`Parser::skip_whitespace`], but `first` (with position
	/// `first_line`/`first_column`) has already been read and may or may not
	/// itself be whitespace.
	fn skip_whitespace_from(
		&mut self,
		first: u16,
		first_line: u64,
		first_column: u64,
	) -> Result<(bool, u16, u64, u64)> {
		if !xmlstream_chars::is_whitespace(first) {
			return Ok((false, first, first_line, first_column));
		}
		self.skip_whitespace().map(|(_, cu, l, c)| (true, cu, l, c))
	}

	fn report_unclosed_elements(&mut self) {
		let (line, column) = (self.line, self.column);
		let handler = &mut self.handler;
		self.scratch.drain_stack(|name| {
			let owned = String::from_utf16_lossy(name);
			let message = ErrorKind::UnclosedElement(owned.clone()).message();
			handler.on_error(&message, line, column);
		});
	}
}

#[inline]
fn is_plain_content(cu: u16) -> bool {
	cu >= 0x20 && cu < xmlstream_chars::HIGH_SURROGATE_START && cu != AMP && cu != LT
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::config::SimdCheckTags;
	use crate::source::SliceSource;

	#[derive(Default)]
	struct Recorder {
		events: Vec<String>,
	}

	impl Handler for Recorder {
		fn on_xml_declaration(
			&mut self,
			version: &[u16],
			encoding: &[u16],
			standalone: &[u16],
			line: u64,
			column: u64,
		) {
			self.events.push(format!(
				"decl({:?},{:?},{:?},{},{})",
				String::from_utf16_lossy(version),
				String::from_utf16_lossy(encoding),
				String::from_utf16_lossy(standalone),
				line,
				column
			));
		}

		fn on_begin_tag(&mut self, name: &[u16], line: u64, column: u64) {
			self.events.push(format!("begin({},{},{})", String::from_utf16_lossy(name), line, column));
		}

		fn on_attribute(
			&mut self,
			name: &[u16],
			value: &[u16],
			nl: u64,
			nc: u64,
			vl: u64,
			vc: u64,
		) {
			self.events.push(format!(
				"attr({},{},{},{},{},{})",
				String::from_utf16_lossy(name),
				String::from_utf16_lossy(value),
				nl,
				nc,
				vl,
				vc
			));
		}

		fn on_end_tag_empty(&mut self) {
			self.events.push("end_empty()".to_string());
		}

		fn on_end_tag(&mut self, name: &[u16], line: u64, column: u64) {
			self.events.push(format!("end({},{},{})", String::from_utf16_lossy(name), line, column));
		}

		fn on_text(&mut self, text: &[u16], line: u64, column: u64) {
			self.events.push(format!("text({},{},{})", String::from_utf16_lossy(text), line, column));
		}

		fn on_comment(&mut self, body: &[u16], line: u64, column: u64) {
			self.events.push(format!("comment({},{},{})", String::from_utf16_lossy(body), line, column));
		}

		fn on_cdata(&mut self, body: &[u16], line: u64, column: u64) {
			self.events.push(format!("cdata({},{},{})", String::from_utf16_lossy(body), line, column));
		}

		fn on_error(&mut self, message: &str, line: u64, column: u64) {
			self.events.push(format!("error({},{},{})", message, line, column));
		}
	}

	fn run_str(text: &str) -> Vec<String> {
		let units: Vec<u16> = text.encode_utf16().collect();
		let source = SliceSource::new(&units);
		let mut handler = Recorder::default();
		let parser = Parser::<_, _, SimdCheckTags>::new(source, &mut handler);
		let _ = parser.run();
		handler.events
	}

	#[test]
	fn seed_scenario_one() {
		let events = run_str(
			"<?xml version=\"1.0\"?><root enabled=\"true\">Hello World!</root>",
		);
		assert_eq!(
			events,
			vec![
				"decl(1.0,,,0,1)".to_string(),
				"begin(root,0,22)".to_string(),
				"attr(enabled,true,0,27,0,35)".to_string(),
				"text(Hello World!,0,42)".to_string(),
				"end(root,0,56)".to_string(),
			]
		);
	}

	#[test]
	fn seed_scenario_empty_element() {
		assert_eq!(run_str("<a/>"), vec!["begin(a,0,1)".to_string(), "end_empty()".to_string()]);
	}

	#[test]
	fn seed_scenario_entities() {
		assert_eq!(
			run_str("<a>&lt;&#65;&#x4e;</a>"),
			vec![
				"begin(a,0,1)".to_string(),
				"text(<AN,0,3)".to_string(),
				"end(a,0,19)".to_string(),
			]
		);
	}

	#[test]
	fn seed_scenario_unclosed_element() {
		assert_eq!(
			run_str("<a>"),
			vec![
				"begin(a,0,1)".to_string(),
				"error(Invalid tag a not closed at the end of the document.,0,3)".to_string(),
			]
		);
	}

	#[test]
	fn seed_scenario_unmatched_end_tag() {
		let events = run_str("<a></b>");
		assert_eq!(events[0], "begin(a,0,1)");
		assert_eq!(events[1], "error(Invalid end tag. No matching start tag found,0,5)");
	}

	#[test]
	fn seed_scenario_comment() {
		assert_eq!(run_str("<!-- a - b -->"), vec!["comment( a - b ,0,4)".to_string()]);
	}

	#[test]
	fn begin_end_tags_are_properly_nested() {
		let events = run_str("<a><b></b></a>");
		assert_eq!(
			events,
			vec![
				"begin(a,0,1)".to_string(),
				"begin(b,0,4)".to_string(),
				"end(b,0,8)".to_string(),
				"end(a,0,12)".to_string(),
			]
		);
	}

	#[test]
	fn cdata_with_embedded_brackets() {
		assert_eq!(
			run_str("<a><![CDATA[x]]y]]></a>"),
			vec![
				"begin(a,0,1)".to_string(),
				"cdata(x]]y,0,12)".to_string(),
				"end(a,0,21)".to_string(),
			]
		);
	}
}
