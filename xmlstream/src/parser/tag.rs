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
	/// `Name (S Attribute)* S? '>'` or `... S? '/>'`, entered with the name's
	/// first code unit already consumed.
	pub(super) fn parse_begin_tag(
		&mut self,
		first: u16,
		start_line: u64,
		start_column: u64,
	) -> Result<()> {
		let stop = self.parse_name(first)?;
		self.finish_begin_tag(stop, start_line, start_column)
	}

	pub(super) fn finish_begin_tag(
		&mut self,
		stop: (u16, u64, u64),
		start_line: u64,
		start_column: u64,
	) -> Result<()> {
		let name_start = self.scratch.split_point();
		let name_end = self.scratch.end();
		self.handler.on_begin_tag(self.scratch.slice(name_start, name_end), start_line, start_column);
		if C::CHECK_TAGS {
			self.scratch.push_name_frame();
		} else {
			self.scratch.clear_lexeme();
		}

		let (mut cu, mut line, mut column) = stop;
		loop {
			let (had_ws, next_cu, next_line, next_column) =
				self.skip_whitespace_from(cu, line, column)?;
			cu = next_cu;
			line = next_line;
			column = next_column;

			match cu {
				b'>' as u16 => return Ok(()),
				b'/' as u16 => {
					let n = self.bump().ok_or_else(|| self.eof())?;
					if n != b'>' as u16 {
						return Err(self.err(ErrorKind::InvalidCharAfterSlash));
					}
					self.handler.on_end_tag_empty();
					if C::CHECK_TAGS {
						self.scratch.commit_pop();
					}
					return Ok(());
				}
				_ => {
					if !had_ws {
						return Err(self.err_at(ErrorKind::MissingWhitespace, line, column));
					}
					let next_stop = self.parse_attribute(cu, line, column)?;
					cu = next_stop.0;
					line = next_stop.1;
					column = next_stop.2;
				}
			}
		}
	}

	/// `Name Eq AttValue`, entered with the attribute name's first code unit
	/// (`first`, at `first_line`/`first_column`) already consumed. Returns
	/// the code unit that follows the attribute value.
	fn parse_attribute(
		&mut self,
		first: u16,
		first_line: u64,
		first_column: u64,
	) -> Result<(u16, u64, u64)> {
		if !xmlstream_chars::is_name_start_char(first) && !xmlstream_chars::is_high_surrogate(first)
		{
			return Err(self.err_at(ErrorKind::InvalidAttributeName, first_line, first_column));
		}
		let attr_start = self.scratch.end();
		let (name_stop_cu, name_stop_line, name_stop_col) = self.parse_name(first)?;
		let value_start_marker = self.scratch.end();

		let (_, eq_cu, eq_line, eq_col) =
			self.skip_whitespace_from(name_stop_cu, name_stop_line, name_stop_col)?;
		if eq_cu != b'=' as u16 {
			return Err(self.err_at(ErrorKind::MissingEquals, eq_line, eq_col));
		}
		let (quote_pl, quote_pc) = (self.line, self.column);
		let after_eq = self.bump().ok_or_else(|| self.eof())?;
		let (_, quote, value_line, value_column) =
			self.skip_whitespace_from(after_eq, quote_pl, quote_pc)?;
		if quote != b'\'' as u16 && quote != b'"' as u16 {
			return Err(self.err_at(ErrorKind::AttributeValueNotQuoted, value_line, value_column));
		}

		self.parse_attribute_value(quote)?;

		let value_end = self.scratch.end();
		let name = self.scratch.slice(attr_start, value_start_marker);
		let value = self.scratch.slice(value_start_marker, value_end);
		self.handler.on_attribute(name, value, first_line, first_column, value_line, value_column);
		self.scratch.clear_lexeme_to(attr_start);

		let (stop, sl, sc) = {
			let (pl, pc) = (self.line, self.column);
			let cu = self.bump().ok_or_else(|| self.eof())?;
			(cu, pl, pc)
		};
		Ok((stop, sl, sc))
	}

	/// The attribute value body up to (and including consuming) the
	/// terminating `quote`.
	fn parse_attribute_value(&mut self, quote: u16) -> Result<()> {
		loop {
			if C::SIMD {
				if let Some(lane) = self.source.try_preview_lane8() {
					if lane.iter().all(|&cu| is_plain_attr_value(cu, quote)) {
						self.scratch.push_lane(&lane);
						self.source.advance(8);
						self.column += 8;
						continue;
					}
				}
			}
			let (pl, pc) = (self.line, self.column);
			let cu = self.bump().ok_or_else(|| self.eof())?;
			if cu == quote {
				return Ok(());
			}
			match cu {
				b'&' as u16 => {
					self.parse_reference_into_scratch()?;
				}
				b'<' as u16 => {
					return Err(self.err_at(ErrorKind::LiteralLessThanInAttributeValue, pl, pc));
				}
				_ => {
					self.push_validated_content_char_for_attr(cu, pl, pc)?;
				}
			}
		}
	}

	fn push_validated_content_char_for_attr(&mut self, cu: u16, pl: u64, pc: u64) -> Result<()> {
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
			Err(self.err_at(ErrorKind::InvalidCharInAttributeValue, pl, pc))
		} else {
			self.scratch.push_unit(cu);
			Ok(())
		}
	}

	/// `</Name S? '>'`, entered with `<` and `/` already consumed.
	pub(super) fn parse_end_tag(&mut self) -> Result<()> {
		let (name_line, name_column) = (self.line, self.column);
		let first = self.bump().ok_or_else(|| self.eof())?;
		if !xmlstream_chars::is_name_start_char(first) && !xmlstream_chars::is_high_surrogate(first)
		{
			return Err(self.err_at(ErrorKind::InvalidEndTagName, name_line, name_column));
		}
		let name_start = self.scratch.end();
		let (stop, _, _) = self.parse_name(first)?;
		let name_end = self.scratch.end();

		let (_, gt, gt_line, gt_col) = self.skip_whitespace_from(stop.0, stop.1, stop.2)?;
		if gt != b'>' as u16 {
			return Err(self.err_at(ErrorKind::InvalidEndTagName, gt_line, gt_col));
		}

		if C::CHECK_TAGS {
			if self.scratch.stack_is_empty() {
				self.scratch.clear_lexeme_to(name_start);
				return Err(self.err_at(ErrorKind::UnmatchedEndTag, name_line, name_column));
			}
			let matches = {
				let expected = self.scratch.top_name();
				let actual = self.scratch.slice(name_start, name_end);
				expected == actual
			};
			if !matches {
				self.scratch.clear_lexeme_to(name_start);
				return Err(self.err_at(ErrorKind::UnmatchedEndTag, name_line, name_column));
			}
			self.handler.on_end_tag(self.scratch.slice(name_start, name_end), name_line, name_column);
			self.scratch.clear_lexeme_to(name_start);
			self.scratch.commit_pop();
		} else {
			self.handler.on_end_tag(self.scratch.slice(name_start, name_end), name_line, name_column);
			self.scratch.clear_lexeme_to(name_start);
		}
		Ok(())
	}
}

#[inline]
fn is_plain_attr_value(cu: u16, quote: u16) -> bool {
	cu >= 0x20
		&& cu < xmlstream_chars::HIGH_SURROGATE_START
		&& cu != quote
		&& cu != b'&' as u16
		&& cu != b'<' as u16
}
