use crate::config::ParserConfig;
use crate::error::{ErrorKind, Result};
use crate::handler::Handler;
use crate::source::CharSource;

use super::Parser;

const VERSION_SUFFIX: &[u8] = b"ersion";
const ENCODING_SUFFIX: &[u8] = b"ncoding";
const STANDALONE_SUFFIX: &[u8] = b"tandalone";

impl<'h, S, H, C> Parser<'h, S, H, C>
where
	S: CharSource,
	H: Handler,
	C: ParserConfig,
{
	/// Peek for a leading `<?xml`, the only position an XML declaration is
	/// ever allowed to appear. Any valid declaration is far longer than one
	/// preview lane, so an eight-unit lookahead is enough to decide whether
	/// to commit to parsing one at all; a document with fewer than eight
	/// units in total cannot contain a well-formed declaration anyway.
	///
	/// `lane[5]` must end the `xml` `PITarget` there (whitespace, since
	/// `VersionInfo` requires a leading `S`, or `?` for a malformed-but-
	/// still-ours `<?xml?>`); otherwise this is some other PI target that
	/// merely starts with `xml` (`<?xml-stylesheet ...?>`), and must fall
	/// through to [`Parser::parse_question_mark`]'s non-`xml` handling.
	pub(super) fn maybe_parse_leading_declaration(&mut self) -> Result<()> {
		let is_leading_decl = matches!(
			self.source.try_preview_lane8(),
			Some(lane)
				if lane[0] == super::LT
					&& lane[1] == b'?' as u16
					&& lane[2] == b'x' as u16
					&& lane[3] == b'm' as u16
					&& lane[4] == b'l' as u16
					&& (xmlstream_chars::is_whitespace(lane[5]) || lane[5] == b'?' as u16)
		);
		if !is_leading_decl {
			return Ok(());
		}
		self.bump();
		let (start_line, start_column) = (self.line, self.column);
		for _ in 0..4 {
			self.bump();
		}
		self.parse_xml_declaration_body(start_line, start_column)
	}

	/// `<?` has just been consumed from inside the main content loop (i.e.
	/// *not* at the very start of the document, since that case is handled by
	/// [`Parser::maybe_parse_leading_declaration`] before the loop ever
	/// starts). Processing instructions in general are not supported; the
	/// only question left is whether to report this one as a
	/// too-late declaration or as an unsupported PI target.
	pub(super) fn parse_question_mark(&mut self, start_line: u64, start_column: u64) -> Result<()> {
		let c1 = self.bump().ok_or_else(|| self.eof())?;
		if c1 == b'x' as u16 {
			let c2 = self.bump().ok_or_else(|| self.eof())?;
			if c2 == b'm' as u16 {
				let c3 = self.bump().ok_or_else(|| self.eof())?;
				if c3 == b'l' as u16 {
					// The PITarget is exactly "xml" only if nothing that could
					// extend the name follows; otherwise this is some other
					// target merely starting with "xml" (`xml-stylesheet`, ...).
					let target_is_exactly_xml = match self.bump() {
						Some(cu) => xmlstream_chars::is_whitespace(cu) || cu == b'?' as u16,
						None => true,
					};
					if target_is_exactly_xml {
						return Err(self.err_at(ErrorKind::XmlDeclarationNotFirst, start_line, start_column));
					}
				}
			}
		}
		Err(self.err_at(ErrorKind::ExpectedXmlDeclaration, start_line, start_column))
	}

	/// `VersionInfo EncodingDecl? SDDecl? S? '?>'`, entered with `<?xml`
	/// already consumed.
	fn parse_xml_declaration_body(&mut self, start_line: u64, start_column: u64) -> Result<()> {
		let region_start = self.scratch.end();

		let (had_ws, cu, line, column) = self.skip_whitespace()?;
		if !had_ws || cu != b'v' as u16 {
			return Err(self.err_at(ErrorKind::MissingVersion, line, column));
		}
		self.expect_keyword_suffix(VERSION_SUFFIX, ErrorKind::MissingVersion, line, column)?;
		self.expect_eq(ErrorKind::MissingVersion)?;
		let (version_start, version_end) = self.scan_quoted_value_into_scratch()?;

		let mut encoding_range = (0usize, 0usize);
		let mut standalone_range = (0usize, 0usize);

		let (had_ws, mut cu, mut line, mut column) = self.skip_whitespace()?;
		let mut has_ws = had_ws;

		if has_ws && cu == b'e' as u16 {
			self.expect_keyword_suffix(ENCODING_SUFFIX, ErrorKind::MissingEncodingKeyword, line, column)?;
			self.expect_eq(ErrorKind::MissingEncodingKeyword)?;
			encoding_range = self.scan_quoted_value_into_scratch()?;
			let next = self.skip_whitespace()?;
			has_ws = next.0;
			cu = next.1;
			line = next.2;
			column = next.3;
		}

		if has_ws && cu == b's' as u16 {
			self.expect_keyword_suffix(STANDALONE_SUFFIX, ErrorKind::MissingStandaloneKeyword, line, column)?;
			self.expect_eq(ErrorKind::MissingStandaloneKeyword)?;
			standalone_range = self.scan_quoted_value_into_scratch()?;
			let next = self.skip_whitespace()?;
			cu = next.1;
			line = next.2;
			column = next.3;
		}

		if cu != b'?' as u16 {
			return Err(self.err_at(ErrorKind::MissingDeclarationEnd, line, column));
		}
		let gt = self.bump().ok_or_else(|| self.eof())?;
		if gt != b'>' as u16 {
			return Err(self.err_at(ErrorKind::MissingDeclarationEnd, line, column));
		}

		let version = self.scratch.slice(version_start, version_end);
		let encoding = self.scratch.slice(encoding_range.0, encoding_range.1);
		let standalone = self.scratch.slice(standalone_range.0, standalone_range.1);
		self.handler.on_xml_declaration(version, encoding, standalone, start_line, start_column);
		self.scratch.clear_lexeme_to(region_start);
		Ok(())
	}

	/// Consume exactly `suffix`, the remaining letters of a pseudo-attribute
	/// keyword whose first letter the caller has already matched.
	fn expect_keyword_suffix(
		&mut self,
		suffix: &[u8],
		kind: ErrorKind,
		line: u64,
		column: u64,
	) -> Result<()> {
		for &expected in suffix {
			let cu = self.bump().ok_or_else(|| self.eof())?;
			if cu != expected as u16 {
				return Err(self.err_at(kind, line, column));
			}
		}
		Ok(())
	}

	/// `S? '=' S?`, without consuming the quote that follows.
	fn expect_eq(&mut self, kind: ErrorKind) -> Result<()> {
		let (_, cu, line, column) = self.skip_whitespace()?;
		if cu != b'=' as u16 {
			return Err(self.err_at(kind, line, column));
		}
		Ok(())
	}

	/// A quoted pseudo-attribute value, pushed into the scratch buffer and
	/// returned as a `(start, end)` index pair rather than a borrowed slice,
	/// so the caller can keep scanning further pseudo-attributes before any
	/// of them are handed to the handler.
	fn scan_quoted_value_into_scratch(&mut self) -> Result<(usize, usize)> {
		let (_, quote, ql, qc) = self.skip_whitespace()?;
		if quote != b'\'' as u16 && quote != b'"' as u16 {
			return Err(self.err_at(ErrorKind::AttributeValueNotQuoted, ql, qc));
		}
		let start = self.scratch.end();
		loop {
			let (pl, pc) = (self.line, self.column);
			let cu = self.bump().ok_or_else(|| self.eof())?;
			if cu == quote {
				return Ok((start, self.scratch.end()));
			}
			if !xmlstream_chars::is_char(cu) {
				return Err(self.err_at(ErrorKind::InvalidChar, pl, pc));
			}
			self.scratch.push_unit(cu);
		}
	}
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
		fn on_xml_declaration(
			&mut self,
			version: &[u16],
			encoding: &[u16],
			standalone: &[u16],
			line: u64,
			column: u64,
		) {
			self.events.push(format!(
				"decl({},{},{},{},{})",
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

		fn on_end_tag_empty(&mut self) {
			self.events.push("end_empty()".to_string());
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
	fn full_declaration_with_encoding_and_standalone() {
		let events = run_str("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?><a/>");
		assert_eq!(
			events,
			vec![
				"decl(1.0,UTF-8,yes,0,1)".to_string(),
				"begin(a,0,56)".to_string(),
				"end_empty()".to_string(),
			]
		);
	}

	#[test]
	fn declaration_without_encoding_or_standalone() {
		let events = run_str("<?xml version=\"1.0\"?><a/>");
		assert_eq!(
			events,
			vec!["decl(1.0,,,0,1)".to_string(), "begin(a,0,22)".to_string(), "end_empty()".to_string()]
		);
	}

	#[test]
	fn declaration_missing_version_is_an_error() {
		let units: Vec<u16> = "<?xml encoding=\"UTF-8\"?><a/>".encode_utf16().collect();
		let source = SliceSource::new(&units);
		let mut handler = Recorder::default();
		let parser = Parser::<_, _, SimdCheckTags>::new(source, &mut handler);
		assert!(parser.run().is_err());
	}

	#[test]
	fn non_xml_processing_instruction_is_rejected() {
		use crate::error::{Error, ErrorKind};

		let units: Vec<u16> = "<?xml-stylesheet href=\"a.xsl\"?><a/>".encode_utf16().collect();
		let source = SliceSource::new(&units);
		let mut handler = Recorder::default();
		let parser = Parser::<_, _, SimdCheckTags>::new(source, &mut handler);
		match parser.run() {
			Err(Error::Wf(ErrorKind::ExpectedXmlDeclaration, _)) => {}
			other => panic!("expected ExpectedXmlDeclaration, got {:?}", other),
		}
	}

	#[test]
	fn declaration_appearing_after_content_is_rejected() {
		use crate::error::{Error, ErrorKind};

		let units: Vec<u16> = "<a/><?xml version=\"1.0\"?>".encode_utf16().collect();
		let source = SliceSource::new(&units);
		let mut handler = Recorder::default();
		let parser = Parser::<_, _, SimdCheckTags>::new(source, &mut handler);
		match parser.run() {
			Err(Error::Wf(ErrorKind::XmlDeclarationNotFirst, _)) => {}
			other => panic!("expected XmlDeclarationNotFirst, got {:?}", other),
		}
	}

	#[test]
	fn non_xml_target_after_content_is_not_confused_with_a_late_declaration() {
		use crate::error::{Error, ErrorKind};

		let units: Vec<u16> = "<a/><?xml-stylesheet href=\"a.xsl\"?>".encode_utf16().collect();
		let source = SliceSource::new(&units);
		let mut handler = Recorder::default();
		let parser = Parser::<_, _, SimdCheckTags>::new(source, &mut handler);
		match parser.run() {
			Err(Error::Wf(ErrorKind::ExpectedXmlDeclaration, _)) => {}
			other => panic!("expected ExpectedXmlDeclaration, got {:?}", other),
		}
	}
}
