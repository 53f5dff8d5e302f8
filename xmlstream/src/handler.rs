/*!
# Handler contract

The [`Handler`] trait is the parser's only output: every significant
production delivers exactly one callback, carrying code-unit slices borrowed
from the parser's internal scratch buffer. None of the slices
(or the `name`/`value`/`text`/`body` arguments derived from them) remain
valid past the return of the method they were passed to.

The parser is generic over `H: Handler` so
that the handler's methods are statically dispatched and can be inlined into
the hot loop; callers who need object-style polymorphism can implement
`Handler` for a thin wrapper around a `dyn Trait` of their own design.
*/

/// Receiver of parse events.
///
/// Every method has a no-op default, including [`Handler::on_error`] -
/// unlike an implementation built on exceptions or `longjmp`, this parser
/// always terminates the surrounding parse call with an `Err` after
/// delivering an error event, regardless of what an override of
/// `on_error` does. The default's only job is to let a handler that does not
/// care about error *text* skip writing a method for it; it does not need to
/// "raise" anything itself to get that fatal behaviour.
pub trait Handler {
	/// Called once, at the very start of the document, if an XML
	/// declaration is present. `encoding` and `standalone` are empty slices
	/// if those pseudo-attributes were absent.
	fn on_xml_declaration(
		&mut self,
		_version: &[u16],
		_encoding: &[u16],
		_standalone: &[u16],
		_line: u64,
		_column: u64,
	) {
	}

	/// Called at `<Name`, before any attributes of that element.
	fn on_begin_tag(&mut self, _name: &[u16], _line: u64, _column: u64) {}

	/// Called once per attribute, after [`Handler::on_begin_tag`] and before
	/// the matching [`Handler::on_end_tag_empty`]/[`Handler::on_end_tag`]
	/// pair closes the element header.
	fn on_attribute(
		&mut self,
		_name: &[u16],
		_value: &[u16],
		_name_line: u64,
		_name_column: u64,
		_value_line: u64,
		_value_column: u64,
	) {
	}

	/// Called immediately after `/>` in an empty-element tag, instead of a
	/// matching [`Handler::on_end_tag`].
	fn on_end_tag_empty(&mut self) {}

	/// Called at `</Name`.
	fn on_end_tag(&mut self, _name: &[u16], _line: u64, _column: u64) {}

	/// Called once per contiguous, non-empty run of character data, at the
	/// position of its first code unit.
	fn on_text(&mut self, _text: &[u16], _line: u64, _column: u64) {}

	/// Called once per comment, with the body between `<!--` and `-->`.
	fn on_comment(&mut self, _body: &[u16], _line: u64, _column: u64) {}

	/// Called once per CDATA section, with the body between `<![CDATA[` and
	/// `]]>`.
	fn on_cdata(&mut self, _body: &[u16], _line: u64, _column: u64) {}

	/// Called once per non-recoverable parse error. The parser's top-level
	/// `run` loop always terminates with an `Err` immediately after this
	/// returns, except in the special end-of-input case where one or more
	/// unclosed elements are reported after the document has already been
	/// fully consumed.
	fn on_error(&mut self, _message: &str, _line: u64, _column: u64) {}
}
