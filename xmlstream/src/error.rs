/*!
# Error types

This module holds the closed taxonomy of well-formedness violations the
parser can report, each with a fixed, human-readable message, plus
the `Error` wrapper that attaches the `(line, column)` at which the violation
was detected.

With the exception of unclosed elements at a clean end-of-file (where the
parser is allowed to report one [`Error`] per unclosed frame without
otherwise failing), a parser that has returned an [`Error`] has
terminated: every subsequent call would report the same condition again, so
callers should treat any `Err` from [`crate::parse_str`]/[`crate::parse_reader`]
as fatal.
*/
use std::error;
use std::fmt;
use std::io;

/// Closed set of well-formedness violations.
///
/// Each variant carries just enough context to render its fixed message;
/// variants are deliberately *not* parameterized with free-form text, so
/// that every error a user ever sees is one of this fixed list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
	/// `<` was not followed by a valid `Name` start character.
	InvalidBeginTagName,
	/// A character other than `>` followed the `/` that was expected to end
	/// an empty-element tag.
	InvalidCharAfterSlash,
	/// Whitespace was required (e.g. between an attribute and the previous
	/// token) but not present.
	MissingWhitespace,
	/// An attribute name did not start with a valid `Name` start character.
	InvalidAttributeName,
	/// `=` was expected after an attribute name but not found.
	MissingEquals,
	/// An attribute value was not delimited by `'` or `"`.
	AttributeValueNotQuoted,
	/// A literal `<` was found inside an attribute value.
	LiteralLessThanInAttributeValue,
	/// A code unit not allowed inside an attribute value was found.
	InvalidCharInAttributeValue,
	/// A code unit outside the `Char` production was encountered.
	InvalidChar,
	/// A lone (unpaired) UTF-16 surrogate was encountered.
	LoneSurrogate,
	/// A character reference (`&#...;`) decoded to a code point that is not
	/// a valid `Char` (including surrogate code points).
	InvalidCharacterReference,
	/// A hexadecimal character reference (`&#x...;`) contained a non-hex
	/// digit.
	InvalidHexDigit,
	/// A decimal character reference (`&#...;`) contained a non-decimal
	/// digit.
	InvalidDecimalDigit,
	/// A character or entity reference was not terminated with `;`.
	MissingReferenceSemicolon,
	/// A named entity reference other than the five predefined entities was
	/// used.
	UnknownEntity,
	/// An end tag's `Name` did not start with a valid `Name` start character.
	InvalidEndTagName,
	/// An end tag did not match the innermost open element (including the
	/// case where no element is open at all).
	UnmatchedEndTag,
	/// An unsupported `<!...>` directive (anything other than a comment or a
	/// CDATA section) was encountered.
	UnsupportedDirective,
	/// `<![` was not followed by the literal `CDATA[`.
	MalformedCDataStart,
	/// `<!` was not followed by `--` while also not being a valid directive.
	MalformedCommentStart,
	/// `--` occurred inside a comment body without being immediately
	/// followed by `>`.
	CommentDashDash,
	/// An XML declaration (`<?xml ... ?>`) was encountered after the prolog
	/// had already been left (i.e. after any non-whitespace content).
	XmlDeclarationNotFirst,
	/// `<?` was encountered before any content, but was not followed by the
	/// literal `xml`.
	ExpectedXmlDeclaration,
	/// The `version` pseudo-attribute was missing from the XML declaration.
	MissingVersion,
	/// The `encoding` pseudo-attribute's keyword was malformed.
	MissingEncodingKeyword,
	/// The `standalone` pseudo-attribute's keyword was malformed.
	MissingStandaloneKeyword,
	/// The XML declaration was not terminated with `?>`.
	MissingDeclarationEnd,
	/// End-of-input was reached in the middle of a construct that requires
	/// more data.
	UnexpectedEof,
	/// An open element was never closed before a clean end-of-input
	/// (matched-tag checking only). Carries the element name for the
	/// message.
	UnclosedElement(String),
}

impl ErrorKind {
	/// The fixed, human-readable message for this error kind.
	pub fn message(&self) -> String {
		match self {
			Self::InvalidBeginTagName => "Invalid start tag name.".to_string(),
			Self::InvalidCharAfterSlash => {
				"Invalid character found after '/'; expecting '>'.".to_string()
			}
			Self::MissingWhitespace => {
				"Expecting whitespace or '/>' or '>'.".to_string()
			}
			Self::InvalidAttributeName => "Invalid attribute name.".to_string(),
			Self::MissingEquals => "Expecting '=' after attribute name.".to_string(),
			Self::AttributeValueNotQuoted => {
				"Attribute value must start with a single or double quote.".to_string()
			}
			Self::LiteralLessThanInAttributeValue => {
				"Literal '<' is not allowed in an attribute value.".to_string()
			}
			Self::InvalidCharInAttributeValue => {
				"Invalid character found in attribute value.".to_string()
			}
			Self::InvalidChar => "Invalid character found in the document.".to_string(),
			Self::LoneSurrogate => "Lone surrogate code unit encountered.".to_string(),
			Self::InvalidCharacterReference => {
				"Character reference expanded to an invalid character.".to_string()
			}
			Self::InvalidHexDigit => "Invalid hexadecimal digit in character reference.".to_string(),
			Self::InvalidDecimalDigit => "Invalid decimal digit in character reference.".to_string(),
			Self::MissingReferenceSemicolon => {
				"Expecting ';' to terminate a character or entity reference.".to_string()
			}
			Self::UnknownEntity => {
				"Only the five predefined entities (lt, gt, amp, apos, quot) are supported."
					.to_string()
			}
			Self::InvalidEndTagName => "Invalid end tag name.".to_string(),
			Self::UnmatchedEndTag => "Invalid end tag. No matching start tag found".to_string(),
			Self::UnsupportedDirective => "Unsupported '<!' directive.".to_string(),
			Self::MalformedCDataStart => "Expecting 'CDATA[' after '<!['.".to_string(),
			Self::MalformedCommentStart => "Expecting '--' after '<!'.".to_string(),
			Self::CommentDashDash => {
				"'--' is not allowed inside a comment except as '-->'.".to_string()
			}
			Self::XmlDeclarationNotFirst => {
				"The XML declaration must be the first thing in the document.".to_string()
			}
			Self::ExpectedXmlDeclaration => "Expecting '<?xml'.".to_string(),
			Self::MissingVersion => "Expecting 'version' in the XML declaration.".to_string(),
			Self::MissingEncodingKeyword => {
				"Expecting 'encoding' in the XML declaration.".to_string()
			}
			Self::MissingStandaloneKeyword => {
				"Expecting 'standalone' in the XML declaration.".to_string()
			}
			Self::MissingDeclarationEnd => "Expecting '?>' to close the XML declaration.".to_string(),
			Self::UnexpectedEof => "Unexpected end of input.".to_string(),
			Self::UnclosedElement(name) => {
				format!("Invalid tag {} not closed at the end of the document.", name)
			}
		}
	}
}

impl fmt::Display for ErrorKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.message())
	}
}

/// A zero-based source position, as delivered to the [`crate::Handler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
	pub line: u64,
	pub column: u64,
}

impl Position {
	pub(crate) fn new(line: u64, column: u64) -> Self {
		Position { line, column }
	}
}

/// A well-formedness violation together with the position at which it was
/// detected.
///
/// This is also used to report I/O failures from the stream-backed character
/// source: those surface as [`Error::Io`] rather than as an
/// [`ErrorKind`], since they are not a property of the document.
#[derive(Debug, Clone)]
pub enum Error {
	/// A violation of the XML 1.0 grammar or a well-formedness constraint it imposes.
	Wf(ErrorKind, Position),
	/// An I/O error from the underlying byte stream.
	Io(std::sync::Arc<io::Error>),
}

impl Error {
	pub(crate) fn wf(kind: ErrorKind, line: u64, column: u64) -> Self {
		Error::Wf(kind, Position::new(line, column))
	}

	/// The position at which the error was detected, if any (I/O errors have
	/// no meaningful document position).
	pub fn position(&self) -> Option<Position> {
		match self {
			Error::Wf(_, pos) => Some(*pos),
			Error::Io(_) => None,
		}
	}
}

impl From<io::Error> for Error {
	fn from(e: io::Error) -> Self {
		Error::Io(std::sync::Arc::new(e))
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::Wf(kind, pos) => {
				write!(f, "{} at line {}, column {}", kind.message(), pos.line, pos.column)
			}
			Error::Io(e) => write!(f, "I/O error: {}", e),
		}
	}
}

impl error::Error for Error {
	fn source(&self) -> Option<&(dyn error::Error + 'static)> {
		match self {
			Error::Io(e) => Some(&**e),
			Error::Wf(..) => None,
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
