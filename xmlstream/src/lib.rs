/*!
# Streaming XML 1.0 parsing

This crate parses XML 1.0 documents over UTF-16 code units, delivering a
subset of SAX-like events to a caller-supplied [`Handler`] with no
per-event heap allocation: every byte slice and code-unit slice handed to a
handler method borrows directly from a scratch buffer owned by the
[`Parser`] and is valid only for the duration of that call.

## Features (and restrictions)

* No DTD, no external entities, no custom entities - only the five
  predefined entities (`lt`, `gt`, `amp`, `apos`, `quot`) and numeric
  character references are supported.
* No general processing instructions; the only one recognized is a leading
  `<?xml ...?>` declaration.
* Comments and CDATA sections are both recognized and reported.
* Works over in-memory UTF-16 slices ([`SliceSource`]) or over an arbitrary
  byte stream with BOM/heuristic encoding detection ([`ReaderSource`]).
* Zero-sized [`ParserConfig`] markers select, at compile time, whether the
  lexer uses its vectorised batch-check fast paths and whether begin/end tag
  names are matched against each other.

## Example

```
use xmlstream::{parse_str, Handler, ParserOptions};

#[derive(Default)]
struct Count(usize);

impl Handler for Count {
    fn on_begin_tag(&mut self, _name: &[u16], _line: u64, _column: u64) {
        self.0 += 1;
    }
}

let mut count = Count::default();
parse_str("<a><b/><c/></a>", &mut count, ParserOptions::default()).unwrap();
assert_eq!(count.0, 3);
```
*/

pub mod config;
pub mod error;
pub mod handler;
pub mod parser;
pub mod scratch;
pub mod source;

#[doc(inline)]
pub use config::{Encoding, ParserOptions};
#[doc(inline)]
pub use error::{Error, ErrorKind, Position, Result};
#[doc(inline)]
pub use handler::Handler;
#[doc(inline)]
pub use parser::Parser;
#[doc(inline)]
pub use source::{CharSource, ReaderSource, SliceSource};

use config::{ScalarCheckTags, ScalarNoCheckTags, SimdCheckTags, SimdNoCheckTags};

/// Parse `text` in memory, delivering events to `handler`.
///
/// `options.encoding` is ignored for this entry point: an in-memory `&str`
/// is already decoded, so no byte-level encoding detection applies.
pub fn parse_str(text: &str, handler: &mut impl Handler, options: ParserOptions) -> Result<()> {
	let units: Vec<u16> = text.encode_utf16().collect();
	let source = SliceSource::new(&units);
	run_with_options(source, handler, options)
}

/// Parse an arbitrary byte stream, delivering events to `handler`.
///
/// The stream's encoding is detected from a leading byte-order mark, or (in
/// its absence) from one of the four `<?xml` byte-pattern heuristics of XML
/// 1.0 Appendix F, unless `options.encoding` pins a specific encoding.
pub fn parse_reader<R: std::io::Read>(
	reader: R,
	handler: &mut impl Handler,
	options: ParserOptions,
) -> Result<()> {
	let source = ReaderSource::new(reader, options.encoding_or_detect())?;
	run_with_options(source, handler, options)
}

fn run_with_options<S: CharSource>(
	source: S,
	handler: &mut impl Handler,
	options: ParserOptions,
) -> Result<()> {
	match (options.use_simd, options.check_begin_end_tag) {
		(true, true) => Parser::<_, _, SimdCheckTags>::new(source, handler).run(),
		(true, false) => Parser::<_, _, SimdNoCheckTags>::new(source, handler).run(),
		(false, true) => Parser::<_, _, ScalarCheckTags>::new(source, handler).run(),
		(false, false) => Parser::<_, _, ScalarNoCheckTags>::new(source, handler).run(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Default)]
	struct Recorder {
		events: Vec<String>,
	}

	impl Handler for Recorder {
		fn on_begin_tag(&mut self, name: &[u16], _line: u64, _column: u64) {
			self.events.push(format!("begin({})", String::from_utf16_lossy(name)));
		}

		fn on_end_tag(&mut self, name: &[u16], _line: u64, _column: u64) {
			self.events.push(format!("end({})", String::from_utf16_lossy(name)));
		}

		fn on_end_tag_empty(&mut self) {
			self.events.push("end_empty()".to_string());
		}
	}

	#[test]
	fn parse_str_runs_the_default_configuration() {
		let mut recorder = Recorder::default();
		parse_str("<a><b/></a>", &mut recorder, ParserOptions::default()).unwrap();
		assert_eq!(
			recorder.events,
			vec!["begin(a)".to_string(), "begin(b)".to_string(), "end_empty()".to_string(), "end(a)".to_string()]
		);
	}

	#[test]
	fn parse_reader_reads_from_a_byte_stream() {
		let mut recorder = Recorder::default();
		parse_reader(b"<a/>".as_slice(), &mut recorder, ParserOptions::default()).unwrap();
		assert_eq!(recorder.events, vec!["begin(a)".to_string(), "end_empty()".to_string()]);
	}

	#[test]
	fn scalar_and_simd_configurations_agree() {
		let mut simd = Recorder::default();
		let mut scalar = Recorder::default();
		let text = "<a><b x=\"1\"/><c>text &amp; more</c></a>";
		parse_str(text, &mut simd, ParserOptions::new().use_simd(true)).unwrap();
		parse_str(text, &mut scalar, ParserOptions::new().use_simd(false)).unwrap();
		assert_eq!(simd.events, scalar.events);
	}
}
