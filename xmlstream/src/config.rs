/*!
# Compile-time and runtime configuration

The parser's hot loop is keyed off two independent flags: whether to run the
vectorised ("SIMD") fast paths, and whether end tags are checked against the
open-tag stack. Rather than branch on a runtime bool inside the loop, both
flags are promoted to `const` associated items on a sealed [`ParserConfig`]
trait, and the four combinations get their own zero-sized marker type. The
compiler then monomorphises `Parser<S, H, C>` once per marker type actually
used, and every `if C::SIMD { .. } else { .. }` in the parser body folds away
at compile time instead of branching per call.

[`ParserOptions`] is the runtime-facing counterpart: a plain, `Copy` options
struct that callers build with the usual builder-setter methods, and which
[`ParserOptions::select`] turns into a choice of marker type for
[`crate::parse_str`]/[`crate::parse_reader`] to dispatch on.
*/

mod sealed {
	pub trait Sealed {}
}

/// Compile-time parser configuration. Implemented only by the four marker
/// types in this module; not implementable outside this crate.
pub trait ParserConfig: sealed::Sealed {
	/// Whether the lexer's batch (lane) predicate checks are used.
	const SIMD: bool;
	/// Whether end tags are compared against the open-tag stack.
	const CHECK_TAGS: bool;
}

macro_rules! marker {
	($name:ident, $simd:expr, $check:expr) => {
		#[doc = concat!(
			"SIMD = ", stringify!($simd), ", CHECK_TAGS = ", stringify!($check), "."
		)]
		#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
		pub struct $name;

		impl sealed::Sealed for $name {}

		impl ParserConfig for $name {
			const SIMD: bool = $simd;
			const CHECK_TAGS: bool = $check;
		}
	};
}

marker!(SimdCheckTags, true, true);
marker!(SimdNoCheckTags, true, false);
marker!(ScalarCheckTags, false, true);
marker!(ScalarNoCheckTags, false, false);

/// Runtime knobs controlling which [`ParserConfig`] marker a parse call is
/// dispatched to, plus the character-source encoding choice.
///
/// `use_simd` defaults to `true` and `check_begin_end_tag` defaults to
/// `true`; callers who want the general (non-stack-comparing) end-tag
/// algorithm, e.g. because they intend to ignore tag names entirely, can
/// turn the latter off.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserOptions {
	pub(crate) encoding: Encoding,
	pub(crate) use_simd: bool,
	pub(crate) check_begin_end_tag: bool,
}

impl Default for ParserOptions {
	fn default() -> Self {
		ParserOptions {
			encoding: Encoding::Detect,
			use_simd: true,
			check_begin_end_tag: true,
		}
	}
}

impl ParserOptions {
	pub fn new() -> Self {
		Self::default()
	}

	/// Fix the input encoding instead of sniffing it from a byte-order mark
	/// or the XML declaration. Has no effect on [`crate::parse_str`], whose
	/// input is already UTF-16 code units by construction.
	pub fn encoding(mut self, encoding: Encoding) -> Self {
		self.encoding = encoding;
		self
	}

	/// Enable or disable the vectorised lane fast paths. Disabling this does
	/// not change parse results, only throughput; it exists mainly for
	/// testing that the scalar and vectorised paths agree.
	pub fn use_simd(mut self, enabled: bool) -> Self {
		self.use_simd = enabled;
		self
	}

	/// Enable or disable checking that each end tag's name matches the
	/// innermost open start tag.
	pub fn check_begin_end_tag(mut self, enabled: bool) -> Self {
		self.check_begin_end_tag = enabled;
		self
	}

	pub(crate) fn encoding_or_detect(&self) -> Encoding {
		self.encoding
	}
}

/// Character encoding of a byte-stream input.
///
/// `Detect` sniffs a leading byte-order mark, falling back to the
/// heuristics of XML 1.0 Appendix F when none is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
	Detect,
	Utf8,
	Utf16Le,
	Utf16Be,
	Utf32Le,
	Utf32Be,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_options_use_simd_and_check_tags() {
		let opts = ParserOptions::default();
		assert!(opts.use_simd);
		assert!(opts.check_begin_end_tag);
		assert_eq!(opts.encoding, Encoding::Detect);
	}

	#[test]
	fn builder_setters_compose() {
		let opts = ParserOptions::new()
			.use_simd(false)
			.check_begin_end_tag(false)
			.encoding(Encoding::Utf8);
		assert!(!opts.use_simd);
		assert!(!opts.check_begin_end_tag);
		assert_eq!(opts.encoding, Encoding::Utf8);
	}

	#[test]
	fn marker_consts_match_combination() {
		assert!(SimdCheckTags::SIMD && SimdCheckTags::CHECK_TAGS);
		assert!(SimdNoCheckTags::SIMD && !SimdNoCheckTags::CHECK_TAGS);
		assert!(!ScalarCheckTags::SIMD && ScalarCheckTags::CHECK_TAGS);
		assert!(!ScalarNoCheckTags::SIMD && !ScalarNoCheckTags::CHECK_TAGS);
	}
}
