use std::collections::VecDeque;
use std::io::{self, Read};

use super::CharSource;
use crate::config::Encoding;

const SNIFF_LEN: usize = 4;
/// Fed into the decoded stream in place of any malformed byte sequence. Not a
/// valid XML `Char` (it is explicitly excluded from the production), so the
/// ordinary character-validation path in the parser turns it into an
/// `InvalidChar` error at the right position without the source needing to
/// know about line/column tracking at all.
const REPLACEMENT: u16 = 0xFFFF;

type Decoder = fn(&[u8], &mut VecDeque<u16>) -> usize;

/// A [`CharSource`] decoding UTF-16 code units from an arbitrary byte stream.
///
/// Detects its encoding at construction time from a leading byte-order mark,
/// falling back to the four BOM-less `<?xml` heuristics of XML 1.0 Appendix F
/// when no BOM is present, unless the caller pins an [`Encoding`] explicitly.
pub struct ReaderSource<R> {
	reader: R,
	decode: Decoder,
	/// Bytes read from `reader` but not yet decoded (a trailing partial
	/// multi-byte sequence carried over from the previous refill).
	pending_bytes: Vec<u8>,
	decoded: VecDeque<u16>,
	eof: bool,
}

impl<R: Read> ReaderSource<R> {
	pub fn new(mut reader: R, requested: Encoding) -> io::Result<Self> {
		let mut sniff = [0u8; SNIFF_LEN];
		let mut sniffed = 0;
		while sniffed < SNIFF_LEN {
			let n = reader.read(&mut sniff[sniffed..])?;
			if n == 0 {
				break;
			}
			sniffed += n;
		}

		let (decode, bom_len) = match requested {
			Encoding::Detect => detect_encoding(&sniff[..sniffed]),
			Encoding::Utf8 => (decode_utf8 as Decoder, 0),
			Encoding::Utf16Le => (decode_utf16le as Decoder, 0),
			Encoding::Utf16Be => (decode_utf16be as Decoder, 0),
			Encoding::Utf32Le => (decode_utf32le as Decoder, 0),
			Encoding::Utf32Be => (decode_utf32be as Decoder, 0),
		};

		let pending_bytes = sniff[bom_len..sniffed].to_vec();

		Ok(ReaderSource { reader, decode, pending_bytes, decoded: VecDeque::new(), eof: false })
	}

	/// Pull more bytes from the underlying reader and decode as much of
	/// `pending_bytes` as currently forms complete code units, carrying the
	/// undecoded remainder forward.
	fn refill(&mut self) -> io::Result<()> {
		if self.eof {
			return Ok(());
		}
		let mut chunk = [0u8; 4096];
		let n = self.reader.read(&mut chunk)?;
		if n == 0 {
			self.eof = true;
			if !self.pending_bytes.is_empty() {
				// Leftover partial sequence at genuine end-of-stream.
				self.decoded.push_back(REPLACEMENT);
				self.pending_bytes.clear();
			}
			return Ok(());
		}
		self.pending_bytes.extend_from_slice(&chunk[..n]);
		let consumed = (self.decode)(&self.pending_bytes, &mut self.decoded);
		self.pending_bytes.drain(..consumed);
		Ok(())
	}

	fn ensure_len(&mut self, n: usize) -> io::Result<()> {
		while self.decoded.len() < n && !self.eof {
			self.refill()?;
		}
		Ok(())
	}
}

impl<R: Read> CharSource for ReaderSource<R> {
	fn try_read_next(&mut self) -> Option<u16> {
		if self.decoded.is_empty() {
			// Best-effort refill; I/O errors surfacing here are reported as
			// end-of-stream to the parser, which then raises UnexpectedEof.
			// Genuine I/O failures are also visible to callers that poll
			// the reader directly via higher-level entry points.
			let _ = self.refill();
		}
		self.decoded.pop_front()
	}

	fn try_preview_lane8(&mut self) -> Option<[u16; 8]> {
		let _ = self.ensure_len(8);
		if self.decoded.len() < 8 {
			return None;
		}
		let mut out = [0u16; 8];
		for (i, cu) in self.decoded.iter().take(8).enumerate() {
			out[i] = *cu;
		}
		Some(out)
	}

	fn try_preview_lane16(&mut self) -> Option<[u16; 16]> {
		let _ = self.ensure_len(16);
		if self.decoded.len() < 16 {
			return None;
		}
		let mut out = [0u16; 16];
		for (i, cu) in self.decoded.iter().take(16).enumerate() {
			out[i] = *cu;
		}
		Some(out)
	}

	fn advance(&mut self, n: usize) {
		self.decoded.drain(..n);
	}
}

/// XML 1.0 Appendix F: byte-order marks first, then the four BOM-less
/// `<?xml`-prefix heuristics. No match defaults to UTF-8.
fn detect_encoding(sniff: &[u8]) -> (Decoder, usize) {
	if sniff.starts_with(&[0xEF, 0xBB, 0xBF]) {
		return (decode_utf8, 3);
	}
	if sniff.starts_with(&[0x00, 0x00, 0xFE, 0xFF]) {
		return (decode_utf32be, 4);
	}
	if sniff.starts_with(&[0xFF, 0xFE, 0x00, 0x00]) {
		return (decode_utf32le, 4);
	}
	if sniff.starts_with(&[0xFE, 0xFF]) {
		return (decode_utf16be, 2);
	}
	if sniff.starts_with(&[0xFF, 0xFE]) {
		return (decode_utf16le, 2);
	}
	if sniff.starts_with(&[0x00, 0x00, 0x00, 0x3C]) {
		return (decode_utf32be, 0);
	}
	if sniff.starts_with(&[0x3C, 0x00, 0x00, 0x00]) {
		return (decode_utf32le, 0);
	}
	if sniff.starts_with(&[0x00, 0x3C, 0x00, 0x3F]) {
		return (decode_utf16be, 0);
	}
	if sniff.starts_with(&[0x3C, 0x00, 0x3F, 0x00]) {
		return (decode_utf16le, 0);
	}
	(decode_utf8, 0)
}

/// Decode as much of `bytes` as forms complete UTF-8 sequences, returning the
/// number of bytes consumed. Each malformed byte is replaced by a single
/// [`REPLACEMENT`] unit and skipped one byte at a time.
fn decode_utf8(bytes: &[u8], out: &mut VecDeque<u16>) -> usize {
	let mut i = 0;
	while i < bytes.len() {
		let b0 = bytes[i];
		let width = if b0 < 0x80 {
			1
		} else if b0 & 0xE0 == 0xC0 {
			2
		} else if b0 & 0xF0 == 0xE0 {
			3
		} else if b0 & 0xF8 == 0xF0 {
			4
		} else {
			out.push_back(REPLACEMENT);
			i += 1;
			continue;
		};
		if i + width > bytes.len() {
			break;
		}
		match std::str::from_utf8(&bytes[i..i + width]) {
			Ok(s) => {
				for cu in s.encode_utf16() {
					out.push_back(cu);
				}
				i += width;
			}
			Err(_) => {
				out.push_back(REPLACEMENT);
				i += 1;
			}
		}
	}
	i
}

fn decode_utf16le(bytes: &[u8], out: &mut VecDeque<u16>) -> usize {
	let mut i = 0;
	while i + 2 <= bytes.len() {
		out.push_back(u16::from_le_bytes([bytes[i], bytes[i + 1]]));
		i += 2;
	}
	i
}

fn decode_utf16be(bytes: &[u8], out: &mut VecDeque<u16>) -> usize {
	let mut i = 0;
	while i + 2 <= bytes.len() {
		out.push_back(u16::from_be_bytes([bytes[i], bytes[i + 1]]));
		i += 2;
	}
	i
}

fn push_scalar(out: &mut VecDeque<u16>, cp: u32) {
	match char::from_u32(cp) {
		Some(c) => {
			let mut buf = [0u16; 2];
			for cu in c.encode_utf16(&mut buf).iter() {
				out.push_back(*cu);
			}
		}
		None => out.push_back(REPLACEMENT),
	}
}

fn decode_utf32le(bytes: &[u8], out: &mut VecDeque<u16>) -> usize {
	let mut i = 0;
	while i + 4 <= bytes.len() {
		let cp = u32::from_le_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
		push_scalar(out, cp);
		i += 4;
	}
	i
}

fn decode_utf32be(bytes: &[u8], out: &mut VecDeque<u16>) -> usize {
	let mut i = 0;
	while i + 4 <= bytes.len() {
		let cp = u32::from_be_bytes([bytes[i], bytes[i + 1], bytes[i + 2], bytes[i + 3]]);
		push_scalar(out, cp);
		i += 4;
	}
	i
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn detects_utf8_bom() {
		let (decode, len) = detect_encoding(&[0xEF, 0xBB, 0xBF, b'<']);
		assert_eq!(decode as usize, decode_utf8 as usize);
		assert_eq!(len, 3);
	}

	#[test]
	fn detects_bomless_utf16be_via_xml_prefix() {
		let (decode, len) = detect_encoding(&[0x00, 0x3C, 0x00, 0x3F]);
		assert_eq!(decode as usize, decode_utf16be as usize);
		assert_eq!(len, 0);
	}

	#[test]
	fn reads_plain_utf8_document() {
		let text = "<a>hi</a>";
		let src = ReaderSource::new(text.as_bytes(), Encoding::Detect).unwrap();
		let mut src = src;
		let mut out = Vec::new();
		while let Some(cu) = src.try_read_next() {
			out.push(cu);
		}
		assert_eq!(String::from_utf16(&out).unwrap(), text);
	}

	#[test]
	fn reads_utf16le_with_bom() {
		let text = "<a/>";
		let mut bytes = vec![0xFF, 0xFE];
		for cu in text.encode_utf16() {
			bytes.extend_from_slice(&cu.to_le_bytes());
		}
		let mut src = ReaderSource::new(bytes.as_slice(), Encoding::Detect).unwrap();
		let mut out = Vec::new();
		while let Some(cu) = src.try_read_next() {
			out.push(cu);
		}
		assert_eq!(String::from_utf16(&out).unwrap(), text);
	}

	#[test]
	fn malformed_utf8_yields_replacement_unit() {
		let bytes: &[u8] = &[b'a', 0xFF, b'b'];
		let mut src = ReaderSource::new(bytes, Encoding::Detect).unwrap();
		let mut out = Vec::new();
		while let Some(cu) = src.try_read_next() {
			out.push(cu);
		}
		assert_eq!(out, vec!['a' as u16, REPLACEMENT, 'b' as u16]);
	}
}
