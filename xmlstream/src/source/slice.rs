use super::CharSource;

/// A [`CharSource`] over an already-decoded, in-memory code-unit slice.
/// Never blocks; `try_preview_lane*` always succeeds while `N` units remain.
pub struct SliceSource<'a> {
	data: &'a [u16],
	pos: usize,
}

impl<'a> SliceSource<'a> {
	pub fn new(data: &'a [u16]) -> Self {
		SliceSource { data, pos: 0 }
	}

	fn preview_lane<const N: usize>(&self) -> Option<[u16; N]> {
		let end = self.pos.checked_add(N)?;
		if end > self.data.len() {
			return None;
		}
		let mut out = [0u16; N];
		out.copy_from_slice(&self.data[self.pos..end]);
		Some(out)
	}
}

impl<'a> CharSource for SliceSource<'a> {
	fn try_read_next(&mut self) -> Option<u16> {
		let cu = *self.data.get(self.pos)?;
		self.pos += 1;
		Some(cu)
	}

	fn try_preview_lane8(&mut self) -> Option<[u16; 8]> {
		self.preview_lane::<8>()
	}

	fn try_preview_lane16(&mut self) -> Option<[u16; 16]> {
		self.preview_lane::<16>()
	}

	fn advance(&mut self, n: usize) {
		self.pos += n;
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn preview_does_not_consume() {
		let data: Vec<u16> = "abcdefgh".encode_utf16().collect();
		let mut src = SliceSource::new(&data);
		let lane = src.try_preview_lane8().unwrap();
		assert_eq!(lane, [
			'a' as u16, 'b' as u16, 'c' as u16, 'd' as u16, 'e' as u16, 'f' as u16, 'g' as u16,
			'h' as u16,
		]);
		assert_eq!(src.try_read_next(), Some('a' as u16));
	}

	#[test]
	fn advance_skips_previewed_units() {
		let data: Vec<u16> = "abcdefgh".encode_utf16().collect();
		let mut src = SliceSource::new(&data);
		let _ = src.try_preview_lane8().unwrap();
		src.advance(8);
		assert_eq!(src.try_read_next(), None);
	}

	#[test]
	fn short_tail_fails_lane_preview_but_scalar_reads_succeed() {
		let data: Vec<u16> = "abc".encode_utf16().collect();
		let mut src = SliceSource::new(&data);
		assert_eq!(src.try_preview_lane8(), None);
		assert_eq!(src.try_read_next(), Some('a' as u16));
	}
}
